//! # hw-proxy
//!
//! Payment terminal driver for the POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          hw-proxy Process                               │
//! │                                                                         │
//! │  POS ───► HTTP (8069) ───► Driver Task Loop ───► Terminal link (9000) │
//! │                                   ▲                       │             │
//! │                                   └──── Result Listener ◄─┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! hw-proxy [--config <path>]
//! HWPROXY_CONFIG=/etc/hw-proxy/ctep.toml hw-proxy
//! RUST_LOG=debug HWPROXY_PRINT_RECEIPT=true hw-proxy
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ctep_driver::{server, CertificationLog, Driver, DriverConfig, TaskQueue, TcpTerminalLink};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file; defaults to ctep.toml in the platform config dir
    #[arg(long, env = "HWPROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting hw-proxy...");

    // Load configuration
    let config = DriverConfig::load(cli.config).context("Failed to load configuration")?;
    info!(
        service_port = config.terminal.service_port,
        http = %config.http.bind_address(),
        print_receipt = config.print_receipt(),
        history_size = config.history.size,
        "Configuration loaded"
    );

    let certification = match &config.terminal.certification_logfile {
        Some(path) => Some(
            CertificationLog::open(path)
                .await
                .with_context(|| format!("Failed to open certification log {}", path.display()))?,
        ),
        None => None,
    };

    // Terminal link first, so it can be handed the task queue's listener
    let queue = TaskQueue::new();
    let link = TcpTerminalLink::new(Arc::new(queue.listener()), certification);
    let socket = TcpListener::bind(("0.0.0.0", config.terminal.service_port))
        .await
        .with_context(|| format!("Failed to bind terminal port {}", config.terminal.service_port))?;
    let accept = link.spawn(socket);

    // Driver task loop
    let driver = Driver::new(&config, link, queue);
    let handle = driver.handle();
    let driver_task = tokio::spawn(driver.run());

    // HTTP routes, until a shutdown signal
    server::serve(&config, handle.clone(), shutdown_signal()).await?;

    if let Err(e) = handle.shutdown() {
        warn!(error = %e, "Driver already stopped");
    }
    if let Err(e) = driver_task.await {
        error!(error = %e, "Driver task failed");
    }
    accept.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag() {
        let cli = Cli::try_parse_from(["hw-proxy", "--config", "/etc/ctep.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ctep.toml")));

        let cli = Cli::try_parse_from(["hw-proxy", "--config=/tmp/a.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
    }

    #[test]
    fn test_config_flag_needs_a_value() {
        assert!(Cli::try_parse_from(["hw-proxy", "--config"]).is_err());
        assert!(Cli::try_parse_from(["hw-proxy", "--port", "9000"]).is_err());
    }
}
