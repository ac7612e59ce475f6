//! # ctep-driver: Payment Terminal Driver Runtime
//!
//! Runs the ctep-core state machine against connected payment terminals and
//! exposes it to the POS over HTTP.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   POS (browser)                                                        │
//! │       │  POST /hw_proxy/payment_terminal_transaction_start             │
//! │       ▼                                                                 │
//! │   ┌──────────┐  DriverTask  ┌──────────────┐  send_sale   ┌──────────┐ │
//! │   │  server  │─────────────►│    driver    │─────────────►│   link   │ │
//! │   │  (axum)  │◄─────────────│  (task loop) │              │  (tcp)   │ │
//! │   └──────────┘   oneshot    └──────▲───────┘              └────┬─────┘ │
//! │                                    │ DriverTask                │       │
//! │                             ┌──────┴───────┐   callbacks       │       │
//! │                             │   listener   │◄──────────────────┘       │
//! │                             └──────────────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Driver configuration (ports, receipt printing, timeouts)
//! - [`error`] - Driver error types
//! - [`link`] - Terminal capability interface
//! - [`listener`] - Result listener feeding the task loop
//! - [`driver`] - The task loop and its handle
//! - [`server`] - HTTP routes
//! - [`tcp`] - Reference TCP terminal link
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ctep_driver::{Driver, DriverConfig, TaskQueue, TcpTerminalLink};
//!
//! let config = DriverConfig::load(None)?;
//! let queue = TaskQueue::new();
//! let link = TcpTerminalLink::new(Arc::new(queue.listener()), None);
//! link.spawn(socket);
//!
//! let handle = Driver::new(&config, link, queue).start();
//! ctep_driver::server::serve(&config, handle, shutdown_signal()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod driver;
pub mod error;
pub mod link;
pub mod listener;
pub mod server;
pub mod tcp;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::DriverConfig;
pub use driver::{Driver, DriverHandle, DriverTask, TaskQueue};
pub use error::{DriverError, DriverResult};
pub use link::{ConnectionListener, LinkError, SaleResultSink, TerminalHandle, TerminalLink};
pub use listener::ResultListener;
pub use server::{ApiError, ServerState};
pub use tcp::{CertificationLog, TcpTerminalLink};
