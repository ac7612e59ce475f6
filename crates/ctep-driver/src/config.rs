//! # Driver Configuration
//!
//! Configuration management for the payment terminal driver.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HWPROXY_SERVICE_PORT=9000                                          │
//! │     HWPROXY_PRINT_RECEIPT=true                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hw-proxy/ctep.toml (Linux)                               │
//! │     ~/Library/Application Support/com.hw-proxy.ctep/ctep.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # ctep.toml
//! [terminal]
//! service_port = 9000
//! certification_logfile = "/var/log/ctep-cert.log"
//! default_terminal_id = "0"
//! transaction_timeout_secs = 180
//!
//! [http]
//! bind_addr = "0.0.0.0"
//! port = 8069
//!
//! [receipt]
//! print_receipt = false
//!
//! [history]
//! size = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DriverError, DriverResult};

// =============================================================================
// Terminal Settings
// =============================================================================

/// Settings for the terminal link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// TCP port terminals connect to.
    #[serde(default = "default_service_port")]
    pub service_port: u16,

    /// When set, every frame exchanged with a terminal is appended here.
    /// Used during terminal certification.
    #[serde(default)]
    pub certification_logfile: Option<PathBuf>,

    /// Terminal used when the POS does not name one.
    #[serde(default = "default_terminal_id")]
    pub default_terminal_id: String,

    /// How long a sale may stay pending before it is failed with "Timeout".
    /// Set to 0 to wait forever.
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_secs: u64,
}

fn default_service_port() -> u16 {
    9000
}

fn default_terminal_id() -> String {
    "0".to_string()
}

fn default_transaction_timeout() -> u64 {
    180
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            service_port: default_service_port(),
            certification_logfile: None,
            default_terminal_id: default_terminal_id(),
            transaction_timeout_secs: default_transaction_timeout(),
        }
    }
}

// =============================================================================
// HTTP Settings
// =============================================================================

/// Settings for the POS-facing HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8069
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_http_port(),
        }
    }
}

impl HttpSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Receipt / History Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptSettings {
    /// Print the client ticket on the terminal after an approved sale.
    #[serde(default)]
    pub print_receipt: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Number of completed outcomes kept in memory, across all orders.
    #[serde(default = "default_history_size")]
    pub size: usize,
}

fn default_history_size() -> usize {
    ctep_core::DEFAULT_HISTORY_SIZE
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings {
            size: default_history_size(),
        }
    }
}

// =============================================================================
// Main Driver Configuration
// =============================================================================

/// Complete driver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub receipt: ReceiptSettings,

    #[serde(default)]
    pub history: HistorySettings,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (ctep.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DriverResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading driver config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| DriverError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DriverResult<()> {
        if self.terminal.service_port == 0 {
            return Err(DriverError::InvalidConfig(
                "terminal.service_port must be non-zero".into(),
            ));
        }

        if self.http.port == 0 {
            return Err(DriverError::InvalidConfig("http.port must be non-zero".into()));
        }

        if self.terminal.service_port == self.http.port {
            return Err(DriverError::InvalidConfig(format!(
                "terminal.service_port and http.port are both {}",
                self.http.port
            )));
        }

        if self.history.size == 0 {
            return Err(DriverError::InvalidConfig(
                "history.size must be greater than 0".into(),
            ));
        }

        if self.terminal.default_terminal_id.trim().is_empty() {
            return Err(DriverError::InvalidConfig(
                "terminal.default_terminal_id must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    ///
    /// Unlike file values, a malformed override is an error: a typo in a
    /// deployment variable must not silently fall back to the file value.
    fn apply_env_overrides(&mut self) -> DriverResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, var: F) -> DriverResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = var("HWPROXY_SERVICE_PORT") {
            let p = parse_env("HWPROXY_SERVICE_PORT", &port)?;
            debug!(port = p, "Overriding service port from environment");
            self.terminal.service_port = p;
        }

        if let Some(port) = var("HWPROXY_HTTP_PORT") {
            let p = parse_env("HWPROXY_HTTP_PORT", &port)?;
            debug!(port = p, "Overriding HTTP port from environment");
            self.http.port = p;
        }

        if let Some(flag) = var("HWPROXY_PRINT_RECEIPT") {
            self.receipt.print_receipt = parse_bool("HWPROXY_PRINT_RECEIPT", &flag)?;
        }

        if let Some(path) = var("HWPROXY_CERTIFICATION_LOGFILE") {
            debug!(path = %path, "Overriding certification logfile from environment");
            self.terminal.certification_logfile = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        if let Some(secs) = var("HWPROXY_TRANSACTION_TIMEOUT_SECS") {
            self.terminal.transaction_timeout_secs =
                parse_env("HWPROXY_TRANSACTION_TIMEOUT_SECS", &secs)?;
        }

        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "hw-proxy", "ctep")
            .map(|dirs| dirs.config_dir().join("ctep.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pending-sale timeout, `None` when disabled.
    pub fn transaction_timeout(&self) -> Option<Duration> {
        match self.terminal.transaction_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn default_terminal_id(&self) -> &str {
        &self.terminal.default_terminal_id
    }

    pub fn print_receipt(&self) -> bool {
        self.receipt.print_receipt
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> DriverResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DriverError::InvalidConfig(format!("{key}: cannot parse '{value}'")))
}

/// Strict boolean parsing for environment flags.
fn parse_bool(key: &str, value: &str) -> DriverResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(DriverError::InvalidConfig(format!(
            "{key}: expected true/false/yes/no/1/0, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.terminal.service_port, 9000);
        assert_eq!(config.terminal.default_terminal_id, "0");
        assert_eq!(config.http.port, 8069);
        assert_eq!(config.history.size, 20);
        assert!(!config.print_receipt());
        assert_eq!(config.transaction_timeout(), Some(Duration::from_secs(180)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DriverConfig = toml::from_str(
            r#"
            [terminal]
            service_port = 9100
            transaction_timeout_secs = 0

            [receipt]
            print_receipt = true
            "#,
        )
        .unwrap();

        assert_eq!(config.terminal.service_port, 9100);
        assert_eq!(config.transaction_timeout(), None);
        assert!(config.print_receipt());
        assert_eq!(config.http.bind_address(), "0.0.0.0:8069");
        assert_eq!(config.history.size, 20);
    }

    #[test]
    fn test_config_validation() {
        let mut config = DriverConfig::default();
        config.history.size = 0;
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.http.port = config.terminal.service_port;
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.terminal.service_port = 0;
        assert!(config.validate().is_err());

        let mut config = DriverConfig::default();
        config.terminal.default_terminal_id = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DriverConfig::default();
        config
            .apply_overrides(env(&[
                ("HWPROXY_SERVICE_PORT", "9500"),
                ("HWPROXY_HTTP_PORT", "8080"),
                ("HWPROXY_PRINT_RECEIPT", "yes"),
                ("HWPROXY_CERTIFICATION_LOGFILE", "/tmp/cert.log"),
                ("HWPROXY_TRANSACTION_TIMEOUT_SECS", "30"),
            ]))
            .unwrap();

        assert_eq!(config.terminal.service_port, 9500);
        assert_eq!(config.http.port, 8080);
        assert!(config.print_receipt());
        assert_eq!(
            config.terminal.certification_logfile,
            Some(PathBuf::from("/tmp/cert.log"))
        );
        assert_eq!(config.transaction_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_env_overrides_are_strict() {
        let mut config = DriverConfig::default();
        assert!(config
            .apply_overrides(env(&[("HWPROXY_PRINT_RECEIPT", "maybe")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("HWPROXY_HTTP_PORT", "eighty")]))
            .is_err());
        assert!(!config.print_receipt());
    }

    #[test]
    fn test_bool_parsing() {
        for yes in ["true", "TRUE", "yes", "1"] {
            assert!(parse_bool("K", yes).unwrap());
        }
        for no in ["false", "No", "0"] {
            assert!(!parse_bool("K", no).unwrap());
        }
    }

    #[test]
    fn test_toml_serialization() {
        let config = DriverConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[terminal]"));
        assert!(toml_str.contains("[http]"));
    }
}
