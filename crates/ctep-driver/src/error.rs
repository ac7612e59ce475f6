//! # Driver Error Types
//!
//! Error types for the driver runtime.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DriverError                                     │
//! │                                                                         │
//! │  Configuration ── InvalidConfig, ConfigLoadFailed                      │
//! │  Payment ──────── Payment(PaymentError)   (rejections from ctep-core)  │
//! │  Protocol ─────── SerializationFailed                                  │
//! │  Internal ─────── Io, ChannelError, ShuttingDown                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payment rejections travel back to the HTTP layer inside `DriverError`;
//! link failures during a sale never do, they resolve the transaction as
//! failed instead.

use ctep_core::PaymentError;
use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid driver configuration.
    #[error("Invalid driver configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Payment Errors
    // =========================================================================
    /// The transaction state machine rejected a request.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Failed to (de)serialize a frame or payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// The driver task loop has stopped.
    #[error("Driver is shutting down")]
    ShuttingDown,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::SerializationFailed(err.to_string())
    }
}

impl From<toml::de::Error> for DriverError {
    fn from(err: toml::de::Error) -> Self {
        DriverError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl DriverError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DriverError::InvalidConfig(_) | DriverError::ConfigLoadFailed(_)
        )
    }

    /// Returns true if the caller sent a bad request (as opposed to the
    /// terminal or driver being unavailable).
    pub fn is_client_error(&self) -> bool {
        match self {
            DriverError::Payment(err) => err.is_client_error(),
            DriverError::SerializationFailed(_) => true,
            _ => false,
        }
    }
}
