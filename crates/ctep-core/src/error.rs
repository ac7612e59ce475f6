//! # Error Types
//!
//! Domain-specific error types for ctep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ctep-core errors (this file)                                          │
//! │  ├── PaymentError     - Transaction state machine rejections           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ctep-driver errors (separate crate)                                   │
//! │  ├── LinkError        - Terminal link capability failures              │
//! │  └── DriverError      - Config, channel and I/O failures               │
//! │                                                                         │
//! │  HTTP layer                                                            │
//! │  └── ApiError         - What the POS sees (JSON-RPC error object)      │
//! │                                                                         │
//! │  Flow: ValidationError → PaymentError → ApiError → POS                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors ever stop the driver task loop. They are either
//! returned to the caller that enqueued the work, or logged and dropped.

use std::fmt;

use thiserror::Error;

use crate::types::{TerminalId, TransactionId};

// =============================================================================
// Payment Error
// =============================================================================

/// Rejections produced by the transaction state machine.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount is missing, malformed, zero or negative.
    ///
    /// ## When This Occurs
    /// Checked before any terminal I/O and before a transaction identifier
    /// is allocated.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// The terminal cannot accept a sale right now.
    ///
    /// ## When This Occurs
    /// ```text
    /// begin(T1)
    ///      │
    ///      ▼
    /// registry.is_ready(T1)? ── unknown ──────┐
    ///      │                  disconnected ───┼──► TerminalNotReady
    ///      │                  in_transaction ─┘    (no id allocated)
    ///      ▼
    /// allocate transaction id
    /// ```
    #[error("Terminal {terminal_id} is not ready: {reason}")]
    TerminalNotReady {
        terminal_id: TerminalId,
        reason: NotReadyReason,
    },

    /// Sending to the terminal link failed.
    ///
    /// The transaction is resolved as failed immediately with this message
    /// as its status detail; it is never left pending.
    #[error("Terminal communication error: {0}")]
    TerminalCommunication(String),

    /// A callback referenced an identifier that is not pending.
    #[error("Unknown transaction callback: {0}")]
    UnknownTransaction(TransactionId),

    /// The link allocator handed out an identifier that is still pending.
    #[error("Duplicate transaction id {0}")]
    DuplicateTransactionId(TransactionId),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl PaymentError {
    /// Returns true if the request itself was malformed, as opposed to the
    /// terminal being unavailable.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidAmount { .. } | PaymentError::Validation(_)
        )
    }
}

/// Why a terminal is not ready for a new sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// The terminal link never reported this terminal.
    Unknown,
    /// The terminal was seen but is currently disconnected.
    Disconnected,
    /// A transaction is already in flight on this terminal.
    Busy,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::Unknown => write!(f, "unknown terminal"),
            NotReadyReason::Disconnected => write!(f, "terminal disconnected"),
            NotReadyReason::Busy => write!(f, "transaction already in progress"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of the POS payload before the state machine
/// runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., not a decimal number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PaymentError.
pub type CoreResult<T> = Result<T, PaymentError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PaymentError::TerminalNotReady {
            terminal_id: TerminalId::from("T1"),
            reason: NotReadyReason::Busy,
        };
        assert_eq!(
            err.to_string(),
            "Terminal T1 is not ready: transaction already in progress"
        );

        let err = PaymentError::UnknownTransaction(TransactionId::new(42));
        assert_eq!(err.to_string(), "Unknown transaction callback: 42");
    }

    #[test]
    fn test_validation_converts_to_payment_error() {
        let validation_err = ValidationError::Required {
            field: "order_id".to_string(),
        };
        assert_eq!(validation_err.field(), "order_id");

        let err: PaymentError = validation_err.into();
        assert!(matches!(err, PaymentError::Validation(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_not_ready_is_not_client_error() {
        let err = PaymentError::TerminalNotReady {
            terminal_id: TerminalId::from("0"),
            reason: NotReadyReason::Disconnected,
        };
        assert!(!err.is_client_error());
    }
}
