//! # Terminal Capability Interface
//!
//! The narrow contract between the driver and whatever speaks the wire
//! protocol to terminals.
//!
//! ## Roles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Driver Task Loop                          Terminal link               │
//! │   ────────────────                          ─────────────               │
//! │   new_transaction_id() ───────────────────► id allocator                │
//! │   terminal_by_id(T1) ─────────────────────► Arc<dyn TerminalHandle>     │
//! │   handle.send_sale_transaction(.., sink) ─► writer queue (non-blocking) │
//! │                                                    │                    │
//! │   ResultListener ◄── SaleResultSink ◄──────────────┘ (link's own task) │
//! │   ResultListener ◄── ConnectionListener ◄── connect / disconnect        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method here is synchronous and must not block: implementations
//! hand work to their own tasks and report back through the sinks.

use std::sync::Arc;

use ctep_core::{Money, TerminalId, TransactionId};
use thiserror::Error;

/// Failures reported by a terminal link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// No terminal with this identifier is connected to the link.
    #[error("Terminal {0} not found")]
    NotFound(TerminalId),

    /// The terminal's connection is gone.
    #[error("Terminal {0} disconnected")]
    Disconnected(TerminalId),

    /// The terminal refused the request because it is busy.
    #[error("Terminal {0} is busy")]
    Busy(TerminalId),

    /// The request could not be encoded for the terminal.
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// Any other transport failure.
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Receives the eventual outcome of a sale.
///
/// Called from the link's tasks. Implementations must return quickly.
pub trait SaleResultSink: Send + Sync {
    fn on_sale_result_success(
        &self,
        terminal_id: &TerminalId,
        transaction_id: TransactionId,
        authorized_amount: Money,
        client_ticket: Option<String>,
    );

    fn on_sale_result_error(
        &self,
        terminal_id: &TerminalId,
        transaction_id: TransactionId,
        incident_code: &str,
        description: &str,
    );
}

/// Receives terminal connection changes.
pub trait ConnectionListener: Send + Sync {
    fn on_terminal_connect(&self, terminal_id: &TerminalId);
    fn on_terminal_disconnect(&self, terminal_id: &TerminalId);
}

/// One connected terminal.
pub trait TerminalHandle: Send + Sync {
    fn id(&self) -> &TerminalId;

    /// Queues a sale. The outcome arrives later on `sink`.
    fn send_sale_transaction(
        &self,
        amount: Money,
        merchant_reference: &str,
        transaction_id: TransactionId,
        sink: Arc<dyn SaleResultSink>,
    ) -> Result<(), LinkError>;

    /// Queues a receipt for printing. The payload is opaque.
    fn send_print_ticket_transaction(&self, receipt: &str) -> Result<(), LinkError>;

    /// Asks the terminal for the outcome of its last sale, delivered on
    /// `sink` like a live result.
    fn last_transaction_status(&self, sink: Arc<dyn SaleResultSink>) -> Result<(), LinkError>;
}

/// The terminal link as seen by the driver.
pub trait TerminalLink: Send + Sync {
    /// Allocates an identifier unique among the link's outstanding sales.
    fn new_transaction_id(&self) -> TransactionId;

    fn terminal_by_id(&self, terminal_id: &TerminalId) -> Result<Arc<dyn TerminalHandle>, LinkError>;

    /// Version string of the link implementation, logged at startup.
    fn library_version(&self) -> String;
}
