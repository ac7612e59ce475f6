//! # Domain Types
//!
//! Core domain types used throughout the driver.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Terminal      │   │  Transaction    │   │  HistoryEntry   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  order_id       │       │
//! │  │  state          │   │  terminal_id    │   │  transaction_id │       │
//! │  │  in_transaction │   │  order_reference│   │  success        │       │
//! │  │  tx count       │   │  amount, status │   │  amount_auth.   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ConnectionState │   │TransactionStatus│   │  SaleOutcome    │       │
//! │  │  Connected      │   │  Pending        │   │  Approved       │       │
//! │  │  Disconnected   │   │  Success/Failed │   │  Declined       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreResult, PaymentError};
use crate::money::Money;
use crate::validation::{validate_amount, validate_order_reference, validate_terminal_id};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque terminal identifier assigned by the terminal link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalId(String);

impl TerminalId {
    pub fn new(id: impl Into<String>) -> Self {
        TerminalId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TerminalId {
    fn from(id: &str) -> Self {
        TerminalId(id.to_string())
    }
}

impl From<String> for TerminalId {
    fn from(id: String) -> Self {
        TerminalId(id)
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sale system action identifier correlating a sale request with its result.
///
/// Allocated by the terminal link, because it must be unique in the link's
/// address space as well as in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        TransactionId(id)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Terminal
// =============================================================================

/// Connection state of a terminal as reported by the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// A terminal known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub id: TerminalId,
    pub state: ConnectionState,
    /// A sale has been dispatched and not yet resolved.
    pub in_transaction: bool,
    /// Number of transactions begun on this terminal since startup.
    pub transactions_count: u64,
}

impl Terminal {
    /// Creates a connected, idle terminal.
    pub fn connected(id: TerminalId) -> Self {
        Terminal {
            id,
            state: ConnectionState::Connected,
            in_transaction: false,
            transactions_count: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

// =============================================================================
// Payment Request
// =============================================================================

/// A validated request to start a sale on a terminal.
///
/// Construction validates every field, so a `PaymentRequest` that exists is
/// always safe to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    terminal_id: TerminalId,
    amount: Money,
    order_reference: String,
}

impl PaymentRequest {
    /// Validates and builds a request.
    ///
    /// ## Errors
    /// - `InvalidAmount` when `amount <= 0`
    /// - `Validation` for an empty terminal id or order reference
    pub fn new(
        terminal_id: TerminalId,
        amount: Money,
        order_reference: impl Into<String>,
    ) -> CoreResult<Self> {
        validate_amount(amount)?;
        validate_terminal_id(terminal_id.as_str())?;
        let order_reference = order_reference.into();
        validate_order_reference(&order_reference)?;

        Ok(PaymentRequest {
            terminal_id,
            amount,
            order_reference,
        })
    }

    pub fn terminal_id(&self) -> &TerminalId {
        &self.terminal_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn order_reference(&self) -> &str {
        &self.order_reference
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Transaction lifecycle.
///
/// ```text
///            resolve(Approved)
///   Pending ─────────────────► Success
///      │
///      │     resolve(Declined) / send failure / timeout
///      └─────────────────────► Failed
/// ```
/// `Success` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Success => write!(f, "success"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A sale dispatched (or about to be dispatched) to a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub terminal_id: TerminalId,
    pub order_reference: String,
    pub amount: Money,
    pub status: TransactionStatus,
    /// Status text or incident description once resolved.
    pub detail: Option<String>,
    /// Incident code reported by the terminal on failure.
    pub incident_code: Option<String>,
    /// Free-text description the terminal attached to a failure.
    pub description: Option<String>,
    /// Client ticket returned by the terminal on success.
    pub receipt: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// The result a terminal reports for a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleOutcome {
    /// The sale was authorized.
    Approved {
        authorized_amount: Money,
        client_ticket: Option<String>,
    },
    /// The sale failed; `status` is already the human-readable text and
    /// `description` is whatever the terminal said about it.
    Declined {
        incident_code: Option<String>,
        status: String,
        description: Option<String>,
    },
}

// =============================================================================
// History
// =============================================================================

/// A completed transaction outcome kept in the bounded history cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub order_id: String,
    pub transaction_id: TransactionId,
    pub terminal: TerminalId,
    pub success: bool,
    /// Present only for authorized sales.
    pub amount_authorized: Option<Money>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Status view of one terminal, as served to the POS.
///
/// ```json
/// {
///   "status": "connected",
///   "in_transaction": false,
///   "transactions_count": 3,
///   "latest_transactions": [{ "order_id": "ORDER-1", "amount_authorized": 1000, ... }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalStatus {
    pub status: ConnectionState,
    pub in_transaction: bool,
    pub transactions_count: u64,
    pub latest_transactions: Vec<HistoryEntry>,
}

/// Convenience for callers that start from raw request fields.
pub fn payment_request(
    terminal_id: &str,
    amount: Money,
    order_reference: &str,
) -> Result<PaymentRequest, PaymentError> {
    PaymentRequest::new(TerminalId::from(terminal_id), amount, order_reference)
}
