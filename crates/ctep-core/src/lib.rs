//! # ctep-core: Transaction State Machine for Payment Terminals
//!
//! This crate holds the bookkeeping behind the payment terminal driver:
//! which terminals are connected, which sales are in flight, and what the
//! recent outcomes were. It performs no I/O; the driver crate owns the
//! clock, the channels and the terminal link.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        hw-proxy Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    POS (browser)                                │   │
//! │  │    POST /hw_proxy/payment_terminal_transaction_start            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON-RPC over HTTP                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ctep-driver (server + task loop)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ctep-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ registry  │  │  ledger   │  │  history  │  │ validation│  │   │
//! │  │   │ Terminals │  │  Pending  │  │ FIFO (20) │  │  amounts  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CHANNELS • CLOCK PASSED IN                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Terminal, Transaction, HistoryEntry, ...)
//! - [`money`] - Integer cents, parsed from decimal text
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation
//! - [`registry`] - Terminal Registry
//! - [`ledger`] - Transaction Ledger
//! - [`history`] - Bounded outcome history
//! - [`incident`] - Incident code table
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use ctep_core::{
//!     payment_request, Money, SaleOutcome, TerminalId, TerminalRegistry, TransactionId,
//!     TransactionLedger,
//! };
//!
//! let mut registry = TerminalRegistry::new();
//! let mut ledger = TransactionLedger::new(20);
//! registry.on_connect(&TerminalId::from("T1"));
//!
//! let request = payment_request("T1", Money::from_cents(1000), "ORDER-1").unwrap();
//! let ids = || TransactionId::new(1);
//! let id = ledger.begin(&mut registry, &ids, &request, Utc::now()).unwrap();
//!
//! let outcome = SaleOutcome::Approved {
//!     authorized_amount: Money::from_cents(1000),
//!     client_ticket: None,
//! };
//! ledger.resolve(&mut registry, id, outcome, Utc::now());
//!
//! assert_eq!(ledger.history("ORDER-1").len(), 1);
//! assert!(registry.is_ready(&TerminalId::from("T1")));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod history;
pub mod incident;
pub mod ledger;
pub mod money;
pub mod registry;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreResult, NotReadyReason, PaymentError, ValidationError};
pub use history::{HistoryCache, DEFAULT_HISTORY_SIZE};
pub use ledger::{IdAllocator, Resolution, TransactionLedger};
pub use money::Money;
pub use registry::{ConnectKind, TerminalRegistry};
pub use types::*;

/// Currency reported to terminals. The driver only handles euro sales.
pub const CURRENCY_ISO: &str = "EUR";
