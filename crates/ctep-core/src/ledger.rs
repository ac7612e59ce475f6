//! # Transaction Ledger
//!
//! Pending sales keyed by transaction identifier, and the bounded history of
//! completed ones.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  begin(request) ──► registry ready? ──no──► TerminalNotReady           │
//! │                          │                  (no id allocated)           │
//! │                         yes                                             │
//! │                          ▼                                              │
//! │                 allocator.next_transaction_id()                         │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              pending[id] = Transaction{Pending}                         │
//! │              registry.mark_busy(terminal)                               │
//! │                                                                         │
//! │  resolve(id, outcome) ──► pending.remove(id)? ──none──► log + no-op    │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                     status = Success | Failed                           │
//! │                     registry.mark_idle(terminal), unless another sale  │
//! │                       of that terminal is still pending                 │
//! │                     history.push(entry)  (FIFO, bounded)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Removing the entry from `pending` is what makes `resolve` exactly-once: a
//! duplicate or late callback finds nothing and is dropped.
//!
//! A reconnect clears the busy flag while the sale dispatched before it may
//! still be pending, so a terminal can own two pending sales. Resolving the
//! older one must leave the flag set for the newer one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{CoreResult, PaymentError};
use crate::history::HistoryCache;
use crate::incident;
use crate::registry::TerminalRegistry;
use crate::types::{
    HistoryEntry, PaymentRequest, SaleOutcome, TerminalId, TerminalStatus, Transaction,
    TransactionId, TransactionStatus,
};

/// Status text recorded for authorized sales.
pub const SUCCESS_STATUS: &str = "Success";

// =============================================================================
// Identifier Allocation
// =============================================================================

/// Source of transaction identifiers.
///
/// Implemented by the terminal link, whose identifiers must be unique in its
/// own address space too. Any `Fn() -> TransactionId` is an allocator.
pub trait IdAllocator {
    fn next_transaction_id(&self) -> TransactionId;
}

impl<F> IdAllocator for F
where
    F: Fn() -> TransactionId,
{
    fn next_transaction_id(&self) -> TransactionId {
        self()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// What a successful `resolve` did.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The transaction in its final state.
    pub transaction: Transaction,
    /// The history entry that was appended.
    pub entry: HistoryEntry,
    /// The entry pushed out of the bounded history, if any.
    pub evicted: Option<HistoryEntry>,
}

// =============================================================================
// Ledger
// =============================================================================

/// Pending transactions and completed-outcome history.
#[derive(Debug, Default)]
pub struct TransactionLedger {
    pending: HashMap<TransactionId, Transaction>,
    history: HistoryCache,
}

/// Public API
impl TransactionLedger {
    pub fn new(history_size: usize) -> Self {
        TransactionLedger {
            pending: HashMap::new(),
            history: HistoryCache::new(history_size),
        }
    }

    /// Registers a new pending transaction for `request`.
    ///
    /// The terminal readiness check happens before the allocator is called,
    /// so a rejected request consumes no identifier.
    pub fn begin(
        &mut self,
        registry: &mut TerminalRegistry,
        allocator: &dyn IdAllocator,
        request: &PaymentRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<TransactionId> {
        let terminal_id = request.terminal_id();

        registry
            .readiness(terminal_id)
            .map_err(|reason| PaymentError::TerminalNotReady {
                terminal_id: terminal_id.clone(),
                reason,
            })?;

        let id = allocator.next_transaction_id();
        if self.pending.contains_key(&id) {
            return Err(PaymentError::DuplicateTransactionId(id));
        }

        self.pending.insert(
            id,
            Transaction {
                id,
                terminal_id: terminal_id.clone(),
                order_reference: request.order_reference().to_string(),
                amount: request.amount(),
                status: TransactionStatus::Pending,
                detail: None,
                incident_code: None,
                description: None,
                receipt: None,
                started_at: now,
            },
        );
        registry.mark_busy(terminal_id);

        info!(
            transaction_id = %id,
            terminal_id = %terminal_id,
            order_id = request.order_reference(),
            amount = %request.amount(),
            "transaction pending"
        );
        Ok(id)
    }

    /// Applies a terminal outcome to a pending transaction.
    ///
    /// Returns `None` (after logging) when `id` is not pending: never issued,
    /// already resolved, or expired.
    pub fn resolve(
        &mut self,
        registry: &mut TerminalRegistry,
        id: TransactionId,
        outcome: SaleOutcome,
        now: DateTime<Utc>,
    ) -> Option<Resolution> {
        let Some(mut transaction) = self.pending.remove(&id) else {
            warn!(
                transaction_id = %id,
                reason = %PaymentError::UnknownTransaction(id),
                "callback dropped"
            );
            return None;
        };

        let amount_authorized = match outcome {
            SaleOutcome::Approved {
                authorized_amount,
                client_ticket,
            } => {
                transaction.status = TransactionStatus::Success;
                transaction.detail = Some(SUCCESS_STATUS.to_string());
                transaction.receipt = client_ticket;
                Some(authorized_amount)
            }
            SaleOutcome::Declined {
                incident_code,
                status,
                description,
            } => {
                transaction.status = TransactionStatus::Failed;
                transaction.detail = Some(status);
                transaction.incident_code = incident_code;
                transaction.description = description;
                None
            }
        };

        let still_pending = self.pending_for_terminal(&transaction.terminal_id);
        match still_pending.last() {
            None => registry.mark_idle(&transaction.terminal_id),
            Some(current) => debug!(
                transaction_id = %id,
                terminal_id = %transaction.terminal_id,
                current = %current.id,
                "terminal stays busy with a newer sale"
            ),
        }

        let entry = HistoryEntry {
            order_id: transaction.order_reference.clone(),
            transaction_id: id,
            terminal: transaction.terminal_id.clone(),
            success: transaction.status == TransactionStatus::Success,
            amount_authorized,
            status: transaction.detail.clone().unwrap_or_default(),
            description: transaction.description.clone(),
            completed_at: now,
        };
        let evicted = self.history.push(entry.clone());

        info!(
            transaction_id = %id,
            terminal_id = %transaction.terminal_id,
            order_id = %transaction.order_reference,
            status = %transaction.status,
            detail = entry.status.as_str(),
            "transaction resolved"
        );

        Some(Resolution {
            transaction,
            entry,
            evicted,
        })
    }

    /// Resolves a pending transaction as failed with `detail` as status.
    ///
    /// Used when the sale never reached the terminal.
    pub fn fail(
        &mut self,
        registry: &mut TerminalRegistry,
        id: TransactionId,
        detail: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Option<Resolution> {
        let outcome = SaleOutcome::Declined {
            incident_code: None,
            status: detail.into(),
            description: None,
        };
        self.resolve(registry, id, outcome, now)
    }

    /// Resolves a still-pending transaction as failed with `"Timeout"`.
    pub fn expire(
        &mut self,
        registry: &mut TerminalRegistry,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Option<Resolution> {
        if !self.pending.contains_key(&id) {
            return None;
        }
        warn!(transaction_id = %id, "transaction timed out waiting for terminal");
        self.fail(registry, id, incident::TIMEOUT, now)
    }

    /// Completed outcomes for an order, oldest first.
    pub fn history(&self, order_reference: &str) -> Vec<HistoryEntry> {
        self.history.for_order(order_reference)
    }

    /// Completed outcomes produced by a terminal, oldest first.
    pub fn latest_for_terminal(&self, terminal_id: &TerminalId) -> Vec<HistoryEntry> {
        self.history.for_terminal(terminal_id)
    }

    pub fn pending(&self, id: TransactionId) -> Option<&Transaction> {
        self.pending.get(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pending transactions owned by a terminal, oldest first.
    pub fn pending_for_terminal(&self, terminal_id: &TerminalId) -> Vec<&Transaction> {
        let mut pending: Vec<_> = self
            .pending
            .values()
            .filter(|t| &t.terminal_id == terminal_id)
            .collect();
        pending.sort_by_key(|t| t.started_at);
        pending
    }

    /// Builds the status view served to the POS.
    pub fn terminal_status(
        &self,
        registry: &TerminalRegistry,
        terminal_id: &TerminalId,
    ) -> TerminalStatus {
        let (status, in_transaction) = registry.status(terminal_id);
        TerminalStatus {
            status,
            in_transaction,
            transactions_count: registry
                .get(terminal_id)
                .map(|t| t.transactions_count)
                .unwrap_or(0),
            latest_transactions: self.latest_for_terminal(terminal_id),
        }
    }

    pub fn history_cache(&self) -> &HistoryCache {
        &self.history
    }
}
