//! # Result Listener
//!
//! The single sink a terminal link reports to. Every callback becomes a
//! [`DriverTask`] on the task loop's queue; nothing here touches driver
//! state.
//!
//! ```text
//! link task ── on_sale_result_error(T1, 42, "1803", ..) ──► ResultListener
//!                                                               │
//!                                      status_for_incident("1803") = "Timeout"
//!                                                               │
//!                       DriverTask::SaleResult { T1, 42, Declined{..} } ──► queue
//! ```
//!
//! The queue is unbounded and the send is synchronous, so a callback never
//! waits on the task loop.

use ctep_core::incident::status_for_incident;
use ctep_core::{Money, SaleOutcome, TerminalId, TransactionId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::driver::DriverTask;
use crate::link::{ConnectionListener, SaleResultSink};

/// Cloneable callback sink feeding the driver task loop.
#[derive(Debug, Clone)]
pub struct ResultListener {
    tasks: mpsc::UnboundedSender<DriverTask>,
}

impl ResultListener {
    pub fn new(tasks: mpsc::UnboundedSender<DriverTask>) -> Self {
        ResultListener { tasks }
    }

    fn enqueue(&self, task: DriverTask) {
        if self.tasks.send(task).is_err() {
            warn!("Driver task loop stopped, dropping terminal callback");
        }
    }
}

impl SaleResultSink for ResultListener {
    fn on_sale_result_success(
        &self,
        terminal_id: &TerminalId,
        transaction_id: TransactionId,
        authorized_amount: Money,
        client_ticket: Option<String>,
    ) {
        debug!(
            terminal_id = %terminal_id,
            transaction_id = %transaction_id,
            amount = %authorized_amount,
            "Sale approved by terminal"
        );
        self.enqueue(DriverTask::SaleResult {
            terminal_id: terminal_id.clone(),
            transaction_id,
            outcome: SaleOutcome::Approved {
                authorized_amount,
                client_ticket,
            },
        });
    }

    fn on_sale_result_error(
        &self,
        terminal_id: &TerminalId,
        transaction_id: TransactionId,
        incident_code: &str,
        description: &str,
    ) {
        let status = status_for_incident(incident_code);
        debug!(
            terminal_id = %terminal_id,
            transaction_id = %transaction_id,
            incident_code,
            description,
            status,
            "Sale failed on terminal"
        );
        self.enqueue(DriverTask::SaleResult {
            terminal_id: terminal_id.clone(),
            transaction_id,
            outcome: SaleOutcome::Declined {
                incident_code: Some(incident_code.to_string()),
                status: status.to_string(),
                description: Some(description.trim())
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            },
        });
    }
}

impl ConnectionListener for ResultListener {
    fn on_terminal_connect(&self, terminal_id: &TerminalId) {
        self.enqueue(DriverTask::TerminalConnected {
            terminal_id: terminal_id.clone(),
        });
    }

    fn on_terminal_disconnect(&self, terminal_id: &TerminalId) {
        self.enqueue(DriverTask::TerminalDisconnected {
            terminal_id: terminal_id.clone(),
        });
    }
}
