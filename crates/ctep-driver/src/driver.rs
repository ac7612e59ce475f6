//! # Driver Task Loop
//!
//! The single owner of the Terminal Registry and the Transaction Ledger.
//! HTTP handlers, link callbacks and timers only enqueue [`DriverTask`]s;
//! the loop runs each one to completion before taking the next.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   axum handlers ──► DriverHandle ──┐                                    │
//! │                                    │                                    │
//! │   link tasks ──► ResultListener ───┼──► unbounded FIFO ──► Driver::run │
//! │                                    │                          │         │
//! │   expiry timers ───────────────────┘                          ▼         │
//! │                                                   ┌────────────────────┐│
//! │                                                   │ TerminalRegistry   ││
//! │                                                   │ TransactionLedger  ││
//! │                                                   │ result watchers    ││
//! │                                                   └─────────┬──────────┘│
//! │                                                             │           │
//! │                          TerminalLink (non-blocking sends) ◄┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Start Flow
//! ```text
//! StartTransaction(request)
//!   ├── ledger.begin ──► TerminalNotReady ──► reply Err
//!   ├── schedule Expire after transaction_timeout_secs
//!   ├── link.terminal_by_id(..).send_sale_transaction(..)
//!   │        └── Err ──► resolve failed now, detail = error text
//!   └── reply Ok(transaction_id)
//! ```
//!
//! A failing task is logged and the loop moves on; only `Shutdown` stops it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ctep_core::{
    ConnectKind, HistoryEntry, PaymentError, PaymentRequest, Resolution, SaleOutcome, TerminalId,
    TerminalRegistry, TerminalStatus, TransactionId, TransactionLedger,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};
use crate::link::{LinkError, SaleResultSink, TerminalLink};
use crate::listener::ResultListener;

// =============================================================================
// Tasks
// =============================================================================

/// Work items consumed by the task loop.
#[derive(Debug)]
pub enum DriverTask {
    /// Begin a sale and dispatch it to the terminal.
    StartTransaction {
        request: PaymentRequest,
        reply: oneshot::Sender<Result<TransactionId, PaymentError>>,
    },
    TerminalConnected {
        terminal_id: TerminalId,
    },
    TerminalDisconnected {
        terminal_id: TerminalId,
    },
    /// Outcome reported by a terminal, live or from a last-status query.
    SaleResult {
        terminal_id: TerminalId,
        transaction_id: TransactionId,
        outcome: SaleOutcome,
    },
    /// The pending-sale timeout fired.
    Expire {
        transaction_id: TransactionId,
    },
    Status {
        terminal_id: TerminalId,
        reply: oneshot::Sender<TerminalStatus>,
    },
    History {
        order_id: String,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    /// Reply once the transaction is resolved. `None` for unknown ids.
    WaitForResult {
        transaction_id: TransactionId,
        reply: oneshot::Sender<Option<HistoryEntry>>,
    },
    Shutdown,
}

/// The task queue, created before the link so the link can be handed a
/// listener.
#[derive(Debug)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<DriverTask>,
    rx: mpsc::UnboundedReceiver<DriverTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        TaskQueue { tx, rx }
    }

    /// The callback sink to inject into the terminal link.
    pub fn listener(&self) -> ResultListener {
        ResultListener::new(self.tx.clone())
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable front door to the task loop.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tasks: mpsc::UnboundedSender<DriverTask>,
}

impl DriverHandle {
    /// Begins a sale. Resolves once the loop accepted or rejected it; the
    /// terminal outcome arrives later.
    pub async fn start_transaction(&self, request: PaymentRequest) -> DriverResult<TransactionId> {
        let result = self
            .request(|reply| DriverTask::StartTransaction { request, reply })
            .await?;
        Ok(result?)
    }

    pub async fn status(&self, terminal_id: TerminalId) -> DriverResult<TerminalStatus> {
        self.request(|reply| DriverTask::Status { terminal_id, reply })
            .await
    }

    pub async fn history(&self, order_id: impl Into<String>) -> DriverResult<Vec<HistoryEntry>> {
        let order_id = order_id.into();
        self.request(|reply| DriverTask::History { order_id, reply })
            .await
    }

    /// Waits until `transaction_id` is resolved.
    ///
    /// Returns immediately when it already is (and still in history), and
    /// with `None` when the id is unknown.
    pub async fn wait_for_result(
        &self,
        transaction_id: TransactionId,
    ) -> DriverResult<Option<HistoryEntry>> {
        self.request(|reply| DriverTask::WaitForResult {
            transaction_id,
            reply,
        })
        .await
    }

    /// Stops the task loop after the tasks already queued.
    pub fn shutdown(&self) -> DriverResult<()> {
        self.send(DriverTask::Shutdown)
    }

    fn send(&self, task: DriverTask) -> DriverResult<()> {
        self.tasks
            .send(task)
            .map_err(|_| DriverError::ChannelError("Driver channel closed".into()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> DriverTask,
    ) -> DriverResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply))?;
        rx.await.map_err(|_| DriverError::ShuttingDown)
    }
}

// =============================================================================
// Driver
// =============================================================================

/// The task loop and the state it owns.
pub struct Driver {
    registry: TerminalRegistry,
    ledger: TransactionLedger,
    link: Arc<dyn TerminalLink>,
    sink: Arc<ResultListener>,
    tx: mpsc::UnboundedSender<DriverTask>,
    rx: mpsc::UnboundedReceiver<DriverTask>,
    watchers: HashMap<TransactionId, Vec<oneshot::Sender<Option<HistoryEntry>>>>,
    timers: HashMap<TransactionId, JoinHandle<()>>,
    print_receipt: bool,
    timeout: Option<Duration>,
}

impl Driver {
    pub fn new(config: &DriverConfig, link: Arc<dyn TerminalLink>, queue: TaskQueue) -> Self {
        Driver {
            registry: TerminalRegistry::new(),
            ledger: TransactionLedger::new(config.history.size),
            link,
            sink: Arc::new(queue.listener()),
            tx: queue.tx,
            rx: queue.rx,
            watchers: HashMap::new(),
            timers: HashMap::new(),
            print_receipt: config.print_receipt(),
            timeout: config.transaction_timeout(),
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            tasks: self.tx.clone(),
        }
    }

    /// Spawns the loop and returns a handle to it.
    pub fn start(self) -> DriverHandle {
        let handle = self.handle();
        tokio::spawn(self.run());
        handle
    }

    /// Main loop. Returns after `Shutdown`.
    pub async fn run(mut self) {
        info!(
            link_version = %self.link.library_version(),
            print_receipt = self.print_receipt,
            timeout_secs = self.timeout.map(|t| t.as_secs()).unwrap_or(0),
            "Driver task loop started"
        );

        while let Some(task) = self.rx.recv().await {
            if let DriverTask::Shutdown = task {
                info!(
                    pending = self.ledger.pending_count(),
                    "Driver task loop shutting down"
                );
                break;
            }
            self.handle_task(task);
        }

        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }

    fn handle_task(&mut self, task: DriverTask) {
        match task {
            DriverTask::StartTransaction { request, reply } => {
                let result = self.start_transaction(request);
                if let Err(ref e) = result {
                    warn!(error = %e, "Transaction rejected");
                }
                let _ = reply.send(result);
            }
            DriverTask::TerminalConnected { terminal_id } => self.on_connect(terminal_id),
            DriverTask::TerminalDisconnected { terminal_id } => {
                if self.registry.on_disconnect(&terminal_id) {
                    let (_, in_transaction) = self.registry.status(&terminal_id);
                    info!(
                        terminal_id = %terminal_id,
                        in_transaction,
                        connected = self.registry.connected_count(),
                        "Terminal disconnected"
                    );
                } else {
                    debug!(terminal_id = %terminal_id, "Disconnect for unknown terminal");
                }
            }
            DriverTask::SaleResult {
                terminal_id,
                transaction_id,
                outcome,
            } => self.on_sale_result(terminal_id, transaction_id, outcome),
            DriverTask::Expire { transaction_id } => {
                self.timers.remove(&transaction_id);
                if let Some(resolution) =
                    self.ledger
                        .expire(&mut self.registry, transaction_id, Utc::now())
                {
                    self.finish(resolution);
                }
            }
            DriverTask::Status { terminal_id, reply } => {
                let _ = reply.send(self.ledger.terminal_status(&self.registry, &terminal_id));
            }
            DriverTask::History { order_id, reply } => {
                let _ = reply.send(self.ledger.history(&order_id));
            }
            DriverTask::WaitForResult {
                transaction_id,
                reply,
            } => self.watch(transaction_id, reply),
            DriverTask::Shutdown => {}
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    fn start_transaction(&mut self, request: PaymentRequest) -> Result<TransactionId, PaymentError> {
        let link = Arc::clone(&self.link);
        let ids = || link.new_transaction_id();
        let id = self
            .ledger
            .begin(&mut self.registry, &ids, &request, Utc::now())?;

        self.schedule_expiry(id);
        self.start_payment(id, &request);
        Ok(id)
    }

    /// Forwards a begun sale to its terminal. Any failure resolves the
    /// transaction as failed right away.
    fn start_payment(&mut self, id: TransactionId, request: &PaymentRequest) {
        let sink: Arc<dyn SaleResultSink> = self.sink.clone();
        let sent = self
            .link
            .terminal_by_id(request.terminal_id())
            .and_then(|terminal| {
                terminal.send_sale_transaction(
                    request.amount(),
                    request.order_reference(),
                    id,
                    sink,
                )
            });

        match sent {
            Ok(()) => debug!(
                transaction_id = %id,
                terminal_id = %request.terminal_id(),
                "Sale sent to terminal"
            ),
            Err(e) => {
                let err = PaymentError::TerminalCommunication(e.to_string());
                error!(
                    transaction_id = %id,
                    terminal_id = %request.terminal_id(),
                    error = %err,
                    "Failed to send sale"
                );
                if let Some(resolution) =
                    self.ledger
                        .fail(&mut self.registry, id, e.to_string(), Utc::now())
                {
                    self.finish(resolution);
                }
            }
        }
    }

    fn on_sale_result(
        &mut self,
        terminal_id: TerminalId,
        transaction_id: TransactionId,
        outcome: SaleOutcome,
    ) {
        if let Some(pending) = self.ledger.pending(transaction_id) {
            if pending.terminal_id != terminal_id {
                warn!(
                    transaction_id = %transaction_id,
                    expected = %pending.terminal_id,
                    reported = %terminal_id,
                    "Result reported by a different terminal"
                );
            }
        }

        if let Some(resolution) =
            self.ledger
                .resolve(&mut self.registry, transaction_id, outcome, Utc::now())
        {
            self.finish(resolution);
        }
    }

    /// Post-resolution bookkeeping: timers, watchers, receipt.
    fn finish(&mut self, resolution: Resolution) {
        let id = resolution.transaction.id;

        if let Some(timer) = self.timers.remove(&id) {
            timer.abort();
        }

        for watcher in self.watchers.remove(&id).unwrap_or_default() {
            let _ = watcher.send(Some(resolution.entry.clone()));
        }

        if let Some(evicted) = resolution.evicted {
            debug!(order_id = %evicted.order_id, transaction_id = %evicted.transaction_id, "History entry evicted");
        }

        if self.print_receipt && resolution.entry.success {
            if let Some(receipt) = resolution.transaction.receipt.as_deref() {
                self.print(&resolution.transaction.terminal_id, receipt);
            }
        }
    }

    fn print(&self, terminal_id: &TerminalId, receipt: &str) {
        let printed = self
            .link
            .terminal_by_id(terminal_id)
            .and_then(|terminal| terminal.send_print_ticket_transaction(receipt));
        if let Err(e) = printed {
            error!(terminal_id = %terminal_id, error = %e, "Failed to print receipt");
        }
    }

    fn schedule_expiry(&mut self, id: TransactionId) {
        let Some(timeout) = self.timeout else {
            return;
        };
        let tasks = self.tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tasks.send(DriverTask::Expire { transaction_id: id });
        });
        self.timers.insert(id, timer);
    }

    fn watch(&mut self, id: TransactionId, reply: oneshot::Sender<Option<HistoryEntry>>) {
        if self.ledger.pending(id).is_some() {
            self.watchers.entry(id).or_default().push(reply);
            return;
        }
        let entry = self
            .ledger
            .history_cache()
            .iter()
            .find(|e| e.transaction_id == id)
            .cloned();
        let _ = reply.send(entry);
    }

    // =========================================================================
    // Connections
    // =========================================================================

    fn on_connect(&mut self, terminal_id: TerminalId) {
        match self.registry.on_connect(&terminal_id) {
            ConnectKind::AlreadyConnected => {
                debug!(terminal_id = %terminal_id, "Terminal already connected");
                return;
            }
            ConnectKind::New => info!(
                terminal_id = %terminal_id,
                connected = self.registry.connected_count(),
                "Terminal connected"
            ),
            ConnectKind::Reconnected => info!(
                terminal_id = %terminal_id,
                connected = self.registry.connected_count(),
                "Terminal reconnected"
            ),
        }

        let sink: Arc<dyn SaleResultSink> = self.sink.clone();
        let queried = self
            .link
            .terminal_by_id(&terminal_id)
            .and_then(|terminal| terminal.last_transaction_status(sink));
        match queried {
            Ok(()) => {}
            Err(LinkError::NotFound(_)) => {
                warn!(terminal_id = %terminal_id, "Connected terminal unknown to link")
            }
            Err(e) => error!(
                terminal_id = %terminal_id,
                error = %e,
                "Failed to query last transaction status"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::{MockLink, MockTerminal, Sent};
    use crate::link::{ConnectionListener, LinkError};
    use ctep_core::{payment_request, ConnectionState, Money, NotReadyReason};

    struct Harness {
        handle: DriverHandle,
        listener: ResultListener,
        link: Arc<MockLink>,
        terminal: Arc<MockTerminal>,
    }

    fn harness(config: DriverConfig) -> Harness {
        let link = MockLink::new();
        let terminal = link.add_terminal("T1");
        let queue = TaskQueue::new();
        let listener = queue.listener();
        let handle = Driver::new(&config, link.clone(), queue).start();
        Harness {
            handle,
            listener,
            link,
            terminal,
        }
    }

    fn t1() -> TerminalId {
        TerminalId::from("T1")
    }

    fn connected(config: DriverConfig) -> Harness {
        let h = harness(config);
        h.listener.on_terminal_connect(&t1());
        h
    }

    async fn start(h: &Harness, cents: i64, order: &str) -> DriverResult<TransactionId> {
        let request = payment_request("T1", Money::from_cents(cents), order).unwrap();
        h.handle.start_transaction(request).await
    }

    #[tokio::test]
    async fn approved_sale_reaches_history() {
        let h = connected(DriverConfig::default());
        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        assert!(h.link.sent().contains(&Sent::Sale {
            terminal: t1(),
            amount: Money::from_cents(1000),
            reference: "ORDER-1".into(),
            id,
        }));
        assert!(h.handle.status(t1()).await.unwrap().in_transaction);

        h.listener
            .on_sale_result_success(&t1(), id, Money::from_cents(1000), None);

        let history = h.handle.history("ORDER-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount_authorized, Some(Money::from_cents(1000)));
        assert_eq!(history[0].terminal, t1());

        let status = h.handle.status(t1()).await.unwrap();
        assert_eq!(status.status, ConnectionState::Connected);
        assert!(!status.in_transaction);
        assert_eq!(status.transactions_count, 1);
        assert_eq!(status.latest_transactions.len(), 1);
    }

    #[tokio::test]
    async fn second_start_on_busy_terminal_is_rejected() {
        let h = connected(DriverConfig::default());
        start(&h, 1000, "ORDER-1").await.unwrap();

        let err = start(&h, 500, "ORDER-2").await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Payment(PaymentError::TerminalNotReady {
                reason: NotReadyReason::Busy,
                ..
            })
        ));
        assert_eq!(h.link.issued(), 1);
    }

    #[tokio::test]
    async fn start_on_unconnected_terminal_is_rejected() {
        let h = harness(DriverConfig::default());
        let err = start(&h, 1000, "ORDER-1").await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Payment(PaymentError::TerminalNotReady { .. })
        ));
        assert_eq!(h.link.issued(), 0);
    }

    #[tokio::test]
    async fn send_failure_resolves_immediately() {
        let h = connected(DriverConfig::default());
        h.terminal.fail_with(LinkError::Disconnected(t1()));

        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        let history = h.handle.history("ORDER-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].transaction_id, id);
        assert!(!history[0].success);
        assert_eq!(history[0].status, "Terminal T1 disconnected");
        assert!(!h.handle.status(t1()).await.unwrap().in_transaction);
    }

    #[tokio::test]
    async fn incident_1803_fails_with_timeout() {
        let h = connected(DriverConfig::default());
        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        h.listener.on_sale_result_error(&t1(), id, "1803", "card timeout");

        let history = h.handle.history("ORDER-1").await.unwrap();
        assert!(!history[0].success);
        assert_eq!(history[0].status, "Timeout");
        assert_eq!(history[0].amount_authorized, None);
    }

    #[tokio::test]
    async fn duplicate_and_unknown_callbacks_are_ignored() {
        let h = connected(DriverConfig::default());
        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        h.listener
            .on_sale_result_success(&t1(), id, Money::from_cents(1000), None);
        h.listener
            .on_sale_result_success(&t1(), id, Money::from_cents(1000), None);
        h.listener.on_sale_result_success(
            &t1(),
            TransactionId::new(999),
            Money::from_cents(5),
            None,
        );

        assert_eq!(h.handle.history("ORDER-1").await.unwrap().len(), 1);
        assert_eq!(
            h.handle.status(t1()).await.unwrap().latest_transactions.len(),
            1
        );
    }

    #[tokio::test]
    async fn reconnect_queries_last_transaction_status() {
        let h = connected(DriverConfig::default());
        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        h.listener.on_terminal_disconnect(&t1());
        let status = h.handle.status(t1()).await.unwrap();
        assert_eq!(status.status, ConnectionState::Disconnected);
        assert!(status.in_transaction);

        h.listener.on_terminal_connect(&t1());
        let status = h.handle.status(t1()).await.unwrap();
        assert_eq!(status.status, ConnectionState::Connected);
        assert!(!status.in_transaction);

        let queries = h
            .link
            .sent()
            .iter()
            .filter(|s| matches!(s, Sent::LastStatus { .. }))
            .count();
        assert_eq!(queries, 2);

        // the terminal answers the query through the normal result path
        h.listener
            .on_sale_result_success(&t1(), id, Money::from_cents(1000), None);
        let history = h.handle.history("ORDER-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].success);
    }

    #[tokio::test]
    async fn stale_result_after_reconnect_keeps_terminal_busy() {
        let h = connected(DriverConfig::default());
        let stale = start(&h, 1000, "ORDER-1").await.unwrap();

        h.listener.on_terminal_disconnect(&t1());
        h.listener.on_terminal_connect(&t1());
        let current = start(&h, 2000, "ORDER-2").await.unwrap();

        // last-status answer for the sale sent before the reconnect
        h.listener
            .on_sale_result_success(&t1(), stale, Money::from_cents(1000), None);
        assert!(h.handle.status(t1()).await.unwrap().in_transaction);

        let err = start(&h, 500, "ORDER-3").await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Payment(PaymentError::TerminalNotReady {
                reason: NotReadyReason::Busy,
                ..
            })
        ));
        let sales = h
            .link
            .sent()
            .iter()
            .filter(|s| matches!(s, Sent::Sale { .. }))
            .count();
        assert_eq!(sales, 2);

        h.listener
            .on_sale_result_success(&t1(), current, Money::from_cents(2000), None);
        assert!(!h.handle.status(t1()).await.unwrap().in_transaction);
        assert_eq!(h.handle.history("ORDER-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn receipt_printed_only_when_enabled() {
        let mut config = DriverConfig::default();
        config.receipt.print_receipt = true;
        let h = connected(config);

        let id = start(&h, 1000, "ORDER-1").await.unwrap();
        h.listener.on_sale_result_success(
            &t1(),
            id,
            Money::from_cents(1000),
            Some("TICKET".into()),
        );
        h.handle.history("ORDER-1").await.unwrap();
        assert!(h.link.sent().contains(&Sent::Print {
            terminal: t1(),
            receipt: "TICKET".into(),
        }));

        let h = connected(DriverConfig::default());
        let id = start(&h, 1000, "ORDER-1").await.unwrap();
        h.listener.on_sale_result_success(
            &t1(),
            id,
            Money::from_cents(1000),
            Some("TICKET".into()),
        );
        h.handle.history("ORDER-1").await.unwrap();
        assert!(!h
            .link
            .sent()
            .iter()
            .any(|s| matches!(s, Sent::Print { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_sale_expires_after_timeout() {
        let mut config = DriverConfig::default();
        config.terminal.transaction_timeout_secs = 5;
        let h = connected(config);
        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;

        let history = h.handle.history("ORDER-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].transaction_id, id);
        assert_eq!(history[0].status, "Timeout");
        assert!(!h.handle.status(t1()).await.unwrap().in_transaction);

        // a late result is ignored
        h.listener
            .on_sale_result_success(&t1(), id, Money::from_cents(1000), None);
        assert_eq!(h.handle.history("ORDER-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wait_for_result_wakes_on_resolve() {
        let h = connected(DriverConfig::default());
        let id = start(&h, 1000, "ORDER-1").await.unwrap();

        let waiter = {
            let handle = h.handle.clone();
            tokio::spawn(async move { handle.wait_for_result(id).await })
        };

        h.listener
            .on_sale_result_success(&t1(), id, Money::from_cents(1000), None);

        let entry = waiter.await.unwrap().unwrap().unwrap();
        assert_eq!(entry.transaction_id, id);
        assert!(entry.success);

        assert!(h
            .handle
            .wait_for_result(TransactionId::new(999))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let h = connected(DriverConfig::default());
        h.handle.shutdown().unwrap();

        let err = h.handle.status(t1()).await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::ShuttingDown | DriverError::ChannelError(_)
        ));
    }
}
