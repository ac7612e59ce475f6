//! # Reference TCP Terminal Link
//!
//! A small [`TerminalLink`] that terminals (or simulators) reach over TCP on
//! `service_port`. Each frame is one JSON object per line.
//!
//! ## Connection Lifecycle
//! ```text
//! terminal                         TcpTerminalLink                      driver
//!    │ ── connect ───────────────────► accept                              │
//!    │ ── {"type":"hello",..} ───────► register T1, spawn writer            │
//!    │                                  listener.on_terminal_connect ─────►│
//!    │ ◄── {"type":"sale",..} ───────── writer queue ◄── send_sale ────────│
//!    │ ── {"type":"sale_result",..} ─► sink.on_sale_result_* ────────────► │
//!    │ ── EOF ───────────────────────► deregister                          │
//!                                       listener.on_terminal_disconnect ──►│
//! ```
//!
//! ## Frames
//! ```json
//! {"type":"hello","terminal_id":"T1"}
//! {"type":"sale","transaction_id":42,"amount":1000,"merchant_reference":"ORDER-1","currency_iso":"EUR"}
//! {"type":"sale_result","transaction_id":42,"success":true,"authorized_amount":1000,"client_ticket":"..."}
//! {"type":"sale_result","transaction_id":42,"success":false,"incident_code":"1803","description":"..."}
//! {"type":"print_ticket","receipt":"..."}
//! {"type":"last_transaction_status"}
//! ```
//!
//! With a certification logfile configured, every frame in both directions
//! is appended to it. A line longer than [`MAX_FRAME_LEN`] closes the
//! connection.
//!
//! A hello for an id that already has a live connection replaces it. The
//! listener sees a disconnect followed by a connect, so the driver treats it
//! as a reconnect.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use ctep_core::{Money, TerminalId, TransactionId, CURRENCY_ISO};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::DriverResult;
use crate::link::{ConnectionListener, LinkError, SaleResultSink, TerminalHandle, TerminalLink};

// =============================================================================
// Frames
// =============================================================================

/// Longest line accepted from a terminal, terminator included.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// One line on the terminal connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// First frame a terminal sends.
    Hello { terminal_id: TerminalId },
    Sale {
        transaction_id: TransactionId,
        amount: Money,
        merchant_reference: String,
        currency_iso: String,
    },
    SaleResult {
        transaction_id: TransactionId,
        success: bool,
        #[serde(default)]
        authorized_amount: Option<Money>,
        #[serde(default)]
        client_ticket: Option<String>,
        #[serde(default)]
        incident_code: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    PrintTicket { receipt: String },
    LastTransactionStatus,
}

// =============================================================================
// Certification Log
// =============================================================================

/// Append-only record of every frame exchanged with terminals.
#[derive(Debug)]
pub struct CertificationLog {
    path: PathBuf,
    file: tokio::sync::Mutex<tokio::fs::File>,
}

impl CertificationLog {
    pub async fn open(path: impl Into<PathBuf>) -> DriverResult<Self> {
        let path = path.into();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(?path, "Certification logging enabled");
        Ok(CertificationLog {
            path,
            file: tokio::sync::Mutex::new(file),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn record(&self, terminal_id: &TerminalId, direction: &str, frame: &str) {
        let line = format!(
            "{} {} {} {}\n",
            Utc::now().to_rfc3339(),
            terminal_id,
            direction,
            frame.trim_end()
        );
        let mut file = self.file.lock().await;
        let written = match file.write_all(line.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(path = ?self.path, error = %e, "Failed to write certification log");
        }
    }
}

// =============================================================================
// Terminal
// =============================================================================

/// A connected terminal. Sends go to its writer task.
pub struct TcpTerminal {
    id: TerminalId,
    frames: mpsc::UnboundedSender<Frame>,
    sink: Mutex<Option<Arc<dyn SaleResultSink>>>,
}

impl TcpTerminal {
    fn queue(&self, frame: Frame) -> Result<(), LinkError> {
        self.frames
            .send(frame)
            .map_err(|_| LinkError::Disconnected(self.id.clone()))
    }

    fn set_sink(&self, sink: Arc<dyn SaleResultSink>) {
        *lock(&self.sink) = Some(sink);
    }

    fn sink(&self) -> Option<Arc<dyn SaleResultSink>> {
        lock(&self.sink).clone()
    }
}

impl TerminalHandle for TcpTerminal {
    fn id(&self) -> &TerminalId {
        &self.id
    }

    fn send_sale_transaction(
        &self,
        amount: Money,
        merchant_reference: &str,
        transaction_id: TransactionId,
        sink: Arc<dyn SaleResultSink>,
    ) -> Result<(), LinkError> {
        if merchant_reference.contains('\n') {
            return Err(LinkError::Malformed(
                "merchant reference contains a line break".into(),
            ));
        }
        self.set_sink(sink);
        self.queue(Frame::Sale {
            transaction_id,
            amount,
            merchant_reference: merchant_reference.to_string(),
            currency_iso: CURRENCY_ISO.to_string(),
        })
    }

    fn send_print_ticket_transaction(&self, receipt: &str) -> Result<(), LinkError> {
        self.queue(Frame::PrintTicket {
            receipt: receipt.to_string(),
        })
    }

    fn last_transaction_status(&self, sink: Arc<dyn SaleResultSink>) -> Result<(), LinkError> {
        self.set_sink(sink);
        self.queue(Frame::LastTransactionStatus)
    }
}

// =============================================================================
// Link
// =============================================================================

pub struct TcpTerminalLink {
    next_id: AtomicU64,
    terminals: Mutex<HashMap<TerminalId, Arc<TcpTerminal>>>,
    listener: Arc<dyn ConnectionListener>,
    certification: Option<Arc<CertificationLog>>,
}

impl TcpTerminalLink {
    pub fn new(
        listener: Arc<dyn ConnectionListener>,
        certification: Option<CertificationLog>,
    ) -> Arc<Self> {
        Arc::new(TcpTerminalLink {
            next_id: AtomicU64::new(0),
            terminals: Mutex::new(HashMap::new()),
            listener,
            certification: certification.map(Arc::new),
        })
    }

    /// Spawns the accept loop on an already bound socket.
    pub fn spawn(self: &Arc<Self>, socket: TcpListener) -> JoinHandle<()> {
        let link = Arc::clone(self);
        tokio::spawn(async move { link.accept_loop(socket).await })
    }

    /// Identifiers of the terminals currently connected.
    pub fn connected(&self) -> Vec<TerminalId> {
        let mut ids: Vec<_> = lock(&self.terminals).keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn accept_loop(self: Arc<Self>, socket: TcpListener) {
        match socket.local_addr() {
            Ok(addr) => info!(addr = %addr, "Terminal link listening"),
            Err(e) => warn!(error = %e, "Terminal link listening on unknown address"),
        }

        loop {
            match socket.accept().await {
                Ok((stream, peer)) => {
                    let link = Arc::clone(&self);
                    tokio::spawn(async move { link.handle_connection(stream, peer).await });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept terminal connection");
                }
            }
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        debug!(peer = %peer, "Terminal connection accepted");
        let (read, write) = stream.into_split();
        let mut reader = BufReader::new(read);

        let terminal_id = match read_frame(&mut reader).await {
            Ok(Some(line)) => match serde_json::from_str::<Frame>(&line) {
                Ok(Frame::Hello { terminal_id }) => {
                    if let Some(log) = &self.certification {
                        log.record(&terminal_id, "<<", &line).await;
                    }
                    terminal_id
                }
                Ok(other) => {
                    warn!(peer = %peer, frame = ?other, "Expected hello frame, closing");
                    return;
                }
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Malformed hello frame, closing");
                    return;
                }
            },
            Ok(None) => return,
            Err(e) => {
                warn!(peer = %peer, error = %e, "Terminal connection failed before hello");
                return;
            }
        };

        let (frames, queue) = mpsc::unbounded_channel();
        let terminal = Arc::new(TcpTerminal {
            id: terminal_id.clone(),
            frames,
            sink: Mutex::new(None),
        });
        let displaced = lock(&self.terminals).insert(terminal_id.clone(), Arc::clone(&terminal));
        if displaced.is_some() {
            warn!(terminal_id = %terminal_id, "Terminal reconnected over a live connection");
            self.listener.on_terminal_disconnect(&terminal_id);
        }

        let writer = tokio::spawn(write_frames(
            terminal_id.clone(),
            write,
            queue,
            self.certification.clone(),
        ));
        info!(terminal_id = %terminal_id, peer = %peer, "Terminal registered");
        self.listener.on_terminal_connect(&terminal_id);

        loop {
            match read_frame(&mut reader).await {
                Ok(Some(line)) => self.handle_frame(&terminal, &line).await,
                Ok(None) => break,
                Err(e) => {
                    warn!(terminal_id = %terminal_id, error = %e, "Terminal read failed");
                    break;
                }
            }
        }

        writer.abort();

        // a newer connection for the same id keeps its registration
        let owned = {
            let mut terminals = lock(&self.terminals);
            if terminals
                .get(&terminal_id)
                .is_some_and(|t| Arc::ptr_eq(t, &terminal))
            {
                terminals.remove(&terminal_id);
                true
            } else {
                false
            }
        };
        if owned {
            info!(terminal_id = %terminal_id, "Terminal connection closed");
            self.listener.on_terminal_disconnect(&terminal_id);
        }
    }

    async fn handle_frame(&self, terminal: &TcpTerminal, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if let Some(log) = &self.certification {
            log.record(&terminal.id, "<<", line).await;
        }

        let frame = match serde_json::from_str::<Frame>(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(terminal_id = %terminal.id, error = %e, "Malformed frame ignored");
                return;
            }
        };

        match frame {
            Frame::SaleResult {
                transaction_id,
                success,
                authorized_amount,
                client_ticket,
                incident_code,
                description,
            } => {
                let Some(sink) = terminal.sink() else {
                    warn!(
                        terminal_id = %terminal.id,
                        transaction_id = %transaction_id,
                        "Sale result with no sale in progress"
                    );
                    return;
                };
                match (success, authorized_amount) {
                    (true, Some(amount)) => sink.on_sale_result_success(
                        &terminal.id,
                        transaction_id,
                        amount,
                        client_ticket,
                    ),
                    (true, None) => warn!(
                        terminal_id = %terminal.id,
                        transaction_id = %transaction_id,
                        "Approved sale without authorized amount ignored"
                    ),
                    (false, _) => sink.on_sale_result_error(
                        &terminal.id,
                        transaction_id,
                        incident_code.as_deref().unwrap_or_default(),
                        description.as_deref().unwrap_or_default(),
                    ),
                }
            }
            Frame::Hello { .. } => debug!(terminal_id = %terminal.id, "Repeated hello ignored"),
            other => warn!(terminal_id = %terminal.id, frame = ?other, "Unexpected frame from terminal"),
        }
    }
}

impl TerminalLink for TcpTerminalLink {
    fn new_transaction_id(&self) -> TransactionId {
        TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn terminal_by_id(&self, terminal_id: &TerminalId) -> Result<Arc<dyn TerminalHandle>, LinkError> {
        lock(&self.terminals)
            .get(terminal_id)
            .map(|t| Arc::clone(t) as Arc<dyn TerminalHandle>)
            .ok_or_else(|| LinkError::NotFound(terminal_id.clone()))
    }

    fn library_version(&self) -> String {
        format!("ctep-tcp/{}", env!("CARGO_PKG_VERSION"))
    }
}

async fn write_frames(
    terminal_id: TerminalId,
    mut write: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Frame>,
    certification: Option<Arc<CertificationLog>>,
) {
    while let Some(frame) = queue.recv().await {
        let mut line = match serde_json::to_string(&frame) {
            Ok(line) => line,
            Err(e) => {
                error!(terminal_id = %terminal_id, error = %e, "Failed to encode frame");
                continue;
            }
        };
        if let Some(log) = &certification {
            log.record(&terminal_id, ">>", &line).await;
        }
        debug!(terminal_id = %terminal_id, frame = %line, "Frame sent");
        line.push('\n');
        if let Err(e) = write.write_all(line.as_bytes()).await {
            warn!(terminal_id = %terminal_id, error = %e, "Terminal write failed");
            break;
        }
    }
}

/// Reads one newline-terminated frame, at most [`MAX_FRAME_LEN`] bytes.
///
/// `Ok(None)` at end of stream. An oversized or non UTF-8 line is an
/// `InvalidData` error.
async fn read_frame<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_FRAME_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame exceeds {MAX_FRAME_LEN} bytes"),
        ));
    }
    let line = String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverTask;
    use crate::listener::ResultListener;
    use ctep_core::SaleOutcome;
    use serde_json::json;
    use crate::config::DriverConfig;
    use crate::driver::{Driver, TaskQueue};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::OwnedReadHalf;
    use tokio::time::{timeout, Duration};

    async fn start_link(
        certification: Option<CertificationLog>,
    ) -> (
        Arc<TcpTerminalLink>,
        ResultListener,
        mpsc::UnboundedReceiver<DriverTask>,
        SocketAddr,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = ResultListener::new(tx);
        let link = TcpTerminalLink::new(Arc::new(listener.clone()), certification);
        let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        link.spawn(socket);
        (link, listener, rx, addr)
    }

    async fn next_task(rx: &mut mpsc::UnboundedReceiver<DriverTask>) -> DriverTask {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for task")
            .expect("channel closed")
    }

    async fn connect_as(
        addr: SocketAddr,
        terminal_id: &str,
    ) -> (Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf) {
        let (read, mut write) = TcpStream::connect(addr).await.unwrap().into_split();
        let hello = json!({"type": "hello", "terminal_id": terminal_id}).to_string() + "\n";
        write.write_all(hello.as_bytes()).await.unwrap();
        (BufReader::new(read).lines(), write)
    }

    async fn next_frame(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> Frame {
        let line = timeout(Duration::from_secs(5), lines.next_line())
            .await
            .expect("timed out waiting for frame")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_frame_wire_format() {
        let frame = Frame::Sale {
            transaction_id: TransactionId::new(42),
            amount: Money::from_cents(1000),
            merchant_reference: "ORDER-1".into(),
            currency_iso: "EUR".into(),
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "sale",
                "transaction_id": 42,
                "amount": 1000,
                "merchant_reference": "ORDER-1",
                "currency_iso": "EUR"
            })
        );

        let parsed: Frame = serde_json::from_str(
            r#"{"type":"sale_result","transaction_id":42,"success":false,"incident_code":"2629"}"#,
        )
        .unwrap();
        assert!(matches!(
            parsed,
            Frame::SaleResult { success: false, authorized_amount: None, .. }
        ));

        let parsed: Frame = serde_json::from_str(r#"{"type":"last_transaction_status"}"#).unwrap();
        assert_eq!(parsed, Frame::LastTransactionStatus);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let link = TcpTerminalLink::new(Arc::new(ResultListener::new(tx)), None);
        let a = link.new_transaction_id();
        let b = link.new_transaction_id();
        assert!(b > a);
        assert!(matches!(
            link.terminal_by_id(&TerminalId::from("T1")),
            Err(LinkError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_terminal_session_round_trip() {
        let (link, listener, mut rx, addr) = start_link(None).await;

        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        write
            .write_all(b"{\"type\":\"hello\",\"terminal_id\":\"T1\"}\n")
            .await
            .unwrap();

        assert!(matches!(
            next_task(&mut rx).await,
            DriverTask::TerminalConnected { terminal_id } if terminal_id == TerminalId::from("T1")
        ));
        assert_eq!(link.connected(), vec![TerminalId::from("T1")]);

        let terminal = link.terminal_by_id(&TerminalId::from("T1")).unwrap();
        terminal
            .send_sale_transaction(
                Money::from_cents(1000),
                "ORDER-1",
                TransactionId::new(1),
                Arc::new(listener),
            )
            .unwrap();

        let line = lines.next_line().await.unwrap().unwrap();
        let frame: Frame = serde_json::from_str(&line).unwrap();
        assert!(matches!(frame, Frame::Sale { ref merchant_reference, .. } if merchant_reference == "ORDER-1"));

        write
            .write_all(b"{\"type\":\"sale_result\",\"transaction_id\":1,\"success\":true,\"authorized_amount\":1000}\n")
            .await
            .unwrap();
        match next_task(&mut rx).await {
            DriverTask::SaleResult {
                transaction_id,
                outcome: SaleOutcome::Approved { authorized_amount, .. },
                ..
            } => {
                assert_eq!(transaction_id, TransactionId::new(1));
                assert_eq!(authorized_amount, Money::from_cents(1000));
            }
            other => panic!("unexpected task {other:?}"),
        }

        drop(write);
        drop(lines);
        assert!(matches!(
            next_task(&mut rx).await,
            DriverTask::TerminalDisconnected { .. }
        ));
        assert!(link.connected().is_empty());
    }

    #[tokio::test]
    async fn test_connection_without_hello_is_dropped() {
        let (link, _listener, mut rx, addr) = start_link(None).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"{\"type\":\"print_ticket\",\"receipt\":\"x\"}\n").await.unwrap();

        let mut buf = String::new();
        let mut reader = BufReader::new(stream);
        let read = timeout(Duration::from_secs(5), reader.read_line(&mut buf))
            .await
            .unwrap();
        // closed, either cleanly or by reset
        assert!(matches!(read, Ok(0) | Err(_)));
        assert!(link.connected().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_certification_log_records_frames() {
        let path = std::env::temp_dir().join(format!(
            "ctep-cert-{}-{}.log",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let log = CertificationLog::open(&path).await.unwrap();
        let (_link, _listener, mut rx, addr) = start_link(Some(log)).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"{\"type\":\"hello\",\"terminal_id\":\"T9\"}\n")
            .await
            .unwrap();
        next_task(&mut rx).await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("T9 <<"));
        assert!(contents.contains("\"hello\""));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_read_frame_strips_terminator_and_bounds_length() {
        let mut input: &[u8] = b"{\"type\":\"last_transaction_status\"}\r\ntail";
        assert_eq!(
            read_frame(&mut input).await.unwrap().as_deref(),
            Some("{\"type\":\"last_transaction_status\"}")
        );
        assert_eq!(read_frame(&mut input).await.unwrap().as_deref(), Some("tail"));
        assert_eq!(read_frame(&mut input).await.unwrap(), None);

        let long = vec![b'a'; MAX_FRAME_LEN + 1];
        let mut input: &[u8] = &long;
        let err = read_frame(&mut input).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_oversized_frame_closes_connection() {
        let (link, _listener, mut rx, addr) = start_link(None).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"{\"type\":\"hello\",\"terminal_id\":\"T1\"}\n")
            .await
            .unwrap();
        assert!(matches!(
            next_task(&mut rx).await,
            DriverTask::TerminalConnected { .. }
        ));

        let _ = stream.write_all(&vec![b'x'; MAX_FRAME_LEN + 1]).await;
        assert!(matches!(
            next_task(&mut rx).await,
            DriverTask::TerminalDisconnected { .. }
        ));
        assert!(link.connected().is_empty());
    }

    #[tokio::test]
    async fn test_second_hello_for_same_id_reconciles_last_status() {
        let queue = TaskQueue::new();
        let link = TcpTerminalLink::new(Arc::new(queue.listener()), None);
        let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        link.spawn(socket);
        let driver = Driver::new(&DriverConfig::default(), link.clone(), queue).start();
        let t1 = TerminalId::from("T1");

        let (mut first, _first_write) = connect_as(addr, "T1").await;
        assert_eq!(next_frame(&mut first).await, Frame::LastTransactionStatus);

        let request = ctep_core::payment_request("T1", Money::from_cents(1000), "ORDER-1").unwrap();
        driver.start_transaction(request).await.unwrap();
        assert!(matches!(next_frame(&mut first).await, Frame::Sale { .. }));
        assert!(driver.status(t1.clone()).await.unwrap().in_transaction);

        // the old socket stays open, as with a half-open connection
        let (mut second, _second_write) = connect_as(addr, "T1").await;
        assert_eq!(next_frame(&mut second).await, Frame::LastTransactionStatus);

        let status = driver.status(t1.clone()).await.unwrap();
        assert!(!status.in_transaction);
        assert_eq!(link.connected(), vec![t1]);
    }
}
