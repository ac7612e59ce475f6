//! # Terminal Registry
//!
//! Tracks the terminals reported by the terminal link, their connection
//! state and whether a sale is in flight on each.
//!
//! ## Terminal Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (unknown) ── on_connect ──► Connected/idle ◄──── mark_idle ───┐       │
//! │                                   │   ▲                         │       │
//! │                          on_disconnect │ on_connect             │       │
//! │                                   ▼   │ (clears in_transaction) │       │
//! │                              Disconnected                       │       │
//! │                                                                 │       │
//! │   Connected/idle ── mark_busy ──► Connected/in_transaction ─────┘       │
//! │                                                                         │
//! │  A disconnect never touches the ledger: a sale dispatched before the   │
//! │  disconnect stays pending until a callback or the timeout resolves it. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Owned by the driver task loop; nothing else holds a mutable reference.

use std::collections::HashMap;

use crate::error::NotReadyReason;
use crate::types::{ConnectionState, Terminal, TerminalId};

/// What `on_connect` found before marking the terminal connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectKind {
    /// First time this terminal is seen.
    New,
    /// The terminal was known and disconnected.
    Reconnected,
    /// The link reported a connect for an already connected terminal.
    AlreadyConnected,
}

/// Registry of terminals keyed by identifier.
#[derive(Debug, Default)]
pub struct TerminalRegistry {
    terminals: HashMap<TerminalId, Terminal>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a terminal connected.
    ///
    /// A terminal coming back from a disconnect has its `in_transaction`
    /// flag cleared; its last sale is reconciled by the caller through a
    /// last-transaction-status query.
    pub fn on_connect(&mut self, terminal_id: &TerminalId) -> ConnectKind {
        match self.terminals.get_mut(terminal_id) {
            Some(terminal) if terminal.is_connected() => ConnectKind::AlreadyConnected,
            Some(terminal) => {
                terminal.state = ConnectionState::Connected;
                terminal.in_transaction = false;
                ConnectKind::Reconnected
            }
            None => {
                self.terminals
                    .insert(terminal_id.clone(), Terminal::connected(terminal_id.clone()));
                ConnectKind::New
            }
        }
    }

    /// Marks a terminal disconnected. Returns false for unknown terminals.
    pub fn on_disconnect(&mut self, terminal_id: &TerminalId) -> bool {
        match self.terminals.get_mut(terminal_id) {
            Some(terminal) => {
                terminal.state = ConnectionState::Disconnected;
                true
            }
            None => false,
        }
    }

    /// Connection state and `in_transaction` flag.
    ///
    /// Unknown terminals report `(Disconnected, false)`.
    pub fn status(&self, terminal_id: &TerminalId) -> (ConnectionState, bool) {
        self.terminals
            .get(terminal_id)
            .map(|t| (t.state, t.in_transaction))
            .unwrap_or((ConnectionState::Disconnected, false))
    }

    /// True iff the terminal is known, connected and idle.
    pub fn is_ready(&self, terminal_id: &TerminalId) -> bool {
        self.readiness(terminal_id).is_ok()
    }

    /// Like [`is_ready`](Self::is_ready), but says why not.
    pub fn readiness(&self, terminal_id: &TerminalId) -> Result<(), NotReadyReason> {
        match self.terminals.get(terminal_id) {
            None => Err(NotReadyReason::Unknown),
            Some(t) if !t.is_connected() => Err(NotReadyReason::Disconnected),
            Some(t) if t.in_transaction => Err(NotReadyReason::Busy),
            Some(_) => Ok(()),
        }
    }

    /// Flags a sale in flight and counts it.
    pub fn mark_busy(&mut self, terminal_id: &TerminalId) {
        if let Some(terminal) = self.terminals.get_mut(terminal_id) {
            terminal.in_transaction = true;
            terminal.transactions_count += 1;
        }
    }

    /// Clears the in-flight flag.
    pub fn mark_idle(&mut self, terminal_id: &TerminalId) {
        if let Some(terminal) = self.terminals.get_mut(terminal_id) {
            terminal.in_transaction = false;
        }
    }

    pub fn get(&self, terminal_id: &TerminalId) -> Option<&Terminal> {
        self.terminals.get(terminal_id)
    }

    /// All known terminals, sorted by identifier.
    pub fn terminals(&self) -> Vec<&Terminal> {
        let mut terminals: Vec<_> = self.terminals.values().collect();
        terminals.sort_by(|a, b| a.id.cmp(&b.id));
        terminals
    }

    pub fn connected_count(&self) -> usize {
        self.terminals.values().filter(|t| t.is_connected()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t1() -> TerminalId {
        TerminalId::from("T1")
    }

    #[test]
    fn unknown_terminal_defaults_to_disconnected() {
        let registry = TerminalRegistry::new();
        assert_eq!(registry.status(&t1()), (ConnectionState::Disconnected, false));
        assert!(!registry.is_ready(&t1()));
        assert_eq!(registry.readiness(&t1()), Err(NotReadyReason::Unknown));
    }

    #[test]
    fn connect_makes_terminal_ready() {
        let mut registry = TerminalRegistry::new();
        assert_eq!(registry.on_connect(&t1()), ConnectKind::New);
        assert!(registry.is_ready(&t1()));
        assert_eq!(registry.on_connect(&t1()), ConnectKind::AlreadyConnected);
        assert_eq!(registry.connected_count(), 1);
    }

    #[test]
    fn busy_terminal_is_not_ready() {
        let mut registry = TerminalRegistry::new();
        registry.on_connect(&t1());
        registry.mark_busy(&t1());

        assert_eq!(registry.readiness(&t1()), Err(NotReadyReason::Busy));
        assert_eq!(registry.status(&t1()), (ConnectionState::Connected, true));
        assert_eq!(registry.get(&t1()).unwrap().transactions_count, 1);

        registry.mark_idle(&t1());
        assert!(registry.is_ready(&t1()));
    }

    #[test]
    fn disconnect_keeps_in_transaction_until_reconnect() {
        let mut registry = TerminalRegistry::new();
        registry.on_connect(&t1());
        registry.mark_busy(&t1());

        assert!(registry.on_disconnect(&t1()));
        assert_eq!(registry.status(&t1()), (ConnectionState::Disconnected, true));
        assert_eq!(registry.readiness(&t1()), Err(NotReadyReason::Disconnected));

        assert_eq!(registry.on_connect(&t1()), ConnectKind::Reconnected);
        assert_eq!(registry.status(&t1()), (ConnectionState::Connected, false));
    }

    #[test]
    fn disconnect_of_unknown_terminal_is_ignored() {
        let mut registry = TerminalRegistry::new();
        assert!(!registry.on_disconnect(&t1()));
        assert!(registry.terminals().is_empty());
    }

    #[test]
    fn terminals_are_listed_in_id_order() {
        let mut registry = TerminalRegistry::new();
        registry.on_connect(&TerminalId::from("b"));
        registry.on_connect(&TerminalId::from("a"));
        let ids: Vec<_> = registry.terminals().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
