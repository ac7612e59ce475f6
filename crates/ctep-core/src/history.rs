//! Bounded FIFO cache of completed transaction outcomes.
//!
//! The cache is global: once `capacity` entries are stored, each new entry
//! evicts the oldest one, whichever order it belongs to.

use std::collections::VecDeque;

use crate::types::{HistoryEntry, TerminalId};

/// Default number of outcomes kept.
pub const DEFAULT_HISTORY_SIZE: usize = 20;

#[derive(Debug, Clone)]
pub struct HistoryCache {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistoryCache {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, returning the evicted one if the bound was hit.
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Outcomes for one order, oldest first.
    pub fn for_order(&self, order_id: &str) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Outcomes produced by one terminal, oldest first.
    pub fn for_terminal(&self, terminal: &TerminalId) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| &e.terminal == terminal)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        HistoryCache::new(DEFAULT_HISTORY_SIZE)
    }
}
