use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::db_types::{UserId, WaitingEntry};

/// The ordered set of users currently seeking a partner.
///
/// Entries are kept in FIFO order by enqueue time. A user occupies at most one slot: re-enqueuing
/// replaces the previous entry rather than duplicating it.
#[derive(Debug, Default)]
pub struct WaitingPool {
    entries: VecDeque<WaitingEntry>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.iter().any(|e| e.user_id == user_id)
    }

    /// Adds the entry at the back of the queue. If the user already has an entry, it is replaced
    /// and the user loses their old queue position.
    pub fn enqueue(&mut self, entry: WaitingEntry) {
        if self.remove(entry.user_id).is_some() {
            debug!("🔍️ {} re-entered the waiting pool; replacing their previous request", entry.user_id);
        }
        self.entries.push_back(entry);
    }

    /// Puts an entry back into the pool at the position its enqueue time dictates. Used when a
    /// removed entry must be returned after a failed pairing, so the user does not lose their
    /// place in line.
    pub fn restore(&mut self, entry: WaitingEntry) {
        if self.contains(entry.user_id) {
            return;
        }
        let pos = self.entries.partition_point(|e| e.enqueued_at <= entry.enqueued_at);
        self.entries.insert(pos, entry);
    }

    /// Scans in FIFO order and removes the first entry that is mutually compatible with `request`.
    /// This is the sole place a waiting entry is consumed by a match.
    pub fn find_and_remove(&mut self, request: &WaitingEntry) -> Option<WaitingEntry> {
        let idx = self.entries.iter().position(|e| e.is_compatible_with(request) && e.user_id != request.user_id)?;
        self.entries.remove(idx)
    }

    /// Removes the user's entry, returning it if one existed.
    pub fn remove(&mut self, user_id: UserId) -> Option<WaitingEntry> {
        let idx = self.entries.iter().position(|e| e.user_id == user_id)?;
        self.entries.remove(idx)
    }

    /// Removes and returns every entry that has been waiting longer than `max_dwell`.
    pub fn evict_stale(&mut self, now: DateTime<Utc>, max_dwell: Duration) -> Vec<WaitingEntry> {
        let cutoff = now - max_dwell;
        let mut evicted = Vec::new();
        // entries are FIFO-ordered, so stale entries form a prefix
        while self.entries.front().is_some_and(|e| e.enqueued_at < cutoff) {
            evicted.extend(self.entries.pop_front());
        }
        evicted
    }
}
