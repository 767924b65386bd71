//! Bounded undo log of scene snapshots.
//!
//! Each editing session owns one [`History`]. Entries are JSON snapshots of
//! the scene taken after every mutation; the oldest entry is evicted once the
//! capacity is exceeded. Undo discards the newest entry, so there is no redo.

use std::collections::VecDeque;

/// Default number of snapshots kept per session.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Bounded, FIFO-evicting stack of scene snapshots.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    /// Create an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding at most `capacity` snapshots.
    ///
    /// A capacity of zero is raised to one so the current state is always
    /// representable.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest entry when over capacity.
    pub fn save(&mut self, snapshot: String) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        tracing::trace!(depth = self.entries.len(), "history snapshot saved");
    }

    /// Drop the newest snapshot and return the one now on top.
    ///
    /// Returns `None` without changing anything when one or zero entries
    /// remain.
    pub fn undo(&mut self) -> Option<&str> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop_back();
        self.entries.back().map(String::as_str)
    }

    /// The newest snapshot.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Whether an undo would change anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.entries.len() > 1
    }

    /// Discard everything and start over from `initial`.
    pub fn reset(&mut self, initial: String) {
        self.entries.clear();
        self.entries.push_back(initial);
    }

    /// Discard every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of stored snapshots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
