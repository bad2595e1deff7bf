//! # Undo/Redo History
//!
//! A single linear sequence of document snapshots with a cursor.
//!
//! ```text
//! record:  [s0, s1, s2*]          -> [s0, s1, s2, s3*]
//! undo:    [s0, s1, s2, s3*]      -> [s0, s1, s2*, s3]
//! record:  [s0, s1, s2*, s3]      -> [s0, s1, s2, s4*]   (redo branch dropped)
//! ```
//!
//! Once the sequence holds `capacity` entries the oldest is evicted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Design, DesignElement};

/// Default number of retained snapshots.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A deep copy of the document at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    /// Elements in paint order.
    pub elements: Vec<DesignElement>,
    /// Product the elements were placed on.
    pub product_id: Option<String>,
}

impl HistoryState {
    /// Capture a design.
    #[must_use]
    pub fn capture(design: &Design) -> Self {
        Self {
            elements: design.elements().to_vec(),
            product_id: design.product_id.clone(),
        }
    }
}

/// History configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum retained snapshots (at least 1).
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Linear undo/redo over [`HistoryState`] snapshots.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryState>,
    cursor: usize,
    capacity: usize,
}

impl History {
    /// Create an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create an empty history with a custom configuration.
    #[must_use]
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: config.capacity.max(1),
        }
    }

    /// Record a snapshot after a committed mutation.
    ///
    /// Anything after the cursor is discarded, the snapshot is appended and
    /// becomes current.
    pub fn record(&mut self, state: HistoryState) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(state);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            tracing::trace!("History full, evicted oldest snapshot");
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Snapshot `design` and record it.
    pub fn record_design(&mut self, design: &Design) {
        self.record(HistoryState::capture(design));
    }

    /// Step back. Returns the snapshot to restore, or `None` at the start.
    pub fn undo(&mut self) -> Option<&HistoryState> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward. Returns the snapshot to restore, or `None` at the end.
    pub fn redo(&mut self) -> Option<&HistoryState> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Whether [`History::undo`] would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether [`History::redo`] would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The snapshot the cursor points at.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryState> {
        self.entries.get(self.cursor)
    }

    /// Cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum retained snapshots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
