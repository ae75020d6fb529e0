/// Snapshot-based undo/redo over an ordered sequence.
///
/// Every committed state is stored as its own `Vec<T>`, cloned on the way in
/// and on the way out. Callers can mutate whatever they pass to `push` or get
/// back from `undo`/`redo` without touching stored history.
use crate::config::HistoryConfig;

/// Coarse lifecycle state of a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing has been pushed yet.
    Empty,
    /// At least one snapshot exists and the cursor addresses one of them.
    Active,
}

/// Linear undo/redo history for one editing session.
///
/// Branching is not supported: pushing after an undo discards every snapshot
/// after the cursor.
#[derive(Clone)]
pub struct SequenceHistory<T> {
    /// Snapshots, oldest first.
    snapshots: Vec<Vec<T>>,
    /// Index of the snapshot currently shown. `None` until the first push.
    cursor: Option<usize>,
    config: HistoryConfig,
}

impl<T> std::fmt::Debug for SequenceHistory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceHistory")
            .field("len", &self.snapshots.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.config.max_depth)
            .finish()
    }
}

impl<T> Default for SequenceHistory<T> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<T> SequenceHistory<T> {
    /// Creates an empty history.
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            config,
        }
    }

    /// Index of the current snapshot, or `None` if nothing was pushed.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of stored snapshots, including the redo future.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn state(&self) -> HistoryState {
        match self.cursor {
            None => HistoryState::Empty,
            Some(_) => HistoryState::Active,
        }
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Whether an earlier snapshot exists.
    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    /// Whether a later snapshot exists.
    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.snapshots.len())
    }

    /// Borrows the snapshot under the cursor.
    pub fn current(&self) -> Option<&[T]> {
        self.cursor.map(|c| self.snapshots[c].as_slice())
    }

    /// Applies `edit` to every element of every stored snapshot in place.
    ///
    /// Snapshot count and cursor are unchanged, so this is not an undo step.
    pub fn rewrite(&mut self, mut edit: impl FnMut(&mut T)) {
        for snapshot in &mut self.snapshots {
            snapshot.iter_mut().for_each(&mut edit);
        }
    }
}

impl<T: Clone> SequenceHistory<T> {
    /// Commits a new state.
    ///
    /// Drops the redo future, stores a copy of `state` as the newest snapshot
    /// and moves the cursor onto it.
    pub fn push(&mut self, state: &[T]) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(state.to_vec());

        if let Some(max) = self.config.max_depth {
            if self.snapshots.len() > max {
                let excess = self.snapshots.len() - max;
                self.snapshots.drain(..excess);
                tracing::debug!("History depth {max} reached, evicted {excess} snapshot(s)");
            }
        }

        self.cursor = Some(self.snapshots.len() - 1);
    }

    /// Steps back one snapshot and returns a copy of it.
    ///
    /// Returns `None` when there is no earlier state. That is a routine
    /// outcome, not an error, and leaves the history untouched.
    pub fn undo(&mut self) -> Option<Vec<T>> {
        let cursor = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(cursor);
        Some(self.snapshots[cursor].clone())
    }

    /// Steps forward one snapshot and returns a copy of it.
    ///
    /// Returns `None` when already at the newest snapshot.
    pub fn redo(&mut self) -> Option<Vec<T>> {
        let cursor = self.cursor? + 1;
        if cursor >= self.snapshots.len() {
            return None;
        }
        self.cursor = Some(cursor);
        Some(self.snapshots[cursor].clone())
    }
}
