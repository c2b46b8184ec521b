// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo log for key edits.
//!
//! Entries are closures over an editing context `C`. Pushing an entry runs
//! its `common` callback (refresh) right away; undo and redo run their own
//! callback followed by `common`.

use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Default number of undoable key edits
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Result alias for undo and redo
pub type Result<T> = std::result::Result<T, HistoryError>;

type Callback<C> = Box<dyn Fn(&mut C)>;

/// A reversible edit
pub struct UndoRedoEntry<C> {
    /// Human-readable description
    pub description: String,
    common: Callback<C>,
    undo: Callback<C>,
    redo: Callback<C>,
}

impl<C> UndoRedoEntry<C> {
    /// Create a new entry
    pub fn new(
        description: impl Into<String>,
        common: impl Fn(&mut C) + 'static,
        undo: impl Fn(&mut C) + 'static,
        redo: impl Fn(&mut C) + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            common: Box::new(common),
            undo: Box::new(undo),
            redo: Box::new(redo),
        }
    }
}

impl<C> fmt::Debug for UndoRedoEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRedoEntry")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Linear undo/redo stack
pub struct UndoRedoLog<C> {
    undo_stack: VecDeque<UndoRedoEntry<C>>,
    redo_stack: VecDeque<UndoRedoEntry<C>>,
    max_depth: usize,
}

impl<C> UndoRedoLog<C> {
    /// Create a log with the default depth
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Log keeping at most `max_depth` entries
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record an entry and run its common callback
    pub fn push(&mut self, entry: UndoRedoEntry<C>, ctx: &mut C) {
        (entry.common)(ctx);

        self.redo_stack.clear();
        self.undo_stack.push_back(entry);

        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                tracing::trace!("Dropped oldest history entry: {}", dropped.description);
            }
        }
    }

    /// Undo the last entry
    pub fn undo(&mut self, ctx: &mut C) -> Result<()> {
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;

        (entry.undo)(ctx);
        (entry.common)(ctx);
        tracing::debug!("Undo: {}", entry.description);

        self.redo_stack.push_back(entry);
        Ok(())
    }

    /// Redo the last undone entry
    pub fn redo(&mut self, ctx: &mut C) -> Result<()> {
        let entry = self
            .redo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToRedo)?;

        (entry.redo)(ctx);
        (entry.common)(ctx);
        tracing::debug!("Redo: {}", entry.description);

        self.undo_stack.push_back(entry);
        Ok(())
    }

    /// Whether an entry can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether an entry can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Entries available to undo
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Entries available to redo
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of next undo entry
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo entry
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }
}

impl<C> Default for UndoRedoLog<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for UndoRedoLog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRedoLog")
            .field("undo_stack", &self.undo_stack)
            .field("redo_stack", &self.redo_stack)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i32,
        refreshes: u32,
    }

    fn set_entry(from: i32, to: i32) -> UndoRedoEntry<Counter> {
        UndoRedoEntry::new(
            format!("set {to}"),
            |c: &mut Counter| c.refreshes += 1,
            move |c: &mut Counter| c.value = from,
            move |c: &mut Counter| c.value = to,
        )
    }

    #[test]
    fn test_push_runs_common() {
        let mut log = UndoRedoLog::new();
        let mut counter = Counter::default();
        log.push(set_entry(0, 1), &mut counter);
        assert_eq!(counter.refreshes, 1);
        assert!(log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut log = UndoRedoLog::new();
        let mut counter = Counter { value: 1, refreshes: 0 };
        log.push(set_entry(0, 1), &mut counter);

        log.undo(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
        assert_eq!(log.redo_description(), Some("set 1"));

        log.redo(&mut counter).unwrap();
        assert_eq!(counter.value, 1);
        assert_eq!(counter.refreshes, 3);
    }

    #[test]
    fn test_empty_stacks() {
        let mut log: UndoRedoLog<Counter> = UndoRedoLog::new();
        let mut counter = Counter::default();
        assert_eq!(log.undo(&mut counter), Err(HistoryError::NothingToUndo));
        assert_eq!(log.redo(&mut counter), Err(HistoryError::NothingToRedo));
    }

    #[test]
    fn test_push_clears_redo() {
        let mut log = UndoRedoLog::new();
        let mut counter = Counter::default();
        log.push(set_entry(0, 1), &mut counter);
        log.undo(&mut counter).unwrap();
        log.push(set_entry(0, 2), &mut counter);
        assert!(!log.can_redo());
        assert_eq!(log.undo_depth(), 1);
    }

    #[test]
    fn test_max_depth() {
        let mut log = UndoRedoLog::with_max_depth(3);
        let mut counter = Counter::default();
        for i in 0..5 {
            log.push(set_entry(i, i + 1), &mut counter);
        }
        assert_eq!(log.undo_depth(), 3);
        assert_eq!(log.undo_description(), Some("set 5"));
    }
}
