//! Snapshot undo/redo
//!
//! Every edit pushes a full copy of the lines and cursor taken just before
//! it. The undo stack keeps the most recent 100 frames.

use std::collections::VecDeque;

use super::document::{Document, Snapshot};

/// Maximum frames kept for undo
pub const MAX_UNDO: usize = 100;

#[derive(Debug, Default)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state before an edit. Clears redo.
    pub fn record(&mut self, before: Snapshot) {
        self.undo.push_back(before);
        if self.undo.len() > MAX_UNDO {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Restore the latest frame; returns false on an empty stack
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(frame) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(doc.snapshot());
        doc.restore(frame);
        true
    }

    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(frame) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(doc.snapshot());
        if self.undo.len() > MAX_UNDO {
            self.undo.pop_front();
        }
        doc.restore(frame);
        true
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
