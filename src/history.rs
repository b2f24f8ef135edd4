//! In-memory board history: baseline, current, bounded undo stack
//!
//! Callers hold board state as values. Every local change produces a new
//! `BoardModel`; the superseded one goes onto the undo stack. Nothing in
//! this module touches the file system; persisting the baseline is the
//! store's job.

use std::collections::VecDeque;

use crate::board::BoardModel;
use crate::diff::{diff_boards, BoardDiff};

/// Default number of undo snapshots retained
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Baseline + current board with a bounded undo stack
#[derive(Debug, Clone)]
pub struct BoardHistory {
    baseline: BoardModel,
    current: BoardModel,
    undo_stack: VecDeque<BoardModel>,
    limit: usize,
}

impl BoardHistory {
    /// Start tracking from a freshly built model
    pub fn new(model: BoardModel, limit: usize) -> Self {
        Self {
            baseline: model.clone(),
            current: model,
            undo_stack: VecDeque::new(),
            limit,
        }
    }

    /// The snapshot local changes are measured against
    pub fn baseline(&self) -> &BoardModel {
        &self.baseline
    }

    /// The model including local, unsaved changes
    pub fn current(&self) -> &BoardModel {
        &self.current
    }

    /// Replace the current model, pushing the old one onto the undo stack.
    /// The oldest snapshot falls off once the stack exceeds its limit.
    pub fn push(&mut self, next: BoardModel) {
        self.undo_stack
            .push_back(std::mem::replace(&mut self.current, next));
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Revert to the most recent snapshot. Returns false at the bottom.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop_back() {
            Some(model) => {
                self.current = model;
                true
            }
            None => false,
        }
    }

    /// Changes accumulated since the baseline
    pub fn pending(&self) -> BoardDiff {
        diff_boards(&self.baseline, &self.current)
    }

    /// Adopt a model as both baseline and current after a successful save.
    /// Clears the undo stack; saved changes are no longer undoable here.
    pub fn rebase(&mut self, model: BoardModel) {
        self.baseline = model.clone();
        self.current = model;
        self.undo_stack.clear();
    }

    /// Snapshots currently available to undo
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}
