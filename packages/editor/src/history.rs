//! # Undo/Redo History
//!
//! Tracks committed transactions and enables undo/redo.
//!
//! ## Design
//!
//! - Each entry stores the forward steps and the inverse steps computed
//!   against the pre-transaction documents
//! - Undo applies the inverses and moves the entry to the redo stack
//! - Redo reapplies the forward steps
//! - New entries clear the redo stack
//! - Consecutive typing within the coalesce window, continuing where the
//!   previous entry left the caret, merges into one entry
//!
//! ## Example
//!
//! ```rust
//! use quire_editor::{EditorState, History};
//! use quire_model::build::*;
//!
//! let state = EditorState::new(doc(vec![paragraph(vec![])]));
//! let mut history = History::new();
//!
//! let mut tr = state.tr();
//! tr.insert_text(1, "hi", vec![]).unwrap();
//! let (next, applied) = state.apply_transaction(&tr).unwrap();
//! history.record(&tr, &applied, state.selection(), next.selection());
//!
//! let (undone, _) = history.undo(&next).unwrap().unwrap();
//! assert_eq!(undone.doc(), state.doc());
//! ```

use crate::errors::StepResult;
use crate::state::{Applied, EditorState};
use crate::step::Step;
use crate::transaction::{InputKind, Transaction};
use quire_model::Selection;
use std::time::{Duration, Instant};
use tracing::debug;

/// A group of steps that is undone/redone together
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Forward steps, in application order
    pub steps: Vec<Step>,

    /// Steps undoing `steps`, in application order
    pub inverses: Vec<Step>,

    pub selection_before: Selection,
    pub selection_after: Selection,

    /// Time of the last transaction merged into this entry
    pub time: Instant,
    pub input: InputKind,
    pub description: Option<String>,
}

/// Undo/redo stacks for one editor
#[derive(Debug)]
pub struct History {
    /// Applied entries (most recent last)
    done: Vec<HistoryEntry>,

    /// Undone entries (most recent last)
    undone: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    coalesce_window: Duration,
}

impl History {
    /// History with 100 levels and a 500ms typing window
    pub fn new() -> Self {
        Self::with_limits(100, Duration::from_millis(500))
    }

    pub fn with_limits(max_levels: usize, coalesce_window: Duration) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            max_levels,
            coalesce_window,
        }
    }

    /// Record a committed transaction
    pub fn record(
        &mut self,
        tr: &Transaction,
        applied: &Applied,
        selection_before: Selection,
        selection_after: Selection,
    ) {
        if !applied.doc_changed {
            return;
        }
        if !tr.add_to_history() {
            // recorded steps no longer line up with the document
            debug!("untracked change, clearing history");
            self.clear();
            return;
        }

        if let Some(last) = self.done.last_mut() {
            let coalesce = tr.input() == InputKind::Typing
                && last.input == InputKind::Typing
                && tr.time().saturating_duration_since(last.time) <= self.coalesce_window
                && last.selection_after == selection_before;
            if coalesce {
                last.steps.extend(applied.steps.iter().cloned());
                let mut inverses = applied.inverses.clone();
                inverses.append(&mut last.inverses);
                last.inverses = inverses;
                last.selection_after = selection_after;
                last.time = tr.time();
                self.undone.clear();
                return;
            }
        }

        self.push(HistoryEntry {
            steps: applied.steps.clone(),
            inverses: applied.inverses.clone(),
            selection_before,
            selection_after,
            time: tr.time(),
            input: tr.input(),
            description: tr.description().map(str::to_string),
        });
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.done.push(entry);

        if self.max_levels > 0 && self.done.len() > self.max_levels {
            self.done.remove(0);
        }

        self.undone.clear();
    }

    /// Undo the most recent entry. Returns `None` when there is nothing to
    /// undo. On failure the entry stays on the undo stack.
    pub fn undo(&mut self, state: &EditorState) -> StepResult<Option<(EditorState, Applied)>> {
        let Some(entry) = self.done.pop() else {
            return Ok(None);
        };
        match replay(state, &entry.inverses, entry.selection_before) {
            Ok(result) => {
                self.undone.push(entry);
                Ok(Some(result))
            }
            Err(err) => {
                self.done.push(entry);
                Err(err)
            }
        }
    }

    /// Redo the most recently undone entry
    pub fn redo(&mut self, state: &EditorState) -> StepResult<Option<(EditorState, Applied)>> {
        let Some(entry) = self.undone.pop() else {
            return Ok(None);
        };
        match replay(state, &entry.steps, entry.selection_after) {
            Ok(result) => {
                self.done.push(entry);
                Ok(Some(result))
            }
            Err(err) => {
                self.undone.push(entry);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.done.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.undone.len()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.done.last().and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.undone
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn replay(
    state: &EditorState,
    steps: &[Step],
    selection: Selection,
) -> StepResult<(EditorState, Applied)> {
    let mut tr = Transaction::from_steps(state, steps.iter().cloned())?;
    tr.set_selection(selection)
        .set_add_to_history(false)
        .set_input(InputKind::History);
    state.apply_transaction(&tr)
}
