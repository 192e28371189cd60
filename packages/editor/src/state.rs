//! Immutable editor state

use crate::errors::StepResult;
use crate::mapping::Mapping;
use crate::step::Step;
use crate::transaction::{map_selection, Transaction};
use crate::transform::Transform;
use quire_model::{MarkSet, Node, Selection};

/// Document, selection and the marks the next typed text will carry
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    doc: Node,
    selection: Selection,
    stored_marks: Option<MarkSet>,
}

/// What a committed transaction did, for history and position tracking
#[derive(Debug, Clone)]
pub struct Applied {
    pub steps: Vec<Step>,
    /// Steps undoing the transaction, in application order
    pub inverses: Vec<Step>,
    pub mapping: Mapping,
    pub doc_changed: bool,
}

impl EditorState {
    /// State with the caret at the start of the first textblock
    pub fn new(doc: Node) -> Self {
        let caret = match doc.child(0) {
            Some(first) if first.is_textblock() => 1,
            _ => 0,
        };
        Self::with_selection(doc, Selection::caret(caret))
    }

    pub fn with_selection(doc: Node, selection: Selection) -> Self {
        let selection = selection.clamp(doc.content_size());
        Self {
            doc,
            selection,
            stored_marks: None,
        }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    /// Start a transaction against this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(self)
    }

    /// Apply a transaction, returning the new state. `self` is never touched.
    pub fn apply(&self, tr: &Transaction) -> StepResult<EditorState> {
        self.apply_transaction(tr).map(|(state, _)| state)
    }

    /// Apply a transaction and report the steps it committed.
    ///
    /// A transaction built against this state is used as is. One built
    /// against an older document is replayed; if any step no longer applies
    /// the whole transaction is rejected.
    pub fn apply_transaction(&self, tr: &Transaction) -> StepResult<(EditorState, Applied)> {
        let replayed;
        let transform = if Node::ptr_eq(tr.before(), &self.doc) {
            tr.transform()
        } else {
            let mut transform = Transform::new(self.doc.clone());
            for step in tr.steps() {
                transform.step(step.clone())?;
            }
            replayed = transform;
            &replayed
        };

        let doc = transform.doc().clone();
        let (selection, selection_at) = tr.raw_selection();
        let selection = if tr.selection_set() {
            map_selection(selection, &transform.mapping().slice(selection_at))
        } else {
            map_selection(self.selection, transform.mapping())
        }
        .clamp(doc.content_size());

        let stored_marks = if tr.stored_marks_set() {
            tr.stored_marks().cloned()
        } else if transform.doc_changed() || selection != self.selection {
            None
        } else {
            self.stored_marks.clone()
        };

        let applied = Applied {
            steps: transform.steps().to_vec(),
            inverses: transform.inverted(),
            mapping: transform.mapping().clone(),
            doc_changed: transform.doc_changed(),
        };
        Ok((
            EditorState {
                doc,
                selection,
                stored_marks,
            },
            applied,
        ))
    }
}
