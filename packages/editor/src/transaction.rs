//! # Transactions
//!
//! A transaction is a [`Transform`] plus everything the editor needs to
//! commit it: the desired selection, stored marks and history metadata.
//!
//! The selection is remembered together with the number of steps recorded
//! when it was set, so it is only mapped through the steps that follow it.

use crate::errors::StepResult;
use crate::mapping::Mapping;
use crate::state::EditorState;
use crate::step::Step;
use crate::transform::Transform;
use quire_model::{Attrs, Fragment, Mark, MarkSet, MarkType, Node, NodeType, Selection};
use std::time::Instant;

/// What produced a transaction. History coalesces consecutive `Typing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    Typing,
    Delete,
    Paste,
    Format,
    Palette,
    Media,
    Upload,
    History,
    #[default]
    Other,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    transform: Transform,
    selection: Selection,
    selection_at: usize,
    selection_set: bool,
    stored_marks: Option<MarkSet>,
    stored_marks_set: bool,
    add_to_history: bool,
    input: InputKind,
    time: Instant,
    description: Option<String>,
}

/// Map both ends of a selection
pub fn map_selection(selection: Selection, mapping: &Mapping) -> Selection {
    Selection::new(mapping.map(selection.anchor), mapping.map(selection.head))
}

impl Transaction {
    pub fn new(state: &EditorState) -> Self {
        Self {
            transform: Transform::new(state.doc().clone()),
            selection: state.selection(),
            selection_at: 0,
            selection_set: false,
            stored_marks: state.stored_marks().cloned(),
            stored_marks_set: false,
            add_to_history: true,
            input: InputKind::Other,
            time: Instant::now(),
            description: None,
        }
    }

    /// Build a transaction from a list of steps, failing if any step fails
    pub fn from_steps(state: &EditorState, steps: impl IntoIterator<Item = Step>) -> StepResult<Self> {
        let mut tr = Self::new(state);
        for step in steps {
            tr.step(step)?;
        }
        Ok(tr)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn before(&self) -> &Node {
        self.transform.before()
    }

    pub fn doc(&self) -> &Node {
        self.transform.doc()
    }

    pub fn steps(&self) -> &[Step] {
        self.transform.steps()
    }

    pub fn mapping(&self) -> &Mapping {
        self.transform.mapping()
    }

    pub fn doc_changed(&self) -> bool {
        self.transform.doc_changed()
    }

    /// Selection against the current document
    pub fn selection(&self) -> Selection {
        let mapped = map_selection(self.selection, &self.mapping().slice(self.selection_at));
        mapped.clamp(self.doc().content_size())
    }

    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    /// The selection as set, with the number of steps it predates
    pub(crate) fn raw_selection(&self) -> (Selection, usize) {
        (self.selection, self.selection_at)
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.selection_at = self.steps().len();
        self.selection_set = true;
        self
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    pub fn stored_marks_set(&self) -> bool {
        self.stored_marks_set
    }

    pub fn set_stored_marks(&mut self, marks: Option<MarkSet>) -> &mut Self {
        self.stored_marks = marks;
        self.stored_marks_set = true;
        self
    }

    pub fn add_to_history(&self) -> bool {
        self.add_to_history
    }

    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    pub fn input(&self) -> InputKind {
        self.input
    }

    pub fn set_input(&mut self, input: InputKind) -> &mut Self {
        self.input = input;
        self
    }

    pub fn time(&self) -> Instant {
        self.time
    }

    pub fn set_time(&mut self, time: Instant) -> &mut Self {
        self.time = time;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn step(&mut self, step: Step) -> StepResult<&mut Self> {
        self.transform.step(step)?;
        Ok(self)
    }

    pub fn insert(&mut self, pos: usize, content: Fragment) -> StepResult<&mut Self> {
        self.transform.insert(pos, content)?;
        Ok(self)
    }

    pub fn insert_node(&mut self, pos: usize, node: Node) -> StepResult<&mut Self> {
        self.transform.insert_node(pos, node)?;
        Ok(self)
    }

    pub fn insert_text(&mut self, pos: usize, text: &str, marks: MarkSet) -> StepResult<&mut Self> {
        self.transform.insert_text(pos, text, marks)?;
        Ok(self)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> StepResult<&mut Self> {
        self.transform.delete(from, to)?;
        Ok(self)
    }

    pub fn set_attrs(&mut self, pos: usize, attrs: Attrs) -> StepResult<&mut Self> {
        self.transform.set_attrs(pos, attrs)?;
        Ok(self)
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> StepResult<&mut Self> {
        self.transform.add_mark(from, to, mark)?;
        Ok(self)
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: MarkType) -> StepResult<&mut Self> {
        self.transform.remove_mark(from, to, mark_type)?;
        Ok(self)
    }

    pub fn set_block_type(
        &mut self,
        pos: usize,
        node_type: NodeType,
        attrs: Attrs,
    ) -> StepResult<&mut Self> {
        self.transform.set_block_type(pos, node_type, attrs)?;
        Ok(self)
    }

    pub fn split(
        &mut self,
        pos: usize,
        depth: usize,
        after: Option<(NodeType, Attrs)>,
    ) -> StepResult<&mut Self> {
        self.transform.split(pos, depth, after)?;
        Ok(self)
    }

    pub fn join(&mut self, pos: usize, depth: usize) -> StepResult<&mut Self> {
        self.transform.join(pos, depth)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::build::*;

    #[test]
    fn test_selection_maps_through_later_steps_only() {
        let state = EditorState::with_selection(
            doc(vec![paragraph(vec![text("abc")])]),
            Selection::caret(2),
        );
        let mut tr = state.tr();
        tr.insert_text(1, "xx", vec![]).unwrap();
        // default selection is mapped through everything
        assert_eq!(tr.selection(), Selection::caret(4));

        tr.set_selection(Selection::caret(1));
        tr.insert_text(1, "y", vec![]).unwrap();
        assert_eq!(tr.selection(), Selection::caret(2));
    }

    #[test]
    fn test_from_steps_is_all_or_nothing() {
        let state = EditorState::new(doc(vec![paragraph(vec![text("abc")])]));
        let result = Transaction::from_steps(
            &state,
            vec![
                Step::Delete { from: 1, to: 2 },
                Step::Delete { from: 0, to: 99 },
            ],
        );
        assert!(result.is_err());
        assert_eq!(state.doc().text_content(), "abc");
    }
}
