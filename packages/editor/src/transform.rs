//! Sequential step application.
//!
//! A [`Transform`] applies steps one at a time, each against the document
//! produced by the previous one. A step that fails is never recorded, so a
//! transform only ever holds steps that applied cleanly.

use crate::errors::StepResult;
use crate::mapping::Mapping;
use crate::step::Step;
use quire_model::{Attrs, Fragment, Mark, MarkSet, MarkType, Node, NodeType};

#[derive(Debug, Clone)]
pub struct Transform {
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    /// Inverse of each step, against the document after it
    inverses: Vec<Vec<Step>>,
    mapping: Mapping,
}

impl Transform {
    pub fn new(doc: Node) -> Self {
        Self {
            before: doc.clone(),
            doc,
            steps: Vec::new(),
            inverses: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// Document the transform started from
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// Current document
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Steps undoing the whole transform, in application order
    pub fn inverted(&self) -> Vec<Step> {
        self.inverses
            .iter()
            .rev()
            .flat_map(|inverse| inverse.iter().cloned())
            .collect()
    }

    pub fn step(&mut self, step: Step) -> StepResult<&mut Self> {
        let output = step.apply(&self.doc)?;
        self.doc = output.doc;
        self.mapping.push(output.map);
        self.inverses.push(output.inverse);
        self.steps.push(step);
        Ok(self)
    }

    pub fn insert(&mut self, pos: usize, content: Fragment) -> StepResult<&mut Self> {
        self.step(Step::Insert { pos, content })
    }

    pub fn insert_node(&mut self, pos: usize, node: Node) -> StepResult<&mut Self> {
        self.insert(pos, Fragment::from_node(node))
    }

    pub fn insert_text(&mut self, pos: usize, text: &str, marks: MarkSet) -> StepResult<&mut Self> {
        if text.is_empty() {
            return Ok(self);
        }
        self.insert_node(pos, Node::new_text(text, marks))
    }

    pub fn delete(&mut self, from: usize, to: usize) -> StepResult<&mut Self> {
        if from == to {
            return Ok(self);
        }
        self.step(Step::Delete { from, to })
    }

    pub fn set_attrs(&mut self, pos: usize, attrs: Attrs) -> StepResult<&mut Self> {
        self.step(Step::SetAttrs { pos, attrs })
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> StepResult<&mut Self> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: MarkType) -> StepResult<&mut Self> {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type,
        })
    }

    pub fn set_block_type(
        &mut self,
        pos: usize,
        node_type: NodeType,
        attrs: Attrs,
    ) -> StepResult<&mut Self> {
        self.step(Step::SetBlockType {
            pos,
            node_type,
            attrs,
        })
    }

    pub fn split(
        &mut self,
        pos: usize,
        depth: usize,
        after: Option<(NodeType, Attrs)>,
    ) -> StepResult<&mut Self> {
        self.step(Step::Split { pos, depth, after })
    }

    pub fn join(&mut self, pos: usize, depth: usize) -> StepResult<&mut Self> {
        self.step(Step::Join { pos, depth })
    }
}
