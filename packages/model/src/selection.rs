use crate::node::Node;
use serde::{Deserialize, Serialize};

/// A text or node selection, expressed as two document positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn caret(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    /// Select the node starting at `pos`
    pub fn node(pos: usize, node: &Node) -> Self {
        Self::new(pos, pos + node.size())
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    /// The atomic node this selection covers exactly, if any
    pub fn selected_node<'a>(&self, doc: &'a Node) -> Option<&'a Node> {
        if self.to() - self.from() != 1 {
            return None;
        }
        let node = doc.node_at(self.from())?;
        if node.is_atom() {
            Some(node)
        } else {
            None
        }
    }

    /// Clamp both ends into `0..=size`
    pub fn clamp(&self, size: usize) -> Self {
        Self::new(self.anchor.min(size), self.head.min(size))
    }
}
