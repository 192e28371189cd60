//! Ordered child lists with cached offsets

use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use std::fmt;

/// The children of a container node.
///
/// Adjacent text nodes with identical marks are merged and empty text nodes
/// are dropped on construction, so two fragments describing the same content
/// always compare equal. Child start offsets are cached, which keeps
/// position lookups to a binary search per tree level.
#[derive(Clone, PartialEq, Default)]
pub struct Fragment {
    children: Vec<Node>,
    starts: Vec<usize>,
    size: usize,
}

impl Fragment {
    pub const fn empty() -> Self {
        Self {
            children: Vec::new(),
            starts: Vec::new(),
            size: 0,
        }
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut children: Vec<Node> = Vec::new();
        for node in nodes {
            if node.is_text() && node.text_len() == 0 {
                continue;
            }
            if let Some(last) = children.last_mut() {
                if let Some(merged) = last.merge_text(&node) {
                    *last = merged;
                    continue;
                }
            }
            children.push(node);
        }

        let mut starts = Vec::with_capacity(children.len());
        let mut size = 0;
        for child in &children {
            starts.push(size);
            size += child.size();
        }

        Self {
            children,
            starts,
            size,
        }
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_nodes([node])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.children.iter()
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    /// Offset of the child at `index`, relative to the start of this fragment
    pub fn child_start(&self, index: usize) -> usize {
        self.starts.get(index).copied().unwrap_or(self.size)
    }

    /// Index of the child containing `pos` and that child's start offset.
    /// At the end of the fragment this is `(child_count, size)`.
    pub fn find_index(&self, pos: usize) -> (usize, usize) {
        if pos >= self.size {
            return (self.children.len(), self.size);
        }
        match self.starts.binary_search(&pos) {
            Ok(index) => (index, self.starts[index]),
            Err(index) => (index - 1, self.starts[index - 1]),
        }
    }

    /// Split the children at `pos`, cutting a text child in two if needed
    pub fn split_at(&self, pos: usize) -> ModelResult<(Vec<Node>, Vec<Node>)> {
        let (index, offset) = self.find_index(pos);
        let mut before: Vec<Node> = self.children[..index].to_vec();
        let mut after: Vec<Node> = Vec::new();
        if let Some(child) = self.children.get(index) {
            if offset == pos {
                after.push(child.clone());
            } else if child.is_text() {
                let split = pos - offset;
                before.push(child.cut_text(0, split));
                after.push(child.cut_text(split, child.text_len()));
            } else {
                return Err(ModelError::SplitsNode {
                    pos,
                    node_type: child.node_type(),
                });
            }
            after.extend_from_slice(&self.children[index + 1..]);
        }
        Ok((before, after))
    }

    /// Content between two offsets. Offsets may only fall inside text children.
    pub fn cut(&self, from: usize, to: usize) -> ModelResult<Fragment> {
        let (_, tail) = self.split_at(from)?;
        let tail = Fragment::from_nodes(tail);
        let (middle, _) = tail.split_at(to - from)?;
        Ok(Fragment::from_nodes(middle))
    }

    /// Remove the content between two offsets
    pub fn remove(&self, from: usize, to: usize) -> ModelResult<Fragment> {
        let (before, _) = self.split_at(from)?;
        let (_, after) = self.split_at(to)?;
        Ok(Fragment::from_nodes(before.into_iter().chain(after)))
    }

    /// Insert `other` at `pos`
    pub fn insert(&self, pos: usize, other: &Fragment) -> ModelResult<Fragment> {
        let (before, after) = self.split_at(pos)?;
        Ok(Fragment::from_nodes(
            before
                .into_iter()
                .chain(other.children.iter().cloned())
                .chain(after),
        ))
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut children = self.children.clone();
        children[index] = node;
        Fragment::from_nodes(children)
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        Fragment::from_nodes(self.children.iter().chain(other.children.iter()).cloned())
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(|c| c.text_content()).collect()
    }

    /// Visit every node overlapping `from..to`. Returning `false` from the
    /// callback skips the node's descendants.
    pub fn nodes_between<F>(&self, from: usize, to: usize, node_start: usize, parent: &Node, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        for (index, child) in self.children.iter().enumerate() {
            let start = self.starts[index];
            if start >= to {
                break;
            }
            let end = start + child.size();
            if end > from
                && f(child, node_start + start, parent, index)
                && child.content_size() > 0
            {
                let inner = start + 1;
                child.content().nodes_between(
                    from.saturating_sub(inner),
                    (to - inner).min(child.content_size()),
                    node_start + inner,
                    child,
                    f,
                );
            }
        }
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.children.iter()).finish()
    }
}

impl FromIterator<Node> for Fragment {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Fragment::from_nodes(iter)
    }
}
