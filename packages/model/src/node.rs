//! # Document nodes
//!
//! A [`Node`] is an immutable, reference-counted tree element. Editing never
//! mutates a node in place: every change builds new nodes along the edited
//! path and shares every untouched subtree with the previous document.
//!
//! ## Sizes
//!
//! ```text
//! text            number of Unicode scalar values
//! leaf (image)    1
//! container       content size + 2 (opening and closing boundary)
//! ```

use crate::attrs::{complete_attrs, validate_attrs, AttrValue, Attrs};
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::MarkSet;
use crate::resolve::ResolvedPos;
use crate::schema::NodeType;
use std::fmt;
use std::sync::Arc;

static EMPTY: Fragment = Fragment::empty();

/// A node in the document tree
#[derive(Clone, PartialEq)]
pub struct Node(Arc<NodeData>);

#[derive(PartialEq)]
struct NodeData {
    node_type: NodeType,
    attrs: Attrs,
    marks: MarkSet,
    body: Body,
}

#[derive(PartialEq)]
enum Body {
    Content(Fragment),
    Text { text: String, len: usize },
}

impl Node {
    /// Create a validated element node. Missing attributes get their defaults.
    pub fn create(node_type: NodeType, attrs: &Attrs, content: Vec<Node>) -> ModelResult<Node> {
        if node_type == NodeType::Text {
            return Err(ModelError::invalid_content(
                node_type,
                "text nodes are created with Node::new_text",
            ));
        }
        let attrs = complete_attrs(node_type.name(), node_type.attr_specs(), attrs)?;
        let node = Node::from_parts(node_type, attrs, Fragment::from_nodes(content), MarkSet::new());
        node.check_level()?;
        Ok(node)
    }

    /// Create a text node. Empty text is dropped when placed in a fragment.
    pub fn new_text(text: impl Into<String>, marks: MarkSet) -> Node {
        let text = text.into();
        let len = text.chars().count();
        Node(Arc::new(NodeData {
            node_type: NodeType::Text,
            attrs: Attrs::new(),
            marks,
            body: Body::Text { text, len },
        }))
    }

    /// Create an element without validation
    pub(crate) fn from_parts(node_type: NodeType, attrs: Attrs, content: Fragment, marks: MarkSet) -> Node {
        Node(Arc::new(NodeData {
            node_type,
            attrs,
            marks,
            body: Body::Content(content),
        }))
    }

    pub fn node_type(&self) -> NodeType {
        self.0.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.0.attrs.get(name)
    }

    pub fn marks(&self) -> &MarkSet {
        &self.0.marks
    }

    pub fn text(&self) -> Option<&str> {
        match &self.0.body {
            Body::Text { text, .. } => Some(text),
            Body::Content(_) => None,
        }
    }

    /// Children of this node (always empty for text and leaves)
    pub fn content(&self) -> &Fragment {
        match &self.0.body {
            Body::Content(content) => content,
            Body::Text { .. } => &EMPTY,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.body, Body::Text { .. })
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type().is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.node_type().is_atom()
    }

    pub fn is_block(&self) -> bool {
        self.node_type().is_block()
    }

    pub fn is_inline(&self) -> bool {
        self.node_type().is_inline()
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type().is_textblock()
    }

    pub fn text_len(&self) -> usize {
        match &self.0.body {
            Body::Text { len, .. } => *len,
            Body::Content(_) => 0,
        }
    }

    /// Size of this node in the flattened position space
    pub fn size(&self) -> usize {
        match &self.0.body {
            Body::Text { len, .. } => *len,
            Body::Content(_) if self.is_leaf() => 1,
            Body::Content(content) => content.size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        self.content().size()
    }

    pub fn child_count(&self) -> usize {
        self.content().child_count()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content().child(index)
    }

    pub fn text_content(&self) -> String {
        match &self.0.body {
            Body::Text { text, .. } => text.clone(),
            Body::Content(content) => content.text_content(),
        }
    }

    /// Same type, attributes and marks
    pub fn same_markup(&self, other: &Node) -> bool {
        self.node_type() == other.node_type()
            && self.attrs() == other.attrs()
            && self.marks() == other.marks()
    }

    /// Whether both handles point at the same shared node
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn with_content(&self, content: Fragment) -> Node {
        match &self.0.body {
            Body::Text { .. } => self.clone(),
            Body::Content(_) => Node::from_parts(
                self.node_type(),
                self.attrs().clone(),
                content,
                self.marks().clone(),
            ),
        }
    }

    pub fn with_attrs(&self, attrs: Attrs) -> Node {
        Node(Arc::new(NodeData {
            node_type: self.node_type(),
            attrs,
            marks: self.marks().clone(),
            body: self.clone_body(),
        }))
    }

    pub fn with_marks(&self, marks: MarkSet) -> Node {
        Node(Arc::new(NodeData {
            node_type: self.node_type(),
            attrs: self.attrs().clone(),
            marks,
            body: self.clone_body(),
        }))
    }

    pub fn with_type(&self, node_type: NodeType, attrs: Attrs) -> Node {
        Node::from_parts(node_type, attrs, self.content().clone(), self.marks().clone())
    }

    fn clone_body(&self) -> Body {
        match &self.0.body {
            Body::Content(content) => Body::Content(content.clone()),
            Body::Text { text, len } => Body::Text {
                text: text.clone(),
                len: *len,
            },
        }
    }

    /// Slice of a text node by character offsets
    pub fn cut_text(&self, from: usize, to: usize) -> Node {
        match &self.0.body {
            Body::Text { text, .. } => {
                let start = char_to_byte(text, from);
                let end = char_to_byte(text, to);
                Node::new_text(&text[start..end], self.marks().clone())
            }
            Body::Content(_) => self.clone(),
        }
    }

    /// Merge with a following text node carrying the same marks
    pub(crate) fn merge_text(&self, next: &Node) -> Option<Node> {
        match (&self.0.body, &next.0.body) {
            (Body::Text { text: a, .. }, Body::Text { text: b, .. }) if self.marks() == next.marks() => {
                Some(Node::new_text(format!("{}{}", a, b), self.marks().clone()))
            }
            _ => None,
        }
    }

    /// Validate this node's attributes and direct children
    pub fn check_level(&self) -> ModelResult<()> {
        let node_type = self.node_type();
        if self.is_text() {
            if self.text_len() == 0 {
                return Err(ModelError::invalid_content(node_type, "empty text node"));
            }
            return Ok(());
        }
        validate_attrs(node_type.name(), node_type.attr_specs(), self.attrs())?;
        if self.is_leaf() && !self.content().is_empty() {
            return Err(ModelError::invalid_content(node_type, "leaf nodes have no content"));
        }
        if node_type.requires_content() && self.content().is_empty() {
            return Err(ModelError::invalid_content(node_type, "requires at least one child"));
        }
        for child in self.content().iter() {
            if !node_type.allows_child(child.node_type()) {
                return Err(ModelError::invalid_content(
                    node_type,
                    format!("{} is not allowed here", child.node_type()),
                ));
            }
            if !child.marks().is_empty() && !node_type.allows_marks() {
                return Err(ModelError::invalid_content(node_type, "marks are not allowed here"));
            }
        }
        Ok(())
    }

    /// Validate the whole subtree
    pub fn check(&self) -> ModelResult<()> {
        self.check_level()?;
        for child in self.content().iter() {
            child.check()?;
        }
        Ok(())
    }

    /// Resolve a position inside this node's content
    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        ResolvedPos::resolve(self, pos)
    }

    /// The node starting at `pos`, or the text node containing it
    pub fn node_at(&self, mut pos: usize) -> Option<&Node> {
        let mut node = self;
        loop {
            let (index, offset) = node.content().find_index(pos);
            let child = node.child(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// Visit every descendant overlapping `from..to` with its absolute position
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.content().nodes_between(from, to, 0, self, &mut f);
    }

    /// Visit every descendant with its absolute position
    pub fn descendants<F>(&self, f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between(0, self.content_size(), f);
    }

    /// Text between two positions, separating textblocks with `separator`
    pub fn text_between(&self, from: usize, to: usize, separator: &str) -> String {
        let mut out = String::new();
        let mut separated = true;
        self.nodes_between(from, to, |node, pos, _, _| {
            if let Some(text) = node.text() {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(node.text_len());
                let (a, b) = (char_to_byte(text, start), char_to_byte(text, end));
                out.push_str(&text[a..b]);
                separated = false;
            } else if node.node_type() == NodeType::HardBreak {
                out.push('\n');
            } else if node.is_textblock() && !separated {
                out.push_str(separator);
                separated = true;
            }
            true
        });
        out
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.body {
            Body::Text { text, .. } => {
                if self.marks().is_empty() {
                    write!(f, "{:?}", text)
                } else {
                    let marks: Vec<_> = self.marks().iter().map(|m| m.mark_type.name()).collect();
                    write!(f, "{:?}@[{}]", text, marks.join(","))
                }
            }
            Body::Content(content) => {
                write!(f, "{}", self.node_type())?;
                let attrs: Vec<_> = self
                    .attrs()
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                if !attrs.is_empty() {
                    write!(f, "{{{}}}", attrs.join(" "))?;
                }
                if !content.is_empty() {
                    write!(f, "{:?}", content)?;
                }
                Ok(())
            }
        }
    }
}

/// Byte index of the `n`th character, clamped to the string length
pub fn char_to_byte(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(b, _)| b).unwrap_or(text.len())
}
