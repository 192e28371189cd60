//! Selection projector.
//!
//! Derives what a toolbar needs to highlight from an [`EditorState`]. The
//! projection is a pure function of the state; it never touches the
//! document.

use crate::state::EditorState;
use quire_model::mark::find_mark;
use quire_model::{Attrs, Mark, MarkSet, MarkType, Node, NodeType};
use serde::Serialize;

/// Language reported for code blocks without one
pub const DEFAULT_CODE_LANGUAGE: &str = "text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading { level: i64 },
    CodeBlock { language: String },
    Image,
    HorizontalRule,
    /// Selection spans blocks of different kinds
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// Formatting active at the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveState {
    pub marks: MarkSet,
    pub block: BlockKind,
    pub in_blockquote: bool,
    pub list: Option<ListKind>,
    pub text_align: Option<String>,
    /// Attributes of the selected image
    pub image: Option<Attrs>,
    pub show_placeholder: bool,
}

impl ActiveState {
    pub fn is_active(&self, mark_type: MarkType) -> bool {
        self.mark(mark_type).is_some()
    }

    pub fn mark(&self, mark_type: MarkType) -> Option<&Mark> {
        find_mark(&self.marks, mark_type)
    }

    pub fn color(&self) -> Option<&str> {
        self.mark_attr(MarkType::Color, "color")
    }

    pub fn highlight(&self) -> Option<&str> {
        self.mark_attr(MarkType::Highlight, "color")
    }

    pub fn link(&self) -> Option<&str> {
        self.mark_attr(MarkType::Link, "href")
    }

    fn mark_attr(&self, mark_type: MarkType, name: &str) -> Option<&str> {
        self.mark(mark_type)
            .and_then(|mark| mark.attr(name))
            .and_then(|value| value.as_str())
    }
}

/// Project the state into toolbar state
pub fn project(state: &EditorState) -> ActiveState {
    let doc = state.doc();
    let selection = state.selection();
    let (from, to) = (selection.from(), selection.to());

    let marks = if selection.is_caret() {
        match state.stored_marks() {
            Some(marks) => marks.clone(),
            None => doc
                .resolve(from)
                .map(|rp| rp.marks())
                .unwrap_or_default(),
        }
    } else {
        shared_marks(doc, from, to)
    };

    let image = selection
        .selected_node(doc)
        .filter(|node| node.node_type() == NodeType::Image)
        .map(|node| node.attrs().clone());

    let (mut in_blockquote, mut list) = (false, None);
    if let Ok(rp) = doc.resolve(from) {
        for depth in (1..=rp.depth()).rev() {
            match rp.node(depth).node_type() {
                NodeType::Blockquote => in_blockquote = true,
                NodeType::BulletList if list.is_none() => list = Some(ListKind::Bullet),
                NodeType::OrderedList if list.is_none() => list = Some(ListKind::Ordered),
                _ => {}
            }
        }
    }

    let (block, text_align) = match selection.selected_node(doc) {
        Some(node) => (leaf_kind(node), None),
        None => {
            let blocks = textblocks(doc, from, to);
            let block = blocks
                .iter()
                .map(|(_, node)| block_kind(node))
                .reduce(|a, b| if a == b { a } else { BlockKind::Mixed })
                .unwrap_or(BlockKind::Paragraph);
            let text_align = blocks.first().and_then(|(_, node)| {
                node.attr("text_align")
                    .and_then(|value| value.as_str())
                    .map(str::to_string)
            });
            (block, text_align)
        }
    };

    ActiveState {
        marks,
        block,
        in_blockquote,
        list,
        text_align,
        image,
        show_placeholder: is_empty_doc(doc),
    }
}

fn block_kind(node: &Node) -> BlockKind {
    match node.node_type() {
        NodeType::Heading => BlockKind::Heading {
            level: node.attr("level").and_then(|v| v.as_int()).unwrap_or(1),
        },
        NodeType::CodeBlock => BlockKind::CodeBlock {
            language: node
                .attr("language")
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_CODE_LANGUAGE)
                .to_string(),
        },
        _ => BlockKind::Paragraph,
    }
}

fn leaf_kind(node: &Node) -> BlockKind {
    match node.node_type() {
        NodeType::Image => BlockKind::Image,
        NodeType::HorizontalRule => BlockKind::HorizontalRule,
        _ => block_kind(node),
    }
}

/// A document holding a single empty paragraph
pub fn is_empty_doc(doc: &Node) -> bool {
    doc.child_count() == 1
        && doc
            .child(0)
            .is_some_and(|first| first.node_type() == NodeType::Paragraph && first.content().is_empty())
}

/// Textblocks overlapping `from..to`, or containing `from` for a caret
pub fn textblocks(doc: &Node, from: usize, to: usize) -> Vec<(usize, Node)> {
    let to = to.max(from + 1).min(doc.content_size());
    let mut blocks = Vec::new();
    doc.nodes_between(from, to, |node, pos, _, _| {
        if node.is_textblock() {
            blocks.push((pos, node.clone()));
            false
        } else {
            true
        }
    });
    blocks
}

/// Markable text runs in `from..to` with their mark sets
fn markable_runs(doc: &Node, from: usize, to: usize) -> Vec<MarkSet> {
    let mut runs = Vec::new();
    doc.nodes_between(from, to, |node, _, parent, _| {
        if node.is_text() && parent.node_type().allows_marks() {
            runs.push(node.marks().clone());
        }
        true
    });
    runs
}

/// Whether every markable text run in `from..to` carries `mark_type`
pub fn range_has_mark(doc: &Node, from: usize, to: usize, mark_type: MarkType) -> bool {
    let runs = markable_runs(doc, from, to);
    !runs.is_empty() && runs.iter().all(|marks| find_mark(marks, mark_type).is_some())
}

/// Marks carried by every markable text run in `from..to`
fn shared_marks(doc: &Node, from: usize, to: usize) -> MarkSet {
    let runs = markable_runs(doc, from, to);
    let Some((first, rest)) = runs.split_first() else {
        return MarkSet::new();
    };
    first
        .iter()
        .filter(|mark| rest.iter().all(|marks| find_mark(marks, mark.mark_type).is_some()))
        .cloned()
        .collect()
}
