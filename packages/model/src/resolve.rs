//! Resolved positions

use crate::error::{ModelError, ModelResult};
use crate::mark::MarkSet;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq)]
struct PathEntry {
    node: Node,
    /// Index of the child containing (or directly after) the position
    index: usize,
    /// Absolute position at the start of that child
    offset: usize,
}

/// A position with the chain of ancestors that contain it.
///
/// Depth 0 is the root. `parent()` is the innermost node whose content holds
/// the position, `parent_offset` the offset inside that content.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPos {
    pub pos: usize,
    pub parent_offset: usize,
    path: Vec<PathEntry>,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> ModelResult<Self> {
        let size = doc.content_size();
        if pos > size {
            return Err(ModelError::out_of_range(pos, size));
        }

        let mut path = Vec::new();
        let mut node = doc.clone();
        let mut start = 0;
        let mut parent_offset = pos;
        loop {
            let (index, offset) = node.content().find_index(parent_offset);
            let rem = parent_offset - offset;
            let child = node.child(index).cloned();
            path.push(PathEntry {
                node,
                index,
                offset: start + offset,
            });
            let Some(child) = child else { break };
            if rem == 0 || child.is_text() || child.is_leaf() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }

        Ok(Self {
            pos,
            parent_offset,
            path,
        })
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn doc(&self) -> &Node {
        &self.path[0].node
    }

    pub fn parent(&self) -> &Node {
        &self.path[self.depth()].node
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Index of the child after the position at `depth`
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Start of the content of the node at `depth`
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the node at `depth`. The root has no outside,
    /// so depth 0 yields 0.
    pub fn before(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset
        }
    }

    pub fn after(&self, depth: usize) -> usize {
        if depth == 0 {
            self.doc().content_size()
        } else {
            self.before(depth) + self.node(depth).size()
        }
    }

    /// Offset into the text node the position falls inside, 0 between nodes
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let child = self.parent().child(self.index(self.depth()))?;
        let offset = self.text_offset();
        if offset > 0 {
            Some(child.cut_text(offset, child.text_len()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return self.parent().child(index).map(|c| c.cut_text(0, offset));
        }
        if index == 0 {
            return None;
        }
        self.parent().child(index - 1).cloned()
    }

    /// Marks that text inserted here would inherit
    pub fn marks(&self) -> MarkSet {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content().is_empty() {
            return MarkSet::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).map(|c| c.marks().clone()).unwrap_or_default();
        }

        let before = index.checked_sub(1).and_then(|i| parent.child(i));
        let after = parent.child(index);
        let (main, other) = match before {
            Some(before) => (before, after),
            None => match after {
                Some(after) => (after, None),
                None => return MarkSet::new(),
            },
        };

        main.marks()
            .iter()
            .filter(|mark| {
                mark.mark_type.inclusive()
                    || other.is_some_and(|o| mark.is_in_set(o.marks()))
            })
            .cloned()
            .collect()
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }

    /// Deepest depth whose node contains both this position and `pos`
    pub fn shared_depth(&self, pos: usize) -> usize {
        (0..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= pos && self.end(d) >= pos)
            .unwrap_or(0)
    }

    /// Innermost ancestor depth matching `pred`
    pub fn find_ancestor(&self, pred: impl Fn(&Node) -> bool) -> Option<usize> {
        (0..=self.depth()).rev().find(|&d| pred(self.node(d)))
    }

    /// Replace the node at `depth` and rebuild every ancestor up to the root
    pub fn rebuild(&self, depth: usize, replacement: Node) -> Node {
        (0..depth).rev().fold(replacement, |child, d| {
            let entry = &self.path[d];
            entry
                .node
                .with_content(entry.node.content().replace_child(entry.index, child))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;
    use crate::mark::Mark;
    use crate::schema::NodeType;

    fn sample() -> Node {
        // 0 <p> 1 a 2 b 3 </p> 4 <img> 5 <blockquote> 6 <p> 7 c 8 </p> 9 </blockquote> 10
        doc(vec![
            paragraph(vec![text("ab")]),
            image("x.png", 200, 100),
            blockquote(vec![paragraph(vec![text("c")])]),
        ])
    }

    #[test]
    fn test_resolve_inside_text() {
        let d = sample();
        let rp = d.resolve(2).unwrap();
        assert_eq!(rp.depth(), 1);
        assert_eq!(rp.parent().node_type(), NodeType::Paragraph);
        assert_eq!(rp.parent_offset, 1);
        assert_eq!(rp.text_offset(), 1);
        assert_eq!(rp.start(1), 1);
        assert_eq!(rp.end(1), 3);
        assert_eq!(rp.before(1), 0);
        assert_eq!(rp.after(1), 4);
        assert_eq!(rp.node_before().unwrap().text(), Some("a"));
        assert_eq!(rp.node_after().unwrap().text(), Some("b"));
    }

    #[test]
    fn test_resolve_before_atom() {
        let d = sample();
        let rp = d.resolve(4).unwrap();
        assert_eq!(rp.depth(), 0);
        assert_eq!(rp.index(0), 1);
        assert_eq!(rp.node_after().unwrap().node_type(), NodeType::Image);
        assert_eq!(rp.node_before().unwrap().node_type(), NodeType::Paragraph);
    }

    #[test]
    fn test_resolve_nested() {
        let d = sample();
        let rp = d.resolve(7).unwrap();
        assert_eq!(rp.depth(), 2);
        assert_eq!(rp.node(1).node_type(), NodeType::Blockquote);
        assert_eq!(rp.start(2), 7);
        assert_eq!(rp.before(1), 5);
        assert_eq!(rp.after(1), 10);
    }

    #[test]
    fn test_resolve_bounds() {
        let d = sample();
        assert!(d.resolve(10).is_ok());
        assert!(matches!(
            d.resolve(11),
            Err(ModelError::OutOfRange { pos: 11, size: 10 })
        ));
    }

    #[test]
    fn test_resolve_empty_paragraph() {
        let d = doc(vec![paragraph(vec![])]);
        let rp = d.resolve(1).unwrap();
        assert_eq!(rp.depth(), 1);
        assert_eq!(rp.parent_offset, 0);
        assert!(rp.marks().is_empty());
    }

    #[test]
    fn test_marks_skip_non_inclusive_link() {
        let d = doc(vec![paragraph(vec![
            marked("a", vec![Mark::link("https://x"), Mark::bold()]),
            text("b"),
        ])]);
        let rp = d.resolve(2).unwrap();
        assert_eq!(rp.marks(), vec![Mark::bold()]);
    }

    #[test]
    fn test_rebuild_shares_siblings() {
        let d = sample();
        let rp = d.resolve(7).unwrap();
        let replaced = rp.rebuild(2, paragraph(vec![text("xyz")]));
        assert_eq!(replaced.content_size(), 12);
        assert!(Node::ptr_eq(replaced.child(0).unwrap(), d.child(0).unwrap()));
        assert_eq!(replaced.text_between(0, 12, "|"), "ab|xyz");
    }
}
