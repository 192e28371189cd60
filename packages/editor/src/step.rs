//! # Steps
//!
//! Primitive, invertible document changes.
//!
//! ## Step Semantics
//!
//! ### Insert / Delete
//! - Content is inserted into (or removed from) a single parent node
//! - A delete range must start and end in the same parent
//! - The resulting parent must still satisfy its content rule
//!
//! ### SetAttrs
//! - Patches the attributes of the node starting at `pos`
//! - The inverse restores exactly the keys that were patched
//!
//! ### AddMark / RemoveMark
//! - Touch every text run in range whose parent allows marks
//! - Removal is by mark type, whatever the mark's attributes
//!
//! ### SetBlockType / Split / Join
//! - Structural edits for textblocks and their wrappers
//! - `Split` of depth `n` inserts `2n` boundary tokens at `pos`;
//!   `Join` of depth `n` at `pos` removes the `2n` tokens around it

use crate::errors::{StepError, StepResult};
use crate::mapping::StepMap;
use quire_model::attrs::{complete_attrs, validate_attrs};
use quire_model::mark::{find_mark, remove_mark_type};
use quire_model::{AttrValue, Attrs, Fragment, Mark, MarkSet, MarkType, ModelError, Node, NodeType};

/// A single document change
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Insert content at a position
    Insert { pos: usize, content: Fragment },

    /// Remove the content between two positions in the same parent
    Delete { from: usize, to: usize },

    /// Patch the attributes of the node starting at `pos`
    SetAttrs { pos: usize, attrs: Attrs },

    /// Add a mark to every text run in range
    AddMark { from: usize, to: usize, mark: Mark },

    /// Remove every mark of a type from text runs in range
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: MarkType,
    },

    /// Change the type of the textblock starting at `pos`
    SetBlockType {
        pos: usize,
        node_type: NodeType,
        attrs: Attrs,
    },

    /// Split `depth` ancestors at `pos`. `after` overrides the type of the
    /// innermost new node.
    Split {
        pos: usize,
        depth: usize,
        after: Option<(NodeType, Attrs)>,
    },

    /// Merge the nodes on both sides of `pos`, `depth` levels deep
    Join { pos: usize, depth: usize },
}

/// Result of applying a step
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub doc: Node,
    pub map: StepMap,
    /// Steps that undo this one, to apply in order
    pub inverse: Vec<Step>,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Insert { .. } => "insert",
            Step::Delete { .. } => "delete",
            Step::SetAttrs { .. } => "set_attrs",
            Step::AddMark { .. } => "add_mark",
            Step::RemoveMark { .. } => "remove_mark",
            Step::SetBlockType { .. } => "set_block_type",
            Step::Split { .. } => "split",
            Step::Join { .. } => "join",
        }
    }

    /// Apply to `doc`, validating against the schema
    pub fn apply(&self, doc: &Node) -> StepResult<StepOutput> {
        match self {
            Step::Insert { pos, content } => apply_insert(doc, *pos, content),
            Step::Delete { from, to } => apply_delete(doc, *from, *to),
            Step::SetAttrs { pos, attrs } => apply_set_attrs(doc, *pos, attrs),
            Step::AddMark { from, to, mark } => apply_add_mark(doc, *from, *to, mark),
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => apply_remove_mark(doc, *from, *to, *mark_type),
            Step::SetBlockType {
                pos,
                node_type,
                attrs,
            } => apply_set_block_type(doc, *pos, *node_type, attrs),
            Step::Split { pos, depth, after } => apply_split(doc, *pos, *depth, after.as_ref()),
            Step::Join { pos, depth } => apply_join(doc, *pos, *depth),
        }
    }
}

/// Schema violations are reported as invalid steps
fn schema(error: ModelError) -> StepError {
    match error {
        ModelError::OutOfRange { .. } => StepError::Model(error),
        other => StepError::InvalidStep(other.to_string()),
    }
}

fn unchanged(doc: &Node) -> StepOutput {
    StepOutput {
        doc: doc.clone(),
        map: StepMap::identity(),
        inverse: Vec::new(),
    }
}

fn apply_insert(doc: &Node, pos: usize, content: &Fragment) -> StepResult<StepOutput> {
    let rp = doc.resolve(pos)?;
    if content.is_empty() {
        return Ok(unchanged(doc));
    }
    for node in content.iter() {
        node.check().map_err(schema)?;
    }

    let parent = rp.parent();
    let inserted = parent
        .content()
        .insert(rp.parent_offset, content)
        .map_err(schema)?;
    let new_parent = parent.with_content(inserted);
    new_parent.check_level().map_err(schema)?;

    let size = content.size();
    Ok(StepOutput {
        doc: rp.rebuild(rp.depth(), new_parent),
        map: StepMap::new(pos, 0, size),
        inverse: vec![Step::Delete {
            from: pos,
            to: pos + size,
        }],
    })
}

fn apply_delete(doc: &Node, from: usize, to: usize) -> StepResult<StepOutput> {
    if from > to {
        return Err(StepError::invalid(format!("delete range {}..{} is reversed", from, to)));
    }
    let rf = doc.resolve(from)?;
    let rt = doc.resolve(to)?;
    if from == to {
        return Ok(unchanged(doc));
    }
    if !rf.same_parent(&rt) {
        return Err(StepError::invalid(format!(
            "delete range {}..{} crosses a node boundary",
            from, to
        )));
    }

    let parent = rf.parent();
    let removed = parent
        .content()
        .cut(rf.parent_offset, rt.parent_offset)
        .map_err(schema)?;
    let remaining = parent
        .content()
        .remove(rf.parent_offset, rt.parent_offset)
        .map_err(schema)?;
    let new_parent = parent.with_content(remaining);
    new_parent.check_level().map_err(schema)?;

    Ok(StepOutput {
        doc: rf.rebuild(rf.depth(), new_parent),
        map: StepMap::new(from, to - from, 0),
        inverse: vec![Step::Insert {
            pos: from,
            content: removed,
        }],
    })
}

/// The non-text child starting exactly at `pos`
fn node_starting_at(doc: &Node, pos: usize) -> StepResult<(quire_model::ResolvedPos, usize, Node)> {
    let rp = doc.resolve(pos)?;
    let index = rp.index(rp.depth());
    let node = match rp.parent().child(index) {
        Some(node) if rp.text_offset() == 0 && !node.is_text() => node.clone(),
        _ => return Err(StepError::invalid(format!("no node starts at {}", pos))),
    };
    Ok((rp, index, node))
}

fn replace_at(rp: &quire_model::ResolvedPos, index: usize, node: Node) -> Node {
    let parent = rp.parent();
    rp.rebuild(
        rp.depth(),
        parent.with_content(parent.content().replace_child(index, node)),
    )
}

fn apply_set_attrs(doc: &Node, pos: usize, attrs: &Attrs) -> StepResult<StepOutput> {
    let (rp, index, node) = node_starting_at(doc, pos)?;

    let mut merged = node.attrs().clone();
    let mut previous = Attrs::new();
    for (name, value) in attrs {
        previous.insert(
            name.clone(),
            node.attr(name).cloned().unwrap_or(AttrValue::Null),
        );
        merged.insert(name.clone(), value.clone());
    }
    let node_type = node.node_type();
    validate_attrs(node_type.name(), node_type.attr_specs(), &merged).map_err(schema)?;

    Ok(StepOutput {
        doc: replace_at(&rp, index, node.with_attrs(merged)),
        map: StepMap::identity(),
        inverse: vec![Step::SetAttrs {
            pos,
            attrs: previous,
        }],
    })
}

/// Text runs in `from..to` whose parent accepts marks, clipped to the range
fn text_segments(doc: &Node, from: usize, to: usize) -> Vec<(usize, usize, MarkSet)> {
    let mut segments = Vec::new();
    doc.nodes_between(from, to, |node, pos, parent, _| {
        if node.is_text() && parent.node_type().allows_marks() {
            segments.push((
                from.max(pos),
                to.min(pos + node.text_len()),
                node.marks().clone(),
            ));
        }
        true
    });
    segments
}

/// Rebuild every node overlapping `from..to`, passing each clipped text run
/// and its parent to `f`
fn map_text(
    node: &Node,
    content_start: usize,
    from: usize,
    to: usize,
    f: &mut dyn FnMut(&Node, &Node) -> Node,
) -> Node {
    let mut children = Vec::with_capacity(node.child_count());
    for (index, child) in node.content().iter().enumerate() {
        let start = content_start + node.content().child_start(index);
        let end = start + child.size();
        if end <= from || start >= to || child.is_leaf() {
            children.push(child.clone());
        } else if child.is_text() {
            let len = child.text_len();
            let a = from.saturating_sub(start);
            let b = (to - start).min(len);
            children.push(child.cut_text(0, a));
            children.push(f(&child.cut_text(a, b), node));
            children.push(child.cut_text(b, len));
        } else {
            children.push(map_text(child, start + 1, from, to, f));
        }
    }
    node.with_content(Fragment::from_nodes(children))
}

fn check_range(doc: &Node, from: usize, to: usize) -> StepResult<()> {
    if from > to {
        return Err(StepError::invalid(format!("range {}..{} is reversed", from, to)));
    }
    doc.resolve(to)?;
    Ok(())
}

fn apply_add_mark(doc: &Node, from: usize, to: usize, mark: &Mark) -> StepResult<StepOutput> {
    check_range(doc, from, to)?;
    let mark_type = mark.mark_type;
    validate_attrs(mark_type.name(), mark_type.attr_specs(), &mark.attrs).map_err(schema)?;

    let mut inverse = Vec::new();
    for (a, b, marks) in text_segments(doc, from, to) {
        if mark.is_in_set(&marks) {
            continue;
        }
        let excluded: Vec<&Mark> = marks
            .iter()
            .filter(|m| mark_type.excludes(m.mark_type))
            .collect();
        if excluded.is_empty() {
            inverse.push(Step::RemoveMark {
                from: a,
                to: b,
                mark_type,
            });
        } else {
            inverse.extend(excluded.into_iter().map(|m| Step::AddMark {
                from: a,
                to: b,
                mark: m.clone(),
            }));
        }
    }

    let doc = map_text(doc, 0, from, to, &mut |text, parent| {
        if parent.node_type().allows_marks() {
            text.with_marks(mark.add_to_set(text.marks()))
        } else {
            text.clone()
        }
    });
    Ok(StepOutput {
        doc,
        map: StepMap::identity(),
        inverse,
    })
}

fn apply_remove_mark(
    doc: &Node,
    from: usize,
    to: usize,
    mark_type: MarkType,
) -> StepResult<StepOutput> {
    check_range(doc, from, to)?;

    let inverse = text_segments(doc, from, to)
        .into_iter()
        .filter_map(|(a, b, marks)| {
            find_mark(&marks, mark_type).map(|m| Step::AddMark {
                from: a,
                to: b,
                mark: m.clone(),
            })
        })
        .collect();

    let doc = map_text(doc, 0, from, to, &mut |text, _| {
        text.with_marks(remove_mark_type(text.marks(), mark_type))
    });
    Ok(StepOutput {
        doc,
        map: StepMap::identity(),
        inverse,
    })
}

/// Content of a textblock converted to fit `target`
fn convert_content(node: &Node, target: NodeType) -> Fragment {
    if target.allows_marks() {
        return node.content().clone();
    }
    node.content()
        .iter()
        .map(|child| {
            if child.is_text() {
                child.with_marks(MarkSet::new())
            } else {
                // hard breaks become newlines, keeping the size
                Node::new_text("\n", MarkSet::new())
            }
        })
        .collect()
}

fn apply_set_block_type(
    doc: &Node,
    pos: usize,
    node_type: NodeType,
    attrs: &Attrs,
) -> StepResult<StepOutput> {
    let (rp, index, node) = node_starting_at(doc, pos)?;
    if !node.is_textblock() || !node_type.is_textblock() {
        return Err(StepError::invalid(format!(
            "cannot change {} into {}",
            node.node_type(),
            node_type
        )));
    }

    let attrs = complete_attrs(node_type.name(), node_type.attr_specs(), attrs).map_err(schema)?;
    let content = convert_content(&node, node_type);
    let lossless = content == *node.content();
    let converted = node.with_type(node_type, attrs).with_content(content);
    converted.check_level().map_err(schema)?;

    let inverse = if lossless {
        vec![Step::SetBlockType {
            pos,
            node_type: node.node_type(),
            attrs: node.attrs().clone(),
        }]
    } else {
        let size = node.size();
        vec![
            Step::Insert {
                pos,
                content: Fragment::from_node(node.clone()),
            },
            Step::Delete {
                from: pos + size,
                to: pos + size + converted.size(),
            },
        ]
    };

    Ok(StepOutput {
        doc: replace_at(&rp, index, converted),
        map: StepMap::identity(),
        inverse,
    })
}

fn apply_split(
    doc: &Node,
    pos: usize,
    depth: usize,
    after: Option<&(NodeType, Attrs)>,
) -> StepResult<StepOutput> {
    let rp = doc.resolve(pos)?;
    if depth == 0 || depth > rp.depth() {
        return Err(StepError::invalid(format!(
            "cannot split {} levels at {}",
            depth, pos
        )));
    }
    let base = rp.depth() - depth;

    let inner = rp.parent();
    let (before, rest) = inner.content().split_at(rp.parent_offset).map_err(schema)?;
    let mut left = inner.with_content(Fragment::from_nodes(before));
    let right_markup = match after {
        Some((node_type, attrs)) => {
            let attrs =
                complete_attrs(node_type.name(), node_type.attr_specs(), attrs).map_err(schema)?;
            inner.with_type(*node_type, attrs)
        }
        None => inner.clone(),
    };
    let mut right = right_markup.with_content(Fragment::from_nodes(rest));
    left.check_level().map_err(schema)?;
    right.check_level().map_err(schema)?;

    for d in (base + 1..rp.depth()).rev() {
        let node = rp.node(d);
        let index = rp.index(d);
        let children = node.content().children();
        left = node.with_content(Fragment::from_nodes(
            children[..index].iter().cloned().chain([left]),
        ));
        right = node.with_content(Fragment::from_nodes(
            [right].into_iter().chain(children[index + 1..].iter().cloned()),
        ));
        left.check_level().map_err(schema)?;
        right.check_level().map_err(schema)?;
    }

    let base_node = rp.node(base);
    let index = rp.index(base);
    let children = base_node.content().children();
    let new_base = base_node.with_content(Fragment::from_nodes(
        children[..index]
            .iter()
            .cloned()
            .chain([left, right])
            .chain(children[index + 1..].iter().cloned()),
    ));
    new_base.check_level().map_err(schema)?;

    Ok(StepOutput {
        doc: rp.rebuild(base, new_base),
        map: StepMap::new(pos, 0, 2 * depth),
        inverse: vec![Step::Join {
            pos: pos + depth,
            depth,
        }],
    })
}

/// Merge `b` into `a`, `depth` levels deep. Also returns the innermost
/// nodes of both sides.
fn join_nodes(a: &Node, b: &Node, depth: usize) -> StepResult<(Node, Node, Node)> {
    if a.is_text() || a.is_leaf() || b.is_text() || b.is_leaf() {
        return Err(StepError::invalid("only container nodes can be joined"));
    }
    if depth == 1 {
        let merged = a.with_content(a.content().append(b.content()));
        merged.check_level().map_err(schema)?;
        return Ok((merged, a.clone(), b.clone()));
    }
    if !a.same_markup(b) {
        return Err(StepError::invalid(format!(
            "cannot join {} with {}",
            a.node_type(),
            b.node_type()
        )));
    }
    let (Some(last), Some(first)) = (a.content().last_child(), b.content().first_child()) else {
        return Err(StepError::invalid("nothing to join"));
    };
    let (inner, inner_a, inner_b) = join_nodes(last, first, depth - 1)?;

    let a_children = a.content().children();
    let b_children = b.content().children();
    let merged = a.with_content(Fragment::from_nodes(
        a_children[..a_children.len() - 1]
            .iter()
            .cloned()
            .chain([inner])
            .chain(b_children[1..].iter().cloned()),
    ));
    merged.check_level().map_err(schema)?;
    Ok((merged, inner_a, inner_b))
}

fn apply_join(doc: &Node, pos: usize, depth: usize) -> StepResult<StepOutput> {
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();
    let index = rp.index(rp.depth());
    if depth == 0 || rp.text_offset() != 0 || index == 0 {
        return Err(StepError::invalid(format!("nothing to join at {}", pos)));
    }
    let (Some(a), Some(b)) = (parent.child(index - 1), parent.child(index)) else {
        return Err(StepError::invalid(format!("nothing to join at {}", pos)));
    };
    let (merged, inner_a, inner_b) = join_nodes(a, b, depth)?;

    let children = parent.content().children();
    let new_parent = parent.with_content(Fragment::from_nodes(
        children[..index - 1]
            .iter()
            .cloned()
            .chain([merged])
            .chain(children[index + 1..].iter().cloned()),
    ));
    new_parent.check_level().map_err(schema)?;

    let after = (!inner_a.same_markup(&inner_b))
        .then(|| (inner_b.node_type(), inner_b.attrs().clone()));
    Ok(StepOutput {
        doc: rp.rebuild(rp.depth(), new_parent),
        map: StepMap::new(pos - depth, 2 * depth, 0),
        inverse: vec![Step::Split {
            pos: pos - depth,
            depth,
            after,
        }],
    })
}
