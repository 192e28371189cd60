//! # Editing Commands
//!
//! Toolbar, keyboard and palette operations built from steps.
//!
//! Every command works on a [`Transaction`]: it reads the document and the
//! selection from the transaction, adds its steps and reports whether it did
//! anything. Commands therefore compose; the palette deletes its query and
//! runs a command in the same transaction.
//!
//! ```rust
//! use quire_editor::{commands, EditorState};
//! use quire_model::build::*;
//!
//! let state = EditorState::new(doc(vec![paragraph(vec![text("Title")])]));
//! let tr = commands::run(&state, |tr| commands::toggle_heading(tr, 1))
//!     .unwrap()
//!     .unwrap();
//! let state = state.apply(&tr).unwrap();
//! assert_eq!(state.doc(), &doc(vec![heading(1, vec![text("Title")])]));
//! ```

use crate::errors::{StepError, StepResult};
use crate::projector::{range_has_mark, textblocks};
use crate::state::EditorState;
use crate::transaction::{InputKind, Transaction};
use quire_model::build::default_attrs;
use quire_model::mark::{find_mark, remove_mark_type};
use quire_model::schema::TEXT_ALIGNS;
use quire_model::{
    AttrValue, Attrs, ContentRule, Fragment, Mark, MarkSet, MarkType, ModelResult, Node, NodeType,
    ResolvedPos, Selection,
};

/// Run `command` against `state`. Returns the transaction if the command
/// applied.
pub fn run(
    state: &EditorState,
    command: impl FnOnce(&mut Transaction) -> StepResult<bool>,
) -> StepResult<Option<Transaction>> {
    let mut tr = state.tr();
    Ok(command(&mut tr)?.then_some(tr))
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Type text at the selection, replacing selected content
pub fn insert_text(tr: &mut Transaction, text: &str) -> StepResult<bool> {
    let selection = tr.selection();
    let from = selection.from();
    let rp = tr.doc().resolve(from)?;
    if text.is_empty() || !rp.parent().is_textblock() {
        return Ok(false);
    }

    let marks = if rp.parent().node_type().allows_marks() {
        match tr.stored_marks() {
            Some(marks) => marks.clone(),
            None => rp.marks(),
        }
    } else {
        MarkSet::new()
    };

    if !selection.is_caret() {
        delete_range(tr, from, selection.to())?;
    }
    tr.insert_text(from, text, marks)?
        .set_selection(Selection::caret(from + text.chars().count()))
        .set_input(InputKind::Typing);
    Ok(true)
}

/// Delete `from..to`. Ranges spanning sibling textblocks merge them.
pub fn delete_range(tr: &mut Transaction, from: usize, to: usize) -> StepResult<()> {
    let doc = tr.doc().clone();
    let rf = doc.resolve(from)?;
    let rt = doc.resolve(to)?;
    if rf.same_parent(&rt) {
        tr.delete(from, to)?;
        return Ok(());
    }

    let depth = rf.depth();
    let siblings = depth > 0
        && rt.depth() == depth
        && rf.parent().is_textblock()
        && rt.parent().is_textblock()
        && rf.start(depth - 1) == rt.start(depth - 1);
    if !siblings {
        return Err(StepError::invalid(format!(
            "cannot delete {}..{} across unrelated blocks",
            from, to
        )));
    }

    // back to front, so earlier positions stay valid
    tr.delete(rt.start(depth), to)?
        .delete(rf.after(depth), rt.before(depth))?
        .delete(from, rf.end(depth))?
        .join(from + 1, 1)?;
    Ok(())
}

pub fn delete_selection(tr: &mut Transaction) -> StepResult<bool> {
    let selection = tr.selection();
    if selection.is_caret() {
        return Ok(false);
    }
    delete_range(tr, selection.from(), selection.to())?;
    tr.set_selection(Selection::caret(selection.from()))
        .set_input(InputKind::Delete);
    Ok(true)
}

/// Backspace
pub fn delete_backward(tr: &mut Transaction) -> StepResult<bool> {
    let selection = tr.selection();
    if !selection.is_caret() {
        return delete_selection(tr);
    }
    let pos = selection.head;
    let doc = tr.doc().clone();
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();

    if !parent.is_textblock() {
        return match rp.node_before() {
            Some(node) if node.is_atom() => {
                tr.delete(pos - 1, pos)?
                    .set_selection(Selection::caret(pos - 1))
                    .set_input(InputKind::Delete);
                Ok(true)
            }
            _ => Ok(false),
        };
    }

    if rp.parent_offset > 0 {
        tr.delete(pos - 1, pos)?
            .set_selection(Selection::caret(pos - 1))
            .set_input(InputKind::Delete);
        return Ok(true);
    }

    let depth = rp.depth();
    let index = rp.index(depth - 1);
    let before = rp.before(depth);
    if index == 0 {
        if parent.node_type() == NodeType::Paragraph {
            return Ok(false);
        }
        tr.set_block_type(before, NodeType::Paragraph, carried_align(parent))?;
        return Ok(true);
    }

    match rp.node(depth - 1).child(index - 1) {
        Some(prev) if prev.is_textblock() => {
            tr.join(before, 1)?
                .set_selection(Selection::caret(pos - 2))
                .set_input(InputKind::Delete);
            Ok(true)
        }
        Some(prev) if prev.is_atom() => {
            tr.delete(before - 1, before)?
                .set_selection(Selection::caret(pos - 1))
                .set_input(InputKind::Delete);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Enter. Splits the textblock, or the list item around it.
pub fn split_block(tr: &mut Transaction) -> StepResult<bool> {
    let selection = tr.selection();
    let pos = selection.from();
    let doc = tr.doc().clone();
    let rp = doc.resolve(pos)?;
    if !rp.parent().is_textblock() {
        return Ok(false);
    }
    if !selection.is_caret() {
        delete_range(tr, pos, selection.to())?;
    }

    let doc = tr.doc().clone();
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();
    if parent.node_type() == NodeType::CodeBlock {
        tr.insert_text(pos, "\n", MarkSet::new())?
            .set_selection(Selection::caret(pos + 1));
        return Ok(true);
    }

    let depth = rp.depth();
    let in_item = depth >= 2 && rp.node(depth - 1).node_type() == NodeType::ListItem;
    let split_depth = if in_item { 2 } else { 1 };
    let at_end = rp.parent_offset == parent.content_size();
    let after = (at_end && parent.node_type() == NodeType::Heading)
        .then(|| (NodeType::Paragraph, carried_align(parent)));

    tr.split(pos, split_depth, after)?
        .set_selection(Selection::caret(pos + 2 * split_depth));
    Ok(true)
}

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

/// Marks the next typed text would get
fn current_marks(tr: &Transaction) -> StepResult<MarkSet> {
    match tr.stored_marks() {
        Some(marks) => Ok(marks.clone()),
        None => Ok(tr.doc().resolve(tr.selection().head)?.marks()),
    }
}

/// Extent of the run of `mark_type` around `pos` inside its textblock
pub fn mark_extent(doc: &Node, pos: usize, mark_type: MarkType) -> StepResult<Option<(usize, usize)>> {
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();
    if !parent.is_textblock() {
        return Ok(None);
    }
    let start = rp.start(rp.depth());
    let mut runs: Vec<(usize, usize, &Mark)> = Vec::new();
    for (index, child) in parent.content().iter().enumerate() {
        let Some(mark) = find_mark(child.marks(), mark_type) else {
            continue;
        };
        let a = start + parent.content().child_start(index);
        let b = a + child.size();
        match runs.last_mut() {
            Some(last) if last.1 == a && last.2 == mark => last.1 = b,
            _ => runs.push((a, b, mark)),
        }
    }
    Ok(runs
        .into_iter()
        .find(|(a, b, _)| *a <= pos && pos <= *b)
        .map(|(a, b, _)| (a, b)))
}

pub fn toggle_mark(tr: &mut Transaction, mark_type: MarkType) -> StepResult<bool> {
    let selection = tr.selection();
    if selection.is_caret() {
        let current = current_marks(tr)?;
        let next = if find_mark(&current, mark_type).is_some() {
            remove_mark_type(&current, mark_type)
        } else {
            Mark::new(mark_type).add_to_set(&current)
        };
        tr.set_stored_marks(Some(next));
        return Ok(true);
    }

    let (from, to) = (selection.from(), selection.to());
    if range_has_mark(tr.doc(), from, to, mark_type) {
        tr.remove_mark(from, to, mark_type)?;
    } else {
        tr.add_mark(from, to, Mark::new(mark_type))?;
    }
    tr.set_input(InputKind::Format);
    Ok(true)
}

/// Apply `mark` to the selection, or to the stored marks for a caret
pub fn set_mark(tr: &mut Transaction, mark: Mark) -> StepResult<bool> {
    let selection = tr.selection();
    if selection.is_caret() {
        let next = mark.add_to_set(&current_marks(tr)?);
        tr.set_stored_marks(Some(next));
    } else {
        tr.add_mark(selection.from(), selection.to(), mark)?
            .set_input(InputKind::Format);
    }
    Ok(true)
}

/// Remove `mark_type` from the selection. A caret inside a marked run
/// clears the whole run.
pub fn unset_mark(tr: &mut Transaction, mark_type: MarkType) -> StepResult<bool> {
    let selection = tr.selection();
    if !selection.is_caret() {
        tr.remove_mark(selection.from(), selection.to(), mark_type)?
            .set_input(InputKind::Format);
        return Ok(true);
    }
    if let Some((from, to)) = mark_extent(tr.doc(), selection.head, mark_type)? {
        tr.remove_mark(from, to, mark_type)?
            .set_input(InputKind::Format);
    }
    let next = remove_mark_type(&current_marks(tr)?, mark_type);
    tr.set_stored_marks(Some(next));
    Ok(true)
}

pub fn set_color(tr: &mut Transaction, color: &str) -> StepResult<bool> {
    set_mark(tr, Mark::color(color))
}

pub fn unset_color(tr: &mut Transaction) -> StepResult<bool> {
    unset_mark(tr, MarkType::Color)
}

pub fn set_highlight(tr: &mut Transaction, color: &str) -> StepResult<bool> {
    set_mark(tr, Mark::highlight(color))
}

pub fn unset_highlight(tr: &mut Transaction) -> StepResult<bool> {
    unset_mark(tr, MarkType::Highlight)
}

/// Link the selection. A caret inside a link updates that link; a caret
/// elsewhere inserts the address as linked text.
pub fn set_link(tr: &mut Transaction, href: &str) -> StepResult<bool> {
    let selection = tr.selection();
    let mark = Mark::link(href);
    if !selection.is_caret() {
        tr.add_mark(selection.from(), selection.to(), mark)?
            .set_input(InputKind::Format);
        return Ok(true);
    }

    let pos = selection.head;
    if let Some((from, to)) = mark_extent(tr.doc(), pos, MarkType::Link)? {
        tr.add_mark(from, to, mark)?.set_input(InputKind::Format);
        return Ok(true);
    }
    let rp = tr.doc().resolve(pos)?;
    if href.is_empty() || !rp.parent().node_type().allows_marks() {
        return Ok(false);
    }
    let marks = mark.add_to_set(&current_marks(tr)?);
    tr.insert_text(pos, href, marks)?
        .set_selection(Selection::new(pos, pos + href.chars().count()))
        .set_input(InputKind::Format);
    Ok(true)
}

pub fn unset_link(tr: &mut Transaction) -> StepResult<bool> {
    unset_mark(tr, MarkType::Link)
}

// ---------------------------------------------------------------------------
// Textblocks
// ---------------------------------------------------------------------------

/// `text_align` of `node`, if it has one
fn carried_align(node: &Node) -> Attrs {
    let mut attrs = Attrs::new();
    if let Some(align) = node.attr("text_align") {
        attrs.insert("text_align".to_string(), align.clone());
    }
    attrs
}

fn selected_textblocks(tr: &Transaction) -> Vec<(usize, Node)> {
    let selection = tr.selection();
    textblocks(tr.doc(), selection.from(), selection.to())
}

pub fn set_text_align(tr: &mut Transaction, align: &str) -> StepResult<bool> {
    if !TEXT_ALIGNS.contains(&align) {
        return Err(StepError::invalid(format!("unknown alignment '{}'", align)));
    }
    let mut changed = false;
    for (pos, node) in selected_textblocks(tr) {
        if node.node_type().attr_spec("text_align").is_none() {
            continue;
        }
        let mut attrs = Attrs::new();
        attrs.insert("text_align".to_string(), align.into());
        tr.set_attrs(pos, attrs)?;
        changed = true;
    }
    if changed {
        tr.set_input(InputKind::Format);
    }
    Ok(changed)
}

/// Change every selected textblock with `attrs_for` deciding the attributes
fn set_textblocks(
    tr: &mut Transaction,
    node_type: NodeType,
    attrs_for: impl Fn(&Node) -> Attrs,
) -> StepResult<bool> {
    let blocks = selected_textblocks(tr);
    if blocks.is_empty() {
        return Ok(false);
    }
    for (pos, node) in blocks {
        tr.set_block_type(pos, node_type, attrs_for(&node))?;
    }
    tr.set_input(InputKind::Format);
    Ok(true)
}

fn all_selected(tr: &Transaction, pred: impl Fn(&Node) -> bool) -> bool {
    let blocks = selected_textblocks(tr);
    !blocks.is_empty() && blocks.iter().all(|(_, node)| pred(node))
}

pub fn set_paragraph(tr: &mut Transaction) -> StepResult<bool> {
    set_textblocks(tr, NodeType::Paragraph, carried_align)
}

/// Turn the selected textblocks into headings of `level`, or back into
/// paragraphs when they already are
pub fn toggle_heading(tr: &mut Transaction, level: i64) -> StepResult<bool> {
    let active = all_selected(tr, |node| {
        node.node_type() == NodeType::Heading && node.attr("level") == Some(&AttrValue::Int(level))
    });
    if active {
        return set_paragraph(tr);
    }
    set_textblocks(tr, NodeType::Heading, |node| {
        let mut attrs = carried_align(node);
        attrs.insert("level".to_string(), AttrValue::Int(level));
        attrs
    })
}

pub fn toggle_code_block(tr: &mut Transaction) -> StepResult<bool> {
    if all_selected(tr, |node| node.node_type() == NodeType::CodeBlock) {
        return set_paragraph(tr);
    }
    set_textblocks(tr, NodeType::CodeBlock, |_| Attrs::new())
}

pub fn set_code_language(tr: &mut Transaction, language: Option<&str>) -> StepResult<bool> {
    let mut changed = false;
    for (pos, node) in selected_textblocks(tr) {
        if node.node_type() != NodeType::CodeBlock {
            continue;
        }
        let mut attrs = Attrs::new();
        attrs.insert("language".to_string(), AttrValue::from(language));
        tr.set_attrs(pos, attrs)?;
        changed = true;
    }
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

/// Consecutive children of a block container covered by the selection
struct BlockRange {
    depth: usize,
    start_index: usize,
    end_index: usize,
    /// Position before the first child
    start: usize,
    /// Position after the last child
    end: usize,
}

impl BlockRange {
    fn at(rp: &ResolvedPos, depth: usize, start_index: usize, end_index: usize) -> Option<Self> {
        let content = rp.node(depth).content();
        let base = rp.start(depth);
        let last = content.child(end_index.checked_sub(1)?)?;
        Some(Self {
            depth,
            start_index,
            end_index,
            start: base + content.child_start(start_index),
            end: base + content.child_start(end_index - 1) + last.size(),
        })
    }

    fn children(&self, rp: &ResolvedPos) -> Vec<Node> {
        rp.node(self.depth).content().children()[self.start_index..self.end_index].to_vec()
    }
}

fn block_range(doc: &Node, selection: Selection) -> StepResult<Option<(ResolvedPos, BlockRange)>> {
    let rf = doc.resolve(selection.from())?;
    let rt = doc.resolve(selection.to())?;

    if selection.selected_node(doc).is_some() {
        let depth = rf.depth();
        let index = rf.index(depth);
        return Ok(BlockRange::at(&rf, depth, index, index + 1).map(|range| (rf, range)));
    }

    let shared = (0..rf.depth().min(rt.depth()))
        .rev()
        .find(|&d| rf.start(d) == rt.start(d));
    let depth = shared.and_then(|shared| {
        (0..=shared)
            .rev()
            .find(|&d| rf.node(d).node_type().content_rule() == ContentRule::Blocks)
    });
    let Some(depth) = depth else {
        return Ok(None);
    };
    let range = BlockRange::at(&rf, depth, rf.index(depth), rt.index(depth) + 1);
    Ok(range.map(|range| (rf, range)))
}

/// Replace the children covered by `range` with `wrapper`
fn wrap_range(tr: &mut Transaction, range: &BlockRange, wrapper: Node) -> StepResult<()> {
    let at = range.start + wrapper.size();
    tr.insert_node(range.start, wrapper)?;
    tr.delete(at, at + (range.end - range.start))?;
    Ok(())
}

/// Replace the node at `pos` with `content`, inserting first so a `block+`
/// parent never goes empty
fn replace_with(tr: &mut Transaction, pos: usize, old: &Node, content: Fragment) -> StepResult<()> {
    let at = pos + content.size();
    tr.insert(pos, content)?;
    tr.delete(at, at + old.size())?;
    Ok(())
}

fn map_selection_with(selection: Selection, f: impl Fn(usize) -> usize) -> Selection {
    Selection::new(f(selection.anchor), f(selection.head))
}

pub fn toggle_blockquote(tr: &mut Transaction) -> StepResult<bool> {
    let selection = tr.selection();
    let doc = tr.doc().clone();
    let rf = doc.resolve(selection.from())?;

    if let Some(depth) = rf.find_ancestor(|node| node.node_type() == NodeType::Blockquote) {
        let quote = rf.node(depth);
        let before = rf.before(depth);
        let after = before + quote.size();
        replace_with(tr, before, quote, quote.content().clone())?;
        tr.set_selection(map_selection_with(selection, |pos| {
            if pos <= before {
                pos
            } else if pos >= after {
                pos - 2
            } else {
                pos - 1
            }
        }))
        .set_input(InputKind::Format);
        return Ok(true);
    }

    let Some((rp, range)) = block_range(&doc, selection)? else {
        return Ok(false);
    };
    let quote = Node::create(NodeType::Blockquote, &Attrs::new(), range.children(&rp))?;
    wrap_range(tr, &range, quote)?;
    tr.set_selection(map_selection_with(selection, |pos| {
        if pos < range.start {
            pos
        } else if pos > range.end {
            pos + 2
        } else {
            pos + 1
        }
    }))
    .set_input(InputKind::Format);
    Ok(true)
}

pub fn toggle_bullet_list(tr: &mut Transaction) -> StepResult<bool> {
    toggle_list(tr, NodeType::BulletList)
}

pub fn toggle_ordered_list(tr: &mut Transaction) -> StepResult<bool> {
    toggle_list(tr, NodeType::OrderedList)
}

/// Wrap the selected blocks in a list of `list_type`, lift them out of such
/// a list, or switch the kind of the surrounding list
pub fn toggle_list(tr: &mut Transaction, list_type: NodeType) -> StepResult<bool> {
    if !list_type.is_list() {
        return Err(StepError::invalid(format!("{} is not a list", list_type)));
    }
    let selection = tr.selection();
    let doc = tr.doc().clone();
    let rf = doc.resolve(selection.from())?;

    if let Some(depth) = rf.find_ancestor(|node| node.node_type().is_list()) {
        let list = rf.node(depth);
        let before = rf.before(depth);

        if list.node_type() != list_type {
            let switched = list.with_type(list_type, default_attrs(list_type));
            replace_with(tr, before, list, Fragment::from_node(switched))?;
            tr.set_selection(selection).set_input(InputKind::Format);
            return Ok(true);
        }

        let blocks: Fragment = list
            .content()
            .iter()
            .flat_map(|item| item.content().iter().cloned().collect::<Vec<_>>())
            .collect();
        let after = before + list.size();
        let items = list.child_count();
        replace_with(tr, before, list, blocks)?;
        tr.set_selection(map_selection_with(selection, |pos| {
            if pos <= before {
                pos
            } else if pos >= after {
                pos - 2 - 2 * items
            } else {
                let (item, _) = list.content().find_index(pos - before - 1);
                pos - 2 - 2 * item
            }
        }))
        .set_input(InputKind::Format);
        return Ok(true);
    }

    let Some((rp, range)) = block_range(&doc, selection)? else {
        return Ok(false);
    };
    let items = range
        .children(&rp)
        .into_iter()
        .map(|block| Node::create(NodeType::ListItem, &Attrs::new(), vec![block]))
        .collect::<ModelResult<Vec<_>>>()?;
    let list = Node::create(list_type, &Attrs::new(), items)?;
    let parent = rp.node(range.depth).content().clone();
    let base = rp.start(range.depth);
    let count = range.end_index - range.start_index;
    wrap_range(tr, &range, list)?;
    tr.set_selection(map_selection_with(selection, |pos| {
        if pos < range.start {
            pos
        } else if pos > range.end {
            pos + 2 + 2 * count
        } else {
            let (index, _) = parent.find_index(pos - base);
            pos + 2 + 2 * (index.min(range.end_index - 1) - range.start_index)
        }
    }))
    .set_input(InputKind::Format);
    Ok(true)
}

// ---------------------------------------------------------------------------
// Block nodes
// ---------------------------------------------------------------------------

/// Insert a block node near `pos`: before the surrounding textblock when
/// `pos` is at its start, after it at its end, otherwise between the halves
/// of a split. Returns the position the node now starts at.
pub fn insert_block_at(tr: &mut Transaction, pos: usize, node: Node) -> StepResult<usize> {
    let doc = tr.doc().clone();
    let rp = doc.resolve(pos)?;
    let parent = rp.parent();
    if !parent.is_textblock() {
        tr.insert_node(pos, node)?;
        return Ok(pos);
    }

    let depth = rp.depth();
    let at = if rp.parent_offset == parent.content_size() {
        rp.after(depth)
    } else if rp.parent_offset == 0 {
        rp.before(depth)
    } else {
        tr.split(pos, 1, None)?;
        pos + 1
    };
    tr.insert_node(at, node)?;
    Ok(at)
}

/// Position to insert a block at: after a selected node, at the start of a
/// replaced range, or at the caret
fn block_insert_pos(tr: &mut Transaction) -> StepResult<usize> {
    let selection = tr.selection();
    if selection.is_caret() {
        return Ok(selection.head);
    }
    if selection.selected_node(tr.doc()).is_some() {
        return Ok(selection.to());
    }
    delete_range(tr, selection.from(), selection.to())?;
    Ok(selection.from())
}

pub fn insert_horizontal_rule(tr: &mut Transaction) -> StepResult<bool> {
    let pos = block_insert_pos(tr)?;
    let rule = Node::create(NodeType::HorizontalRule, &Attrs::new(), vec![])?;
    let after = insert_block_at(tr, pos, rule)? + 1;

    let next = tr.doc().resolve(after)?.node_after();
    if !next.is_some_and(|node| node.is_textblock()) {
        let paragraph = Node::create(NodeType::Paragraph, &Attrs::new(), vec![])?;
        tr.insert_node(after, paragraph)?;
    }
    tr.set_selection(Selection::caret(after + 1))
        .set_input(InputKind::Format);
    Ok(true)
}

/// Insert an image and select it
pub fn insert_image(tr: &mut Transaction, attrs: &Attrs) -> StepResult<bool> {
    let image = Node::create(NodeType::Image, attrs, vec![])?;
    let pos = block_insert_pos(tr)?;
    let at = insert_block_at(tr, pos, image.clone())?;
    tr.set_selection(Selection::node(at, &image))
        .set_input(InputKind::Media);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::build::*;

    fn exec(
        doc: Node,
        selection: Selection,
        command: impl FnOnce(&mut Transaction) -> StepResult<bool>,
    ) -> EditorState {
        let state = EditorState::with_selection(doc, selection);
        let tr = run(&state, command).unwrap().expect("command applied");
        state.apply(&tr).unwrap()
    }

    #[test]
    fn test_insert_text_uses_stored_marks() {
        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        let tr = run(&state, |tr| toggle_mark(tr, MarkType::Bold)).unwrap().unwrap();
        let state = state.apply(&tr).unwrap();
        let tr = run(&state, |tr| insert_text(tr, "hi")).unwrap().unwrap();
        let state = state.apply(&tr).unwrap();
        assert_eq!(state.doc(), &doc(vec![paragraph(vec![marked("hi", vec![Mark::bold()])])]));
        assert_eq!(state.selection(), Selection::caret(3));
        assert_eq!(tr.input(), InputKind::Typing);
    }

    #[test]
    fn test_typing_after_link_does_not_extend_it() {
        let d = doc(vec![paragraph(vec![marked("a", vec![Mark::link("x"), Mark::bold()])])]);
        let state = exec(d, Selection::caret(2), |tr| insert_text(tr, "b"));
        let p = state.doc().child(0).unwrap();
        assert_eq!(p.child(1).unwrap().marks(), &vec![Mark::bold()]);
    }

    #[test]
    fn test_delete_selection_across_paragraphs() {
        // 0 <p> 1 a 2 b 3 </p> 4 <p> 5 c 6 d 7 </p> 8 <p> 9 e 10 f 11
        let d = doc(vec![
            paragraph(vec![text("ab")]),
            paragraph(vec![text("cd")]),
            paragraph(vec![text("ef")]),
        ]);
        let state = exec(d, Selection::new(2, 10), delete_selection);
        assert_eq!(state.doc(), &doc(vec![paragraph(vec![text("af")])]));
        assert_eq!(state.selection(), Selection::caret(2));
    }

    #[test]
    fn test_delete_backward_joins_textblocks() {
        let d = doc(vec![paragraph(vec![text("ab")]), heading(2, vec![text("cd")])]);
        let state = exec(d, Selection::caret(5), delete_backward);
        assert_eq!(state.doc(), &doc(vec![paragraph(vec![text("abcd")])]));
        assert_eq!(state.selection(), Selection::caret(3));
    }

    #[test]
    fn test_delete_backward_removes_image() {
        let d = doc(vec![image("a.png", 10, 10), paragraph(vec![text("a")])]);
        let state = exec(d, Selection::caret(2), delete_backward);
        assert_eq!(state.doc(), &doc(vec![paragraph(vec![text("a")])]));
        assert_eq!(state.selection(), Selection::caret(1));
    }

    #[test]
    fn test_delete_backward_resets_heading() {
        let d = doc(vec![heading(1, vec![text("a")])]);
        let state = exec(d, Selection::caret(1), delete_backward);
        assert_eq!(state.doc(), &doc(vec![paragraph(vec![text("a")])]));
    }

    #[test]
    fn test_split_heading_at_end_makes_paragraph() {
        let d = doc(vec![heading(1, vec![text("T")])]);
        let state = exec(d, Selection::caret(2), split_block);
        assert_eq!(
            state.doc(),
            &doc(vec![heading(1, vec![text("T")]), paragraph(vec![])])
        );
        assert_eq!(state.selection(), Selection::caret(4));
    }

    #[test]
    fn test_split_list_item() {
        let d = doc(vec![bullet_list(vec![list_item(vec![paragraph(vec![text("ab")])])])]);
        let state = exec(d, Selection::caret(4), split_block);
        assert_eq!(
            state.doc(),
            &doc(vec![bullet_list(vec![
                list_item(vec![paragraph(vec![text("a")])]),
                list_item(vec![paragraph(vec![text("b")])]),
            ])])
        );
        assert_eq!(state.selection(), Selection::caret(8));
    }

    #[test]
    fn test_split_code_block_inserts_newline() {
        let d = doc(vec![code_block(None, "ab")]);
        let state = exec(d, Selection::caret(2), split_block);
        assert_eq!(state.doc(), &doc(vec![code_block(None, "a\nb")]));
    }

    #[test]
    fn test_toggle_mark_on_range() {
        let d = doc(vec![paragraph(vec![text("abc")])]);
        let state = exec(d.clone(), Selection::new(1, 3), |tr| toggle_mark(tr, MarkType::Italic));
        assert_eq!(
            state.doc(),
            &doc(vec![paragraph(vec![marked("ab", vec![Mark::italic()]), text("c")])])
        );
        let state = exec(state.doc().clone(), Selection::new(1, 3), |tr| {
            toggle_mark(tr, MarkType::Italic)
        });
        assert_eq!(state.doc(), &d);
    }

    #[test]
    fn test_unset_link_at_caret_clears_run() {
        let d = doc(vec![paragraph(vec![
            text("x"),
            marked("link", vec![Mark::link("https://a.b")]),
            text("y"),
        ])]);
        let state = exec(d, Selection::caret(4), unset_link);
        assert_eq!(state.doc(), &doc(vec![paragraph(vec![text("xlinky")])]));
    }

    #[test]
    fn test_set_link_at_caret_inserts_address() {
        let d = doc(vec![paragraph(vec![])]);
        let state = exec(d, Selection::caret(1), |tr| set_link(tr, "a.b"));
        assert_eq!(
            state.doc(),
            &doc(vec![paragraph(vec![marked("a.b", vec![Mark::link("a.b")])])])
        );
        assert_eq!(state.selection(), Selection::new(1, 4));
    }

    #[test]
    fn test_set_text_align() {
        let d = doc(vec![paragraph(vec![text("a")]), heading(2, vec![text("b")])]);
        let state = exec(d, Selection::new(1, 5), |tr| set_text_align(tr, "center"));
        for block in state.doc().content().iter() {
            assert_eq!(block.attr("text_align"), Some(&AttrValue::from("center")));
        }

        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        assert!(run(&state, |tr| set_text_align(tr, "middle")).is_err());
    }

    #[test]
    fn test_toggle_heading_round_trip() {
        let d = doc(vec![aligned_paragraph("right", vec![text("a")])]);
        let state = exec(d.clone(), Selection::caret(1), |tr| toggle_heading(tr, 3));
        let h = state.doc().child(0).unwrap();
        assert_eq!(h.node_type(), NodeType::Heading);
        assert_eq!(h.attr("text_align"), Some(&AttrValue::from("right")));

        let state = exec(state.doc().clone(), Selection::caret(1), |tr| toggle_heading(tr, 3));
        assert_eq!(state.doc(), &d);
    }

    #[test]
    fn test_code_block_language() {
        let d = doc(vec![paragraph(vec![marked("x", vec![Mark::bold()])])]);
        let state = exec(d, Selection::caret(1), toggle_code_block);
        let state = exec(state.doc().clone(), Selection::caret(1), |tr| {
            set_code_language(tr, Some("rust"))
        });
        assert_eq!(state.doc(), &doc(vec![code_block(Some("rust"), "x")]));
    }

    #[test]
    fn test_toggle_blockquote() {
        let d = doc(vec![paragraph(vec![text("a")]), paragraph(vec![text("b")])]);
        let state = exec(d.clone(), Selection::new(1, 5), toggle_blockquote);
        assert_eq!(
            state.doc(),
            &doc(vec![blockquote(vec![
                paragraph(vec![text("a")]),
                paragraph(vec![text("b")]),
            ])])
        );
        assert_eq!(state.selection(), Selection::new(2, 6));

        let state = exec(state.doc().clone(), state.selection(), toggle_blockquote);
        assert_eq!(state.doc(), &d);
        assert_eq!(state.selection(), Selection::new(1, 5));
    }

    #[test]
    fn test_toggle_list_wrap_switch_unwrap() {
        let d = doc(vec![paragraph(vec![text("a")]), paragraph(vec![text("b")])]);
        let state = exec(d.clone(), Selection::new(1, 5), toggle_bullet_list);
        assert_eq!(
            state.doc(),
            &doc(vec![bullet_list(vec![
                list_item(vec![paragraph(vec![text("a")])]),
                list_item(vec![paragraph(vec![text("b")])]),
            ])])
        );
        // 0 <ul> 1 <li> 2 <p> 3 a 4 </p> 5 </li> 6 <li> 7 <p> 8 b 9
        assert_eq!(state.selection(), Selection::new(3, 9));

        let state = exec(state.doc().clone(), state.selection(), toggle_ordered_list);
        assert_eq!(state.doc().child(0).unwrap().node_type(), NodeType::OrderedList);
        assert_eq!(state.selection(), Selection::new(3, 9));

        let state = exec(state.doc().clone(), state.selection(), toggle_ordered_list);
        assert_eq!(state.doc(), &d);
        assert_eq!(state.selection(), Selection::new(1, 5));
    }

    #[test]
    fn test_horizontal_rule_splits_paragraph() {
        let d = doc(vec![paragraph(vec![text("ab")])]);
        let state = exec(d, Selection::caret(2), insert_horizontal_rule);
        assert_eq!(
            state.doc(),
            &doc(vec![
                paragraph(vec![text("a")]),
                horizontal_rule(),
                paragraph(vec![text("b")]),
            ])
        );
        assert_eq!(state.selection(), Selection::caret(5));
    }

    #[test]
    fn test_horizontal_rule_at_end_adds_paragraph() {
        let d = doc(vec![paragraph(vec![text("a")])]);
        let state = exec(d, Selection::caret(2), insert_horizontal_rule);
        assert_eq!(
            state.doc(),
            &doc(vec![paragraph(vec![text("a")]), horizontal_rule(), paragraph(vec![])])
        );
        assert_eq!(state.selection(), Selection::caret(5));
    }

    #[test]
    fn test_insert_image_selects_it() {
        let d = doc(vec![paragraph(vec![text("a")])]);
        let mut attrs = Attrs::new();
        attrs.insert("src".into(), "a.png".into());
        let state = exec(d, Selection::caret(1), |tr| insert_image(tr, &attrs));
        assert_eq!(state.doc().child(0).unwrap().node_type(), NodeType::Image);
        assert_eq!(state.selection(), Selection::new(0, 1));
    }
}
