//! # Command Palette
//!
//! Typing the trigger character in a paragraph opens a menu of structural
//! commands filtered by the text typed after the trigger.
//!
//! ```text
//! Closed --trigger typed in paragraph--> Open
//! Open   --typing inside the query-----> Open (query updated)
//! Open   --Enter / click---------------> Closed (query deleted, command applied)
//! Open   --Escape / click outside /
//!          caret leaves the query------> Closed (document untouched)
//! ```
//!
//! The menu position is computed once, when the palette opens. Its document
//! listeners live only as long as the palette is open.

pub mod commands;
pub mod filter;
pub mod position;

pub use commands::{default_commands, HostRequest, PaletteAction, PaletteCommand};
pub use filter::filter_commands;
pub use position::{position_menu, MenuPosition, Placement};

use crate::config::PaletteConfig;
use crate::errors::StepResult;
use crate::geometry::CaretGeometry;
use crate::listeners::{EventKind, ListenerGuard, ListenerRegistry, ListenerTarget};
use crate::mapping::Mapping;
use crate::state::EditorState;
use crate::transaction::{InputKind, Transaction};
use quire_model::{NodeType, Selection};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The palette is closed or matches nothing; the key belongs to the editor
    Ignored,
    Handled,
    /// Run the item at this index
    Confirm(usize),
    Dismissed,
}

#[derive(Debug)]
pub struct OpenPalette {
    /// Position of the trigger character
    trigger: usize,
    query: String,
    highlighted: usize,
    position: Option<MenuPosition>,
    _listeners: Vec<ListenerGuard>,
}

#[derive(Debug, Default)]
pub enum PaletteState {
    #[default]
    Closed,
    Open(OpenPalette),
}

#[derive(Debug)]
pub struct Palette {
    commands: Vec<PaletteCommand>,
    config: PaletteConfig,
    listeners: ListenerRegistry,
    state: PaletteState,
}

impl Palette {
    pub fn new(config: PaletteConfig, listeners: ListenerRegistry) -> Self {
        Self::with_commands(default_commands(), config, listeners)
    }

    pub fn with_commands(
        commands: Vec<PaletteCommand>,
        config: PaletteConfig,
        listeners: ListenerRegistry,
    ) -> Self {
        Self {
            commands,
            config,
            listeners,
            state: PaletteState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PaletteState::Open(_))
    }

    fn open(&self) -> Option<&OpenPalette> {
        match &self.state {
            PaletteState::Open(open) => Some(open),
            PaletteState::Closed => None,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.open().map(|open| open.query.as_str())
    }

    pub fn trigger_pos(&self) -> Option<usize> {
        self.open().map(|open| open.trigger)
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.open().map(|open| open.highlighted)
    }

    pub fn position(&self) -> Option<MenuPosition> {
        self.open().and_then(|open| open.position)
    }

    /// Commands matching the current query
    pub fn items(&self) -> Vec<&PaletteCommand> {
        match self.open() {
            Some(open) => filter_commands(&self.commands, &open.query),
            None => Vec::new(),
        }
    }

    /// Called after typed text was committed. Opens the palette when the
    /// text is the trigger and the caret sits in a paragraph.
    pub fn text_typed(&mut self, state: &EditorState, text: &str, geometry: Option<CaretGeometry>) -> bool {
        if self.is_open() || text.chars().ne(std::iter::once(self.config.trigger)) {
            return false;
        }
        let selection = state.selection();
        if !selection.is_caret() || selection.head == 0 {
            return false;
        }
        let trigger = selection.head - 1;
        if query_at(state, trigger, self.config.trigger).is_none() {
            return false;
        }

        let listeners = vec![
            self.listeners.listen(ListenerTarget::Document, EventKind::PointerDown),
            self.listeners.listen(ListenerTarget::Document, EventKind::KeyDown),
        ];
        self.state = PaletteState::Open(OpenPalette {
            trigger,
            query: String::new(),
            highlighted: 0,
            position: geometry.map(|geometry| position_menu(&geometry, &self.config)),
            _listeners: listeners,
        });
        debug!(trigger, "palette opened");
        true
    }

    /// Follow a committed transaction. Closes when the caret leaves the
    /// query or the trigger is gone.
    pub fn sync(&mut self, state: &EditorState, mapping: &Mapping) {
        let PaletteState::Open(open) = &mut self.state else {
            return;
        };
        let mapped = mapping.map_result(open.trigger);
        let query = if mapped.deleted {
            None
        } else {
            query_at(state, mapped.pos, self.config.trigger)
        };
        match query {
            Some(query) => {
                open.trigger = mapped.pos;
                if open.query != query {
                    open.query = query;
                    open.highlighted = 0;
                }
            }
            None => self.close("caret left the query"),
        }
    }

    pub fn key_down(&mut self, key: PaletteKey) -> KeyOutcome {
        let count = self.items().len();
        let PaletteState::Open(open) = &mut self.state else {
            return KeyOutcome::Ignored;
        };
        match key {
            PaletteKey::ArrowDown | PaletteKey::ArrowUp | PaletteKey::Enter if count == 0 => {
                KeyOutcome::Ignored
            }
            PaletteKey::ArrowDown => {
                open.highlighted = (open.highlighted + 1) % count;
                KeyOutcome::Handled
            }
            PaletteKey::ArrowUp => {
                open.highlighted = (open.highlighted + count - 1) % count;
                KeyOutcome::Handled
            }
            PaletteKey::Enter => KeyOutcome::Confirm(open.highlighted.min(count - 1)),
            PaletteKey::Escape => {
                self.close("escape");
                KeyOutcome::Dismissed
            }
            _ => KeyOutcome::Handled,
        }
    }

    /// Pointer down outside the menu
    pub fn pointer_down_outside(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.close("pointer down outside");
        true
    }

    pub fn close(&mut self, reason: &str) {
        if let PaletteState::Open(open) = std::mem::take(&mut self.state) {
            debug!(trigger = open.trigger, reason, "palette closed");
        }
    }

    /// Build the transaction running item `index`: the trigger and query
    /// are deleted and the command applied in the same transaction.
    pub fn commit(
        &mut self,
        state: &EditorState,
        index: usize,
    ) -> StepResult<Option<(Transaction, Option<HostRequest>)>> {
        let Some(trigger) = self.trigger_pos() else {
            return Ok(None);
        };
        let Some(command) = self.items().get(index).map(|command| (*command).clone()) else {
            return Ok(None);
        };
        if query_at(state, trigger, self.config.trigger).is_none() {
            self.close("stale palette");
            return Ok(None);
        }

        let mut tr = state.tr();
        tr.delete(trigger, state.selection().head)?
            .set_selection(Selection::caret(trigger));
        let request = command.action.apply(&mut tr)?;
        tr.set_input(InputKind::Palette)
            .set_description(command.title.clone());
        self.close("command selected");
        Ok(Some((tr, request)))
    }
}

/// Query typed after the trigger at `trigger`, if the caret is still
/// behind it in the same paragraph
fn query_at(state: &EditorState, trigger: usize, trigger_char: char) -> Option<String> {
    let selection = state.selection();
    let head = selection.head;
    if !selection.is_caret() || head <= trigger {
        return None;
    }
    let doc = state.doc();
    let at_trigger = doc.resolve(trigger).ok()?;
    let at_head = doc.resolve(head).ok()?;
    if !at_trigger.same_parent(&at_head) || at_head.parent().node_type() != NodeType::Paragraph {
        return None;
    }
    let between = doc.text_between(trigger, head, "");
    let mut typed = between.chars();
    if typed.next() != Some(trigger_char) {
        return None;
    }
    Some(typed.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands;
    use quire_model::build::*;

    fn palette() -> (Palette, ListenerRegistry) {
        let listeners = ListenerRegistry::new();
        (Palette::new(PaletteConfig::default(), listeners.clone()), listeners)
    }

    /// Type `text` at the caret and feed the palette like the editor does
    fn type_text(palette: &mut Palette, state: &EditorState, text: &str) -> EditorState {
        let tr = commands::run(state, |tr| commands::insert_text(tr, text))
            .unwrap()
            .unwrap();
        let (next, applied) = state.apply_transaction(&tr).unwrap();
        palette.sync(&next, &applied.mapping);
        palette.text_typed(&next, text, None);
        next
    }

    #[test]
    fn test_opens_in_paragraph_only() {
        let (mut palette, listeners) = palette();
        let state = EditorState::new(doc(vec![heading(1, vec![])]));
        type_text(&mut palette, &state, "/");
        assert!(!palette.is_open());

        let state = EditorState::new(doc(vec![code_block(None, "")]));
        type_text(&mut palette, &state, "/");
        assert!(!palette.is_open());

        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        type_text(&mut palette, &state, "/");
        assert!(palette.is_open());
        assert_eq!(palette.query(), Some(""));
        assert_eq!(palette.items().len(), 10);
        assert_eq!(listeners.active_count(), 2);
    }

    #[test]
    fn test_query_filters_items() {
        let (mut palette, _) = palette();
        let mut state = EditorState::new(doc(vec![paragraph(vec![])]));
        for text in ["/", "代"] {
            state = type_text(&mut palette, &state, text);
        }
        assert_eq!(palette.query(), Some("代"));
        let titles: Vec<_> = palette.items().iter().map(|c| c.title.clone()).collect();
        assert_eq!(titles, vec!["代码块"]);
    }

    #[test]
    fn test_commit_deletes_query_in_same_transaction() {
        let (mut palette, listeners) = palette();
        let mut state = EditorState::new(doc(vec![paragraph(vec![])]));
        for text in ["/", "代", "码", "块"] {
            state = type_text(&mut palette, &state, text);
        }
        assert_eq!(palette.query(), Some("代码块"));

        let (tr, request) = palette.commit(&state, 0).unwrap().unwrap();
        assert_eq!(request, None);
        assert_eq!(tr.input(), InputKind::Palette);
        let state = state.apply(&tr).unwrap();
        assert_eq!(state.doc(), &doc(vec![code_block(None, "")]));
        assert_eq!(state.selection(), Selection::caret(1));
        assert!(!palette.is_open());
        assert_eq!(listeners.active_count(), 0);
    }

    #[test]
    fn test_keyboard_navigation() {
        let (mut palette, _) = palette();
        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        let state = type_text(&mut palette, &state, "/");

        assert_eq!(palette.key_down(PaletteKey::ArrowUp), KeyOutcome::Handled);
        assert_eq!(palette.highlighted(), Some(9));
        palette.key_down(PaletteKey::ArrowDown);
        palette.key_down(PaletteKey::ArrowDown);
        assert_eq!(palette.key_down(PaletteKey::Enter), KeyOutcome::Confirm(1));

        let (tr, _) = palette.commit(&state, 1).unwrap().unwrap();
        let state = state.apply(&tr).unwrap();
        assert_eq!(state.doc(), &doc(vec![heading(2, vec![])]));
    }

    #[test]
    fn test_keys_pass_through_without_matches() {
        let (mut palette, _) = palette();
        let mut state = EditorState::new(doc(vec![paragraph(vec![])]));
        for text in ["/", "z", "z"] {
            state = type_text(&mut palette, &state, text);
        }
        assert!(palette.is_open());
        assert!(palette.items().is_empty());
        assert_eq!(palette.key_down(PaletteKey::Enter), KeyOutcome::Ignored);
        assert_eq!(palette.key_down(PaletteKey::ArrowDown), KeyOutcome::Ignored);
        assert_eq!(palette.key_down(PaletteKey::ArrowUp), KeyOutcome::Ignored);
        assert_eq!(palette.key_down(PaletteKey::Escape), KeyOutcome::Dismissed);
        assert!(palette.commit(&state, 0).unwrap().is_none());
    }

    #[test]
    fn test_escape_dismisses_without_edit() {
        let (mut palette, listeners) = palette();
        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        type_text(&mut palette, &state, "/");
        assert_eq!(palette.key_down(PaletteKey::Escape), KeyOutcome::Dismissed);
        assert!(!palette.is_open());
        assert_eq!(palette.key_down(PaletteKey::Enter), KeyOutcome::Ignored);
        assert_eq!(listeners.released_count(), 2);
    }

    #[test]
    fn test_caret_leaving_query_closes() {
        let (mut palette, _) = palette();
        let state = EditorState::new(doc(vec![paragraph(vec![text("ab")])]));
        let state = EditorState::with_selection(state.doc().clone(), Selection::caret(3));
        let state = type_text(&mut palette, &state, "/");
        assert!(palette.is_open());

        let mut tr = state.tr();
        tr.set_selection(Selection::caret(1));
        let (state, applied) = state.apply_transaction(&tr).unwrap();
        palette.sync(&state, &applied.mapping);
        assert!(!palette.is_open());
    }

    #[test]
    fn test_link_requests_host_input() {
        let (mut palette, _) = palette();
        let state = EditorState::new(doc(vec![paragraph(vec![])]));
        let state = type_text(&mut palette, &state, "/");
        let (tr, request) = palette.commit(&state, 9).unwrap().unwrap();
        assert_eq!(request, Some(HostRequest::LinkInput));
        assert_eq!(state.apply(&tr).unwrap().doc(), &doc(vec![paragraph(vec![])]));
    }
}
