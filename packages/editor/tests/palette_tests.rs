//! Command palette driven through the editor

mod common;

use common::{editor, geometry};
use quire_editor::{commands, EventKind, HostRequest, KeyOutcome, ListenerTarget, PaletteKey};
use quire_editor::palette::Placement;
use quire_model::Selection;

fn titles(editor: &quire_editor::Editor<common::RecordingHost>) -> Vec<String> {
    editor
        .palette()
        .items()
        .iter()
        .map(|command| command.title.clone())
        .collect()
}

#[test]
fn test_trigger_opens_palette() {
    let mut editor = editor("");
    editor.host_mut().geometry = Some(geometry());
    editor.type_text("/").unwrap();

    let palette = editor.palette();
    assert!(palette.is_open());
    assert_eq!(palette.trigger_pos(), Some(1));
    assert_eq!(palette.items().len(), 10);

    let position = palette.position().unwrap();
    assert_eq!(position.placement, Placement::Below);
    assert_eq!(position.left, 20.0);
    assert_eq!(position.top, 78.0);

    assert!(editor
        .listeners()
        .listens(ListenerTarget::Document, EventKind::KeyDown));
}

#[test]
fn test_trigger_outside_paragraph_is_plain_text() {
    let mut editor = editor("<doc><heading>T</heading></doc>");
    editor.type_text("/").unwrap();
    assert!(!editor.palette().is_open());
    assert_eq!(editor.get_content(), "<doc><heading>/T</heading></doc>");
}

#[test]
fn test_query_filters_commands() {
    let mut editor = editor("");
    for text in ["/", "代"] {
        editor.type_text(text).unwrap();
    }
    assert_eq!(editor.palette().query(), Some("代"));
    assert_eq!(titles(&editor), vec!["代码块"]);

    editor.type_text("x").unwrap();
    assert!(editor.palette().items().is_empty());
}

#[test]
fn test_enter_without_matches_reaches_the_editor() {
    let mut editor = editor("");
    for text in ["/", "代", "x"] {
        editor.type_text(text).unwrap();
    }
    assert!(editor.palette().is_open());
    assert_eq!(
        editor.palette_key(PaletteKey::Enter).unwrap(),
        KeyOutcome::Ignored
    );
    assert_eq!(
        editor.palette_key(PaletteKey::ArrowDown).unwrap(),
        KeyOutcome::Ignored
    );

    editor.run(commands::split_block).unwrap();
    assert_eq!(
        editor.get_content(),
        "<doc><paragraph>/代x</paragraph><paragraph></paragraph></doc>"
    );
    assert!(!editor.palette().is_open());
}

#[test]
fn test_enter_runs_highlighted_command() {
    let mut editor = editor("");
    for text in ["/", "代", "码", "块"] {
        editor.type_text(text).unwrap();
    }
    let reports = editor.host().contents.len();

    assert_eq!(
        editor.palette_key(PaletteKey::Enter).unwrap(),
        KeyOutcome::Confirm(0)
    );
    assert_eq!(editor.get_content(), "<doc><code_block></code_block></doc>");
    assert_eq!(editor.selection(), Selection::caret(1));
    assert_eq!(editor.host().contents.len(), reports + 1);
    assert!(!editor.palette().is_open());
    assert_eq!(editor.listeners().active_count(), 0);

    // the palette edit is its own undo step
    editor.undo().unwrap();
    assert_eq!(
        editor.get_content(),
        "<doc><paragraph>/代码块</paragraph></doc>"
    );
    assert!(!editor.palette().is_open());
}

#[test]
fn test_select_by_click() {
    let mut editor = editor("<doc><paragraph>ab</paragraph></doc>");
    let mut tr = editor.state().tr();
    tr.set_selection(Selection::caret(3));
    editor.dispatch(tr).unwrap();

    editor.type_text("/").unwrap();
    editor.type_text("分").unwrap();
    assert_eq!(titles(&editor), vec!["分割线"]);

    assert!(editor.palette_select(0).unwrap());
    assert_eq!(
        editor.get_content(),
        "<doc><paragraph>ab</paragraph><horizontal_rule/><paragraph></paragraph></doc>"
    );
    assert_eq!(editor.history().undo_description(), Some("分割线"));
}

#[test]
fn test_host_input_commands() {
    let mut editor = editor("");
    editor.type_text("/").unwrap();
    editor.palette_key(PaletteKey::ArrowUp).unwrap();
    assert_eq!(editor.palette().highlighted(), Some(9));
    editor.palette_key(PaletteKey::Enter).unwrap();

    assert_eq!(editor.host().requests, vec![HostRequest::LinkInput]);
    assert_eq!(editor.get_content(), "<doc><paragraph></paragraph></doc>");
}

#[test]
fn test_escape_leaves_document() {
    let mut editor = editor("");
    editor.type_text("/").unwrap();
    let content = editor.get_content();

    assert_eq!(
        editor.palette_key(PaletteKey::Escape).unwrap(),
        KeyOutcome::Dismissed
    );
    assert!(!editor.palette().is_open());
    assert_eq!(editor.get_content(), content);
    assert_eq!(editor.listeners().released_count(), 2);
}

#[test]
fn test_click_outside_closes() {
    let mut editor = editor("");
    editor.type_text("/").unwrap();
    assert!(editor.palette_pointer_down_outside());
    assert!(!editor.palette().is_open());
    assert!(!editor.palette_pointer_down_outside());
}

#[test]
fn test_deleting_trigger_closes() {
    let mut editor = editor("");
    editor.type_text("/").unwrap();
    editor.run(quire_editor::commands::delete_backward).unwrap();
    assert!(!editor.palette().is_open());
    assert_eq!(editor.listeners().active_count(), 0);
}

#[test]
fn test_set_content_closes_palette() {
    let mut editor = editor("");
    editor.type_text("/").unwrap();
    editor.set_content("<doc><paragraph>x</paragraph></doc>").unwrap();
    assert!(!editor.palette().is_open());
    assert_eq!(editor.listeners().active_count(), 0);
}
