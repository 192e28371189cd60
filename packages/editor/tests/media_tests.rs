//! Image views driven through the editor

mod common;

use common::editor;
use quire_editor::{commands, EventKind, ListenerTarget, NodeView, Point, Size};
use quire_model::{Attrs, Selection};

const DOC: &str =
    r#"<doc><paragraph>ab</paragraph><image src="a.png" width="200" height="100"/></doc>"#;

#[test]
fn test_views_mount_for_images() {
    let editor = editor(DOC);
    assert_eq!(editor.views().len(), 1);
    let id = editor.views().view_at(4).unwrap();

    let render = editor.views().get(id).unwrap().render();
    assert_eq!(render.src, "a.png");
    assert_eq!(render.width, Some(200.0));
    assert_eq!(render.align, "center");
    assert!(!render.show_toolbar);
    assert_eq!(editor.listeners().active_count(), 3);
}

#[test]
fn test_view_follows_its_node() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();

    editor.type_text("x").unwrap();
    assert_eq!(editor.views().position(id), Some(5));
    assert_eq!(editor.views().created_count(), 1);
    assert_eq!(editor.views().get(id).unwrap().update_count(), 0);
}

#[test]
fn test_drag_resize_commits_once() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();

    assert!(editor.image_resize_start(id, Point::new(0.0, 0.0), None));
    assert!(editor
        .listeners()
        .listens(ListenerTarget::Document, EventKind::PointerMove));

    editor.pointer_move(Point::new(10.0, 10.0));
    editor.pointer_move(Point::new(300.0, 300.0));
    assert_eq!(editor.host().frames, 1);

    let frame = editor.animation_frame();
    assert_eq!(frame.len(), 1);
    assert_eq!(frame[0].0, id);
    assert_eq!(frame[0].1.width.round(), 441.0);
    assert!(editor.views().get(id).unwrap().render().lift_max_width);
    // no content change until the drag ends
    assert!(editor.host().contents.is_empty());

    editor.pointer_up(Point::new(300.0, 300.0)).unwrap();
    assert_eq!(
        editor.get_content(),
        r#"<doc><paragraph>ab</paragraph><image src="a.png" width="441" height="221"/></doc>"#
    );
    assert_eq!(editor.history().undo_levels(), 1);
    assert_eq!(editor.history().undo_description(), Some("Resize image"));
    assert!(!editor
        .listeners()
        .listens(ListenerTarget::Document, EventKind::PointerMove));

    let view = editor.views().get(id).unwrap();
    assert_eq!(view.update_count(), 1);
    assert!(!view.render().resizing);

    editor.undo().unwrap();
    assert_eq!(editor.get_content(), DOC);
}

#[test]
fn test_resize_is_clamped() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();

    editor.image_resize_start(id, Point::new(0.0, 0.0), Some(Size::new(200.0, 100.0)));
    editor.pointer_up(Point::new(-500.0, -500.0)).unwrap();
    assert!(editor.get_content().contains(r#"width="100" height="50""#));
}

#[test]
fn test_image_deleted_mid_drag() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();
    editor.image_resize_start(id, Point::new(0.0, 0.0), None);
    assert_eq!(editor.listeners().active_count(), 5);

    let mut tr = editor.state().tr();
    tr.delete(4, 5).unwrap();
    editor.dispatch(tr).unwrap();

    assert!(editor.views().is_empty());
    assert_eq!(editor.listeners().active_count(), 0);
    assert_eq!(editor.listeners().released_count(), 5);

    let content = editor.get_content();
    editor.pointer_up(Point::new(300.0, 300.0)).unwrap();
    assert_eq!(editor.get_content(), content);
    assert_eq!(editor.history().undo_levels(), 1);
}

#[test]
fn test_toolbar_needs_hover_or_selection() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();
    assert!(!editor.image_set_align(id, "left").unwrap());

    editor.image_hover(id, true);
    assert!(editor.image_set_align(id, "left").unwrap());
    assert!(editor.get_content().contains(r#"align="left""#));
    assert!(editor.image_set_align(id, "diagonal").is_err());

    editor.image_hover(id, false);
    assert!(!editor.views().get(id).unwrap().toolbar_visible());
}

#[test]
fn test_node_selection_shows_toolbar() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();
    let image = editor.doc().child(1).unwrap().clone();

    let mut tr = editor.state().tr();
    tr.set_selection(Selection::node(4, &image));
    editor.dispatch(tr).unwrap();
    assert!(editor.views().get(id).unwrap().toolbar_visible());
    assert!(editor.active_state().image.is_some());

    assert!(editor.image_remove(id).unwrap());
    assert_eq!(editor.get_content(), "<doc><paragraph>ab</paragraph></doc>");
    assert!(editor.views().is_empty());
    assert_eq!(editor.views().destroyed_count(), 1);
}

#[test]
fn test_inserted_image_is_selected() {
    let mut editor = editor("<doc><paragraph>ab</paragraph></doc>");
    let mut attrs = Attrs::new();
    attrs.insert("src".to_string(), "b.png".into());
    editor.run(|tr| commands::insert_image(tr, &attrs)).unwrap();

    assert_eq!(editor.views().len(), 1);
    let id = editor.views().ids()[0];
    assert!(editor.views().get(id).unwrap().toolbar_visible());
}

#[test]
fn test_events_for_unknown_views_are_ignored() {
    let mut editor = editor(DOC);
    let id = editor.views().view_at(4).unwrap();
    let mut tr = editor.state().tr();
    tr.delete(4, 5).unwrap();
    editor.dispatch(tr).unwrap();

    assert!(!editor.image_resize_start(id, Point::default(), None));
    assert!(!editor.image_remove(id).unwrap());
    editor.image_hover(id, true);
}

#[test]
fn test_dropping_editor_releases_listeners() {
    let editor = editor(DOC);
    let listeners = editor.listeners().clone();
    assert_eq!(listeners.active_count(), 3);

    drop(editor);
    assert_eq!(listeners.active_count(), 0);
    assert_eq!(listeners.released_count(), 3);
}
