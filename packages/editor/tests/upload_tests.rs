//! Image uploads through paste, drop and the file picker

mod common;

use common::{editor, RecordingHost};
use futures::future::BoxFuture;
use futures::FutureExt;
use quire_editor::{commands, Editor, PasteItem, UploadError, UploadFile, Uploader};
use quire_model::Selection;
use std::sync::Arc;

/// Stores files under a fake CDN; empty files fail
struct Cdn;

impl Uploader for Cdn {
    fn upload(&self, file: UploadFile) -> BoxFuture<'static, Result<String, UploadError>> {
        async move {
            tokio::task::yield_now().await;
            if file.data.is_empty() {
                Err(UploadError::Failed(format!("{} is empty", file.name)))
            } else {
                Ok(format!("https://cdn.test/{}", file.name))
            }
        }
        .boxed()
    }
}

fn uploading(content: &str, caret: usize) -> Editor<RecordingHost> {
    let mut editor = editor(content).with_uploader(Arc::new(Cdn));
    let mut tr = editor.state().tr();
    tr.set_selection(Selection::caret(caret));
    editor.dispatch(tr).unwrap();
    editor
}

fn png(name: &str) -> PasteItem {
    PasteItem::file(name, "image/png", vec![137, 80, 78, 71])
}

#[tokio::test]
async fn test_pasted_image_is_inserted() {
    let mut editor = uploading("<doc><paragraph>ab</paragraph></doc>", 2);
    editor.paste(vec![png("a.png")]).unwrap();
    assert_eq!(editor.pending_uploads(), 1);
    // nothing changes until the upload finishes
    assert!(editor.host().contents.is_empty());

    assert_eq!(editor.settle_uploads().await, 1);
    assert_eq!(
        editor.get_content(),
        r#"<doc><paragraph>a</paragraph><image src="https://cdn.test/a.png" alt="a.png"/><paragraph>b</paragraph></doc>"#
    );
    assert_eq!(editor.views().len(), 1);
    assert_eq!(editor.pending_uploads(), 0);

    editor.undo().unwrap();
    assert_eq!(editor.get_content(), "<doc><paragraph>ab</paragraph></doc>");
}

#[tokio::test]
async fn test_target_follows_edits() {
    let mut editor = uploading("<doc><paragraph>ab</paragraph></doc>", 3);
    editor.paste(vec![png("a.png")]).unwrap();

    let mut tr = editor.state().tr();
    tr.set_selection(Selection::caret(1));
    editor.dispatch(tr).unwrap();
    editor.type_text("x").unwrap();

    editor.settle_uploads().await;
    assert_eq!(
        editor.get_content(),
        r#"<doc><paragraph>xab</paragraph><image src="https://cdn.test/a.png" alt="a.png"/></doc>"#
    );
}

#[tokio::test]
async fn test_deleted_target_drops_upload() {
    let mut editor = uploading("<doc><paragraph>abc</paragraph></doc>", 2);
    editor.paste(vec![png("a.png")]).unwrap();

    let mut tr = editor.state().tr();
    tr.set_selection(Selection::new(1, 4));
    editor.dispatch(tr).unwrap();
    editor.run(commands::delete_selection).unwrap();

    assert_eq!(editor.settle_uploads().await, 0);
    assert_eq!(editor.get_content(), "<doc><paragraph></paragraph></doc>");
    assert!(editor.host().errors.is_empty());
}

#[tokio::test]
async fn test_failed_upload_is_reported() {
    let mut editor = uploading("<doc><paragraph>ab</paragraph></doc>", 2);
    editor
        .paste(vec![PasteItem::file("empty.png", "image/png", vec![])])
        .unwrap();

    assert_eq!(editor.settle_uploads().await, 0);
    assert_eq!(editor.host().errors.len(), 1);
    assert!(editor.host().errors[0].contains("empty.png is empty"));
    assert_eq!(editor.get_content(), "<doc><paragraph>ab</paragraph></doc>");
}

#[tokio::test]
async fn test_mixed_paste() {
    let mut editor = uploading("<doc><paragraph></paragraph></doc>", 1);
    editor
        .paste(vec![
            PasteItem::text("hi"),
            PasteItem::file("doc.pdf", "application/pdf", vec![1]),
            png("a.png"),
        ])
        .unwrap();
    assert_eq!(editor.get_content(), "<doc><paragraph>hi</paragraph></doc>");
    assert_eq!(editor.pending_uploads(), 1);

    editor.settle_uploads().await;
    assert_eq!(
        editor.get_content(),
        r#"<doc><paragraph>hi</paragraph><image src="https://cdn.test/a.png" alt="a.png"/></doc>"#
    );
}

#[tokio::test]
async fn test_poll_applies_finished_uploads() {
    let mut editor = uploading("<doc><paragraph>ab</paragraph></doc>", 3);
    editor.drop_files(
        vec![
            UploadFile::new("a.png", "image/png", vec![1]),
            UploadFile::new("notes.txt", "text/plain", vec![1]),
        ],
        3,
    );
    assert_eq!(editor.pending_uploads(), 1);

    let mut inserted = 0;
    while editor.pending_uploads() > 0 {
        tokio::task::yield_now().await;
        inserted += editor.poll_uploads();
    }
    assert_eq!(inserted, 1);
    assert_eq!(editor.history().undo_levels(), 1);
}

#[tokio::test]
async fn test_picker_rejects_other_files() {
    let mut editor = uploading("<doc><paragraph></paragraph></doc>", 1);
    editor.upload_file(UploadFile::new("a.zip", "application/zip", vec![1]));
    assert_eq!(editor.pending_uploads(), 0);
    assert_eq!(
        editor.host().errors,
        vec!["Upload error: Unsupported file type: application/zip".to_string()]
    );
}

#[tokio::test]
async fn test_set_content_abandons_uploads() {
    let mut editor = uploading("<doc><paragraph></paragraph></doc>", 1);
    editor.paste(vec![png("a.png")]).unwrap();
    editor.set_content("<doc><paragraph>new</paragraph></doc>").unwrap();

    assert_eq!(editor.pending_uploads(), 0);
    assert_eq!(editor.settle_uploads().await, 0);
    assert_eq!(editor.get_content(), "<doc><paragraph>new</paragraph></doc>");
}

#[test]
fn test_without_uploader() {
    let mut editor = editor("<doc><paragraph></paragraph></doc>");
    editor.paste(vec![png("a.png")]).unwrap();
    assert_eq!(editor.pending_uploads(), 0);
    assert_eq!(
        editor.host().errors,
        vec!["Upload error: No uploader configured".to_string()]
    );
}


#[test]
fn test_paste_outside_runtime_is_reported() {
    let mut editor = uploading("<doc><paragraph>ab</paragraph></doc>", 2);
    editor.paste(vec![png("a.png")]).unwrap();
    assert_eq!(editor.pending_uploads(), 0);
    assert_eq!(
        editor.host().errors,
        vec!["Upload error: No async runtime to run uploads on".to_string()]
    );
    assert_eq!(editor.get_content(), "<doc><paragraph>ab</paragraph></doc>");
}

#[tokio::test]
async fn test_drop_outside_document_is_ignored() {
    let mut editor = uploading("<doc><paragraph>ab</paragraph></doc>", 2);
    editor.drop_files(vec![UploadFile::new("a.png", "image/png", vec![1])], 999);
    assert_eq!(editor.pending_uploads(), 0);

    assert_eq!(editor.settle_uploads().await, 0);
    assert_eq!(editor.get_content(), "<doc><paragraph>ab</paragraph></doc>");
    assert!(editor.host().errors.is_empty());
}
