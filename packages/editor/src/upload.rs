//! # Upload Coordinator
//!
//! Images pasted, dropped or picked are uploaded through the host's
//! [`Uploader`] while editing continues. Each upload runs as its own tokio
//! task and reports back over a channel that the editor drains with
//! [`UploadCoordinator::poll`].
//!
//! The position an upload will insert at is mapped through every committed
//! transaction. If the content around it is deleted before the upload
//! finishes, the result is dropped.

use crate::mapping::Mapping;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Upload failed: {0}")]
    Failed(String),

    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("No uploader configured")]
    Unavailable,

    #[error("No async runtime to run uploads on")]
    NoRuntime,
}

/// A file handed to the uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// The upload service. Resolves to the URL of the stored file.
pub trait Uploader: Send + Sync {
    fn upload(&self, file: UploadFile) -> BoxFuture<'static, Result<String, UploadError>>;
}

/// One entry of a paste payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteItem {
    pub mime: String,
    pub name: Option<String>,
    pub data: Vec<u8>,
}

/// What the editor does with a paste entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteContent {
    Text(String),
    Image(UploadFile),
}

impl PasteItem {
    pub fn text(text: &str) -> Self {
        Self {
            mime: "text/plain".to_string(),
            name: None,
            data: text.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &str, mime: &str, data: Vec<u8>) -> Self {
        Self {
            mime: mime.to_string(),
            name: Some(name.to_string()),
            data,
        }
    }

    /// Images upload and plain text inserts; anything else, including
    /// text that is not UTF-8, is ignored
    pub fn classify(self) -> Option<PasteContent> {
        if self.mime.starts_with("image/") {
            let name = self.name.unwrap_or_else(|| "image".to_string());
            return Some(PasteContent::Image(UploadFile::new(name, self.mime, self.data)));
        }
        if self.mime == "text/plain" {
            return String::from_utf8(self.data).ok().map(PasteContent::Text);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadId(u64);

#[derive(Debug)]
struct Completion {
    id: UploadId,
    result: Result<String, UploadError>,
}

#[derive(Debug)]
struct Pending {
    pos: usize,
    deleted: bool,
    name: String,
}

/// A finished upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Insert an image for `url` at `pos`
    Ready {
        id: UploadId,
        pos: usize,
        url: String,
        name: String,
    },
    Failed {
        id: UploadId,
        name: String,
        error: UploadError,
    },
    /// The target was deleted while uploading
    Dropped { id: UploadId },
}

pub struct UploadCoordinator {
    uploader: Arc<dyn Uploader>,
    next_id: u64,
    pending: BTreeMap<UploadId, Pending>,
    tasks: JoinSet<()>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl UploadCoordinator {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            uploader,
            next_id: 0,
            pending: BTreeMap::new(),
            tasks: JoinSet::new(),
            tx,
            rx,
        }
    }

    /// Start uploading `file` for insertion at `pos` on the current tokio
    /// runtime. Fails without starting anything when there is none.
    pub fn start(&mut self, file: UploadFile, pos: usize) -> Result<UploadId, UploadError> {
        let runtime = Handle::try_current().map_err(|_| UploadError::NoRuntime)?;
        let id = UploadId(self.next_id);
        self.next_id += 1;
        self.pending.insert(
            id,
            Pending {
                pos,
                deleted: false,
                name: file.name.clone(),
            },
        );

        let upload = self.uploader.upload(file);
        let tx = self.tx.clone();
        self.tasks.spawn_on(
            async move {
                let result = upload.await;
                // the receiver is gone once the editor is torn down
                let _ = tx.send(Completion { id, result });
            },
            &runtime,
        );
        debug!(id = id.0, pos, "upload started");
        Ok(id)
    }

    /// Carry pending targets through a committed transaction
    pub fn map(&mut self, mapping: &Mapping) {
        for pending in self.pending.values_mut() {
            let mapped = mapping.map_result(pending.pos);
            pending.pos = mapped.pos;
            pending.deleted |= mapped.deleted;
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn target(&self, id: UploadId) -> Option<usize> {
        self.pending
            .get(&id)
            .filter(|pending| !pending.deleted)
            .map(|pending| pending.pos)
    }

    /// Drain uploads that finished since the last poll
    pub fn poll(&mut self) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(outcome) = self.resolve(completion) {
                outcomes.push(outcome);
            }
        }
        while self.tasks.try_join_next().is_some() {}
        outcomes
    }

    /// Wait for the next upload to finish
    pub async fn next(&mut self) -> Option<UploadOutcome> {
        while !self.pending.is_empty() {
            let completion = self.rx.recv().await?;
            if let Some(outcome) = self.resolve(completion) {
                return Some(outcome);
            }
        }
        None
    }

    fn resolve(&mut self, completion: Completion) -> Option<UploadOutcome> {
        let pending = self.pending.remove(&completion.id)?;
        let id = completion.id;
        Some(match completion.result {
            Err(error) => UploadOutcome::Failed {
                id,
                name: pending.name,
                error,
            },
            Ok(_) if pending.deleted => UploadOutcome::Dropped { id },
            Ok(url) => UploadOutcome::Ready {
                id,
                pos: pending.pos,
                url,
                name: pending.name,
            },
        })
    }

    /// Abort every outstanding upload
    pub fn clear(&mut self) {
        self.tasks.abort_all();
        self.pending.clear();
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StepMap;
    use futures::FutureExt;

    struct Echo;

    impl Uploader for Echo {
        fn upload(&self, file: UploadFile) -> BoxFuture<'static, Result<String, UploadError>> {
            async move {
                if file.data.is_empty() {
                    Err(UploadError::Failed(format!("{} is empty", file.name)))
                } else {
                    Ok(format!("https://cdn.test/{}", file.name))
                }
            }
            .boxed()
        }
    }

    fn png(name: &str) -> UploadFile {
        UploadFile::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_classify_paste_items() {
        assert_eq!(
            PasteItem::text("hi").classify(),
            Some(PasteContent::Text("hi".into()))
        );
        assert!(matches!(
            PasteItem::file("a.png", "image/png", vec![1]).classify(),
            Some(PasteContent::Image(_))
        ));
        assert_eq!(PasteItem::file("a.pdf", "application/pdf", vec![1]).classify(), None);
        assert_eq!(
            PasteItem {
                mime: "text/plain".into(),
                name: None,
                data: vec![0xff, 0xfe],
            }
            .classify(),
            None
        );
    }

    #[tokio::test]
    async fn test_upload_success() {
        let mut uploads = UploadCoordinator::new(Arc::new(Echo));
        let id = uploads.start(png("a.png"), 3).unwrap();
        assert_eq!(uploads.target(id), Some(3));

        let outcome = uploads.next().await.unwrap();
        assert_eq!(
            outcome,
            UploadOutcome::Ready {
                id,
                pos: 3,
                url: "https://cdn.test/a.png".into(),
                name: "a.png".into(),
            }
        );
        assert_eq!(uploads.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let mut uploads = UploadCoordinator::new(Arc::new(Echo));
        uploads
            .start(UploadFile::new("b.png", "image/png", vec![]), 1)
            .unwrap();
        assert!(matches!(
            uploads.next().await,
            Some(UploadOutcome::Failed {
                error: UploadError::Failed(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_target_follows_mapping() {
        let mut uploads = UploadCoordinator::new(Arc::new(Echo));
        let kept = uploads.start(png("a.png"), 2).unwrap();
        let lost = uploads.start(png("b.png"), 8).unwrap();

        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(0, 0, 3));
        mapping.push(StepMap::new(9, 4, 0));
        uploads.map(&mapping);
        assert_eq!(uploads.target(kept), Some(5));
        assert_eq!(uploads.target(lost), None);

        let mut outcomes = Vec::new();
        while let Some(outcome) = uploads.next().await {
            outcomes.push(outcome);
        }
        assert!(outcomes.contains(&UploadOutcome::Dropped { id: lost }));
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, UploadOutcome::Ready { id, pos: 5, .. } if *id == kept)));
    }

    #[test]
    fn test_start_without_runtime() {
        let mut uploads = UploadCoordinator::new(Arc::new(Echo));
        assert_eq!(uploads.start(png("a.png"), 1), Err(UploadError::NoRuntime));
        assert_eq!(uploads.pending_count(), 0);
        assert!(uploads.poll().is_empty());
    }
}
