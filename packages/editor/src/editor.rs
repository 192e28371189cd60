//! # Editor
//!
//! Ties the pieces together for one mounted editor: state and history,
//! image views, the command palette and pending uploads.
//!
//! ## Lifecycle
//!
//! ```text
//! new(content) → dispatch / undo / redo → get_content
//!                      ↓
//!         views, palette and uploads follow the mapping
//! ```
//!
//! Every transaction goes through [`Editor::dispatch`]. A rejected
//! transaction leaves everything as it was. After a commit the image views,
//! the palette and pending uploads are carried through the transaction's
//! mapping and the host is told about the new content.

use crate::commands;
use crate::config::EditorConfig;
use crate::context::EditorContext;
use crate::errors::{EditorError, StepError, StepResult};
use crate::geometry::{CaretGeometry, Point, Size};
use crate::history::History;
use crate::listeners::ListenerRegistry;
use crate::mapping::Mapping;
use crate::media::{ImageView, ViewId, ViewRegistry};
use crate::palette::{HostRequest, KeyOutcome, Palette, PaletteKey};
use crate::projector::{project, ActiveState};
use crate::state::{Applied, EditorState};
use crate::transaction::{InputKind, Transaction};
use crate::upload::{PasteContent, PasteItem, UploadCoordinator, UploadError, UploadFile, UploadOutcome, Uploader};
use quire_model::{build, Attrs, Node, NodeType, Selection};
use quire_parser::{parse, serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Callbacks into the page hosting the editor
pub trait EditorHost {
    /// The document changed; `content` is its serialized form
    fn content_changed(&mut self, content: &str);

    /// A recoverable error the user should see
    fn report_error(&mut self, error: &EditorError);

    fn request_animation_frame(&mut self) {}

    /// On-screen caret position, for placing the palette
    fn caret_geometry(&self, _pos: usize) -> Option<CaretGeometry> {
        None
    }

    /// A command needs input only the host can collect
    fn request_input(&mut self, _request: HostRequest) {}
}

#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    /// Initial markup; empty for a blank document
    pub content: String,
    pub placeholder: String,
    pub config: EditorConfig,
}

/// State and history, split from the views so controllers can dispatch
/// while a view is borrowed
struct Core<H> {
    state: EditorState,
    history: History,
    host: H,
    config: EditorConfig,
    version: u64,
    /// Mappings committed since views and uploads were last synced
    unsynced: Mapping,
}

impl<H: EditorHost> Core<H> {
    fn commit(&mut self, tr: &Transaction) -> Result<(), EditorError> {
        let (next, applied) = self.state.apply_transaction(tr).map_err(|err| {
            warn!(%err, "transaction rejected");
            EditorError::from(err)
        })?;
        self.history
            .record(tr, &applied, self.state.selection(), next.selection());
        self.replace(next, applied);
        Ok(())
    }

    fn replace(&mut self, next: EditorState, applied: Applied) {
        self.state = next;
        self.unsynced.append(&applied.mapping);
        if applied.doc_changed {
            self.version += 1;
            let content = serialize(self.state.doc());
            self.host.content_changed(&content);
        }
    }
}

pub struct Editor<H: EditorHost> {
    core: Core<H>,
    placeholder: String,
    listeners: ListenerRegistry,
    views: ViewRegistry,
    palette: Palette,
    uploads: Option<UploadCoordinator>,
}

/// Parse markup, treating blank input as an empty document
fn parse_content(content: &str) -> Result<Node, EditorError> {
    if content.trim().is_empty() {
        return Ok(build::doc(vec![build::paragraph(vec![])]));
    }
    Ok(parse(content)?)
}

impl<H: EditorHost> Editor<H> {
    pub fn new(options: EditorOptions, host: H) -> Result<Self, EditorError> {
        let doc = parse_content(&options.content)?;
        let config = options.config;
        config.validate()?;
        let listeners = ListenerRegistry::new();
        let state = EditorState::new(doc);

        let mut views = ViewRegistry::new(listeners.clone());
        views.sync(state.doc(), None, state.selection());

        Ok(Self {
            core: Core {
                state,
                history: History::with_limits(config.history_depth, config.coalesce_window()),
                host,
                config: config.clone(),
                version: 0,
                unsynced: Mapping::new(),
            },
            placeholder: options.placeholder,
            palette: Palette::new(config.palette.clone(), listeners.clone()),
            listeners,
            views,
            uploads: None,
        })
    }

    /// Use `uploader` for pasted, dropped and picked images
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploads = Some(UploadCoordinator::new(uploader));
        self
    }

    /// Open a markup file
    pub fn load(path: &Path, config: EditorConfig, host: H) -> Result<Self, EditorError> {
        let content = std::fs::read_to_string(path)?;
        Self::new(
            EditorOptions {
                content,
                config,
                ..Default::default()
            },
            host,
        )
    }

    pub fn save(&self, path: &Path) -> Result<(), EditorError> {
        std::fs::write(path, self.get_content())?;
        Ok(())
    }

    pub fn state(&self) -> &EditorState {
        &self.core.state
    }

    pub fn doc(&self) -> &Node {
        self.core.state.doc()
    }

    pub fn selection(&self) -> Selection {
        self.core.state.selection()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.core.config
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Incremented on every document change
    pub fn version(&self) -> u64 {
        self.core.version
    }

    pub fn host(&self) -> &H {
        &self.core.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.core.host
    }

    pub fn history(&self) -> &History {
        &self.core.history
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Toolbar state for the current selection
    pub fn active_state(&self) -> ActiveState {
        project(&self.core.state)
    }

    pub fn get_content(&self) -> String {
        serialize(self.core.state.doc())
    }

    /// Replace the document. History, views, the palette and pending
    /// uploads are reset.
    pub fn set_content(&mut self, content: &str) -> Result<(), EditorError> {
        let doc = parse_content(content)?;
        self.views.clear();
        self.palette.close("content replaced");
        if let Some(uploads) = &mut self.uploads {
            uploads.clear();
        }
        self.core.history.clear();
        self.core.unsynced = Mapping::new();
        self.core.state = EditorState::new(doc);
        self.core.version += 1;
        self.views
            .sync(self.core.state.doc(), None, self.core.state.selection());
        Ok(())
    }

    /// Commit a transaction
    pub fn dispatch(&mut self, tr: Transaction) -> Result<(), EditorError> {
        let result = self.core.commit(&tr);
        self.sync();
        result
    }

    /// Carry views, the palette and uploads through committed mappings
    fn sync(&mut self) {
        let mapping = std::mem::take(&mut self.core.unsynced);
        let state = &self.core.state;
        self.views.sync(state.doc(), Some(&mapping), state.selection());
        self.palette.sync(state, &mapping);
        if let Some(uploads) = &mut self.uploads {
            uploads.map(&mapping);
        }
    }

    /// Run an editing command. Returns whether it applied.
    pub fn run(
        &mut self,
        command: impl FnOnce(&mut Transaction) -> StepResult<bool>,
    ) -> Result<bool, EditorError> {
        let tr = commands::run(&self.core.state, command).map_err(|err| {
            warn!(%err, "command failed");
            EditorError::from(err)
        })?;
        match tr {
            Some(tr) => self.dispatch(tr).map(|_| true),
            None => Ok(false),
        }
    }

    /// Type text at the selection; typing the palette trigger in a
    /// paragraph opens the palette
    pub fn type_text(&mut self, text: &str) -> Result<bool, EditorError> {
        if !self.run(|tr| commands::insert_text(tr, text))? {
            return Ok(false);
        }
        let geometry = self.core.host.caret_geometry(self.selection().head);
        self.palette.text_typed(&self.core.state, text, geometry);
        Ok(true)
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let Some((next, applied)) = self.core.history.undo(&self.core.state)? else {
            return Ok(false);
        };
        self.core.replace(next, applied);
        self.sync();
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let Some((next, applied)) = self.core.history.redo(&self.core.state)? else {
            return Ok(false);
        };
        self.core.replace(next, applied);
        self.sync();
        Ok(true)
    }

    // -- palette ----------------------------------------------------------

    /// Keyboard input while the palette may be open
    pub fn palette_key(&mut self, key: PaletteKey) -> Result<KeyOutcome, EditorError> {
        let outcome = self.palette.key_down(key);
        if let KeyOutcome::Confirm(index) = outcome {
            self.palette_select(index)?;
        }
        Ok(outcome)
    }

    /// Run palette item `index`
    pub fn palette_select(&mut self, index: usize) -> Result<bool, EditorError> {
        let Some((tr, request)) = self.palette.commit(&self.core.state, index)? else {
            return Ok(false);
        };
        self.dispatch(tr)?;
        if let Some(request) = request {
            self.core.host.request_input(request);
        }
        Ok(true)
    }

    pub fn palette_pointer_down_outside(&mut self) -> bool {
        self.palette.pointer_down_outside()
    }

    // -- image views -------------------------------------------------------

    /// Call `f` with a view and a context bound to it
    fn with_view<R>(
        &mut self,
        id: ViewId,
        f: impl FnOnce(&mut ImageView, &mut EditorContext<'_>) -> Result<R, EditorError>,
    ) -> Result<Option<R>, EditorError> {
        let state = self.core.state.clone();
        let Some((pos, view)) = self.views.get_mut(id) else {
            debug!(?id, "event for unmounted view");
            return Ok(None);
        };
        let core = &mut self.core;
        let get_pos = move || Some(pos);
        let mut dispatch = |tr: Transaction| core.commit(&tr);
        let mut ctx = EditorContext::new(&state, &get_pos, &mut dispatch);
        let result = f(view, &mut ctx);
        self.sync();
        result.map(Some)
    }

    pub fn image_hover(&mut self, id: ViewId, hovered: bool) {
        if let Some((_, view)) = self.views.get_mut(id) {
            view.set_hovered(hovered);
        }
    }

    /// Pointer down on a view's resize handle
    pub fn image_resize_start(&mut self, id: ViewId, at: Point, rendered: Option<Size>) -> bool {
        match self.views.get_mut(id) {
            Some((_, view)) => view.begin_resize(at, rendered),
            None => false,
        }
    }

    /// Pointer move anywhere. At most one frame is requested per frame.
    pub fn pointer_move(&mut self, at: Point) {
        let mut wants_frame = false;
        for view in self.views.views_mut() {
            wants_frame |= view.pointer_move(at);
        }
        if wants_frame {
            self.core.host.request_animation_frame();
        }
    }

    /// Animation frame: compute resize previews
    pub fn animation_frame(&mut self) -> Vec<(ViewId, Size)> {
        let config = self.core.config.resize.clone();
        self.views
            .views_mut()
            .filter_map(|view| view.frame(&config).map(|size| (view.id(), size)))
            .collect()
    }

    /// Pointer up anywhere: commit any drag in progress
    pub fn pointer_up(&mut self, at: Point) -> Result<(), EditorError> {
        let config = self.core.config.resize.clone();
        let resizing: Vec<ViewId> = self
            .views
            .ids()
            .into_iter()
            .filter(|id| {
                self.views
                    .get(*id)
                    .is_some_and(|view| view.resize_state().is_resizing())
            })
            .collect();
        for id in resizing {
            self.with_view(id, |view, ctx| view.commit_resize(at, &config, ctx))?;
        }
        Ok(())
    }

    pub fn image_set_align(&mut self, id: ViewId, align: &str) -> Result<bool, EditorError> {
        Ok(self
            .with_view(id, |view, ctx| view.set_align(align, ctx))?
            .unwrap_or(false))
    }

    pub fn image_remove(&mut self, id: ViewId) -> Result<bool, EditorError> {
        Ok(self
            .with_view(id, |view, ctx| view.remove(ctx))?
            .unwrap_or(false))
    }

    // -- uploads -------------------------------------------------------------

    /// Handle a paste payload: images upload, text inserts, anything else
    /// is ignored
    pub fn paste(&mut self, items: Vec<PasteItem>) -> Result<(), EditorError> {
        for item in items {
            match item.classify() {
                Some(PasteContent::Text(text)) => {
                    self.run(|tr| {
                        commands::insert_text(tr, &text)?;
                        tr.set_input(InputKind::Paste);
                        Ok(true)
                    })?;
                }
                Some(PasteContent::Image(file)) => {
                    let pos = self.selection().head;
                    self.upload(file, pos);
                }
                None => debug!("ignoring pasted item"),
            }
        }
        Ok(())
    }

    /// Upload dropped files for insertion at `pos`. A position outside the
    /// document drops the files.
    pub fn drop_files(&mut self, files: Vec<UploadFile>, pos: usize) {
        if self.doc().resolve(pos).is_err() {
            debug!(pos, "drop position outside the document");
            return;
        }
        for file in files {
            if file.is_image() {
                self.upload(file, pos);
            } else {
                debug!(mime = %file.mime, "ignoring dropped file");
            }
        }
    }

    /// Upload a file chosen in the host's picker at the caret
    pub fn upload_file(&mut self, file: UploadFile) {
        let pos = self.selection().head;
        if file.is_image() {
            self.upload(file, pos);
        } else {
            let error = EditorError::Upload(UploadError::Unsupported(file.mime));
            self.core.host.report_error(&error);
        }
    }

    fn upload(&mut self, file: UploadFile, pos: usize) {
        match &mut self.uploads {
            Some(uploads) => {
                if let Err(error) = uploads.start(file, pos) {
                    warn!(%error, "could not start upload");
                    self.core.host.report_error(&EditorError::Upload(error));
                }
            }
            None => {
                warn!(name = %file.name, "no uploader configured");
                self.core
                    .host
                    .report_error(&EditorError::Upload(UploadError::Unavailable));
            }
        }
    }

    pub fn pending_uploads(&self) -> usize {
        self.uploads.as_ref().map_or(0, UploadCoordinator::pending_count)
    }

    /// Apply uploads finished since the last poll. Returns the number of
    /// images inserted.
    pub fn poll_uploads(&mut self) -> usize {
        let outcomes = match &mut self.uploads {
            Some(uploads) => uploads.poll(),
            None => return 0,
        };
        let mut inserted = 0;
        for outcome in outcomes {
            if self.finish_upload(outcome) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Wait for every pending upload and apply the results
    pub async fn settle_uploads(&mut self) -> usize {
        let mut inserted = 0;
        loop {
            let outcome = match &mut self.uploads {
                Some(uploads) => uploads.next().await,
                None => None,
            };
            let Some(outcome) = outcome else {
                return inserted;
            };
            if self.finish_upload(outcome) {
                inserted += 1;
            }
        }
    }

    fn finish_upload(&mut self, outcome: UploadOutcome) -> bool {
        match outcome {
            UploadOutcome::Ready { pos, url, name, .. } => {
                match self.insert_uploaded(pos, &url, &name) {
                    Ok(inserted) => inserted,
                    Err(err) => {
                        warn!(%err, "could not insert uploaded image");
                        self.core.host.report_error(&err);
                        false
                    }
                }
            }
            UploadOutcome::Failed { name, error, .. } => {
                warn!(%error, name = %name, "upload failed");
                self.core.host.report_error(&EditorError::Upload(error));
                false
            }
            UploadOutcome::Dropped { id } => {
                debug!(?id, "upload target deleted, dropping image");
                false
            }
        }
    }

    fn insert_uploaded(&mut self, pos: usize, url: &str, name: &str) -> Result<bool, EditorError> {
        if self.doc().resolve(pos).is_err() {
            debug!(pos, "upload target no longer resolves, dropping image");
            return Ok(false);
        }
        let mut attrs = Attrs::new();
        attrs.insert("src".to_string(), url.into());
        attrs.insert("alt".to_string(), name.into());
        let image = Node::create(NodeType::Image, &attrs, vec![]).map_err(StepError::from)?;

        let mut tr = self.core.state.tr();
        commands::insert_block_at(&mut tr, pos, image)?;
        tr.set_input(InputKind::Upload);
        self.dispatch(tr)?;
        Ok(true)
    }
}
