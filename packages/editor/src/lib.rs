//! # Quire Editor
//!
//! Editing engine for Quire documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: markup ↔ document tree              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: state + transactions                │
//! │  - Steps applied atomically                 │
//! │  - Undo/redo with typing coalescing         │
//! │  - Positions mapped through every change    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ controllers: image views, palette, uploads  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The document is the source of truth**: views and toolbar state are
//!    derived from it
//! 2. **All changes are transactions**: a transaction applies completely or
//!    not at all
//! 3. **Positions are mapped, never guessed**: anything holding a position
//!    follows it through committed mappings
//!
//! ## Usage
//!
//! ```rust
//! use quire_editor::{commands, Editor, EditorError, EditorHost, EditorOptions};
//!
//! struct Host;
//!
//! impl EditorHost for Host {
//!     fn content_changed(&mut self, _content: &str) {}
//!     fn report_error(&mut self, _error: &EditorError) {}
//! }
//!
//! let options = EditorOptions {
//!     content: "<doc><paragraph>Hello</paragraph></doc>".to_string(),
//!     ..Default::default()
//! };
//! let mut editor = Editor::new(options, Host).unwrap();
//! editor.run(|tr| commands::toggle_heading(tr, 2)).unwrap();
//! assert_eq!(
//!     editor.get_content(),
//!     r#"<doc><heading level="2">Hello</heading></doc>"#
//! );
//!
//! editor.undo().unwrap();
//! assert_eq!(editor.get_content(), "<doc><paragraph>Hello</paragraph></doc>");
//! ```

pub mod commands;
pub mod config;
pub mod context;
pub mod editor;
pub mod errors;
pub mod geometry;
pub mod history;
pub mod listeners;
pub mod mapping;
pub mod media;
pub mod palette;
pub mod projector;
pub mod state;
pub mod step;
pub mod transaction;
pub mod transform;
pub mod upload;

pub use config::{EditorConfig, PaletteConfig, ResizeConfig};
pub use context::EditorContext;
pub use editor::{Editor, EditorHost, EditorOptions};
pub use errors::{EditorError, StepError, StepResult};
pub use geometry::{CaretGeometry, Point, Rect, Size};
pub use history::History;
pub use listeners::{EventKind, ListenerGuard, ListenerId, ListenerRegistry, ListenerTarget};
pub use mapping::{MapResult, Mapping, StepMap};
pub use media::{ImageView, NodeView, ViewId, ViewRegistry};
pub use palette::{HostRequest, KeyOutcome, Palette, PaletteCommand, PaletteKey};
pub use projector::{project, ActiveState};
pub use state::{Applied, EditorState};
pub use step::Step;
pub use transaction::{InputKind, Transaction};
pub use transform::Transform;
pub use upload::{PasteItem, UploadError, UploadFile, Uploader};
