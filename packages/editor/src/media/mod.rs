//! # Media Node Controller
//!
//! Interactive image nodes. Each image in the document gets one
//! [`ImageView`], created on first mount and kept across edits: its position
//! is mapped through every transaction, attribute changes update it in place
//! and it is destroyed exactly once when the node goes away.
//!
//! Resizing is a [`ResizeState`] machine driven by pointer events. Nothing
//! is written to the document until pointer-up, which commits one
//! `SetAttrs` step.

pub mod resize;
pub mod view;

pub use resize::{target_size, Drag, ResizeState};
pub use view::{ImageRender, ImageView, NodeView, ViewId, ViewRegistry};
