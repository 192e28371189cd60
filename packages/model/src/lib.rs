//! # Quire Model
//!
//! Immutable document tree for the Quire editor.
//!
//! ## Position space
//!
//! ```text
//! <doc>
//!   0 <paragraph> 1 H 2 i 3 </paragraph> 4 <image/> 5
//! </doc>
//! ```
//!
//! Every text character, every container boundary and every leaf node
//! occupies one position. Positions are resolved against the tree with a
//! binary search per level using the start offsets each [`Fragment`] caches.
//!
//! ## Usage
//!
//! ```rust
//! use quire_model::build::*;
//! use quire_model::NodeType;
//!
//! let doc = doc(vec![paragraph(vec![text("Hi")]), image("a.png", 200, 100)]);
//! assert_eq!(doc.content_size(), 5);
//!
//! let pos = doc.resolve(2).unwrap();
//! assert_eq!(pos.parent().node_type(), NodeType::Paragraph);
//! ```

pub mod attrs;
pub mod build;
pub mod error;
pub mod fragment;
pub mod mark;
pub mod node;
pub mod resolve;
pub mod schema;
pub mod selection;

pub use attrs::{AttrKind, AttrSpec, AttrValue, Attrs};
pub use error::{ModelError, ModelResult};
pub use fragment::Fragment;
pub use mark::{Mark, MarkSet};
pub use node::Node;
pub use resolve::ResolvedPos;
pub use schema::{ContentRule, MarkType, NodeType};
pub use selection::Selection;
