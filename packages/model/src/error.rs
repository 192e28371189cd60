//! Error types for the document model

use crate::schema::NodeType;
use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Position {pos} out of range (document size {size})")]
    OutOfRange { pos: usize, size: usize },

    #[error("Invalid content in {parent}: {message}")]
    InvalidContent { parent: NodeType, message: String },

    #[error("Invalid attribute '{name}' on {owner}: {message}")]
    InvalidAttr {
        owner: String,
        name: String,
        message: String,
    },

    #[error("Position {pos} falls inside a {node_type} node")]
    SplitsNode { pos: usize, node_type: NodeType },

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),
}

impl ModelError {
    pub fn out_of_range(pos: usize, size: usize) -> Self {
        Self::OutOfRange { pos, size }
    }

    pub fn invalid_content(parent: NodeType, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            parent,
            message: message.into(),
        }
    }

    pub fn invalid_attr(
        owner: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttr {
            owner: owner.into(),
            name: name.into(),
            message: message.into(),
        }
    }
}
