//! Error types for the editor

use quire_model::ModelError;
use thiserror::Error;

pub type StepResult<T> = Result<T, StepError>;

/// A step or transaction that could not be applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StepError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidStep(message.into())
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] quire_parser::ParseError),

    #[error("Step error: {0}")]
    Step(#[from] StepError),

    #[error("Upload error: {0}")]
    Upload(#[from] crate::upload::UploadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
