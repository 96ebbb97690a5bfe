use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("Training corpus has no non-empty documents")]
    EmptyCorpus,

    #[error("Vectorizer used before fit")]
    NotFitted,

    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Model artifact is corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Model artifact version mismatch: expected {expected}, found {found}")]
    ArtifactVersionMismatch { expected: u16, found: u16 },

    #[error("Input text is empty")]
    EmptyInput,

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpamError {
    /// True for failures the web layer reports as "classification temporarily
    /// unavailable" rather than as a problem with the caller's input.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, SpamError::EmptyInput | SpamError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SpamError>;
