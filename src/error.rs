//! Error handling for the resume tailor application

use crate::processing::document::BlockKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeTailorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid Google Doc link: {0}")]
    InvalidLink(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File is not valid UTF-8 text: {}", .0.display())]
    Encoding(PathBuf),

    #[error("Could not read file: {0}")]
    FileAccess(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Tailoring service error: {0}")]
    TailoringService(String),

    #[error("The tailoring service returned no usable text")]
    EmptyTailoringResult,

    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    #[error("Failed to read document: {0}")]
    DocumentRead(String),

    #[error("Document service error: {0}")]
    DocumentService(String),

    #[error("Failed to write block {index} ({kind}): {message}")]
    DocumentWrite {
        index: usize,
        kind: BlockKind,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cancelled by user")]
    Cancelled,
}

impl ResumeTailorError {
    /// True for every error that stems from reading the job posting file.
    pub fn is_file_access(&self) -> bool {
        matches!(
            self,
            ResumeTailorError::FileNotFound(_)
                | ResumeTailorError::Encoding(_)
                | ResumeTailorError::FileAccess(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ResumeTailorError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeTailorError {
    fn from(err: anyhow::Error) -> Self {
        ResumeTailorError::Configuration(err.to_string())
    }
}
