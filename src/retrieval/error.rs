use std::time::Duration;

use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Artifact fallback only supports version updates, '{name}' is not an update")]
    Inapplicable { name: String },

    #[error("No suitable artifact (sdist or wheel) found for {name}=={version}")]
    NoSuitableArtifact { name: String, version: String },

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to extract archive: {0}")]
    Archive(String),

    #[error("Git command failed: {0}")]
    Vcs(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Retrieval task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(e: reqwest::Error) -> Self {
        RetrievalError::Download(e.to_string())
    }
}

impl From<tokio::task::JoinError> for RetrievalError {
    fn from(e: tokio::task::JoinError) -> Self {
        RetrievalError::TaskFailed(e.to_string())
    }
}
