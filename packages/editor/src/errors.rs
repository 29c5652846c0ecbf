//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("No code diffs found for {0}")]
    EmptyDiff(&'static str),

    #[error("Failed to write code to {0}")]
    WriteRejected(String),

    #[error("Write cycle panicked: {0}")]
    Panicked(String),

    #[error("Code manager disposed")]
    Disposed,
}

/// Failure talking to a live preview.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreviewError {
    #[error("Preview disconnected: {0}")]
    Disconnected(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Preview rejected message: {0}")]
    Rejected(String),
}

/// Failure reported by the sandbox or the diff service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Sandbox unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;
