//! Editor errors

use std::path::PathBuf;
use thiserror::Error;

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    /// Config file could not be parsed
    #[error("Invalid editor config '{path}': {message}")]
    InvalidConfig {
        path: PathBuf,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EditorError {
    pub fn invalid_config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EditorError::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }
}
