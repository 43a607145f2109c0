//! Error types for the hot-reload pipeline
//!
//! Reload stages themselves report plain success/failure; these errors cover
//! setting up the pipeline (settings, watcher) and the reinstancer's API.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for hot-reload operations
pub type Result<T> = std::result::Result<T, ReloadError>;

/// Errors raised while configuring or driving hot reload
#[derive(Debug, Error)]
pub enum ReloadError {
    /// Settings file could not be parsed
    #[error("Invalid settings in '{path}': {message}")]
    InvalidSettings {
        path: PathBuf,
        message: String,
    },

    /// Directory watcher could not be created or registered
    #[error("Watch error on '{path}': {message}")]
    WatchError {
        path: PathBuf,
        message: String,
    },

    /// Type has no registered layout
    #[error("Type '{0}' not registered")]
    TypeNotFound(String),

    /// Live instance does not exist
    #[error("Instance {0} not found")]
    InstanceNotFound(u64),

    /// Field missing from the instance's layout
    #[error("Type '{type_name}' has no field '{field}'")]
    FieldNotFound {
        type_name: String,
        field: String,
    },

    /// Value does not match the field's declared type
    #[error("Field '{field}' expects {expected}, got {found}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReloadError {
    /// Create a watch error
    pub fn watch_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReloadError::WatchError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid settings error
    pub fn invalid_settings(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReloadError::InvalidSettings {
            path: path.into(),
            message: message.into(),
        }
    }
}
