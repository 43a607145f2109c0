//! Error types for the managed runtime

use std::path::PathBuf;
use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while loading or unloading assemblies
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Failed to load the assembly module
    #[error("Failed to load assembly '{path}': {message}")]
    LoadError {
        path: PathBuf,
        message: String,
    },

    /// Module does not contain a required symbol
    #[error("Symbol '{symbol}' not found in assembly '{assembly}'")]
    SymbolNotFound {
        assembly: String,
        symbol: String,
    },

    /// No assembly with this name is loaded
    #[error("Assembly '{0}' is not loaded")]
    NotLoaded(String),

    /// An assembly with this name is already loaded
    #[error("Assembly '{0}' is already loaded")]
    AlreadyLoaded(String),

    /// Assembly is still referenced outside the runtime
    #[error("Assembly '{name}' is still referenced ({references} outstanding handles)")]
    AssemblyInUse {
        name: String,
        references: usize,
    },

    /// Shared assemblies live as long as the runtime
    #[error("Assembly '{0}' is shared and cannot be unloaded")]
    SharedAssembly(String),

    /// The assembly's own load or unload hook reported failure
    #[error("Assembly '{name}' rejected {hook}")]
    HookFailed {
        name: String,
        hook: &'static str,
    },

    /// Version mismatch
    #[error("Version mismatch: assembly API version {assembly_version}, expected {expected_version}")]
    VersionMismatch {
        assembly_version: u32,
        expected_version: u32,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RuntimeError {
    /// Create a load error
    pub fn load_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuntimeError::LoadError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a symbol not found error
    pub fn symbol_not_found(assembly: impl Into<String>, symbol: impl Into<String>) -> Self {
        RuntimeError::SymbolNotFound {
            assembly: assembly.into(),
            symbol: symbol.into(),
        }
    }
}
