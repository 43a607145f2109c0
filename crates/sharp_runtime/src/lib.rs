//! # sharp_runtime - Managed Assembly Lifecycle
//!
//! Owns the managed assemblies loaded into the host: the shared core
//! assembly and the user's project assembly, which is replaced on every hot
//! reload.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ RuntimeManager  │────▶│ AssemblyLoader  │
//! │ (single owner)  │     │ (dylib / test)  │
//! └────────┬────────┘     └────────┬────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ LoadedAssembly  │────▶│ AssemblyModule  │
//! │ (Arc, by name)  │     │ (load hooks)    │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! The manager must be initialized before anything subscribes to
//! [`RuntimeManager::on_initialized`] expecting assemblies to be present;
//! subscribers registered earlier are simply deferred until it happens.

mod assembly;
mod config;
mod error;
mod event;
mod exports;
mod ffi;
mod manager;

pub use assembly::{AssemblyLoader, AssemblyModule, DylibAssembly, DylibAssemblyLoader, LoadedAssembly};
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use event::OnceEvent;
pub use exports::ExportRegistry;
pub use ffi::*;
pub use manager::RuntimeManager;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::assembly::{AssemblyLoader, AssemblyModule, DylibAssemblyLoader, LoadedAssembly};
    pub use crate::config::RuntimeConfig;
    pub use crate::error::{Result, RuntimeError};
    pub use crate::manager::RuntimeManager;
}
