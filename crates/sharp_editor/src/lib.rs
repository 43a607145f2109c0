//! # sharp_editor - Editor Host
//!
//! Startup order:
//!
//! ```text
//! EditorModule::from_config   registers native exports, builds the graph
//!          │
//! EditorModule::startup       subscribes to runtime initialization
//!          │
//! RuntimeManager::initialize  loads core + user assemblies, fires the event
//!          │
//!          ▼
//! watcher registered, reinstancer initialized, ticks reach the coordinator
//! ```

mod config;
mod error;
mod module;

pub use config::{EditorConfig, CONFIG_ENV_VAR};
pub use error::{EditorError, Result};
pub use module::EditorModule;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::module::EditorModule;
    pub use sharp_reload::{ReloadOutcome, ReloadState};
    pub use sharp_runtime::RuntimeManager;
}
