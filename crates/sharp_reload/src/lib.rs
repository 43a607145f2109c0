//! # sharp_reload - Managed Script Hot Reload
//!
//! Watches the managed source tree and, on a qualifying change, rebuilds the
//! user project and swaps the running assembly for the new one.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐ changes ┌───────────────────┐  tick  ┌──────────────┐
//! │ ScriptWatcher │────────▶│ ReloadCoordinator │◀───────│ host loop    │
//! │ (notify)      │         │ (single flight)   │        │ (focus gate) │
//! └───────────────┘         └─────────┬─────────┘        └──────────────┘
//!                                     │
//!        ┌────────────┬───────────────┼───────────────┐
//!        ▼            ▼               ▼               ▼
//!   BuildTool    BuildTool      AssemblyHost     Reinstancer
//!   (build)      (weave)      (unload + load)   (fix up live
//!                                                 instances)
//! ```
//!
//! Stages run strictly in order and a failed stage aborts the rest. A
//! failed build or weave leaves the previous assembly loaded.
//!
//! ## Example
//!
//! ```ignore
//! let coordinator = Arc::new(ReloadCoordinator::new(settings, build_tool, runtime, reinstancer));
//! let events = coordinator.clone();
//! let _watcher = ScriptWatcher::watch("Script", move |changes| {
//!     events.on_files_changed(changes);
//! })?;
//!
//! loop {
//!     coordinator.tick();
//!     std::thread::sleep(coordinator.settings().tick_interval());
//! }
//! ```

mod build_tool;
mod coordinator;
mod error;
mod filter;
mod host;
mod progress;
mod reinstancer;
mod settings;
mod state;
mod watcher;

pub use build_tool::{BuildAction, BuildTool, ProcessBuildTool};
pub use coordinator::ReloadCoordinator;
pub use error::{ReloadError, Result};
pub use filter::SourceFilter;
pub use host::{AlwaysFocused, AssemblyHost, FocusFlag, FocusSource};
pub use progress::{LogProgress, ReloadProgress};
pub use reinstancer::{
    FieldLayout, FieldType, FieldValue, InstanceId, InstanceReinstancer, LiveInstance, ReinstanceReport,
    Reinstancer, TypeLayout,
};
pub use settings::{BuildSettings, HotReloadSettings};
pub use state::{AbortReason, ReloadOutcome, ReloadStage, ReloadState};
pub use watcher::{FileChange, FileChangeKind, ScriptWatcher};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::build_tool::{BuildAction, BuildTool, ProcessBuildTool};
    pub use crate::coordinator::ReloadCoordinator;
    pub use crate::host::{AssemblyHost, FocusSource};
    pub use crate::reinstancer::{InstanceReinstancer, Reinstancer};
    pub use crate::settings::HotReloadSettings;
    pub use crate::state::{ReloadOutcome, ReloadState};
    pub use crate::watcher::ScriptWatcher;
}
