//! Hot-reload settings
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! require_focus_for_hot_reload = true
//! script_dir = "Script"
//! source_extension = "cs"
//! output_dirs = ["bin", "obj"]
//! tick_interval_ms = 100
//!
//! [build]
//! program = "SharpBuildTool"
//! build_args = ["--action", "Build"]
//! weave_args = ["--action", "Weave"]
//! ```

use crate::error::{ReloadError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings consumed by the reload pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotReloadSettings {
    /// Wait until the host window has focus before reloading
    pub require_focus_for_hot_reload: bool,
    /// Root of the managed sources; the watched directory
    pub script_dir: PathBuf,
    /// Extension of managed source files, without the dot
    pub source_extension: String,
    /// Build-output directory names whose trees are ignored
    pub output_dirs: Vec<String>,
    /// Host tick period
    pub tick_interval_ms: u64,
    /// External build tool invocation
    pub build: BuildSettings,
}

impl Default for HotReloadSettings {
    fn default() -> Self {
        Self {
            require_focus_for_hot_reload: false,
            script_dir: PathBuf::from("Script"),
            source_extension: "cs".to_string(),
            output_dirs: vec!["bin".to_string(), "obj".to_string()],
            tick_interval_ms: 100,
            build: BuildSettings::default(),
        }
    }
}

impl HotReloadSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| ReloadError::invalid_settings(path, e.to_string()))
    }

    /// Load settings, falling back to defaults when the file is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(ReloadError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No hot-reload settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{}; using default hot-reload settings", e);
                Self::default()
            }
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// How to run the external build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Executable to run
    pub program: String,
    /// Arguments for the build action
    pub build_args: Vec<String>,
    /// Arguments for the weave action
    pub weave_args: Vec<String>,
    /// Working directory (defaults to the current directory)
    pub working_dir: Option<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            program: "SharpBuildTool".to_string(),
            build_args: vec!["--action".to_string(), "Build".to_string()],
            weave_args: vec!["--action".to_string(), "Weave".to_string()],
            working_dir: None,
        }
    }
}
