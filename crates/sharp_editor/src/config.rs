//! Editor configuration
//!
//! One TOML file holding the runtime and hot-reload sections:
//!
//! ```toml
//! [runtime]
//! assembly_dir = "Binaries/Managed"
//! user_assembly_name = "ManagedGame"
//!
//! [hot_reload]
//! require_focus_for_hot_reload = false
//! script_dir = "Script"
//!
//! [hot_reload.build]
//! program = "dotnet"
//! build_args = ["build", "Script/ManagedGame.csproj"]
//! ```
//!
//! The file is taken from `SHARP_EDITOR_CONFIG`, then the first non-flag
//! command-line argument. Without either, defaults are used.

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use sharp_reload::HotReloadSettings;
use sharp_runtime::RuntimeConfig;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SHARP_EDITOR_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub runtime: RuntimeConfig,
    pub hot_reload: HotReloadSettings,
}

impl EditorConfig {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| EditorError::invalid_config(path, e.to_string()))
    }

    /// Pick the config path from an environment value or the arguments
    pub fn resolve_path<I>(env_value: Option<String>, args: I) -> Option<PathBuf>
    where
        I: IntoIterator<Item = String>,
    {
        env_value
            .filter(|value| !value.is_empty())
            .or_else(|| args.into_iter().find(|arg| !arg.starts_with("--")))
            .map(PathBuf::from)
    }

    /// Load from `SHARP_EDITOR_CONFIG` or the process arguments
    ///
    /// Falls back to defaults (with a warning) if the file is unusable.
    pub fn from_environment() -> Self {
        let path = Self::resolve_path(std::env::var(CONFIG_ENV_VAR).ok(), std::env::args().skip(1));

        match path {
            Some(path) => match Self::load(&path) {
                Ok(config) => {
                    log::info!("Loaded editor config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("{}; using defaults", e);
                    Self::default()
                }
            },
            None => {
                log::info!("No editor config given, using defaults");
                Self::default()
            }
        }
    }

    pub fn print_summary(&self) {
        log::info!("Assembly dir:   {}", self.runtime.assembly_dir.display());
        log::info!("User assembly:  {}", self.runtime.user_assembly_name);
        log::info!("Script dir:     {}", self.hot_reload.script_dir.display());
        log::info!("Build program:  {}", self.hot_reload.build.program);
        log::info!("Require focus:  {}", self.hot_reload.require_focus_for_hot_reload);
    }
}
