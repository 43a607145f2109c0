//! Runtime configuration
//!
//! ```toml
//! [runtime]
//! assembly_dir = "Binaries/Managed"
//! core_assembly_name = "SharpCore"
//! user_assembly_name = "ManagedGame"
//! shared_assemblies = ["SharpCore", "SharpBindings"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where assemblies live and which ones the runtime manages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory holding compiled assembly modules
    pub assembly_dir: PathBuf,
    /// Assembly loaded first and kept for the runtime's lifetime
    pub core_assembly_name: Option<String>,
    /// The user's managed project
    pub user_assembly_name: String,
    /// Assemblies resolved from the core context and never unloaded
    pub shared_assemblies: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            assembly_dir: PathBuf::from("Binaries/Managed"),
            core_assembly_name: None,
            user_assembly_name: "ManagedGame".to_string(),
            shared_assemblies: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Platform file path of the module for `name`
    pub fn assembly_path(&self, name: &str) -> PathBuf {
        self.assembly_dir.join(libloading::library_filename(name))
    }

    /// Whether `name` outlives user reloads
    pub fn is_shared(&self, name: &str) -> bool {
        self.core_assembly_name.as_deref() == Some(name)
            || self.shared_assemblies.iter().any(|shared| shared == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.user_assembly_name, "ManagedGame");
        assert!(config.core_assembly_name.is_none());
        assert!(!config.is_shared("ManagedGame"));
    }

    #[test]
    fn test_shared_names() {
        let config = RuntimeConfig {
            core_assembly_name: Some("SharpCore".into()),
            shared_assemblies: vec!["Bindings".into()],
            ..Default::default()
        };
        assert!(config.is_shared("SharpCore"));
        assert!(config.is_shared("Bindings"));
        assert!(!config.is_shared("ManagedGame"));
    }

    #[test]
    fn test_assembly_path_is_platform_named() {
        let config = RuntimeConfig {
            assembly_dir: PathBuf::from("out"),
            ..Default::default()
        };
        let path = config.assembly_path("Game");
        assert!(path.starts_with("out"));
        let file = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file.contains("Game"));
    }

    #[test]
    fn test_partial_toml() {
        let config: RuntimeConfig = toml::from_str(r#"user_assembly_name = "Shooter""#).unwrap();
        assert_eq!(config.user_assembly_name, "Shooter");
        assert_eq!(config.assembly_dir, PathBuf::from("Binaries/Managed"));
    }
}
