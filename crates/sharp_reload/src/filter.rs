//! Qualifying file events
//!
//! A change qualifies for a reload when the file has the managed-source
//! extension and does not sit inside a build-output directory.

use crate::settings::HotReloadSettings;
use std::path::{Component, Path, PathBuf};

/// Decides which changed paths should trigger a reload
#[derive(Debug, Clone)]
pub struct SourceFilter {
    root: PathBuf,
    extension: String,
    output_dirs: Vec<String>,
}

impl SourceFilter {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>, output_dirs: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
            output_dirs,
        }
    }

    pub fn from_settings(settings: &HotReloadSettings) -> Self {
        Self::new(
            settings.script_dir.clone(),
            settings.source_extension.clone(),
            settings.output_dirs.clone(),
        )
    }

    /// The watched source root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_qualifying(&self, path: &Path) -> bool {
        self.has_source_extension(path) && !self.is_build_output(path)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Whether any directory between the root and the file is an output dir
    fn is_build_output(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let directories = match relative.parent() {
            Some(parent) => parent,
            None => return false,
        };

        directories.components().any(|component| match component {
            Component::Normal(name) => self
                .output_dirs
                .iter()
                .any(|dir| name.to_str().map_or(false, |n| n.eq_ignore_ascii_case(dir))),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SourceFilter {
        SourceFilter::new("/project/Script", "cs", vec!["bin".into(), "obj".into()])
    }

    #[test]
    fn test_source_files_qualify() {
        let f = filter();
        assert!(f.is_qualifying(Path::new("/project/Script/Player.cs")));
        assert!(f.is_qualifying(Path::new("/project/Script/Game/Weapons/Gun.cs")));
        assert!(f.is_qualifying(Path::new("/project/Script/Upper.CS")));
    }

    #[test]
    fn test_other_extensions_ignored() {
        let f = filter();
        assert!(!f.is_qualifying(Path::new("/project/Script/Game.csproj")));
        assert!(!f.is_qualifying(Path::new("/project/Script/notes.txt")));
        assert!(!f.is_qualifying(Path::new("/project/Script/Makefile")));
    }

    #[test]
    fn test_build_output_ignored() {
        let f = filter();
        assert!(!f.is_qualifying(Path::new("/project/Script/bin/Debug/Gen.cs")));
        assert!(!f.is_qualifying(Path::new("/project/Script/obj/Gen.g.cs")));
        assert!(!f.is_qualifying(Path::new("/project/Script/Game/obj/AssemblyInfo.cs")));
    }

    #[test]
    fn test_output_names_above_root_do_not_count() {
        let f = SourceFilter::new("/home/obj/project/Script", "cs", vec!["obj".into()]);
        assert!(f.is_qualifying(Path::new("/home/obj/project/Script/Player.cs")));
    }

    #[test]
    fn test_file_named_like_output_dir_qualifies() {
        let f = SourceFilter::new("/p/Script", ".cs", vec!["bin".into()]);
        assert!(f.is_qualifying(Path::new("/p/Script/bin.cs")));
    }
}
