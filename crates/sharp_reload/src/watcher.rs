//! Script directory watcher
//!
//! Watches the managed source root recursively and hands each notification
//! to a callback as a batch of [`FileChange`]s. The callback runs on the
//! watcher's own thread.

use crate::error::{ReloadError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// A file change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path to the changed file
    pub path: PathBuf,
    /// Type of change
    pub kind: FileChangeKind,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>, kind: FileChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Type of file change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// File was created
    Created,
    /// File was modified
    Modified,
    /// File was deleted
    Deleted,
}

impl FileChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChangeKind::Created),
            EventKind::Modify(_) => Some(FileChangeKind::Modified),
            EventKind::Remove(_) => Some(FileChangeKind::Deleted),
            _ => None,
        }
    }
}

/// Convert one notify event into a batch of changes
pub(crate) fn changes_from_event(event: Event) -> Vec<FileChange> {
    let Some(kind) = FileChangeKind::from_event(&event.kind) else {
        return Vec::new();
    };

    event
        .paths
        .into_iter()
        .filter(|path| !path.is_dir())
        .map(|path| FileChange { path, kind })
        .collect()
}

/// Recursive watcher over the script directory
///
/// Dropping the watcher stops delivery.
pub struct ScriptWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl ScriptWatcher {
    /// Start watching `root`, creating it first if it does not exist
    pub fn watch<F>(root: impl AsRef<Path>, callback: F) -> Result<Self>
    where
        F: Fn(&[FileChange]) + Send + 'static,
    {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            std::fs::create_dir_all(&root)?;
            log::info!("Created script directory: {:?}", root);
        }

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let changes = changes_from_event(event);
                if !changes.is_empty() {
                    callback(&changes);
                }
            }
            Err(e) => log::warn!("Script watcher error: {}", e),
        })
        .map_err(|e| ReloadError::watch_error(&root, e.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| ReloadError::watch_error(&root, e.to_string()))?;

        log::info!("Watching script directory: {:?}", root);

        Ok(Self {
            _watcher: watcher,
            root,
        })
    }

    /// The watched directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Debug for ScriptWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptWatcher").field("root", &self.root).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn test_event_kinds_map_to_changes() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/s/A.cs"));
        assert_eq!(
            changes_from_event(event),
            vec![FileChange::new("/s/A.cs", FileChangeKind::Modified)]
        );

        let event = Event::new(EventKind::Remove(RemoveKind::File)).add_path(PathBuf::from("/s/B.cs"));
        assert_eq!(changes_from_event(event)[0].kind, FileChangeKind::Deleted);

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/s/C.cs"))
            .add_path(PathBuf::from("/s/D.cs"));
        assert_eq!(changes_from_event(event).len(), 2);
    }

    #[test]
    fn test_access_events_dropped() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/s/A.cs"));
        assert!(changes_from_event(event).is_empty());
    }

    #[test]
    fn test_watch_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Script");
        assert!(!root.exists());

        let watcher = ScriptWatcher::watch(&root, |_| {}).unwrap();
        assert!(root.is_dir());
        assert_eq!(watcher.root(), root.as_path());
    }
}
