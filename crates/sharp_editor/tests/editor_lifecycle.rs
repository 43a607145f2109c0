//! Editor module driving a real build process

use sharp_editor::{EditorConfig, EditorModule};
use sharp_reload::{AbortReason, ReloadOutcome, ReloadState};
use sharp_runtime::{AssemblyLoader, AssemblyModule, ExportRegistry};
use std::path::Path;

struct StubModule;
impl AssemblyModule for StubModule {}

struct StubLoader;
impl AssemblyLoader for StubLoader {
    fn load(&self, _: &str, _: &Path, _: &ExportRegistry) -> sharp_runtime::Result<Box<dyn AssemblyModule>> {
        Ok(Box::new(StubModule))
    }
}

fn editor(script_dir: &Path, build_script: &str) -> EditorModule {
    let mut config = EditorConfig::default();
    config.hot_reload.script_dir = script_dir.to_path_buf();
    config.hot_reload.build.program = "sh".into();
    config.hot_reload.build.build_args = vec!["-c".into(), build_script.into()];
    config.hot_reload.build.weave_args = vec!["-c".into(), "exit 0".into()];

    let editor = EditorModule::from_config(config, StubLoader);
    editor.startup();
    editor.runtime().initialize().unwrap();
    editor
}

#[cfg(unix)]
#[test]
fn compile_runs_full_reload() {
    let dir = tempfile::tempdir().unwrap();
    let editor = editor(dir.path(), "exit 0");
    let before = editor.runtime().assembly_generation("ManagedGame").unwrap();

    assert_eq!(editor.compile(), Some(ReloadOutcome::Completed));
    assert!(editor.runtime().assembly_generation("ManagedGame").unwrap() > before);
    assert_eq!(editor.coordinator().state(), ReloadState::Idle);
}

#[cfg(unix)]
#[test]
fn failing_build_keeps_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let editor = editor(dir.path(), "echo 'error CS1002: ; expected' >&2; exit 1");
    let before = editor.runtime().assembly_generation("ManagedGame");

    assert_eq!(
        editor.compile(),
        Some(ReloadOutcome::Aborted(AbortReason::BuildFailed))
    );
    assert_eq!(editor.runtime().assembly_generation("ManagedGame"), before);
}

#[test]
fn shutdown_unloads_user_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let editor = editor(dir.path(), "exit 0");
    assert!(editor.is_watching());

    editor.shutdown();
    editor.runtime().shutdown();
    assert!(editor.runtime().loaded_assemblies().is_empty());
}
