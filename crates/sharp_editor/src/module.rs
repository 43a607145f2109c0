//! Editor module
//!
//! Wires the runtime, the reload coordinator and the script watcher
//! together. Hot reload only becomes active once the runtime reports that it
//! has initialized; [`EditorModule::startup`] can be called before or after
//! that happens.

use crate::config::EditorConfig;
use parking_lot::Mutex;
use sharp_reload::{
    InstanceReinstancer, ProcessBuildTool, ReloadCoordinator, ReloadOutcome, Reinstancer, ScriptWatcher,
};
use sharp_runtime::{AssemblyLoader, RuntimeManager};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct ModuleState {
    coordinator: Arc<ReloadCoordinator>,
    reinstancer: Arc<dyn Reinstancer>,
    watcher: Mutex<Option<ScriptWatcher>>,
    ticking: AtomicBool,
    shut_down: AtomicBool,
}

impl ModuleState {
    /// Runs once the runtime is initialized
    fn activate(&self) {
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }

        let root = self.coordinator.settings().script_dir;
        let events = self.coordinator.clone();
        match ScriptWatcher::watch(&root, move |changes| {
            events.on_files_changed(changes);
        }) {
            Ok(watcher) => *self.watcher.lock() = Some(watcher),
            Err(e) => log::error!("Hot reload disabled, cannot watch {}: {}", root.display(), e),
        }

        self.reinstancer.initialize();
        self.ticking.store(true, Ordering::SeqCst);
        log::info!("Editor hot reload active");
    }
}

/// Editor-side host of the managed runtime
pub struct EditorModule {
    runtime: Arc<RuntimeManager>,
    state: Arc<ModuleState>,
}

impl EditorModule {
    pub fn new(
        runtime: Arc<RuntimeManager>,
        coordinator: Arc<ReloadCoordinator>,
        reinstancer: Arc<dyn Reinstancer>,
    ) -> Self {
        Self {
            runtime,
            state: Arc::new(ModuleState {
                coordinator,
                reinstancer,
                watcher: Mutex::new(None),
                ticking: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Build the full module graph from config
    ///
    /// Registers the native array functions with the runtime's export table
    /// before any assembly can load.
    pub fn from_config(config: EditorConfig, loader: impl AssemblyLoader + 'static) -> Self {
        let runtime = Arc::new(RuntimeManager::new(config.runtime, loader));
        sharp_array::export_functions(&mut |name, function| runtime.exports().register(name, function));

        let reinstancer: Arc<dyn Reinstancer> = Arc::new(InstanceReinstancer::new());
        let build_tool = Arc::new(ProcessBuildTool::new(config.hot_reload.build.clone()));
        let coordinator = Arc::new(ReloadCoordinator::new(
            config.hot_reload,
            build_tool,
            runtime.clone(),
            reinstancer.clone(),
        ));

        Self::new(runtime, coordinator, reinstancer)
    }

    pub fn runtime(&self) -> &Arc<RuntimeManager> {
        &self.runtime
    }

    pub fn coordinator(&self) -> &Arc<ReloadCoordinator> {
        &self.state.coordinator
    }

    /// Whether the watcher is registered and ticks reach the coordinator
    pub fn is_active(&self) -> bool {
        self.state.ticking.load(Ordering::SeqCst)
    }

    pub fn is_watching(&self) -> bool {
        self.state.watcher.lock().is_some()
    }

    // ========== Lifecycle ==========

    /// Arm hot reload for when the runtime finishes initializing
    ///
    /// Activates immediately if the runtime is already initialized.
    pub fn startup(&self) {
        let state = self.state.clone();
        self.runtime.on_initialized(move || state.activate());
    }

    /// Host tick; runs any scheduled reload
    pub fn tick(&self) -> Option<ReloadOutcome> {
        if !self.is_active() {
            return None;
        }
        self.state.coordinator.tick()
    }

    /// Manual "Compile" action
    pub fn compile(&self) -> Option<ReloadOutcome> {
        if !self.runtime.is_initialized() {
            log::warn!("Cannot compile before the runtime is initialized");
            return None;
        }
        self.state.coordinator.force_reload()
    }

    /// Stop ticking and drop the watcher
    pub fn shutdown(&self) {
        self.state.shut_down.store(true, Ordering::SeqCst);
        self.state.ticking.store(false, Ordering::SeqCst);
        if self.state.watcher.lock().take().is_some() {
            log::info!("Stopped watching scripts");
        }
    }
}

impl std::fmt::Debug for EditorModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorModule")
            .field("active", &self.is_active())
            .field("watching", &self.is_watching())
            .finish()
    }
}
