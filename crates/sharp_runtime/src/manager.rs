//! Runtime manager
//!
//! Sole owner of every loaded assembly. Other components may borrow an
//! assembly through [`RuntimeManager::assembly`], but an outstanding handle
//! blocks unloading, so nothing can keep a reference across an unload.

use crate::assembly::{AssemblyLoader, LoadedAssembly};
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::event::OnceEvent;
use crate::exports::ExportRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Owns the managed assemblies and their lifecycle
pub struct RuntimeManager {
    config: RuntimeConfig,
    loader: Box<dyn AssemblyLoader>,
    exports: ExportRegistry,
    /// Loaded assemblies by name
    assemblies: RwLock<HashMap<String, Arc<LoadedAssembly>>>,
    next_generation: AtomicU64,
    initialized: AtomicBool,
    on_initialized: OnceEvent,
}

impl RuntimeManager {
    /// Create a manager; nothing is loaded until [`RuntimeManager::initialize`]
    pub fn new(config: RuntimeConfig, loader: impl AssemblyLoader + 'static) -> Self {
        Self {
            config,
            loader: Box::new(loader),
            exports: ExportRegistry::new(),
            assemblies: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            on_initialized: OnceEvent::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Native functions offered to assemblies while they load
    pub fn exports(&self) -> &ExportRegistry {
        &self.exports
    }

    /// Name of the user's managed project
    pub fn user_assembly_name(&self) -> &str {
        &self.config.user_assembly_name
    }

    // ========== Initialization ==========

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Load the core and user assemblies and fire the initialization event
    ///
    /// A missing or broken user assembly is logged but does not fail
    /// initialization; a later reload can still bring it in. Calling this
    /// again after success does nothing.
    pub fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        if let Some(core) = self.config.core_assembly_name.clone() {
            self.load_named(&core)?;
        }

        if let Err(e) = self.try_load_user_assembly() {
            log::warn!("Starting without user assembly '{}': {}", self.user_assembly_name(), e);
        }

        self.initialized.store(true, Ordering::Release);
        log::info!("Managed runtime initialized");
        self.on_initialized.fire();
        Ok(())
    }

    /// Run `callback` once, when the runtime first becomes initialized
    ///
    /// Runs immediately if initialization already happened.
    pub fn on_initialized(&self, callback: impl FnOnce() + Send + 'static) {
        self.on_initialized.subscribe(callback);
    }

    // ========== Assembly Lifecycle ==========

    /// Unload an assembly; `false` leaves the previous state untouched
    pub fn unload_assembly(&self, name: &str) -> bool {
        match self.try_unload_assembly(name) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to unload assembly '{}': {}", name, e);
                false
            }
        }
    }

    /// Load the user's assembly; `false` means it is not loaded
    pub fn load_user_assembly(&self) -> bool {
        match self.try_load_user_assembly() {
            Ok(_) => true,
            Err(e) => {
                log::error!("Failed to load user assembly '{}': {}", self.user_assembly_name(), e);
                false
            }
        }
    }

    /// Unload an assembly, reporting why it could not be
    pub fn try_unload_assembly(&self, name: &str) -> Result<()> {
        if self.config.is_shared(name) {
            return Err(RuntimeError::SharedAssembly(name.to_string()));
        }

        let mut assemblies = self.assemblies.write();
        let assembly = assemblies
            .get(name)
            .ok_or_else(|| RuntimeError::NotLoaded(name.to_string()))?;

        let references = Arc::strong_count(assembly) - 1;
        if references > 0 {
            return Err(RuntimeError::AssemblyInUse {
                name: name.to_string(),
                references,
            });
        }

        assembly.module().prepare_unload()?;

        if let Some(assembly) = assemblies.remove(name) {
            log::info!("Unloaded assembly '{}' (generation {})", name, assembly.generation());
        }
        Ok(())
    }

    /// Load the user's assembly from the configured directory
    pub fn try_load_user_assembly(&self) -> Result<Arc<LoadedAssembly>> {
        let name = self.config.user_assembly_name.clone();
        self.load_named(&name)
    }

    fn load_named(&self, name: &str) -> Result<Arc<LoadedAssembly>> {
        if self.assemblies.read().contains_key(name) {
            return Err(RuntimeError::AlreadyLoaded(name.to_string()));
        }

        let path = self.config.assembly_path(name);
        let module = self.loader.load(name, &path, &self.exports)?;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let assembly = Arc::new(LoadedAssembly::new(name.to_string(), path, generation, module));

        let mut assemblies = self.assemblies.write();
        if assemblies.contains_key(name) {
            return Err(RuntimeError::AlreadyLoaded(name.to_string()));
        }
        assemblies.insert(name.to_string(), assembly.clone());

        log::info!("Assembly '{}' ready (generation {})", name, generation);
        Ok(assembly)
    }

    /// Borrow a loaded assembly
    ///
    /// The returned handle must be dropped before the assembly can unload.
    pub fn assembly(&self, name: &str) -> Option<Arc<LoadedAssembly>> {
        self.assemblies.read().get(name).cloned()
    }

    /// Generation of a loaded assembly, without holding a handle
    pub fn assembly_generation(&self, name: &str) -> Option<u64> {
        self.assemblies.read().get(name).map(|a| a.generation())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.assemblies.read().contains_key(name)
    }

    /// Names of all loaded assemblies
    pub fn loaded_assemblies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.assemblies.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Unload everything, user assemblies before shared ones
    pub fn shutdown(&self) {
        let names = self.loaded_assemblies();
        let (shared, user): (Vec<_>, Vec<_>) = names.into_iter().partition(|n| self.config.is_shared(n));

        for name in &user {
            self.unload_assembly(name);
        }

        let mut assemblies = self.assemblies.write();
        for name in &shared {
            assemblies.remove(name);
        }
        if !assemblies.is_empty() {
            log::warn!("{} assemblies still loaded at shutdown", assemblies.len());
        }
        log::info!("Managed runtime shut down");
    }
}

impl Drop for RuntimeManager {
    fn drop(&mut self) {
        log::debug!("Dropping runtime manager");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::AssemblyModule;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    struct StubModule {
        refuse_unload: bool,
    }

    impl AssemblyModule for StubModule {
        fn prepare_unload(&self) -> Result<()> {
            if self.refuse_unload {
                Err(RuntimeError::HookFailed {
                    name: "stub".into(),
                    hook: "unload",
                })
            } else {
                Ok(())
            }
        }
    }

    /// Loader that succeeds unless the name is in `failing`
    #[derive(Clone, Default)]
    struct StubLoader {
        failing: Arc<Mutex<Vec<String>>>,
        refuse_unload: Arc<AtomicBool>,
        loads: Arc<AtomicUsize>,
    }

    impl AssemblyLoader for StubLoader {
        fn load(&self, name: &str, path: &Path, _exports: &ExportRegistry) -> Result<Box<dyn AssemblyModule>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().iter().any(|n| n == name) {
                return Err(RuntimeError::load_error(path, "stubbed failure"));
            }
            Ok(Box::new(StubModule {
                refuse_unload: self.refuse_unload.load(Ordering::SeqCst),
            }))
        }
    }

    fn config() -> RuntimeConfig {
        RuntimeConfig {
            core_assembly_name: Some("Core".into()),
            user_assembly_name: "Game".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_initialize_loads_core_and_user() {
        let manager = RuntimeManager::new(config(), StubLoader::default());
        assert!(!manager.is_initialized());

        manager.initialize().unwrap();
        assert!(manager.is_initialized());
        assert_eq!(manager.loaded_assemblies(), vec!["Core".to_string(), "Game".to_string()]);

        // Idempotent
        manager.initialize().unwrap();
        assert_eq!(manager.loaded_assemblies().len(), 2);
    }

    #[test]
    fn test_initialize_without_user_assembly() {
        let loader = StubLoader::default();
        loader.failing.lock().push("Game".into());
        let manager = RuntimeManager::new(config(), loader);

        manager.initialize().unwrap();
        assert!(manager.is_initialized());
        assert!(!manager.is_loaded("Game"));
    }

    #[test]
    fn test_core_failure_fails_initialize() {
        let loader = StubLoader::default();
        loader.failing.lock().push("Core".into());
        let manager = RuntimeManager::new(config(), loader);

        assert!(manager.initialize().is_err());
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_on_initialized_fires_once() {
        let manager = RuntimeManager::new(config(), StubLoader::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        manager.on_initialized(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        manager.initialize().unwrap();
        manager.initialize().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let c = calls.clone();
        manager.on_initialized(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unload_then_reload_bumps_generation() {
        let manager = RuntimeManager::new(config(), StubLoader::default());
        manager.initialize().unwrap();
        let before = manager.assembly_generation("Game").unwrap();

        assert!(manager.unload_assembly("Game"));
        assert!(!manager.is_loaded("Game"));
        assert!(manager.load_user_assembly());

        let after = manager.assembly_generation("Game").unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_referenced_assembly_cannot_unload() {
        let manager = RuntimeManager::new(config(), StubLoader::default());
        manager.initialize().unwrap();

        let handle = manager.assembly("Game").unwrap();
        let err = manager.try_unload_assembly("Game").unwrap_err();
        assert!(matches!(err, RuntimeError::AssemblyInUse { references: 1, .. }));
        assert!(manager.is_loaded("Game"));

        drop(handle);
        assert!(manager.unload_assembly("Game"));
    }

    #[test]
    fn test_refused_unload_keeps_assembly() {
        let loader = StubLoader::default();
        loader.refuse_unload.store(true, Ordering::SeqCst);
        let manager = RuntimeManager::new(config(), loader);
        manager.initialize().unwrap();
        let generation = manager.assembly_generation("Game");

        assert!(!manager.unload_assembly("Game"));
        assert_eq!(manager.assembly_generation("Game"), generation);
    }

    #[test]
    fn test_shared_and_missing_assemblies() {
        let manager = RuntimeManager::new(config(), StubLoader::default());
        manager.initialize().unwrap();

        assert!(matches!(
            manager.try_unload_assembly("Core"),
            Err(RuntimeError::SharedAssembly(_))
        ));
        assert!(matches!(
            manager.try_unload_assembly("Other"),
            Err(RuntimeError::NotLoaded(_))
        ));
        assert!(matches!(
            manager.try_load_user_assembly(),
            Err(RuntimeError::AlreadyLoaded(_))
        ));
    }

    #[test]
    fn test_load_failure_leaves_nothing_loaded() {
        let loader = StubLoader::default();
        let manager = RuntimeManager::new(config(), loader.clone());
        manager.initialize().unwrap();

        assert!(manager.unload_assembly("Game"));
        loader.failing.lock().push("Game".into());
        assert!(!manager.load_user_assembly());
        assert!(!manager.is_loaded("Game"));
    }

    #[test]
    fn test_shutdown_unloads_everything() {
        let manager = RuntimeManager::new(config(), StubLoader::default());
        manager.initialize().unwrap();

        manager.shutdown();
        assert!(manager.loaded_assemblies().is_empty());
    }
}
