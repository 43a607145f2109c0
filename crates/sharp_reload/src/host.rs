//! Host-side collaborators of the reload pipeline

use sharp_runtime::RuntimeManager;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the host application has input focus
pub trait FocusSource: Send + Sync {
    fn has_focus(&self) -> bool;
}

/// Focus source for hosts without a window
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFocused;

impl FocusSource for AlwaysFocused {
    fn has_focus(&self) -> bool {
        true
    }
}

/// Focus flag pushed by the host
#[derive(Debug)]
pub struct FocusFlag(AtomicBool);

impl FocusFlag {
    pub fn new(focused: bool) -> Self {
        Self(AtomicBool::new(focused))
    }

    pub fn set(&self, focused: bool) {
        self.0.store(focused, Ordering::SeqCst);
    }
}

impl Default for FocusFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FocusSource for FocusFlag {
    fn has_focus(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Assembly operations the reload pipeline needs from the runtime
pub trait AssemblyHost: Send + Sync {
    fn user_assembly_name(&self) -> String;
    fn is_assembly_loaded(&self, name: &str) -> bool;
    fn unload_assembly(&self, name: &str) -> bool;
    fn load_user_assembly(&self) -> bool;
}

impl AssemblyHost for RuntimeManager {
    fn user_assembly_name(&self) -> String {
        RuntimeManager::user_assembly_name(self).to_string()
    }

    fn is_assembly_loaded(&self, name: &str) -> bool {
        self.is_loaded(name)
    }

    fn unload_assembly(&self, name: &str) -> bool {
        RuntimeManager::unload_assembly(self, name)
    }

    fn load_user_assembly(&self) -> bool {
        RuntimeManager::load_user_assembly(self)
    }
}
