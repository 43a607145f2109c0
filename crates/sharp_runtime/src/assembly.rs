//! Assembly modules and their loaders
//!
//! The runtime never touches a module's code directly; it goes through
//! [`AssemblyLoader`] so the dynamic-library backend can be swapped for a
//! test double or another hosting strategy.

use crate::error::{Result, RuntimeError};
use crate::exports::ExportRegistry;
use crate::ffi::*;
use libloading::{Library, Symbol};
use std::ffi::CStr;
use std::path::{Path, PathBuf};

/// A module loaded into the runtime
pub trait AssemblyModule: Send + Sync {
    /// Version reported by the module
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Give the module a chance to refuse unloading
    ///
    /// Returning an error keeps the module loaded.
    fn prepare_unload(&self) -> Result<()> {
        Ok(())
    }
}

/// Produces modules from files on disk
pub trait AssemblyLoader: Send + Sync {
    fn load(&self, name: &str, path: &Path, exports: &ExportRegistry) -> Result<Box<dyn AssemblyModule>>;
}

/// An assembly owned by the runtime manager
pub struct LoadedAssembly {
    name: String,
    path: PathBuf,
    generation: u64,
    module: Box<dyn AssemblyModule>,
}

impl LoadedAssembly {
    pub(crate) fn new(name: String, path: PathBuf, generation: u64, module: Box<dyn AssemblyModule>) -> Self {
        Self {
            name,
            path,
            generation,
            module,
        }
    }

    /// Assembly name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the module was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Monotonic load counter; a reload always yields a new generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Version reported by the module
    pub fn version(&self) -> &str {
        self.module.version()
    }

    pub(crate) fn module(&self) -> &dyn AssemblyModule {
        self.module.as_ref()
    }
}

impl std::fmt::Debug for LoadedAssembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedAssembly")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for LoadedAssembly {
    fn drop(&mut self) {
        log::debug!("Releasing assembly '{}' (generation {})", self.name, self.generation);
    }
}

/// Assembly compiled to a native dynamic library
pub struct DylibAssembly {
    name: String,
    version: String,
    unload_hook: Option<AssemblyUnloadFn>,
    /// Keeps the code mapped; declared last so it drops after the hook
    _library: Library,
}

impl DylibAssembly {
    /// Load a module and run its load hook
    pub fn load(name: &str, path: &Path, exports: &ExportRegistry) -> Result<Self> {
        let library = unsafe { Library::new(path).map_err(|e| RuntimeError::load_error(path, e.to_string()))? };

        let get_info: Symbol<GetAssemblyInfoFn> = unsafe {
            library
                .get(ASSEMBLY_INFO_SYMBOL)
                .map_err(|_| RuntimeError::symbol_not_found(name, "sharp_assembly_info"))?
        };

        let info = get_info();
        if info.api_version != SHARP_ASSEMBLY_API_VERSION {
            return Err(RuntimeError::VersionMismatch {
                assembly_version: info.api_version,
                expected_version: SHARP_ASSEMBLY_API_VERSION,
            });
        }

        let reported_name = if info.name.is_null() {
            name.to_string()
        } else {
            unsafe { CStr::from_ptr(info.name) }.to_string_lossy().into_owned()
        };
        if reported_name != name {
            log::warn!("Assembly file for '{}' reports name '{}'", name, reported_name);
        }

        let version = if info.version.is_null() {
            "0.0.0".to_string()
        } else {
            unsafe { CStr::from_ptr(info.version) }.to_string_lossy().into_owned()
        };

        let load_hook: Option<AssemblyLoadFn> =
            unsafe { library.get(ASSEMBLY_LOAD_SYMBOL).ok().map(|s: Symbol<AssemblyLoadFn>| *s) };
        let unload_hook: Option<AssemblyUnloadFn> =
            unsafe { library.get(ASSEMBLY_UNLOAD_SYMBOL).ok().map(|s: Symbol<AssemblyUnloadFn>| *s) };

        if let Some(load) = load_hook {
            let lookup = exports.lookup();
            if !load(&lookup) {
                return Err(RuntimeError::HookFailed {
                    name: name.to_string(),
                    hook: "load",
                });
            }
        }

        log::info!("Loaded assembly '{}' v{} from {}", name, version, path.display());

        Ok(Self {
            name: name.to_string(),
            version,
            unload_hook,
            _library: library,
        })
    }
}

impl AssemblyModule for DylibAssembly {
    fn version(&self) -> &str {
        &self.version
    }

    fn prepare_unload(&self) -> Result<()> {
        match self.unload_hook {
            Some(unload) if !unload() => Err(RuntimeError::HookFailed {
                name: self.name.clone(),
                hook: "unload",
            }),
            _ => Ok(()),
        }
    }
}

impl Drop for DylibAssembly {
    fn drop(&mut self) {
        log::debug!("Unmapping assembly module '{}'", self.name);
    }
}

/// Loads assemblies as native dynamic libraries
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibAssemblyLoader;

impl AssemblyLoader for DylibAssemblyLoader {
    fn load(&self, name: &str, path: &Path, exports: &ExportRegistry) -> Result<Box<dyn AssemblyModule>> {
        if !path.exists() {
            return Err(RuntimeError::load_error(path, "file does not exist"));
        }
        Ok(Box::new(DylibAssembly::load(name, path, exports)?))
    }
}
