//! Native functions exposed to managed code
//!
//! Native subsystems register `(name, address)` pairs here; assembly modules
//! resolve them through [`FfiExportLookup`] while loading.

use crate::ffi::FfiExportLookup;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::ptr;

/// Name → address table of exported native functions
#[derive(Default)]
pub struct ExportRegistry {
    // Addresses are stored as integers so the table is Send + Sync
    functions: RwLock<HashMap<String, usize>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function; a later registration under the same name wins
    pub fn register(&self, name: &str, function: *const c_void) {
        if function.is_null() {
            log::warn!("Ignoring null export '{}'", name);
            return;
        }
        if self.functions.write().insert(name.to_string(), function as usize).is_some() {
            log::warn!("Export '{}' registered twice, keeping the latest", name);
        }
    }

    /// Address of a registered function
    pub fn find(&self, name: &str) -> Option<*const c_void> {
        self.functions.read().get(name).map(|addr| *addr as *const c_void)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }

    /// FFI view of this registry, valid while `self` is alive
    pub fn lookup(&self) -> FfiExportLookup {
        FfiExportLookup {
            context: self as *const Self as *const c_void,
            find: find_export,
        }
    }
}

extern "C" fn find_export(context: *const c_void, name: *const c_char) -> *const c_void {
    if context.is_null() || name.is_null() {
        return ptr::null();
    }

    let registry = unsafe { &*(context as *const ExportRegistry) };
    let name = unsafe { CStr::from_ptr(name) };
    match name.to_str() {
        Ok(name) => registry.find(name).unwrap_or(ptr::null()),
        Err(_) => ptr::null(),
    }
}
