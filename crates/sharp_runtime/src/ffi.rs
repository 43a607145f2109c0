//! FFI types and entry-point signatures for assembly modules
//!
//! A compiled assembly module is a dynamic library exporting
//! `sharp_assembly_info` and, optionally, `sharp_assembly_load` and
//! `sharp_assembly_unload`. All types use `#[repr(C)]`.

use std::ffi::{c_char, c_void};

/// API version for compatibility checking
pub const SHARP_ASSEMBLY_API_VERSION: u32 = 1;

/// Symbol names, null-terminated for `libloading`
pub const ASSEMBLY_INFO_SYMBOL: &[u8] = b"sharp_assembly_info\0";
pub const ASSEMBLY_LOAD_SYMBOL: &[u8] = b"sharp_assembly_load\0";
pub const ASSEMBLY_UNLOAD_SYMBOL: &[u8] = b"sharp_assembly_unload\0";

/// Metadata exported by an assembly module
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiAssemblyInfo {
    /// API version the module was built against
    pub api_version: u32,
    /// Assembly name (null-terminated, may be null)
    pub name: *const c_char,
    /// Version string (null-terminated, may be null)
    pub version: *const c_char,
}

/// Resolves native entry points by name for managed code
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiExportLookup {
    /// Opaque registry pointer passed back to `find`
    pub context: *const c_void,
    /// Returns the function address, or null when unknown
    pub find: extern "C" fn(context: *const c_void, name: *const c_char) -> *const c_void,
}

/// `sharp_assembly_info`
pub type GetAssemblyInfoFn = extern "C" fn() -> FfiAssemblyInfo;

/// `sharp_assembly_load`: receives the export lookup, returns success
pub type AssemblyLoadFn = extern "C" fn(lookup: *const FfiExportLookup) -> bool;

/// `sharp_assembly_unload`: returns false while managed objects are still alive
pub type AssemblyUnloadFn = extern "C" fn() -> bool;
