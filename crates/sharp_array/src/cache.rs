//! Descriptor cache
//!
//! Descriptors are selected once per element type and shared afterwards.

use crate::descriptor::{PropertyDescriptor, TypeHandle};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared store of element descriptors keyed by type handle
#[derive(Default)]
pub struct DescriptorCache {
    descriptors: RwLock<HashMap<TypeHandle, Arc<PropertyDescriptor>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a descriptor
    pub fn get(&self, handle: TypeHandle) -> Option<Arc<PropertyDescriptor>> {
        self.descriptors.read().get(&handle).cloned()
    }

    /// Return the cached descriptor for `handle`, building it on first use
    pub fn get_or_insert_with<F>(&self, handle: TypeHandle, build: F) -> Result<Arc<PropertyDescriptor>>
    where
        F: FnOnce() -> Result<PropertyDescriptor>,
    {
        // Check cache first
        if let Some(desc) = self.get(handle) {
            return Ok(desc);
        }

        let mut descriptors = self.descriptors.write();
        if let Some(desc) = descriptors.get(&handle) {
            return Ok(desc.clone());
        }

        let desc = Arc::new(build()?);
        descriptors.insert(handle, desc.clone());
        log::debug!(
            "Cached array element descriptor {:?} ({} bytes)",
            handle,
            desc.element_size
        );
        Ok(desc)
    }

    /// Descriptor for a Rust element type
    pub fn for_type<T: Default + Clone + 'static>(&self) -> Result<Arc<PropertyDescriptor>> {
        self.get_or_insert_with(TypeHandle::of::<T>(), PropertyDescriptor::of::<T>)
    }

    /// Drop every cached descriptor
    ///
    /// Only valid once no accessor can reference them, e.g. after the
    /// assembly that registered them was unloaded.
    pub fn clear(&self) {
        self.descriptors.write().clear();
    }

    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }
}
