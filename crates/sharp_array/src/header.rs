//! Native dynamic array header
//!
//! The header is owned by the host object containing the field. Managed code
//! only ever hands its address across the boundary; the bridge never keeps it.

use std::ptr;

/// In-memory layout of a native dynamic array
///
/// Invariant: `length <= capacity`, and `data` is valid for
/// `capacity * element_size` bytes whenever `capacity > 0`.
#[repr(C)]
#[derive(Debug)]
pub struct ScriptArrayHeader {
    /// Element storage (null when `capacity == 0`)
    pub data: *mut u8,
    /// Number of live elements
    pub length: u32,
    /// Number of allocated element slots
    pub capacity: u32,
}

impl ScriptArrayHeader {
    /// An empty header with no storage
    pub const fn new() -> Self {
        Self {
            data: ptr::null_mut(),
            length: 0,
            capacity: 0,
        }
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Whether the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of allocated slots
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Slots available without reallocating
    pub fn slack(&self) -> usize {
        (self.capacity - self.length) as usize
    }
}

impl Default for ScriptArrayHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Slack policy used when an append or insert outgrows the capacity
///
/// Grows by roughly 3/8 plus a constant so small arrays skip the first few
/// reallocations.
pub fn grow_capacity(required: usize) -> usize {
    const FIRST_GROW: usize = 4;
    const CONSTANT_GROW: usize = 16;

    if required <= FIRST_GROW {
        return FIRST_GROW;
    }

    required
        .saturating_add(3 * required / 8)
        .saturating_add(CONSTANT_GROW)
        .min(u32::MAX as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_header() {
        let header = ScriptArrayHeader::new();
        assert!(header.data.is_null());
        assert!(header.is_empty());
        assert_eq!(header.capacity(), 0);
        assert_eq!(header.slack(), 0);
    }

    #[test]
    fn test_grow_capacity() {
        assert_eq!(grow_capacity(1), 4);
        assert_eq!(grow_capacity(4), 4);
        assert_eq!(grow_capacity(5), 5 + 1 + 16);
        assert_eq!(grow_capacity(64), 64 + 24 + 16);
        assert!(grow_capacity(1000) > 1000);
    }
}
