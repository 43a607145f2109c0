//! Structural operations over a type-erased native array
//!
//! [`ArrayAccessor`] pairs one [`ScriptArrayHeader`] with the
//! [`PropertyDescriptor`] of its element type for the duration of a single
//! call. It owns nothing: the header belongs to the host object and the
//! descriptor to the host reflection data.
//!
//! Element moves (reallocation, shifting after insert/remove) are expressed
//! as construct + copy-assign + destruct through the descriptor, so elements
//! that own resources stay balanced. Swapping is a bitwise exchange.

use crate::descriptor::PropertyDescriptor;
use crate::header::{grow_capacity, ScriptArrayHeader};
use std::alloc::{self, Layout};
use std::ptr;

/// Transient view used to mutate one native array
pub struct ArrayAccessor<'a> {
    header: &'a mut ScriptArrayHeader,
    descriptor: &'a PropertyDescriptor,
}

impl<'a> ArrayAccessor<'a> {
    /// Pair a header with the descriptor of its elements
    ///
    /// # Safety
    /// The header must satisfy its invariants, and its storage and live
    /// elements must have been created through a descriptor with the same
    /// layout and callbacks as `descriptor`. No other thread may mutate the
    /// header while the accessor is alive.
    pub unsafe fn new(header: &'a mut ScriptArrayHeader, descriptor: &'a PropertyDescriptor) -> Self {
        debug_assert!(header.length <= header.capacity);
        Self { header, descriptor }
    }

    /// Build an accessor from raw pointers handed over by managed code
    ///
    /// Returns `None` if either pointer is null.
    ///
    /// # Safety
    /// Non-null pointers must be valid for the lifetime `'a`, and the
    /// requirements of [`ArrayAccessor::new`] apply.
    pub unsafe fn from_raw(
        header: *mut ScriptArrayHeader,
        descriptor: *const PropertyDescriptor,
    ) -> Option<Self> {
        if header.is_null() || descriptor.is_null() {
            return None;
        }
        Some(Self::new(&mut *header, &*descriptor))
    }

    /// The descriptor used for element operations
    pub fn descriptor(&self) -> &PropertyDescriptor {
        self.descriptor
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.header.len()
    }

    /// Whether the array is empty
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Number of allocated slots
    pub fn capacity(&self) -> usize {
        self.header.capacity()
    }

    /// Whether `index` addresses a live element
    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.len()
    }

    /// Raw pointer to a live element
    pub fn element_ptr(&self, index: usize) -> Option<*mut u8> {
        if self.is_valid_index(index) {
            Some(self.slot(index))
        } else {
            None
        }
    }

    /// Typed view of a live element
    ///
    /// # Safety
    /// `T` must be the element type the descriptor describes.
    pub unsafe fn get<T>(&self, index: usize) -> Option<&T> {
        self.element_ptr(index).map(|ptr| &*ptr.cast::<T>())
    }

    /// Typed mutable view of a live element
    ///
    /// # Safety
    /// `T` must be the element type the descriptor describes.
    pub unsafe fn get_mut<T>(&mut self, index: usize) -> Option<&mut T> {
        self.element_ptr(index).map(|ptr| &mut *ptr.cast::<T>())
    }

    // ========== Element Operations ==========

    /// Destroy all elements, then hold exactly `length` default elements
    pub fn initialize(&mut self, length: usize) {
        self.empty_values(length);
        self.add_values(length);
    }

    /// Destroy all elements and release the storage
    pub fn clear(&mut self) {
        self.empty_values(0);
    }

    /// Append one default element, returning its index
    pub fn add_value(&mut self) -> usize {
        self.add_values(1)
    }

    /// Insert one default element at `index` (`index <= len`)
    pub fn insert_value(&mut self, index: usize) {
        self.insert_values(index, 1);
    }

    /// Remove the element at `index` (`index < len`)
    pub fn remove_value(&mut self, index: usize) {
        self.remove_values(index, 1);
    }

    /// Grow with default elements or shrink by destroying the tail
    pub fn resize(&mut self, new_length: usize) {
        let length = self.len();
        if new_length > length {
            self.add_values(new_length - length);
        } else if new_length < length {
            self.remove_values(new_length, length - new_length);
        }
    }

    /// Exchange the contents of two live elements
    pub fn swap_values(&mut self, a: usize, b: usize) {
        if !self.is_valid_index(a) || !self.is_valid_index(b) {
            log::error!(
                "SwapValues out of range: ({}, {}) with length {}",
                a,
                b,
                self.len()
            );
            return;
        }
        if a == b {
            return;
        }

        unsafe {
            ptr::swap_nonoverlapping(self.slot(a), self.slot(b), self.descriptor.element_size);
        }
    }

    // ========== Multi-element Forms ==========

    /// Destroy all elements and reallocate to exactly `slack` slots
    pub fn empty_values(&mut self, slack: usize) {
        let length = self.len();
        unsafe {
            self.descriptor.destruct_range(self.header.data, length);
        }
        self.header.length = 0;

        if slack != self.capacity() {
            self.reallocate(slack);
        }
    }

    /// Append `count` default elements, returning the index of the first
    pub fn add_values(&mut self, count: usize) -> usize {
        let old_length = self.len();
        if count == 0 {
            return old_length;
        }

        let new_length = checked_length(old_length, count);
        self.reserve_for(new_length);

        unsafe {
            self.descriptor.construct_range(self.slot(old_length), count);
        }
        self.header.length = new_length as u32;
        old_length
    }

    /// Insert `count` default elements at `index` (`index <= len`)
    pub fn insert_values(&mut self, index: usize, count: usize) {
        let old_length = self.len();
        if index > old_length {
            log::error!("Insert index {} out of range for length {}", index, old_length);
            return;
        }
        if count == 0 {
            return;
        }

        let new_length = checked_length(old_length, count);
        self.reserve_for(new_length);

        let desc = self.descriptor;
        unsafe {
            desc.construct_range(self.slot(old_length), count);
            self.header.length = new_length as u32;

            // Shift the tail right, back to front
            for dest in (index + count..new_length).rev() {
                desc.copy_assign(self.slot(dest), self.slot(dest - count));
            }

            // The opened slots still hold shifted values
            for slot in index..(index + count).min(old_length) {
                let ptr = self.slot(slot);
                desc.destruct(ptr);
                desc.construct(ptr);
            }
        }
    }

    /// Remove `count` elements starting at `index` (`index + count <= len`)
    pub fn remove_values(&mut self, index: usize, count: usize) {
        let old_length = self.len();
        if index.checked_add(count).map_or(true, |end| end > old_length) {
            log::error!(
                "Remove range {}..+{} out of range for length {}",
                index,
                count,
                old_length
            );
            return;
        }
        if count == 0 {
            return;
        }

        let desc = self.descriptor;
        let new_length = old_length - count;
        unsafe {
            // Shift the tail left, front to back
            for dest in index..new_length {
                desc.copy_assign(self.slot(dest), self.slot(dest + count));
            }
            desc.destruct_range(self.slot(new_length), count);
        }
        self.header.length = new_length as u32;
    }

    // ========== Storage ==========

    #[inline]
    fn slot(&self, index: usize) -> *mut u8 {
        // `wrapping_add` keeps the zero-capacity case (null data) well defined
        self.header.data.wrapping_add(index * self.descriptor.element_size)
    }

    fn reserve_for(&mut self, required: usize) {
        if required > self.capacity() {
            self.reallocate(grow_capacity(required));
        }
    }

    fn layout(&self, capacity: usize) -> Layout {
        self.descriptor
            .element_size
            .checked_mul(capacity)
            .and_then(|size| Layout::from_size_align(size, self.descriptor.element_align).ok())
            .unwrap_or_else(|| capacity_overflow())
    }

    /// Move the live elements into a block of exactly `new_capacity` slots
    fn reallocate(&mut self, new_capacity: usize) {
        let length = self.len();
        debug_assert!(new_capacity >= length);
        if new_capacity > u32::MAX as usize {
            capacity_overflow();
        }

        let old_data = self.header.data;
        let old_capacity = self.capacity();

        let new_data = if new_capacity == 0 {
            ptr::null_mut()
        } else {
            let layout = self.layout(new_capacity);
            let data = unsafe { alloc::alloc(layout) };
            if data.is_null() {
                alloc::handle_alloc_error(layout);
            }
            data
        };

        if length > 0 {
            let desc = self.descriptor;
            let size = desc.element_size;
            unsafe {
                for i in 0..length {
                    let dest = new_data.add(i * size);
                    let src = old_data.add(i * size);
                    desc.construct(dest);
                    desc.copy_assign(dest, src);
                    desc.destruct(src);
                }
            }
        }

        if old_capacity > 0 && !old_data.is_null() {
            unsafe { alloc::dealloc(old_data, self.layout(old_capacity)) };
        }

        self.header.data = new_data;
        self.header.capacity = new_capacity as u32;
    }
}

fn checked_length(length: usize, count: usize) -> usize {
    match length.checked_add(count) {
        Some(total) if total <= u32::MAX as usize => total,
        _ => capacity_overflow(),
    }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("script array capacity overflow");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static LIVE: Cell<isize> = const { Cell::new(0) };
    }

    /// Element that counts live instances on the current thread
    #[derive(Debug, PartialEq)]
    struct Tracked(u32);

    impl Default for Tracked {
        fn default() -> Self {
            LIVE.with(|l| l.set(l.get() + 1));
            Tracked(0)
        }
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            LIVE.with(|l| l.set(l.get() + 1));
            Tracked(self.0)
        }

        fn clone_from(&mut self, source: &Self) {
            self.0 = source.0;
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            LIVE.with(|l| l.set(l.get() - 1));
        }
    }

    fn live() -> isize {
        LIVE.with(|l| l.get())
    }

    fn values(accessor: &ArrayAccessor<'_>) -> Vec<u32> {
        (0..accessor.len())
            .map(|i| unsafe { accessor.get::<Tracked>(i).unwrap().0 })
            .collect()
    }

    fn fill(accessor: &mut ArrayAccessor<'_>, values: &[u32]) {
        accessor.initialize(values.len());
        for (i, v) in values.iter().enumerate() {
            unsafe { accessor.get_mut::<Tracked>(i).unwrap().0 = *v };
        }
    }

    #[test]
    fn test_initialize_and_clear() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        array.initialize(5);
        assert_eq!(array.len(), 5);
        assert_eq!(array.capacity(), 5);
        assert_eq!(live(), 5);

        array.initialize(2);
        assert_eq!(array.len(), 2);
        assert_eq!(live(), 2);

        array.clear();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert_eq!(live(), 0);
        assert!(header.data.is_null());
    }

    #[test]
    fn test_add_grows_capacity() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        for expected in 0..50 {
            assert_eq!(array.add_value(), expected);
            unsafe { array.get_mut::<Tracked>(expected).unwrap().0 = expected as u32 };
            assert!(array.len() <= array.capacity());
        }
        assert_eq!(values(&array), (0..50).collect::<Vec<_>>());
        assert_eq!(live(), 50);

        array.clear();
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_insert_shifts_right() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        fill(&mut array, &[1, 2, 3]);
        array.insert_value(1);
        assert_eq!(values(&array), vec![1, 0, 2, 3]);

        array.insert_value(4);
        assert_eq!(values(&array), vec![1, 0, 2, 3, 0]);

        array.insert_value(0);
        assert_eq!(values(&array), vec![0, 1, 0, 2, 3, 0]);
        assert_eq!(live(), 6);

        array.clear();
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_insert_multiple_near_end() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        fill(&mut array, &[1, 2]);
        array.insert_values(1, 3);
        assert_eq!(values(&array), vec![1, 0, 0, 0, 2]);
        assert_eq!(live(), 5);

        array.clear();
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_remove_shifts_left() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        fill(&mut array, &[10, 20, 30, 40]);
        let capacity = array.capacity();

        array.remove_value(1);
        assert_eq!(values(&array), vec![10, 30, 40]);
        assert_eq!(array.capacity(), capacity);
        assert_eq!(live(), 3);

        array.remove_value(2);
        assert_eq!(values(&array), vec![10, 30]);

        array.clear();
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        fill(&mut array, &[1, 2]);
        array.insert_value(3);
        array.remove_value(2);
        array.remove_values(1, 5);
        array.swap_values(0, 2);
        assert_eq!(values(&array), vec![1, 2]);

        array.clear();
    }

    #[test]
    fn test_resize() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        fill(&mut array, &[7, 8, 9]);
        array.resize(5);
        assert_eq!(values(&array), vec![7, 8, 9, 0, 0]);

        array.resize(1);
        assert_eq!(values(&array), vec![7]);
        assert_eq!(live(), 1);

        array.clear();
        assert_eq!(live(), 0);
    }

    #[test]
    fn test_swap_values() {
        let desc = PropertyDescriptor::of::<Tracked>().unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        fill(&mut array, &[1, 2, 3]);
        array.swap_values(0, 2);
        assert_eq!(values(&array), vec![3, 2, 1]);
        array.swap_values(1, 1);
        assert_eq!(values(&array), vec![3, 2, 1]);

        array.clear();
    }

    #[test]
    fn test_plain_descriptor_zero_fills() {
        let desc = PropertyDescriptor::plain(8, 4, crate::descriptor::TypeHandle::NONE).unwrap();
        let mut header = ScriptArrayHeader::new();
        let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };

        array.initialize(3);
        for i in 0..3 {
            let bytes = unsafe { std::slice::from_raw_parts(array.element_ptr(i).unwrap(), 8) };
            assert!(bytes.iter().all(|b| *b == 0));
        }
        assert!(array.element_ptr(3).is_none());

        array.clear();
    }

    #[test]
    fn test_from_raw_rejects_null() {
        let desc = PropertyDescriptor::of::<u32>().unwrap();
        let mut header = ScriptArrayHeader::new();

        unsafe {
            assert!(ArrayAccessor::from_raw(ptr::null_mut(), &desc).is_none());
            assert!(ArrayAccessor::from_raw(&mut header, ptr::null()).is_none());
            assert!(ArrayAccessor::from_raw(&mut header, &desc).is_some());
        }
    }
}
