//! Property descriptors for type-erased array elements
//!
//! A descriptor is plain data: the element layout plus a small table of
//! life-cycle callbacks. The accessor never inspects element bytes itself;
//! every construct, destruct and copy goes through these callbacks.

use crate::error::{DescriptorError, Result};
use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ptr;

/// Default-construct an element in place
pub type ConstructFn = unsafe extern "C" fn(dest: *mut u8);
/// Destroy an element in place
pub type DestructFn = unsafe extern "C" fn(dest: *mut u8);
/// Assign `src` into an already constructed `dest`
pub type CopyAssignFn = unsafe extern "C" fn(dest: *mut u8, src: *const u8);

/// Opaque identifier of an element type, supplied by the host reflection
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub u64);

impl TypeHandle {
    /// Handle used when the host did not supply one
    pub const NONE: Self = Self(0);

    /// Derive a stable-per-process handle for a Rust type
    pub fn of<T: 'static>() -> Self {
        let mut hasher = DefaultHasher::new();
        TypeId::of::<T>().hash(&mut hasher);
        // Reserve zero for NONE
        Self(hasher.finish() | 1)
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// Layout and life-cycle callbacks of one array-typed field's element
///
/// Missing callbacks select the plain-old-data path: zero-fill construction,
/// no-op destruction, bitwise copy.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PropertyDescriptor {
    /// Size of one element in bytes (never zero)
    pub element_size: usize,
    /// Alignment of one element in bytes (power of two)
    pub element_align: usize,
    /// Host type of the element
    pub element_handle: TypeHandle,
    /// Default constructor
    pub construct: Option<ConstructFn>,
    /// Destructor
    pub destruct: Option<DestructFn>,
    /// Copy assignment
    pub copy_assign: Option<CopyAssignFn>,
}

impl PropertyDescriptor {
    /// Create a descriptor, validating the layout
    pub fn new(
        element_size: usize,
        element_align: usize,
        element_handle: TypeHandle,
        construct: Option<ConstructFn>,
        destruct: Option<DestructFn>,
        copy_assign: Option<CopyAssignFn>,
    ) -> Result<Self> {
        if element_size == 0 {
            return Err(DescriptorError::ZeroSize);
        }
        if !element_align.is_power_of_two() {
            return Err(DescriptorError::InvalidAlignment(element_align));
        }
        if element_size % element_align != 0 {
            return Err(DescriptorError::UnalignedSize {
                size: element_size,
                align: element_align,
            });
        }

        Ok(Self {
            element_size,
            element_align,
            element_handle,
            construct,
            destruct,
            copy_assign,
        })
    }

    /// Descriptor for a plain-old-data element of the given layout
    pub fn plain(element_size: usize, element_align: usize, element_handle: TypeHandle) -> Result<Self> {
        Self::new(element_size, element_align, element_handle, None, None, None)
    }

    /// Descriptor for a Rust type, using `Default`, `Drop` and `Clone`
    ///
    /// Zero-sized types cannot be described; the host never reflects them.
    pub fn of<T: Default + Clone + 'static>() -> Result<Self> {
        let destruct: Option<DestructFn> = if mem::needs_drop::<T>() {
            Some(destruct_in_place::<T>)
        } else {
            None
        };

        Self::new(
            mem::size_of::<T>(),
            mem::align_of::<T>(),
            TypeHandle::of::<T>(),
            Some(construct_default::<T>),
            destruct,
            Some(clone_assign::<T>),
        )
    }

    /// Whether elements need no destructor call
    pub fn is_trivially_destructible(&self) -> bool {
        self.destruct.is_none()
    }

    /// Default-construct the element at `dest`
    ///
    /// # Safety
    /// `dest` must point to `element_size` writable bytes aligned to
    /// `element_align` that do not hold a live element.
    #[inline]
    pub unsafe fn construct(&self, dest: *mut u8) {
        match self.construct {
            Some(construct) => construct(dest),
            None => ptr::write_bytes(dest, 0, self.element_size),
        }
    }

    /// Default-construct `count` consecutive elements starting at `dest`
    ///
    /// # Safety
    /// See [`PropertyDescriptor::construct`], for every element in the range.
    pub unsafe fn construct_range(&self, dest: *mut u8, count: usize) {
        match self.construct {
            Some(construct) => {
                for i in 0..count {
                    construct(dest.add(i * self.element_size));
                }
            }
            None => ptr::write_bytes(dest, 0, count * self.element_size),
        }
    }

    /// Destroy the element at `dest`
    ///
    /// # Safety
    /// `dest` must hold a live element of this descriptor's type.
    #[inline]
    pub unsafe fn destruct(&self, dest: *mut u8) {
        if let Some(destruct) = self.destruct {
            destruct(dest);
        }
    }

    /// Destroy `count` consecutive elements starting at `dest`
    ///
    /// # Safety
    /// Every element in the range must be live.
    pub unsafe fn destruct_range(&self, dest: *mut u8, count: usize) {
        if let Some(destruct) = self.destruct {
            for i in 0..count {
                destruct(dest.add(i * self.element_size));
            }
        }
    }

    /// Assign the element at `src` into the live element at `dest`
    ///
    /// # Safety
    /// Both pointers must hold live elements and must not overlap.
    #[inline]
    pub unsafe fn copy_assign(&self, dest: *mut u8, src: *const u8) {
        match self.copy_assign {
            Some(copy) => copy(dest, src),
            None => ptr::copy_nonoverlapping(src, dest, self.element_size),
        }
    }
}

unsafe extern "C" fn construct_default<T: Default>(dest: *mut u8) {
    dest.cast::<T>().write(T::default());
}

unsafe extern "C" fn destruct_in_place<T>(dest: *mut u8) {
    ptr::drop_in_place(dest.cast::<T>());
}

unsafe extern "C" fn clone_assign<T: Clone>(dest: *mut u8, src: *const u8) {
    (*dest.cast::<T>()).clone_from(&*src.cast::<T>());
}
