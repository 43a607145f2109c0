//! Managed-call entry points
//!
//! Every function takes the element descriptor and the array header by raw
//! pointer, followed by the operation's integer arguments, and returns
//! nothing. Null pointers are logged and ignored. Negative lengths are
//! treated as zero; negative indices are out of range.

use crate::accessor::ArrayAccessor;
use crate::descriptor::PropertyDescriptor;
use crate::header::ScriptArrayHeader;
use std::ffi::{c_int, c_void};

/// Signature of the host's export registration callback
pub type RegisterExportFn<'a> = dyn FnMut(&'static str, *const c_void) + 'a;

/// Names and addresses of the array entry points
pub fn exported_functions() -> [(&'static str, *const c_void); 7] {
    [
        ("InitializeArray", sharp_array_initialize as *const c_void),
        ("EmptyArray", sharp_array_empty as *const c_void),
        ("AddToArray", sharp_array_add as *const c_void),
        ("InsertInArray", sharp_array_insert as *const c_void),
        ("RemoveFromArray", sharp_array_remove as *const c_void),
        ("ResizeArray", sharp_array_resize as *const c_void),
        ("SwapValues", sharp_array_swap_values as *const c_void),
    ]
}

/// Hand every array entry point to the host's registration callback
pub fn export_functions(register: &mut RegisterExportFn<'_>) {
    for (name, function) in exported_functions() {
        register(name, function);
    }
}

unsafe fn with_accessor(
    operation: &str,
    property: *const PropertyDescriptor,
    array: *mut ScriptArrayHeader,
    f: impl FnOnce(&mut ArrayAccessor<'_>),
) {
    match ArrayAccessor::from_raw(array, property) {
        Some(mut accessor) => f(&mut accessor),
        None => log::error!("{}: null property or array pointer", operation),
    }
}

fn length_arg(value: c_int) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn index_arg(value: c_int) -> usize {
    // Negative indices map past any valid length and are rejected downstream
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Destroy all elements and hold `length` default elements
///
/// # Safety
/// `property` and `array` must be null or valid, and `array` must have been
/// built with `property`'s element layout.
#[no_mangle]
pub unsafe extern "C" fn sharp_array_initialize(
    property: *const PropertyDescriptor,
    array: *mut ScriptArrayHeader,
    length: c_int,
) {
    with_accessor("InitializeArray", property, array, |a| a.initialize(length_arg(length)));
}

/// Destroy all elements
///
/// # Safety
/// See [`sharp_array_initialize`].
#[no_mangle]
pub unsafe extern "C" fn sharp_array_empty(property: *const PropertyDescriptor, array: *mut ScriptArrayHeader) {
    with_accessor("EmptyArray", property, array, |a| a.clear());
}

/// Append one default element
///
/// # Safety
/// See [`sharp_array_initialize`].
#[no_mangle]
pub unsafe extern "C" fn sharp_array_add(property: *const PropertyDescriptor, array: *mut ScriptArrayHeader) {
    with_accessor("AddToArray", property, array, |a| {
        a.add_value();
    });
}

/// Insert one default element at `index`
///
/// # Safety
/// See [`sharp_array_initialize`].
#[no_mangle]
pub unsafe extern "C" fn sharp_array_insert(
    property: *const PropertyDescriptor,
    array: *mut ScriptArrayHeader,
    index: c_int,
) {
    with_accessor("InsertInArray", property, array, |a| a.insert_value(index_arg(index)));
}

/// Remove the element at `index`
///
/// # Safety
/// See [`sharp_array_initialize`].
#[no_mangle]
pub unsafe extern "C" fn sharp_array_remove(
    property: *const PropertyDescriptor,
    array: *mut ScriptArrayHeader,
    index: c_int,
) {
    with_accessor("RemoveFromArray", property, array, |a| a.remove_value(index_arg(index)));
}

/// Resize to `length` elements
///
/// # Safety
/// See [`sharp_array_initialize`].
#[no_mangle]
pub unsafe extern "C" fn sharp_array_resize(
    property: *const PropertyDescriptor,
    array: *mut ScriptArrayHeader,
    length: c_int,
) {
    with_accessor("ResizeArray", property, array, |a| a.resize(length_arg(length)));
}

/// Exchange two elements
///
/// # Safety
/// See [`sharp_array_initialize`].
#[no_mangle]
pub unsafe extern "C" fn sharp_array_swap_values(
    property: *const PropertyDescriptor,
    array: *mut ScriptArrayHeader,
    index_a: c_int,
    index_b: c_int,
) {
    with_accessor("SwapValues", property, array, |a| {
        a.swap_values(index_arg(index_a), index_arg(index_b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_export_table() {
        let mut names = Vec::new();
        export_functions(&mut |name, function| {
            assert!(!function.is_null());
            names.push(name);
        });

        assert_eq!(
            names,
            vec![
                "InitializeArray",
                "EmptyArray",
                "AddToArray",
                "InsertInArray",
                "RemoveFromArray",
                "ResizeArray",
                "SwapValues",
            ]
        );
    }

    #[test]
    fn test_null_pointers_are_ignored() {
        let desc = PropertyDescriptor::of::<u32>().unwrap();
        let mut header = ScriptArrayHeader::new();

        unsafe {
            sharp_array_initialize(ptr::null(), &mut header, 4);
            sharp_array_add(&desc, ptr::null_mut());
            sharp_array_swap_values(ptr::null(), ptr::null_mut(), 0, 1);
        }
        assert_eq!(header.len(), 0);
    }

    #[test]
    fn test_entry_points_drive_header() {
        let desc = PropertyDescriptor::of::<i32>().unwrap();
        let mut header = ScriptArrayHeader::new();

        unsafe {
            sharp_array_initialize(&desc, &mut header, 3);
            assert_eq!(header.len(), 3);

            sharp_array_add(&desc, &mut header);
            sharp_array_insert(&desc, &mut header, 0);
            assert_eq!(header.len(), 5);

            sharp_array_remove(&desc, &mut header, -1);
            assert_eq!(header.len(), 5);

            sharp_array_remove(&desc, &mut header, 4);
            sharp_array_resize(&desc, &mut header, -3);
            assert_eq!(header.len(), 0);

            sharp_array_resize(&desc, &mut header, 2);
            *header.data.cast::<i32>() = 5;
            sharp_array_swap_values(&desc, &mut header, 0, 1);
            assert_eq!(*header.data.cast::<i32>().add(1), 5);

            sharp_array_empty(&desc, &mut header);
        }
        assert_eq!(header.len(), 0);
        assert_eq!(header.capacity(), 0);
    }
}
