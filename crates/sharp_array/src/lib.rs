//! # sharp_array - Dynamic Array Bridge
//!
//! Lets managed scripts mutate native dynamic arrays whose element type is
//! only known at runtime.
//!
//! ## Overview
//!
//! The host reflection system describes each array-typed field with a
//! [`PropertyDescriptor`]: element size and alignment plus construct,
//! destruct and copy-assign callbacks. Managed code passes that descriptor
//! and the address of the field's [`ScriptArrayHeader`] to one of the
//! exported entry points, which wraps them in a short-lived
//! [`ArrayAccessor`] and performs the mutation.
//!
//! ```text
//! ┌─────────────────┐  descriptor*, header*, int…  ┌─────────────────┐
//! │  Managed code   │─────────────────────────────▶│  exports.rs     │
//! └─────────────────┘                              └────────┬────────┘
//!                                                           │
//!                                                           ▼
//! ┌─────────────────┐                              ┌─────────────────┐
//! │PropertyDescriptor│◀──── callbacks ─────────────│  ArrayAccessor  │
//! └─────────────────┘                              └────────┬────────┘
//!                                                           │
//!                                                           ▼
//!                                                  ┌─────────────────┐
//!                                                  │ScriptArrayHeader│
//!                                                  │ (host memory)   │
//!                                                  └─────────────────┘
//! ```
//!
//! The accessor does no locking. Callers must not mutate the same header
//! from two threads at once.
//!
//! ## Example
//!
//! ```
//! use sharp_array::{ArrayAccessor, PropertyDescriptor, ScriptArrayHeader};
//!
//! let desc = PropertyDescriptor::of::<String>().unwrap();
//! let mut header = ScriptArrayHeader::new();
//!
//! let mut array = unsafe { ArrayAccessor::new(&mut header, &desc) };
//! array.initialize(2);
//! array.insert_value(1);
//! assert_eq!(array.len(), 3);
//! array.clear();
//! ```

mod accessor;
mod cache;
mod descriptor;
mod error;
mod exports;
mod header;

pub use accessor::ArrayAccessor;
pub use cache::DescriptorCache;
pub use descriptor::{ConstructFn, CopyAssignFn, DestructFn, PropertyDescriptor, TypeHandle};
pub use error::{DescriptorError, Result};
pub use exports::*;
pub use header::{grow_capacity, ScriptArrayHeader};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::accessor::ArrayAccessor;
    pub use crate::cache::DescriptorCache;
    pub use crate::descriptor::{PropertyDescriptor, TypeHandle};
    pub use crate::error::{DescriptorError, Result};
    pub use crate::header::ScriptArrayHeader;
}
