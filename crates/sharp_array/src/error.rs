//! Error types for the array bridge

use thiserror::Error;

/// Result type for descriptor construction
pub type Result<T> = std::result::Result<T, DescriptorError>;

/// Errors raised while building a property descriptor
///
/// Array mutations themselves never fail; only descriptor validation does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Element size was zero
    #[error("Element size must be greater than zero")]
    ZeroSize,

    /// Alignment is not a power of two
    #[error("Element alignment {0} is not a power of two")]
    InvalidAlignment(usize),

    /// Size is not a multiple of the alignment
    #[error("Element size {size} is not a multiple of alignment {align}")]
    UnalignedSize {
        size: usize,
        align: usize,
    },
}
