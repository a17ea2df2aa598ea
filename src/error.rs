//! Construction errors.
//!
//! Only building a table can fail. Every operation on a live map is total.

use thiserror::Error;

/// Result type alias for map construction.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Initial capacity was zero.
    #[error("initial capacity must be positive, got {0}")]
    InvalidCapacity(usize),

    /// Load factor was zero, negative or NaN.
    #[error("load factor must be positive, got {0}")]
    InvalidLoadFactor(f32),
}
