//! Error types for weight generation and packing.

use thiserror::Error;

/// Errors raised by the generator and the packer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A control parameter is outside its valid domain (unknown shape selector,
    /// ratio outside `[0, 1]`, non-positive capacity or item count, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A weight larger than the container capacity was handed to the packer.
    #[error("Item {index} with weight {weight} exceeds container capacity {capacity}")]
    OversizedItem {
        index: usize,
        weight: f64,
        capacity: f64,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
