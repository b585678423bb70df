//! Error types for k-d tree construction and persistence.

use thiserror::Error;

/// Errors that can occur while building, saving, or loading a k-d tree.
#[derive(Error, Debug)]
pub enum TreeError {
    /// Mesh triangle count exceeds what the node encoding can address.
    #[error("mesh has {0} triangles, exceeding the supported maximum of 0x3fffffff")]
    TooManyTriangles(usize),

    /// A build parameter is out of range.
    #[error("invalid build parameters: {0}")]
    InvalidParams(String),

    /// The node array would exceed its addressable capacity.
    #[error("maximum number of k-d tree nodes has been reached: {0}")]
    NodeCapacityExceeded(usize),

    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted tree data failed structural validation.
    #[error("malformed k-d tree data: {0}")]
    Format(String),
}

/// Result type for k-d tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
