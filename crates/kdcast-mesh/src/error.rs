//! Error types for mesh construction and STL parsing.

use thiserror::Error;

/// Errors that can occur while building or loading a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The STL payload is shorter than its header promises.
    #[error("truncated STL data: expected {expected} bytes, found {found}")]
    Truncated {
        /// Byte count implied by the STL triangle count.
        expected: usize,
        /// Byte count actually present.
        found: usize,
    },

    /// A vertex coordinate is NaN or infinite.
    #[error("non-finite vertex coordinate in triangle {0}")]
    NonFiniteVertex(usize),

    /// A triangle references a vertex outside the vertex array.
    #[error("triangle {triangle} references vertex {index}, but only {count} vertices exist")]
    IndexOutOfRange {
        /// Offending triangle.
        triangle: usize,
        /// Out-of-range vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        count: usize,
    },
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
