#![warn(missing_docs)]

//! SAH k-d tree construction, traversal, and persistence for kdcast.
//!
//! Given an immutable triangle mesh, [`KdTreeBuilder`] partitions space
//! with axis-aligned planes chosen by the Surface Area Heuristic and emits
//! a compact pre-order node array. The resulting [`KdTree`] answers
//! closest-hit ray queries in logarithmic expected time and round-trips
//! through a small binary file format.
//!
//! # Architecture
//!
//! - [`Node`] - 8-byte tagged node encoding (interior / empty / single- /
//!   multi-triangle leaf)
//! - [`KdTreeBuilder`] - recursive SAH construction with reused scratch
//!   memory, configured by [`BuildParams`]
//! - [`KdTree`] - the node and triangle-index arrays plus iterative
//!   stack-based traversal and file I/O
//! - [`BuildStats`] - leaf and depth statistics for validating builds
//!
//! # Example
//!
//! ```ignore
//! use kdcast_tree::{BuildParams, KdTreeBuilder};
//!
//! let mesh = kdcast_mesh::load_stl("bunny.stl")?;
//! let mut builder = KdTreeBuilder::new(&mesh, BuildParams::default())?;
//! let tree = builder.build()?;
//!
//! if let Some(hit) = tree.intersect(&ray) {
//!     println!("triangle {} at t = {}", hit.triangle_index, hit.t);
//! }
//! ```

mod builder;
mod error;
mod io;
mod node;
mod stats;
mod tree;

pub use builder::{BuildParams, KdTreeBuilder};
pub use error::{Result, TreeError};
pub use node::{Node, MAX_NODE_COUNT, MAX_TRIANGLE_COUNT};
pub use stats::BuildStats;
pub use tree::{Intersection, KdTree};
