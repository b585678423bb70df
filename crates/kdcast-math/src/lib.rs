#![warn(missing_docs)]

//! Math types for the kdcast ray casting kernel.
//!
//! Thin wrappers around nalgebra providing the geometric vocabulary the
//! k-d tree needs: 32-bit and 64-bit vectors and bounding boxes, rays with
//! precomputed reciprocal directions, and ray-primitive intersection tests.

mod bbox;
mod ray;
mod triangle;

pub use bbox::{BBox32, BBox64};
pub use ray::Ray;
pub use triangle::{intersect_triangle, TriangleHit};

/// A 3D vector with f32 components, indexable by axis 0/1/2.
pub type Vec3f = nalgebra::Vector3<f32>;

/// A 3D vector with f64 components, indexable by axis 0/1/2.
pub type Vec3d = nalgebra::Vector3<f64>;

/// A point in 3D space with f32 coordinates.
pub type Point3f = nalgebra::Point3<f32>;

/// A point in 3D space with f64 coordinates.
pub type Point3d = nalgebra::Point3<f64>;
