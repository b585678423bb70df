//! kdcast: SAH k-d tree ray casting over static triangle meshes
//!
//! Builds a k-d tree for an immutable triangle mesh with the Surface Area
//! Heuristic and answers closest-hit ray queries in logarithmic expected
//! time. Trees round-trip through a compact binary format, and meshes load
//! from binary STL.
//!
//! # Example
//!
//! ```rust,no_run
//! use kdcast::{BuildParams, KdTreeBuilder, Point3d, Ray, Vec3d};
//!
//! let mesh = kdcast::load_stl("bunny.stl").unwrap();
//! let mut builder = KdTreeBuilder::new(&mesh, BuildParams::default()).unwrap();
//! let tree = builder.build().unwrap();
//!
//! let ray = Ray::new(Point3d::new(0.0, 0.0, -10.0), Vec3d::new(0.0, 0.0, 1.0));
//! if let Some(hit) = tree.intersect(&ray) {
//!     println!("triangle {} at t = {}", hit.triangle_index, hit.t);
//! }
//! tree.save_to_file("bunny.kdtree").unwrap();
//! ```

pub use kdcast_math::{
    intersect_triangle, BBox32, BBox64, Point3d, Point3f, Ray, TriangleHit, Vec3d, Vec3f,
};
pub use kdcast_mesh::{load_stl, parse_stl, stl_bytes, MeshError, TriangleMesh};
pub use kdcast_tree::{
    BuildParams, BuildStats, Intersection, KdTree, KdTreeBuilder, Node, TreeError,
};
