#![warn(missing_docs)]

//! Immutable indexed triangle meshes for the kdcast kernel.
//!
//! A [`TriangleMesh`] owns a vertex array and a triangle-index array and
//! exposes the per-triangle queries the k-d tree builder and traversal
//! engine need: vertex fetch, bounding box computation, and ray
//! intersection. The [`stl`] module loads binary STL files into
//! deduplicated indexed meshes and writes them back out.

pub mod error;
pub mod stl;

pub use error::{MeshError, Result};
pub use stl::{load_stl, parse_stl, stl_bytes};

use kdcast_math::{intersect_triangle, BBox32, Point3f, Ray, TriangleHit, Vec3d};

/// An immutable indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    vertices: Vec<Point3f>,
    triangles: Vec<[u32; 3]>,
    degenerate_triangles: usize,
}

impl TriangleMesh {
    /// Create a mesh from a vertex array and triangle indices.
    ///
    /// Fails when a triangle references a vertex outside the array or a
    /// referenced vertex has a non-finite coordinate (NaN would poison the
    /// builder's edge ordering). Degenerate (zero-area) triangles are
    /// kept: they carry a flat bounding box and never produce a ray hit,
    /// but callers can inspect
    /// [`TriangleMesh::degenerate_triangle_count`] to warn about them.
    pub fn new(vertices: Vec<Point3f>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        for (i, tri) in triangles.iter().enumerate() {
            for &index in tri {
                if index as usize >= vertices.len() {
                    return Err(MeshError::IndexOutOfRange {
                        triangle: i,
                        index,
                        count: vertices.len(),
                    });
                }
            }
        }

        let mut degenerate_triangles = 0;
        for (i, tri) in triangles.iter().enumerate() {
            let [v0, v1, v2] = Self::fetch(&vertices, tri);
            for v in [&v0, &v1, &v2] {
                if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
                    return Err(MeshError::NonFiniteVertex(i));
                }
            }
            let e1 = Vec3d::new(
                (v1.x - v0.x) as f64,
                (v1.y - v0.y) as f64,
                (v1.z - v0.z) as f64,
            );
            let e2 = Vec3d::new(
                (v2.x - v0.x) as f64,
                (v2.y - v0.y) as f64,
                (v2.z - v0.z) as f64,
            );
            if e1.cross(&e2).norm_squared() == 0.0 {
                degenerate_triangles += 1;
            }
        }

        Ok(Self {
            vertices,
            triangles,
            degenerate_triangles,
        })
    }

    fn fetch(vertices: &[Point3f], tri: &[u32; 3]) -> [Point3f; 3] {
        [
            vertices[tri[0] as usize],
            vertices[tri[1] as usize],
            vertices[tri[2] as usize],
        ]
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of zero-area triangles kept in the mesh.
    pub fn degenerate_triangle_count(&self) -> usize {
        self.degenerate_triangles
    }

    /// The three vertices of triangle `i`.
    pub fn triangle(&self, i: usize) -> [Point3f; 3] {
        Self::fetch(&self.vertices, &self.triangles[i])
    }

    /// Axis-aligned bounding box of triangle `i`.
    pub fn triangle_bounds(&self, i: usize) -> BBox32 {
        let [v0, v1, v2] = self.triangle(i);
        let mut bounds = BBox32::empty();
        bounds.extend(&v0);
        bounds.extend(&v1);
        bounds.extend(&v2);
        bounds
    }

    /// Bounding box of the whole mesh (union of all triangle bounds).
    pub fn bounds(&self) -> BBox32 {
        let mut bounds = BBox32::empty();
        for i in 0..self.triangle_count() {
            bounds = BBox32::union(bounds, self.triangle_bounds(i));
        }
        bounds
    }

    /// Intersect a ray with triangle `i`.
    pub fn intersect_triangle(&self, i: usize, ray: &Ray) -> Option<TriangleHit> {
        let [v0, v1, v2] = self.triangle(i);
        intersect_triangle(ray, &v0, &v1, &v2)
    }
}
