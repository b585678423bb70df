//! Ray-triangle intersection.

use crate::{Point3f, Ray, Vec3d};

/// Result of a ray-triangle intersection test.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Ray parameter at the hit point.
    pub t: f64,
    /// Barycentric weight of the second vertex.
    pub b1: f64,
    /// Barycentric weight of the third vertex.
    pub b2: f64,
}

/// Möller-Trumbore ray-triangle intersection.
///
/// Vertices are stored in f32 but the computation runs in f64 to keep the
/// barycentric and parametric results stable on thin triangles. A hit is
/// reported only when `t` lies inside the ray's parametric range.
/// Degenerate (zero-area) triangles never report a hit.
pub fn intersect_triangle(
    ray: &Ray,
    v0: &Point3f,
    v1: &Point3f,
    v2: &Point3f,
) -> Option<TriangleHit> {
    let p0 = Vec3d::new(v0.x as f64, v0.y as f64, v0.z as f64);
    let p1 = Vec3d::new(v1.x as f64, v1.y as f64, v1.z as f64);
    let p2 = Vec3d::new(v2.x as f64, v2.y as f64, v2.z as f64);

    let edge1 = p1 - p0;
    let edge2 = p2 - p0;

    let h = ray.direction.cross(&edge2);
    let det = edge1.dot(&h);

    // Parallel ray or degenerate triangle.
    if det.abs() < 1e-12 {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin.coords - p0;

    let b1 = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&b1) {
        return None;
    }

    let q = s.cross(&edge1);
    let b2 = inv_det * ray.direction.dot(&q);
    if b2 < 0.0 || b1 + b2 > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(&q);
    if t < ray.t_min || t > ray.t_max {
        return None;
    }

    Some(TriangleHit { t, b1, b2 })
}
