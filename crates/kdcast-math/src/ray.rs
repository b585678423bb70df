//! Ray representation and the ray-box slab test.

use crate::{BBox64, Point3d, Vec3d};

/// A ray in 3D space with a parametric range.
///
/// The direction is not required to be unit length; all parametric values
/// are expressed in units of the direction vector. The reciprocal direction
/// is precomputed at construction for fast slab tests.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3d,
    /// Direction of the ray (not necessarily normalized).
    pub direction: Vec3d,
    /// Lower bound of the valid parametric range.
    pub t_min: f64,
    /// Upper bound of the valid parametric range.
    pub t_max: f64,
    inv_direction: Vec3d,
    sign: [usize; 3],
}

impl Ray {
    /// Create a ray with the default parametric range `[0, +inf)`.
    pub fn new(origin: Point3d, direction: Vec3d) -> Self {
        Self::with_range(origin, direction, 0.0, f64::INFINITY)
    }

    /// Create a ray with an explicit parametric range.
    pub fn with_range(origin: Point3d, direction: Vec3d, t_min: f64, t_max: f64) -> Self {
        let inv = Vec3d::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction,
            t_min,
            t_max,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3d {
        self.origin + t * self.direction
    }

    /// Precomputed componentwise reciprocal of the direction.
    #[inline]
    pub fn inv_direction(&self) -> &Vec3d {
        &self.inv_direction
    }

    /// Test ray-box intersection using the slab method.
    ///
    /// Returns `Some((t_near, t_far))` for the raw entry and exit
    /// parameters of the box, without clamping to the ray's own range;
    /// `t_near` is negative when the origin is inside the box. Returns
    /// `None` when the ray line misses the box entirely.
    #[inline]
    pub fn intersect_bounds(&self, bounds: &BBox64) -> Option<(f64, f64)> {
        let corners = [bounds.min, bounds.max];

        let tx1 = (corners[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (corners[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut t_near = tx1;
        let mut t_far = tx2;

        let ty1 = (corners[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (corners[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_near = t_near.max(ty1);
        t_far = t_far.min(ty2);

        let tz1 = (corners[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (corners[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_near = t_near.max(tz1);
        t_far = t_far.min(tz2);

        if t_far >= t_near {
            Some((t_near, t_far))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BBox64 {
        BBox64::new(Vec3d::new(0.0, 0.0, 0.0), Vec3d::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3d::new(1.0, 2.0, 3.0), Vec3d::new(0.0, 0.0, 2.0));
        let p = ray.at(2.0);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.z - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_slab_hit() {
        let ray = Ray::new(Point3d::new(-5.0, 0.5, 0.5), Vec3d::new(1.0, 0.0, 0.0));
        let (t_near, t_far) = ray.intersect_bounds(&unit_box()).unwrap();
        assert!((t_near - 5.0).abs() < 1e-12);
        assert!((t_far - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_slab_miss() {
        let ray = Ray::new(Point3d::new(-5.0, 5.0, 0.5), Vec3d::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_bounds(&unit_box()).is_none());
    }

    #[test]
    fn test_slab_origin_inside() {
        let ray = Ray::new(Point3d::new(0.5, 0.5, 0.5), Vec3d::new(1.0, 0.0, 0.0));
        let (t_near, t_far) = ray.intersect_bounds(&unit_box()).unwrap();
        assert!(t_near < 0.0);
        assert!((t_far - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_slab_box_behind() {
        // The line through the box still reports the (negative) interval;
        // the caller rejects it by clamping to the parametric range.
        let ray = Ray::new(Point3d::new(5.0, 0.5, 0.5), Vec3d::new(1.0, 0.0, 0.0));
        let (t_near, t_far) = ray.intersect_bounds(&unit_box()).unwrap();
        assert!(t_far < 0.0);
        assert!(t_near < t_far);
    }

    #[test]
    fn test_slab_axis_parallel_ray() {
        // Zero direction component: inside the slab hits, outside misses.
        let inside = Ray::new(Point3d::new(0.5, 0.5, -3.0), Vec3d::new(0.0, 0.0, 1.0));
        assert!(inside.intersect_bounds(&unit_box()).is_some());

        let outside = Ray::new(Point3d::new(2.0, 0.5, -3.0), Vec3d::new(0.0, 0.0, 1.0));
        assert!(outside.intersect_bounds(&unit_box()).is_none());
    }

    #[test]
    fn test_slab_unnormalized_direction() {
        let ray = Ray::new(Point3d::new(-4.0, 0.5, 0.5), Vec3d::new(2.0, 0.0, 0.0));
        let (t_near, t_far) = ray.intersect_bounds(&unit_box()).unwrap();
        assert!((t_near - 2.0).abs() < 1e-12);
        assert!((t_far - 2.5).abs() < 1e-12);
    }
}
