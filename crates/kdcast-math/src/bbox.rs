//! 32-bit and 64-bit axis-aligned bounding boxes.

use crate::{Point3f, Vec3d, Vec3f};

/// Axis-aligned bounding box with f32 corners.
///
/// The empty box has `min = +inf` and `max = -inf`, so a union with any
/// other box yields that box unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox32 {
    /// Minimum corner.
    pub min: Vec3f,
    /// Maximum corner.
    pub max: Vec3f,
}

impl BBox32 {
    /// Create a bounding box from min and max corners.
    pub fn new(min: Vec3f, max: Vec3f) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Vec3f::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vec3f::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Expand this box to include a point.
    pub fn extend(&mut self, p: &Point3f) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Componentwise union of two boxes.
    pub fn union(a: BBox32, b: BBox32) -> BBox32 {
        BBox32 {
            min: Vec3f::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y), a.min.z.min(b.min.z)),
            max: Vec3f::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y), a.max.z.max(b.max.z)),
        }
    }

    /// Extent of the box along all three axes.
    pub fn diagonal(&self) -> Vec3f {
        self.max - self.min
    }
}

/// Axis-aligned bounding box with f64 corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox64 {
    /// Minimum corner.
    pub min: Vec3d,
    /// Maximum corner.
    pub max: Vec3d,
}

impl BBox64 {
    /// Create a bounding box from min and max corners.
    pub fn new(min: Vec3d, max: Vec3d) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Vec3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Vec3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Componentwise union of two boxes.
    pub fn union(a: BBox64, b: BBox64) -> BBox64 {
        BBox64 {
            min: Vec3d::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y), a.min.z.min(b.min.z)),
            max: Vec3d::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y), a.max.z.max(b.max.z)),
        }
    }
}

impl From<BBox32> for BBox64 {
    fn from(b: BBox32) -> Self {
        Self {
            min: Vec3d::new(b.min.x as f64, b.min.y as f64, b.min.z as f64),
            max: Vec3d::new(b.max.x as f64, b.max.y as f64, b.max.z as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_union_identity() {
        let b = BBox32::new(Vec3f::new(-1.0, 0.0, 2.0), Vec3f::new(3.0, 4.0, 5.0));
        let u = BBox32::union(BBox32::empty(), b);
        assert_eq!(u, b);
        let u = BBox32::union(b, BBox32::empty());
        assert_eq!(u, b);
    }

    #[test]
    fn test_extend_points() {
        let mut b = BBox32::empty();
        b.extend(&Point3f::new(1.0, -2.0, 3.0));
        b.extend(&Point3f::new(-1.0, 2.0, 0.0));
        assert_eq!(b.min, Vec3f::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3f::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_union_overlapping() {
        let a = BBox32::new(Vec3f::new(0.0, 0.0, 0.0), Vec3f::new(2.0, 2.0, 2.0));
        let b = BBox32::new(Vec3f::new(1.0, -1.0, 1.0), Vec3f::new(3.0, 1.0, 1.5));
        let u = BBox32::union(a, b);
        assert_eq!(u.min, Vec3f::new(0.0, -1.0, 0.0));
        assert_eq!(u.max, Vec3f::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn test_diagonal() {
        let b = BBox32::new(Vec3f::new(1.0, 1.0, 1.0), Vec3f::new(4.0, 3.0, 2.0));
        assert_eq!(b.diagonal(), Vec3f::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn test_widening_conversion() {
        let b32 = BBox32::new(Vec3f::new(-1.5, 0.25, 2.0), Vec3f::new(3.0, 4.5, 5.0));
        let b64 = BBox64::from(b32);
        assert_eq!(b64.min, Vec3d::new(-1.5, 0.25, 2.0));
        assert_eq!(b64.max, Vec3d::new(3.0, 4.5, 5.0));
    }
}
