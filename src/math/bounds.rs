//! Axis-aligned bounds and triangles
//!
//! Every geometric test the graph performs goes through these two types:
//! point containment for localization, overlap for containment and
//! collision, merged volume and extents for the portal heuristic.

use serde::{Serialize, Deserialize};
use super::Vec3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point, `None` for an empty set
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Aabb::new(first, first);
        for point in points {
            bounds.expand(point);
        }
        Some(bounds)
    }

    /// Check if a point is strictly inside the box.
    ///
    /// Points on a face are outside, so two boxes sharing a face never
    /// both contain the same point.
    pub fn contains(&self, point: Vec3) -> bool {
        point.x > self.min.x && point.x < self.max.x
            && point.y > self.min.y && point.y < self.max.y
            && point.z > self.min.z && point.z < self.max.z
    }

    /// Overlap test; touching faces count as an overlap
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Expand bounds to include a point
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box enclosing both boxes
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Get center of the box
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Half-size along each axis
    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn volume(&self) -> f32 {
        let size = self.max - self.min;
        size.x * size.y * size.z
    }

    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }

    /// The eight corners, min corner first
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Index of the axis with the smallest extent (last one on ties)
    pub fn thinnest_axis(&self) -> usize {
        let extent = self.extent();
        let mut axis = 0;
        for i in 1..3 {
            if extent.axis(i) <= extent.axis(axis) {
                axis = i;
            }
        }
        axis
    }
}

/// A single triangle of static or dynamic geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.a, self.b, self.c]
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.a.min(self.b).min(self.c), self.a.max(self.b).max(self.c))
    }

    pub fn translated(&self, offset: Vec3) -> Triangle {
        Triangle::new(self.a + offset, self.b + offset, self.c + offset)
    }

    /// Triangle/box overlap using the separating axis theorem
    ///
    /// Tests the three box normals, the triangle normal and the nine
    /// edge cross products.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let center = aabb.center();
        let half = aabb.extent();
        let v = [self.a - center, self.b - center, self.c - center];
        let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

        for unit in [Vec3::X, Vec3::Y, Vec3::Z] {
            if separated(unit, &v, half) {
                return false;
            }
            for edge in edges {
                if separated(unit.cross(edge), &v, half) {
                    return false;
                }
            }
        }

        !separated(edges[0].cross(edges[1]), &v, half)
    }
}

/// Whether `axis` separates the (box-centered) triangle from the box
fn separated(axis: Vec3, v: &[Vec3; 3], half: Vec3) -> bool {
    // Degenerate axis from parallel edges
    if axis.dot(axis) <= f32::EPSILON {
        return false;
    }
    let p0 = v[0].dot(axis);
    let p1 = v[1].dot(axis);
    let p2 = v[2].dot(axis);
    let radius = half.dot(axis.abs());
    p0.max(p1).max(p2) < -radius || p0.min(p1).min(p2) > radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::splat(1.0))
    }

    #[test]
    fn test_touching_faces_intersect() {
        let a = unit_box();
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_merge_volume_grows_only_when_outside() {
        let outer = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        let inner = Aabb::new(Vec3::splat(2.0), Vec3::splat(4.0));
        assert_eq!(outer.merge(&inner).volume(), outer.volume());

        let poking = Aabb::new(Vec3::splat(9.0), Vec3::splat(11.0));
        assert!(outer.merge(&poking).volume() > outer.volume());
    }

    #[test]
    fn test_thinnest_axis() {
        let door = Aabb::new(Vec3::new(0.0, 0.0, 4.9), Vec3::new(2.0, 3.0, 5.1));
        assert_eq!(door.thinnest_axis(), 2);
        let slab = Aabb::new(Vec3::ZERO, Vec3::new(4.0, 0.5, 4.0));
        assert_eq!(slab.thinnest_axis(), 1);

        // Ties go to the later axis
        assert_eq!(unit_box().thinnest_axis(), 2);
        let square = Aabb::new(Vec3::ZERO, Vec3::new(0.2, 0.2, 3.0));
        assert_eq!(square.thinnest_axis(), 1);
    }

    #[test]
    fn test_contains_excludes_faces() {
        let b = unit_box();
        assert!(b.contains(Vec3::splat(0.5)));
        assert!(!b.contains(Vec3::new(1.0, 0.5, 0.5)));
        assert!(!b.contains(Vec3::new(0.5, 0.0, 0.5)));
        assert!(!b.contains(Vec3::ZERO));
        assert!(!b.contains(Vec3::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn test_triangle_box_overlap() {
        let floor = Triangle::new(
            Vec3::new(-5.0, 0.5, -5.0),
            Vec3::new(5.0, 0.5, -5.0),
            Vec3::new(0.0, 0.5, 5.0),
        );
        assert!(floor.intersects_aabb(&unit_box()));

        let above = Triangle::new(
            Vec3::new(-5.0, 2.0, -5.0),
            Vec3::new(5.0, 2.0, -5.0),
            Vec3::new(0.0, 2.0, 5.0),
        );
        assert!(!above.intersects_aabb(&unit_box()));
    }

    #[test]
    fn test_triangle_bounds_overlap_but_no_contact() {
        // Diagonal triangle whose bounds cover the box corner but whose plane misses it
        let tri = Triangle::new(
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        );
        let small = Aabb::new(Vec3::ZERO, Vec3::splat(0.5));
        assert!(tri.bounds().intersects(&small));
        assert!(!tri.intersects_aabb(&small));
    }

    #[test]
    fn test_from_points() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
        let b = Aabb::from_points([Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 2.0, 0.0)]).unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 3.0));
    }
}
