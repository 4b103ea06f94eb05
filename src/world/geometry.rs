//! Static geometry attached to graph nodes
//!
//! A node's geometry is a flat triangle list with a cached bound. The bound
//! is what localization, containment and the portal collision heuristic
//! look at; triangles are only consulted by precise proxy checks.

use serde::{Serialize, Deserialize};
use crate::math::{Aabb, Triangle, Vec3};

/// Triangle mesh with a precomputed bounding box
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub triangles: Vec<Triangle>,
    /// Bounding box - computed from triangles, not serialized
    #[serde(skip)]
    pub bounds: Aabb,
}

impl Geometry {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let mut geometry = Self { triangles, bounds: Aabb::default() };
        geometry.recalculate_bounds();
        geometry
    }

    /// Closed box made of 12 triangles
    pub fn cuboid(bounds: Aabb) -> Self {
        let c = bounds.corners();
        // Two triangles per face, indices into `corners()`
        const FACES: [[usize; 4]; 6] = [
            [0, 1, 3, 2], // -z
            [4, 6, 7, 5], // +z
            [0, 4, 5, 1], // -y
            [2, 3, 7, 6], // +y
            [0, 2, 6, 4], // -x
            [1, 5, 7, 3], // +x
        ];
        let triangles = FACES
            .iter()
            .flat_map(|f| {
                [
                    Triangle::new(c[f[0]], c[f[1]], c[f[2]]),
                    Triangle::new(c[f[0]], c[f[2]], c[f[3]]),
                ]
            })
            .collect();
        Self::new(triangles)
    }

    /// Recalculate bounds from triangles (call after loading from file)
    pub fn recalculate_bounds(&mut self) {
        self.bounds = Aabb::from_points(self.triangles.iter().flat_map(|t| t.vertices()))
            .unwrap_or_default();
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Renderable data shared by a tracked entity and all of its proxies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Renderable {
    Geometry(Geometry),
    /// Several meshes drawn as one entity
    Composite(Vec<Geometry>),
}

impl Renderable {
    /// Local-space bound over every part, `None` when there is nothing to bound
    pub fn bounds(&self) -> Option<Aabb> {
        match self {
            Renderable::Geometry(g) if g.is_empty() => None,
            Renderable::Geometry(g) => Some(g.bounds),
            Renderable::Composite(parts) => parts
                .iter()
                .filter(|g| !g.is_empty())
                .map(|g| g.bounds)
                .reduce(|a, b| a.merge(&b)),
        }
    }

    pub fn triangles(&self) -> Box<dyn Iterator<Item = &Triangle> + '_> {
        match self {
            Renderable::Geometry(g) => Box::new(g.triangles.iter()),
            Renderable::Composite(parts) => Box::new(parts.iter().flat_map(|g| g.triangles.iter())),
        }
    }

    pub fn triangle_count(&self) -> usize {
        match self {
            Renderable::Geometry(g) => g.triangles.len(),
            Renderable::Composite(parts) => parts.iter().map(|g| g.triangles.len()).sum(),
        }
    }

    /// Recalculate bounds of every part (call after loading from file)
    pub fn recalculate_bounds(&mut self) {
        match self {
            Renderable::Geometry(g) => g.recalculate_bounds(),
            Renderable::Composite(parts) => parts.iter_mut().for_each(Geometry::recalculate_bounds),
        }
    }

    /// Solid box, handy for placeholder entities
    pub fn cuboid(half_extent: Vec3) -> Self {
        Renderable::Geometry(Geometry::cuboid(Aabb::new(-half_extent, half_extent)))
    }
}
