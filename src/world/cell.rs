//! Cells: graph vertices of the portal graph
//!
//! A cell owns its static geometry, the indices of its incident portals and
//! the proxies of the tracked entities currently overlapping it.

use std::collections::HashMap;

use super::{Geometry, NodeId, Portal};
use crate::math::{Aabb, Vec3};
use crate::tracking::{Body, ProxyHandle, TrackerId};

/// Render state of a cell; nothing is drawn until a query shows it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

#[derive(Debug, Clone)]
pub struct Cell {
    id: NodeId,
    geometry: Option<Geometry>,
    /// Indices into the network's portal arena, in insertion order
    portals: Vec<usize>,
    /// One proxy per tracked entity overlapping this cell
    proxies: HashMap<TrackerId, ProxyHandle>,
    visibility: Visibility,
}

impl Cell {
    pub fn new(id: NodeId, geometry: Option<Geometry>) -> Self {
        Self {
            id,
            geometry,
            portals: Vec::new(),
            proxies: HashMap::new(),
            visibility: Visibility::Hidden,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Wall bound, `None` for a cell without geometry
    pub fn bounds(&self) -> Option<&Aabb> {
        self.geometry.as_ref().map(|g| &g.bounds)
    }

    /// Whether the point lies inside the wall bound
    pub fn contains(&self, point: Vec3) -> bool {
        self.bounds().map_or(false, |b| b.contains(point))
    }

    /// Whether a box overlaps the wall bound
    pub fn intersects(&self, bounds: &Aabb) -> bool {
        self.bounds().map_or(false, |b| b.intersects(bounds))
    }

    // ========================================================================
    // Portals
    // ========================================================================

    pub(crate) fn add_portal(&mut self, portal: usize) {
        self.portals.push(portal);
    }

    pub fn portals(&self) -> &[usize] {
        &self.portals
    }

    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    pub fn portal_at(&self, i: usize) -> Option<usize> {
        self.portals.get(i).copied()
    }

    // ========================================================================
    // Proxies
    // ========================================================================

    /// Attach a tracked entity's proxy, returning the one it replaces
    pub fn attach_proxy(&mut self, tracker: TrackerId, handle: ProxyHandle) -> Option<ProxyHandle> {
        self.proxies.insert(tracker, handle)
    }

    pub fn detach_proxy(&mut self, tracker: TrackerId) -> Option<ProxyHandle> {
        self.proxies.remove(&tracker)
    }

    pub fn proxy(&self, tracker: TrackerId) -> Option<ProxyHandle> {
        self.proxies.get(&tracker).copied()
    }

    pub fn proxies(&self) -> impl Iterator<Item = (TrackerId, ProxyHandle)> + '_ {
        self.proxies.iter().map(|(&t, &h)| (t, h))
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    pub fn show(&mut self) {
        self.visibility = Visibility::Visible;
    }

    pub fn hide(&mut self) {
        self.visibility = Visibility::Hidden;
    }

    // ========================================================================
    // Collision
    // ========================================================================

    /// Whether a moving box is in a disallowed overlap with this cell.
    ///
    /// `portals` is the owning network's portal arena. `bodies` resolves
    /// the entity behind each attached proxy; returning `None` skips it
    /// (the mover's own proxies, or entities already gone).
    ///
    /// Boxes that poke out of the wall bound are only allowed through a
    /// portal: the first portal touching the mover decides, and the mover
    /// collides if it sticks out past the opening on either lateral axis.
    pub fn has_collision<'b, F>(&self, portals: &[Portal], mover: &Aabb, precise: bool, mut bodies: F) -> bool
    where
        F: FnMut(TrackerId) -> Option<&'b Body>,
    {
        let Some(wall) = self.bounds() else {
            return false;
        };
        if !wall.intersects(mover) {
            return false;
        }

        for &tracker in self.proxies.keys() {
            if let Some(body) = bodies(tracker) {
                if proxy_hits(body, mover, precise) {
                    return true;
                }
            }
        }

        // Fully inside the walls
        if wall.merge(mover).volume() <= wall.volume() {
            return false;
        }

        let opening = self
            .portals
            .iter()
            .filter_map(|&p| portals.get(p))
            .find(|p| p.bounds().intersects(mover));

        let Some(portal) = opening else {
            // Breaching a solid wall
            return true;
        };

        let bounds = portal.bounds();
        let normal = bounds.thinnest_axis();
        let own = bounds.extent();
        let merged = bounds.merge(mover).extent();
        (0..3)
            .filter(|&axis| axis != normal)
            .any(|axis| merged.axis(axis) > own.axis(axis))
    }
}

fn proxy_hits(body: &Body, mover: &Aabb, precise: bool) -> bool {
    let Some(bounds) = body.world_bounds() else {
        return false;
    };
    if !bounds.intersects(mover) {
        return false;
    }
    !precise || body.world_triangles().any(|t| t.intersects_aabb(mover))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Renderable;

    fn room() -> (Cell, Vec<Portal>) {
        let mut cell = Cell::new(
            NodeId::cell(0, 0, 0),
            Some(Geometry::cuboid(Aabb::new(Vec3::ZERO, Vec3::splat(10.0)))),
        );
        let door = Portal::new(
            NodeId::portal(0, 0, 0, 1),
            Geometry::cuboid(Aabb::new(Vec3::new(9.9, 0.0, 3.0), Vec3::new(10.1, 6.0, 7.0))),
            [0, 1],
        );
        cell.add_portal(0);
        (cell, vec![door])
    }

    fn mover(min: (f32, f32, f32), max: (f32, f32, f32)) -> Aabb {
        Aabb::new(Vec3::new(min.0, min.1, min.2), Vec3::new(max.0, max.1, max.2))
    }

    fn no_bodies(_: TrackerId) -> Option<&'static Body> {
        None
    }

    #[test]
    fn test_contains_without_geometry() {
        let cell = Cell::new(NodeId::cell(0, 0, 0), None);
        assert!(!cell.contains(Vec3::ZERO));
        assert!(!cell.has_collision(&[], &mover((0.0, 0.0, 0.0), (1.0, 1.0, 1.0)), false, no_bodies));
    }

    #[test]
    fn test_inside_never_collides() {
        let (cell, portals) = room();
        assert!(!cell.has_collision(&portals, &mover((4.0, 1.0, 4.0), (6.0, 3.0, 6.0)), false, no_bodies));
    }

    #[test]
    fn test_passing_through_opening() {
        let (cell, portals) = room();
        assert!(!cell.has_collision(&portals, &mover((9.0, 1.0, 4.0), (11.0, 3.0, 6.0)), false, no_bodies));
    }

    #[test]
    fn test_wider_than_opening_collides() {
        let (cell, portals) = room();
        assert!(cell.has_collision(&portals, &mover((9.0, 1.0, 2.0), (11.0, 3.0, 8.0)), false, no_bodies));
    }

    #[test]
    fn test_wall_breach_collides() {
        let (cell, portals) = room();
        assert!(cell.has_collision(&portals, &mover((9.0, 7.0, 4.0), (11.0, 9.0, 6.0)), false, no_bodies));
    }

    #[test]
    fn test_far_away_is_ignored() {
        let (cell, portals) = room();
        assert!(!cell.has_collision(&portals, &mover((50.0, 1.0, 4.0), (52.0, 3.0, 6.0)), false, no_bodies));
    }

    #[test]
    fn test_dynamic_proxy_blocks() {
        let (mut cell, portals) = room();
        let other = Body::new("barrel", Renderable::cuboid(Vec3::splat(1.0)), Vec3::new(5.0, 1.0, 5.0));
        let mut pool = crate::tracking::ProxyPool::new(TrackerId(9), other.renderable().clone());
        cell.attach_proxy(TrackerId(9), pool.acquire());

        let lookup = |t: TrackerId| (t == TrackerId(9)).then_some(&other);
        let touching = mover((5.5, 0.5, 5.5), (7.0, 1.5, 7.0));
        assert!(cell.has_collision(&portals, &touching, false, lookup));
        assert!(cell.has_collision(&portals, &touching, true, lookup));

        // The mover's own proxy is skipped by the lookup
        assert!(!cell.has_collision(&portals, &touching, false, no_bodies));
    }

    #[test]
    fn test_precise_check_ignores_bound_only_overlap() {
        let (mut cell, portals) = room();
        // Thin diagonal slab: bound covers the corner region, triangles do not
        let slab = Renderable::Geometry(Geometry::new(vec![crate::math::Triangle::new(
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        )]));
        let other = Body::new("ramp", slab, Vec3::new(1.0, 1.0, 1.0));
        let mut pool = crate::tracking::ProxyPool::new(TrackerId(4), other.renderable().clone());
        cell.attach_proxy(TrackerId(4), pool.acquire());

        let lookup = |t: TrackerId| (t == TrackerId(4)).then_some(&other);
        let corner = mover((1.0, 1.0, 1.0), (1.5, 1.5, 1.5));
        assert!(cell.has_collision(&portals, &corner, false, lookup));
        assert!(!cell.has_collision(&portals, &corner, true, lookup));
    }

    #[test]
    fn test_visibility_toggles() {
        let (mut cell, _) = room();
        assert_eq!(cell.visibility(), Visibility::Hidden);
        cell.show();
        assert!(cell.is_visible());
        cell.hide();
        assert!(!cell.is_visible());
    }
}
