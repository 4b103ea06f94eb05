use super::{Geometry, NodeId};
use crate::math::Aabb;

/// Opening shared by exactly two cells of one network
///
/// Cells are stored as indices into the owning network's cell arena and
/// never change after construction.
#[derive(Debug, Clone)]
pub struct Portal {
    id: NodeId,
    geometry: Geometry,
    cells: [usize; 2],
}

impl Portal {
    pub(crate) fn new(id: NodeId, geometry: Geometry, cells: [usize; 2]) -> Self {
        Self { id, geometry, cells }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bounds(&self) -> &Aabb {
        &self.geometry.bounds
    }

    /// Cell on side 0 or 1
    pub fn cell_at(&self, side: usize) -> Option<usize> {
        self.cells.get(side).copied()
    }

    pub fn cells(&self) -> [usize; 2] {
        self.cells
    }

    /// Cell on the far side when coming from `cell`
    pub fn other(&self, cell: usize) -> Option<usize> {
        match self.cells {
            [a, b] if a == cell => Some(b),
            [a, b] if b == cell => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_other_side() {
        let p = Portal::new(
            NodeId::portal(0, 0, 3, 5),
            Geometry::cuboid(Aabb::new(Vec3::ZERO, Vec3::splat(1.0))),
            [3, 5],
        );
        assert_eq!(p.other(3), Some(5));
        assert_eq!(p.other(5), Some(3));
        assert_eq!(p.other(4), None);
        assert_eq!(p.cell_at(1), Some(5));
        assert_eq!(p.cell_at(2), None);
    }
}
