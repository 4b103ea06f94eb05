//! Networks: one connected component of cells and portals
//!
//! Cells and portals live in two arenas and refer to each other by index.
//! Cell 0 is the default seed of every cold search.

use std::cell::RefCell;
use std::collections::HashMap;

use log::warn;

use super::{Cell, Flow, Geometry, NodeId, Portal, Visitor};
use crate::math::{Aabb, Camera, FrustumParameters, Projection, Vec3};

/// Clip rectangle derived for one traversed portal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalFrustum {
    pub portal: NodeId,
    /// Cell entered through the portal
    pub cell: usize,
    pub frustum: FrustumParameters,
}

#[derive(Debug)]
pub struct Network {
    id: i32,
    level: i32,
    cells: Vec<Cell>,
    portals: Vec<Portal>,
    index: HashMap<NodeId, usize>,
    /// Scratch for localization and the other queries
    visitor: RefCell<Visitor>,
}

impl Network {
    pub fn new(level: i32, id: i32) -> Self {
        Self {
            id,
            level,
            cells: Vec::new(),
            portals: Vec::new(),
            index: HashMap::new(),
            visitor: RefCell::new(Visitor::default()),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Append a cell, returning its index
    pub fn add_cell(&mut self, cell: Cell) -> usize {
        let index = self.cells.len();
        self.index.insert(cell.id(), index);
        self.cells.push(cell);
        index
    }

    /// Link two existing cells through a new portal, returning its index.
    ///
    /// Returns `None` if either cell index is out of range.
    pub fn add_portal(&mut self, id: NodeId, geometry: Geometry, first: usize, second: usize) -> Option<usize> {
        if first >= self.cells.len() || second >= self.cells.len() {
            return None;
        }
        let index = self.portals.len();
        self.portals.push(Portal::new(id, geometry, [first, second]));
        self.cells[first].add_portal(index);
        if second != first {
            self.cells[second].add_portal(index);
        }
        Some(index)
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portal(&self, index: usize) -> Option<&Portal> {
        self.portals.get(index)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    pub fn cell_index(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// `(portal, neighbor)` pairs of a cell, in portal order
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .get(cell)
            .map(|c| c.portals())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&p| self.portals.get(p).and_then(|portal| portal.other(cell)).map(|n| (p, n)))
    }

    /// Run `f` with the shared visitor, or a temporary one when it is busy
    fn with_visitor<R>(&self, f: impl FnOnce(&mut Visitor) -> R) -> R {
        match self.visitor.try_borrow_mut() {
            Ok(mut visitor) => f(&mut visitor),
            Err(_) => {
                warn!("network {}: visitor already in use, falling back to a temporary one", self.id);
                f(&mut Visitor::default())
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Cell containing `point`, searching from cell 0
    pub fn locate(&self, point: Vec3) -> Option<usize> {
        self.locate_from(point, 0)
    }

    /// Cell containing `point`, searching outward from `previous`.
    ///
    /// A moving point is usually still in or next to its previous cell, so
    /// this stops after a handful of visits. An out-of-range `previous`
    /// falls back to cell 0.
    pub fn locate_from(&self, point: Vec3, previous: usize) -> Option<usize> {
        let start = if previous < self.cells.len() { previous } else { 0 };
        self.with_visitor(|visitor| {
            visitor.visit(
                self,
                start,
                |_, cell| if cell.contains(point) { Flow::Stop } else { Flow::Continue },
                |_, _, _| true,
            )
        })
        .stopped_at()
    }

    /// Every cell whose wall bound overlaps `bounds`, in visit order from
    /// `seed` (cell 0 if `None` or out of range)
    pub fn containing_cells(&self, bounds: &Aabb, seed: Option<usize>) -> Vec<usize> {
        let start = seed.filter(|&s| s < self.cells.len()).unwrap_or(0);
        let mut found = Vec::new();
        self.with_visitor(|visitor| {
            visitor.visit(
                self,
                start,
                |index, cell| {
                    if cell.intersects(bounds) {
                        found.push(index);
                    }
                    Flow::Continue
                },
                |_, _, _| true,
            )
        });
        found
    }

    /// Cells seen from `current` through portals in view
    pub fn visible_cells(&self, current: usize, camera: &Camera) -> Vec<usize> {
        self.portal_visibility(current, camera).0
    }

    /// Clip rectangle of every portal the visibility pass went through
    pub fn frustum_parameters(&self, current: usize, camera: &Camera) -> Vec<PortalFrustum> {
        self.portal_visibility(current, camera).1
    }

    /// Breadth-first pass from `current`, only crossing portals whose
    /// projection overlaps the clip rectangle of the cell they lead out of.
    ///
    /// A cell keeps the rectangle it was first reached with.
    pub fn portal_visibility(&self, current: usize, camera: &Camera) -> (Vec<usize>, Vec<PortalFrustum>) {
        let mut cells = Vec::new();
        let mut frusta = Vec::new();
        if current >= self.cells.len() {
            return (cells, frusta);
        }

        let mut clip: Vec<Option<FrustumParameters>> = vec![None; self.cells.len()];
        clip[current] = Some(camera.frustum());

        self.with_visitor(|visitor| {
            visitor.visit(
                self,
                current,
                |index, _| {
                    cells.push(index);
                    Flow::Continue
                },
                |from, portal, to| {
                    let Some(parent) = clip[from] else {
                        return false;
                    };
                    let narrowed = match camera.project_bounds(portal.bounds()) {
                        Projection::Behind => return false,
                        // Camera is in the doorway
                        Projection::Straddling => parent,
                        Projection::Rect(rect) => match rect.intersection(&parent) {
                            Some(rect) => rect,
                            None => return false,
                        },
                    };
                    clip[to] = Some(narrowed);
                    frusta.push(PortalFrustum { portal: portal.id(), cell: to, frustum: narrowed });
                    true
                },
            )
        });

        (cells, frusta)
    }

    /// Reset every cell to hidden
    pub fn hide_all(&mut self) {
        self.cells.iter_mut().for_each(Cell::hide);
    }
}
