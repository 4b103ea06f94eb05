//! Levels: every network of one playable level
//!
//! A level is built once from a flat list of named nodes and then answers
//! the per-frame queries of the renderer and the game loop:
//! - Coherent localization across networks
//! - Visible cells and portal clip rectangles
//! - Collision against walls, openings and tracked entities
//! - Tracked entities kept attached to every cell they overlap

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::{Cell, Geometry, Network, NodeId, NodeIdError, NodeKind, PortalFrustum};
use crate::math::{Aabb, Camera, Vec3};
use crate::settings::{limits, TrackingSettings};
use crate::tracking::{Body, Tracker, TrackerId, TrackingError};

/// Address of a cell within a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    /// Index into the level's networks
    pub network: usize,
    /// Index into that network's cells
    pub cell: usize,
}

/// Anything a renderer may have to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Level,
    Network(usize),
    Cell(CellRef),
}

/// Raw graph-build input: a node name encoding its identifier, and its geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedNode {
    pub name: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl NamedNode {
    pub fn new(name: impl Into<String>, geometry: Option<Geometry>) -> Self {
        Self { name: name.into(), geometry }
    }
}

/// Graph construction failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("no nodes to build a level from")]
    Empty,
    #[error(transparent)]
    InvalidName(#[from] NodeIdError),
    #[error("node {name:?} has no network id")]
    MissingNetwork { name: String },
    #[error("node {name:?} is neither a cell nor a portal")]
    NotAGraphNode { name: String },
    #[error("node {name:?} belongs to level {found}, expected level {expected}")]
    LevelMismatch { name: String, expected: i32, found: i32 },
    #[error("cell {name:?} is defined more than once")]
    DuplicateCell { name: String },
    #[error("node {name:?} has geometry without triangles")]
    EmptyGeometry { name: String },
    #[error("portal {name:?} has no geometry")]
    PortalWithoutGeometry { name: String },
    #[error("portal {name:?} links a cell to itself")]
    SelfLoop { name: String },
    #[error("portal {name:?} is in network {network}, which has no cells")]
    NetworkWithoutCells { name: String, network: i32 },
    #[error("portal {name:?} refers to unknown cell {cell}")]
    UnknownCell { name: String, cell: NodeId },
}

#[derive(Debug)]
pub struct Level {
    id: i32,
    /// Sorted by network id
    networks: Vec<Network>,
    trackers: BTreeMap<TrackerId, Tracker>,
    next_tracker: u32,
    settings: TrackingSettings,
}

impl Level {
    pub fn build(nodes: Vec<NamedNode>) -> Result<Self, BuildError> {
        Self::build_with_settings(nodes, TrackingSettings::default())
    }

    /// Parse node names, group cells and portals per network and link them
    pub fn build_with_settings(nodes: Vec<NamedNode>, settings: TrackingSettings) -> Result<Self, BuildError> {
        if nodes.is_empty() {
            return Err(BuildError::Empty);
        }

        let mut level_id: Option<i32> = None;
        let mut cells: BTreeMap<i32, Vec<(String, NodeId, Option<Geometry>)>> = BTreeMap::new();
        let mut portals: BTreeMap<i32, Vec<(String, NodeId, Geometry)>> = BTreeMap::new();

        for node in nodes {
            let id: NodeId = node.name.parse()?;
            match level_id {
                None => level_id = Some(id.level),
                Some(expected) if expected != id.level => {
                    return Err(BuildError::LevelMismatch { name: node.name, expected, found: id.level });
                }
                Some(_) => {}
            }
            if id.network == NodeId::UNSET {
                return Err(BuildError::MissingNetwork { name: node.name });
            }

            let mut geometry = node.geometry;
            if let Some(g) = geometry.as_mut() {
                if g.is_empty() {
                    return Err(BuildError::EmptyGeometry { name: node.name });
                }
                // Bounds are not serialized
                g.recalculate_bounds();
            }

            match id.kind() {
                NodeKind::Cell => cells.entry(id.network).or_default().push((node.name, id, geometry)),
                NodeKind::Portal => {
                    if id.cell == id.secondary {
                        return Err(BuildError::SelfLoop { name: node.name });
                    }
                    let Some(geometry) = geometry else {
                        return Err(BuildError::PortalWithoutGeometry { name: node.name });
                    };
                    portals.entry(id.network).or_default().push((node.name, id, geometry));
                }
                NodeKind::Other => return Err(BuildError::NotAGraphNode { name: node.name }),
            }
        }

        let level = level_id.unwrap_or(NodeId::UNSET);
        let mut networks = Vec::with_capacity(cells.len());

        for (network_id, members) in cells {
            let mut network = Network::new(level, network_id);
            for (name, id, geometry) in members {
                if network.cell_index(&id).is_some() {
                    return Err(BuildError::DuplicateCell { name });
                }
                network.add_cell(Cell::new(id, geometry));
            }

            for (name, id, geometry) in portals.remove(&network_id).unwrap_or_default() {
                let mut sides = [0; 2];
                for (side, slot) in sides.iter_mut().enumerate() {
                    let cell = id.cell_side(side);
                    *slot = network
                        .cell_index(&cell)
                        .ok_or_else(|| BuildError::UnknownCell { name: name.clone(), cell })?;
                }
                network.add_portal(id, geometry, sides[0], sides[1]);
            }

            debug!(
                "level {} network {}: {} cells, {} portals",
                level, network_id, network.cell_count(), network.portal_count()
            );
            networks.push(network);
        }

        if let Some((network, links)) = portals.into_iter().next() {
            let name = links.into_iter().next().map(|(name, _, _)| name).unwrap_or_default();
            return Err(BuildError::NetworkWithoutCells { name, network });
        }

        Ok(Self {
            id: level,
            networks,
            trackers: BTreeMap::new(),
            next_tracker: 0,
            settings,
        })
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    #[cfg(test)]
    pub(crate) fn networks_mut(&mut self) -> &mut [Network] {
        &mut self.networks
    }

    pub fn network(&self, index: usize) -> Option<&Network> {
        self.networks.get(index)
    }

    /// Index of the network with the given id
    pub fn network_index(&self, network_id: i32) -> Option<usize> {
        self.networks.binary_search_by_key(&network_id, Network::id).ok()
    }

    pub fn cell(&self, cell: CellRef) -> Option<&Cell> {
        self.networks.get(cell.network)?.cell(cell.cell)
    }

    /// Resolve a cell identifier to its address
    pub fn cell_ref(&self, id: &NodeId) -> Option<CellRef> {
        let network = self.network_index(id.network)?;
        let cell = self.networks[network].cell_index(id)?;
        Some(CellRef { network, cell })
    }

    pub fn cell_count(&self) -> usize {
        self.networks.iter().map(Network::cell_count).sum()
    }

    pub fn portal_count(&self) -> usize {
        self.networks.iter().map(Network::portal_count).sum()
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    /// Network indices starting at `previous`'s network, wrapping around
    fn round_robin(&self, previous: Option<CellRef>) -> impl Iterator<Item = usize> {
        let count = self.networks.len();
        let start = previous.map(|p| p.network).filter(|&n| n < count).unwrap_or(0);
        (0..count).map(move |step| (start + step) % count)
    }

    /// Cell containing `point`.
    ///
    /// The previous cell's network is searched first, seeded at that cell;
    /// the other networks get a cold search in turn.
    pub fn locate(&self, point: Vec3, previous: Option<CellRef>) -> Option<CellRef> {
        self.round_robin(previous).find_map(|network| {
            let net = &self.networks[network];
            let found = match previous {
                Some(p) if p.network == network => net.locate_from(point, p.cell),
                _ => net.locate(point),
            };
            found.map(|cell| CellRef { network, cell })
        })
    }

    /// Every cell overlapping `bounds`, from the first network (in
    /// round-robin order from `previous`) with any overlap
    pub fn containing_cells(&self, bounds: &Aabb, previous: Option<CellRef>) -> Vec<CellRef> {
        for network in self.round_robin(previous) {
            let seed = previous.filter(|p| p.network == network).map(|p| p.cell);
            let found = self.networks[network].containing_cells(bounds, seed);
            if !found.is_empty() {
                return found.into_iter().map(|cell| CellRef { network, cell }).collect();
            }
        }
        Vec::new()
    }

    /// `[level, network]` followed by the cells visible from `current`
    pub fn visible_nodes(&self, current: CellRef, camera: &Camera) -> Vec<NodeRef> {
        let Some(network) = self.networks.get(current.network) else {
            return Vec::new();
        };
        let cells = network.visible_cells(current.cell, camera);
        if cells.is_empty() {
            return Vec::new();
        }

        let mut nodes = Vec::with_capacity(cells.len() + 2);
        nodes.push(NodeRef::Level);
        nodes.push(NodeRef::Network(current.network));
        nodes.extend(cells.into_iter().map(|cell| NodeRef::Cell(CellRef { network: current.network, cell })));
        nodes
    }

    pub fn frustum_parameters(&self, current: CellRef, camera: &Camera) -> Vec<PortalFrustum> {
        self.networks
            .get(current.network)
            .map(|network| network.frustum_parameters(current.cell, camera))
            .unwrap_or_default()
    }

    /// Mark the cells visible from `current` as visible and return them.
    ///
    /// Nothing is hidden here; call `hide_all` once the frame is drawn.
    pub fn show_visible(&mut self, current: CellRef, camera: &Camera) -> Vec<NodeRef> {
        let nodes = self.visible_nodes(current, camera);
        for node in &nodes {
            if let NodeRef::Cell(cell) = node {
                if let Some(target) = self.networks.get_mut(cell.network).and_then(|n| n.cell_mut(cell.cell)) {
                    target.show();
                }
            }
        }
        nodes
    }

    pub fn hide_all(&mut self) {
        self.networks.iter_mut().for_each(Network::hide_all);
    }

    /// Collision of an arbitrary box with one cell
    pub fn has_collision(&self, cell: CellRef, mover: &Aabb, precise: bool) -> bool {
        self.collision(cell, mover, precise, None)
    }

    /// Collision of a tracked entity with one cell, ignoring its own proxies
    pub fn tracked_collision(&self, tracker: TrackerId, cell: CellRef) -> Result<bool, TrackingError> {
        let mover = self
            .trackers
            .get(&tracker)
            .ok_or(TrackingError::UnknownTracker(tracker))?
            .body()
            .world_bounds()
            .ok_or(TrackingError::NoBounds(tracker))?;
        Ok(self.collision(cell, &mover, self.settings.precise_collisions, Some(tracker)))
    }

    fn collision(&self, cell: CellRef, mover: &Aabb, precise: bool, skip: Option<TrackerId>) -> bool {
        let Some(network) = self.networks.get(cell.network) else {
            return false;
        };
        let Some(target) = network.cell(cell.cell) else {
            return false;
        };
        target.has_collision(network.portals(), mover, precise, |id| {
            if Some(id) == skip {
                None
            } else {
                self.trackers.get(&id).map(Tracker::body)
            }
        })
    }

    // ========================================================================
    // Tracked entities
    // ========================================================================

    /// Start tracking a moving entity and attach it to the cells it overlaps
    pub fn attach_descendant(&mut self, body: Body) -> Result<TrackerId, TrackingError> {
        let id = TrackerId(self.next_tracker);
        self.next_tracker += 1;

        let capacity = self.settings.initial_pool_capacity.min(limits::MAX_POOL_CAPACITY);
        let name = body.name.clone();
        self.trackers.insert(id, Tracker::new(id, body, capacity));

        if let Err(err) = self.update_descendant(id) {
            if let Some(mut tracker) = self.trackers.remove(&id) {
                if let Err(cleanup) = tracker.detach_all(&mut self.networks) {
                    warn!("{}: cleanup after failed attach: {}", id, cleanup);
                }
            }
            return Err(err);
        }

        debug!("attached {} ({}) to {} cells", id, name, self.trackers.get(&id).map_or(0, |t| t.containing().len()));
        Ok(id)
    }

    /// Re-attach one entity after it moved
    pub fn update_descendant(&mut self, id: TrackerId) -> Result<(), TrackingError> {
        let tracker = self.trackers.get(&id).ok_or(TrackingError::UnknownTracker(id))?;
        if tracker.is_poisoned() {
            return Err(TrackingError::LeftGraph { tracker: id });
        }
        let bounds = tracker.body().world_bounds().ok_or(TrackingError::NoBounds(id))?;
        let found = self.containing_cells(&bounds, tracker.previous());

        let tracker = self.trackers.get_mut(&id).ok_or(TrackingError::UnknownTracker(id))?;
        tracker.apply(found, &mut self.networks)
    }

    /// Move an entity and re-attach it
    pub fn move_descendant(&mut self, id: TrackerId, translation: Vec3) -> Result<(), TrackingError> {
        let tracker = self.trackers.get_mut(&id).ok_or(TrackingError::UnknownTracker(id))?;
        tracker.body_mut().translation = translation;
        self.update_descendant(id)
    }

    /// Per-frame tick for every tracked entity.
    ///
    /// A failing entity does not hold back the others; the first error is
    /// returned once all of them were updated.
    pub fn update_descendants(&mut self) -> Result<(), TrackingError> {
        let ids: Vec<TrackerId> = self.trackers.keys().copied().collect();
        let mut first_error = None;
        for id in ids {
            if let Err(err) = self.update_descendant(id) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop tracking an entity, releasing all of its proxies
    pub fn detach_descendant(&mut self, id: TrackerId) -> Result<Body, TrackingError> {
        let mut tracker = self.trackers.remove(&id).ok_or(TrackingError::UnknownTracker(id))?;
        tracker.detach_all(&mut self.networks)?;
        debug!("detached {} ({})", id, tracker.body().name);
        Ok(tracker.into_body())
    }

    pub fn descendant(&self, id: TrackerId) -> Option<&Tracker> {
        self.trackers.get(&id)
    }

    pub fn descendants(&self) -> impl Iterator<Item = &Tracker> {
        self.trackers.values()
    }
}
