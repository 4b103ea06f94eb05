//! Per-entity tracker
//!
//! Each frame the level hands the tracker the cells its body overlaps; the
//! tracker diffs that against the cells holding one of its proxies:
//! - Cells left behind get their proxy detached and released
//! - Newly entered cells get a fresh (or recycled) proxy
//! - An empty result means the entity left the graph, which poisons the tracker

use std::collections::HashMap;
use std::rc::Rc;

use log::{error, trace};
use thiserror::Error;

use super::{Body, PoolError, ProxyHandle, ProxyPool, TrackerId};
use crate::world::{CellRef, Network};

/// Errors from attaching, updating or detaching tracked entities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("{0} is not attached to this level")]
    UnknownTracker(TrackerId),
    #[error("{tracker} left the cell graph")]
    LeftGraph { tracker: TrackerId },
    #[error("{0} has no geometry to track")]
    NoBounds(TrackerId),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[derive(Debug)]
pub struct Tracker {
    id: TrackerId,
    body: Body,
    pool: ProxyPool,
    /// Cells the body overlapped after the last update
    containing: Vec<CellRef>,
    /// Proxy attached to each containing cell
    clones: HashMap<CellRef, ProxyHandle>,
    previous: Option<CellRef>,
    poisoned: bool,
}

impl Tracker {
    pub fn new(id: TrackerId, body: Body, pool_capacity: usize) -> Self {
        let pool = ProxyPool::with_capacity(id, Rc::clone(body.renderable()), pool_capacity);
        Self {
            id,
            body,
            pool,
            containing: Vec::new(),
            clones: HashMap::new(),
            previous: None,
            poisoned: false,
        }
    }

    pub fn id(&self) -> TrackerId {
        self.id
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn pool(&self) -> &ProxyPool {
        &self.pool
    }

    pub fn containing(&self) -> &[CellRef] {
        &self.containing
    }

    pub fn clone_in(&self, cell: CellRef) -> Option<ProxyHandle> {
        self.clones.get(&cell).copied()
    }

    pub fn clone_count(&self) -> usize {
        self.clones.len()
    }

    /// First cell of the last containing set, seed of the next search
    pub fn previous(&self) -> Option<CellRef> {
        self.previous
    }

    /// Set once the body left the graph; every later update fails
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Bring proxies in line with a new containing set
    pub(crate) fn apply(&mut self, found: Vec<CellRef>, networks: &mut [Network]) -> Result<(), TrackingError> {
        if self.poisoned {
            return Err(TrackingError::LeftGraph { tracker: self.id });
        }
        let Some(&first) = found.first() else {
            self.poisoned = true;
            error!("{} ({}) left the cell graph at {:?}", self.id, self.body.name, self.body.translation);
            return Err(TrackingError::LeftGraph { tracker: self.id });
        };
        self.previous = Some(first);

        let stale: Vec<CellRef> = self.containing.iter().copied().filter(|c| !found.contains(c)).collect();
        let left = stale.len();
        self.release_cells(stale, networks)?;

        let mut entered = 0;
        for &cell in &found {
            if self.clones.contains_key(&cell) {
                continue;
            }
            let handle = self.pool.acquire();
            if let Some(target) = cell_mut(networks, cell) {
                target.attach_proxy(self.id, handle);
            }
            self.clones.insert(cell, handle);
            entered += 1;
        }

        if left > 0 || entered > 0 {
            trace!("{}: left {} cells, entered {}, now in {}", self.id, left, entered, found.len());
        }
        self.containing = found;
        Ok(())
    }

    /// Detach and release every proxy
    pub(crate) fn detach_all(&mut self, networks: &mut [Network]) -> Result<(), TrackingError> {
        let cells: Vec<CellRef> = self.clones.keys().copied().collect();
        self.release_cells(cells, networks)?;
        self.containing.clear();
        Ok(())
    }

    /// Release the proxies of `cells` and detach them.
    ///
    /// A proxy the pool refuses stays attached and in the clone map, and
    /// `containing` is cut back to the cells still holding a proxy.
    fn release_cells(&mut self, cells: Vec<CellRef>, networks: &mut [Network]) -> Result<(), TrackingError> {
        for cell in cells {
            let Some(&handle) = self.clones.get(&cell) else {
                continue;
            };
            if let Err(err) = self.pool.release(handle) {
                let clones = &self.clones;
                self.containing.retain(|c| clones.contains_key(c));
                return Err(err.into());
            }
            self.clones.remove(&cell);
            if let Some(target) = cell_mut(networks, cell) {
                target.detach_proxy(self.id);
            }
        }
        Ok(())
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}

fn cell_mut(networks: &mut [Network], cell: CellRef) -> Option<&mut crate::world::Cell> {
    networks.get_mut(cell.network).and_then(|n| n.cell_mut(cell.cell))
}
