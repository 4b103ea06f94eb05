//! Proxy pool with generational handles
//!
//! Entities straddling a doorway get one proxy per cell they overlap, and
//! the set of cells changes almost every frame. Proxies are recycled instead
//! of rebuilt:
//! - Each slot has a generation counter
//! - Releasing a proxy bumps the generation, so the old handle goes stale
//! - Handles carry the owning tracker, so a handle from another pool is caught

use std::collections::VecDeque;
use std::rc::Rc;

use thiserror::Error;

use super::TrackerId;
use crate::world::Renderable;

/// Reference to a proxy issued by a specific pool.
///
/// Only `ProxyPool::acquire` creates these. A handle is valid until it is
/// released; after that its generation no longer matches the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyHandle {
    pool: TrackerId,
    index: u32,
    generation: u32,
}

impl ProxyHandle {
    /// Tracker whose pool issued this handle
    pub fn owner(&self) -> TrackerId {
        self.pool
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Rejected releases
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("proxy {handle:?} belongs to {} and cannot be released into the pool of {pool}", .handle.pool)]
    ForeignProxy { pool: TrackerId, handle: ProxyHandle },
    #[error("proxy slot {index} was never issued by the pool of {pool}")]
    NeverIssued { pool: TrackerId, index: u32 },
    #[error("proxy {handle:?} is stale (already released)")]
    StaleHandle { handle: ProxyHandle },
}

/// Lightweight stand-in for a tracked entity inside one cell
#[derive(Debug, Clone)]
pub struct Proxy {
    /// Tracker driving this proxy each frame
    pub owner: TrackerId,
    /// Shared with the entity and every other proxy of it
    pub renderable: Rc<Renderable>,
}

#[derive(Debug)]
struct Slot {
    proxy: Proxy,
    generation: u32,
    in_use: bool,
}

/// Used and unused proxies for one tracked entity
#[derive(Debug)]
pub struct ProxyPool {
    owner: TrackerId,
    renderable: Rc<Renderable>,
    slots: Vec<Slot>,
    /// Free slots, oldest release reused first
    unused: VecDeque<u32>,
    in_use: usize,
    acquired_total: u64,
    released_total: u64,
}

impl ProxyPool {
    pub fn new(owner: TrackerId, renderable: Rc<Renderable>) -> Self {
        Self::with_capacity(owner, renderable, 0)
    }

    /// Create a pool with `capacity` proxies already built
    pub fn with_capacity(owner: TrackerId, renderable: Rc<Renderable>, capacity: usize) -> Self {
        let mut pool = Self {
            owner,
            renderable,
            slots: Vec::with_capacity(capacity),
            unused: VecDeque::with_capacity(capacity),
            in_use: 0,
            acquired_total: 0,
            released_total: 0,
        };
        for _ in 0..capacity {
            let index = pool.push_slot();
            pool.unused.push_back(index);
        }
        pool
    }

    fn push_slot(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            proxy: Proxy { owner: self.owner, renderable: Rc::clone(&self.renderable) },
            generation: 0,
            in_use: false,
        });
        index
    }

    /// Take a proxy, reusing a released one when available
    pub fn acquire(&mut self) -> ProxyHandle {
        let index = match self.unused.pop_front() {
            Some(index) => index,
            None => self.push_slot(),
        };
        let slot = &mut self.slots[index as usize];
        slot.in_use = true;
        self.in_use += 1;
        self.acquired_total += 1;
        ProxyHandle { pool: self.owner, index, generation: slot.generation }
    }

    /// Return a proxy to the pool.
    ///
    /// Fails for handles issued by another pool, for slots this pool never
    /// created and for handles that were already released.
    pub fn release(&mut self, handle: ProxyHandle) -> Result<(), PoolError> {
        if handle.pool != self.owner {
            return Err(PoolError::ForeignProxy { pool: self.owner, handle });
        }
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(PoolError::NeverIssued { pool: self.owner, index: handle.index })?;
        if !slot.in_use || slot.generation != handle.generation {
            return Err(PoolError::StaleHandle { handle });
        }

        // Increment generation to invalidate the released handle
        slot.generation = slot.generation.wrapping_add(1);
        slot.in_use = false;
        self.unused.push_back(handle.index);
        self.in_use -= 1;
        self.released_total += 1;
        Ok(())
    }

    /// Look up a live proxy
    pub fn get(&self, handle: ProxyHandle) -> Option<&Proxy> {
        if handle.pool != self.owner {
            return None;
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
            .map(|slot| &slot.proxy)
    }

    pub fn is_live(&self, handle: ProxyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn owner(&self) -> TrackerId {
        self.owner
    }

    pub fn renderable(&self) -> &Rc<Renderable> {
        &self.renderable
    }

    /// Proxies currently handed out
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Proxies ever built (used + unused)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn acquired_total(&self) -> u64 {
        self.acquired_total
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn pool(id: u32) -> ProxyPool {
        ProxyPool::new(TrackerId(id), Rc::new(Renderable::cuboid(Vec3::splat(0.5))))
    }

    #[test]
    fn test_acquire_and_release() {
        let mut p = pool(1);
        let a = p.acquire();
        let b = p.acquire();
        assert_eq!(p.in_use(), 2);
        assert!(p.is_live(a));

        p.release(a).unwrap();
        assert_eq!(p.in_use(), 1);
        assert!(!p.is_live(a));
        assert!(p.is_live(b));
        assert_eq!(p.acquired_total() - p.released_total(), p.in_use() as u64);
    }

    #[test]
    fn test_released_proxy_is_reused() {
        let mut p = pool(1);
        let a = p.acquire();
        p.release(a).unwrap();

        let b = p.acquire();
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert_eq!(p.capacity(), 1);
    }

    #[test]
    fn test_double_release_rejected() {
        let mut p = pool(1);
        let a = p.acquire();
        p.release(a).unwrap();
        assert_eq!(p.release(a), Err(PoolError::StaleHandle { handle: a }));

        // Slot reused by someone else; the old handle still must not free it
        let b = p.acquire();
        assert!(p.release(a).is_err());
        assert!(p.is_live(b));
    }

    #[test]
    fn test_foreign_and_unissued_rejected() {
        let mut mine = pool(1);
        let mut theirs = pool(2);
        let foreign = theirs.acquire();
        assert!(matches!(mine.release(foreign), Err(PoolError::ForeignProxy { .. })));

        let bogus = ProxyHandle { pool: TrackerId(1), index: 7, generation: 0 };
        assert!(matches!(mine.release(bogus), Err(PoolError::NeverIssued { index: 7, .. })));
    }

    #[test]
    fn test_preallocated_capacity() {
        let renderable = Rc::new(Renderable::cuboid(Vec3::splat(1.0)));
        let mut p = ProxyPool::with_capacity(TrackerId(3), Rc::clone(&renderable), 4);
        assert_eq!(p.capacity(), 4);
        assert_eq!(p.in_use(), 0);
        for _ in 0..4 {
            p.acquire();
        }
        assert_eq!(p.capacity(), 4);
        p.acquire();
        assert_eq!(p.capacity(), 5);

        // Every proxy shares the entity's renderable
        assert_eq!(Rc::strong_count(&renderable), 1 + 1 + 5);
    }
}
