//! Dynamic-entity tracking
//!
//! Keeps moving entities attached to every cell they overlap:
//! - `Body`: the moving entity (shared renderable + translation)
//! - `ProxyPool`: reusable per-entity proxies with generational handles
//! - `Tracker`: per-frame diff of the containing cells against the clone map

mod body;
mod pool;
mod tracker;

pub use body::Body;
pub use pool::{PoolError, Proxy, ProxyHandle, ProxyPool};
pub use tracker::{Tracker, TrackingError};

use std::fmt;

/// Identifies one tracked entity (and its tracker) within a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackerId(pub u32);

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tracker#{}", self.0)
    }
}
