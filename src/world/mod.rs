//! World module - portal-cell spatial graph
//!
//! Indoor levels partitioned into cells joined by portals:
//! - Identifiers parsed from node names
//! - Breadth-first visitor shared by every graph query
//! - Networks (connected components) grouped into levels
//! - RON level files, optionally brotli-compressed

mod cell;
mod geometry;
mod identifier;
mod io;
mod level;
mod network;
mod portal;
mod visitor;

pub use cell::{Cell, Visibility};
pub use geometry::{Geometry, Renderable};
pub use identifier::{NodeId, NodeIdError, NodeKind};
pub use io::*;
pub use level::{BuildError, CellRef, Level, NamedNode, NodeRef};
pub use network::{Network, PortalFrustum};
pub use portal::Portal;
pub use visitor::{breadth_first_search, Flow, Outcome, SearchOrder, Visitor};
