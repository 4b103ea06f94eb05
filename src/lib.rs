//! Portal-cell spatial graph for indoor levels
//!
//! Levels are split into cells (convex-ish rooms) joined by portals
//! (doorways). One breadth-first visitor answers every query:
//! - Point localization, seeded from the previous frame's cell
//! - Visible cells and per-portal clip rectangles for the renderer
//! - Wall and doorway collision with a bounding-box heuristic
//! - Moving entities kept attached to every cell they overlap, through
//!   pooled proxies

pub mod math;
pub mod settings;
pub mod tracking;
pub mod world;

#[cfg(test)]
pub(crate) mod fixtures;

pub use math::{Aabb, Camera, FrustumParameters, Triangle, Vec3};
pub use settings::TrackingSettings;
pub use tracking::{Body, TrackerId, TrackingError};
pub use world::{
    load_level_file, save_level_file, BuildError, Cell, CellRef, Geometry, Level, LevelFile, NamedNode,
    Network, NodeId, NodeRef, Portal, Renderable,
};
