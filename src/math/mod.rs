//! Geometry primitives
//!
//! - `Vec3`: points, offsets, directions
//! - `Aabb` / `Triangle`: bounds, overlap and containment tests
//! - `Camera` / `FrustumParameters`: near-plane projection for portal visibility

mod bounds;
mod camera;
mod frustum;
mod vec;

pub use bounds::{Aabb, Triangle};
pub use camera::{Camera, Projection};
pub use frustum::FrustumParameters;
pub use vec::Vec3;
