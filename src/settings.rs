//! Tracking configuration and level-file limits

use serde::{Serialize, Deserialize};

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum number of named nodes (cells + portals) in a level file
    pub const MAX_NODES: usize = 16_384;
    /// Maximum triangles in one node's geometry
    pub const MAX_TRIANGLES_PER_NODE: usize = 65_536;
    /// Maximum number of entity placements in a level file
    pub const MAX_ENTITIES: usize = 4_096;
    /// Maximum string length for node and entity names
    pub const MAX_NAME_LEN: usize = 256;
    /// Maximum coordinate value (prevents overflow issues)
    pub const MAX_COORD: f32 = 1_000_000.0;
    /// Maximum proxies preallocated per tracked entity
    pub const MAX_POOL_CAPACITY: usize = 64;
}

/// Knobs for collision checks and the dynamic-entity tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Test dynamic proxies triangle by triangle instead of bound against bound
    pub precise_collisions: bool,
    /// Proxies built up front for every newly attached entity
    pub initial_pool_capacity: usize,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            precise_collisions: false,
            initial_pool_capacity: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let s: TrackingSettings = ron::from_str("(precise_collisions: true)").unwrap();
        assert!(s.precise_collisions);
        assert_eq!(s.initial_pool_capacity, TrackingSettings::default().initial_pool_capacity);
    }
}
