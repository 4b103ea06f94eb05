//! Composite node identifiers
//!
//! Every cell and portal is addressed by `(level, network, cell, secondary)`.
//! Node names carry the identifier as text: `level0NID2CID7` is cell 7 of
//! network 2, `level0NID2CID7CID8` is the portal between cells 7 and 8.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

const LEVEL_TAG: &str = "level";
const NETWORK_TAG: &str = "NID";
const CELL_TAG: &str = "CID";

/// Errors from parsing a node name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    #[error("node name {0:?} carries no identifier tag")]
    NoTags(String),
    #[error("invalid number after {tag:?} in node name {name:?}")]
    InvalidNumber { name: String, tag: &'static str },
    #[error("unexpected text {rest:?} in node name {name:?}")]
    TrailingText { name: String, rest: String },
}

/// What kind of node an identifier addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Cell,
    Portal,
    /// Neither cell tag set; not usable as a graph node
    Other,
}

/// Four-part node identifier
///
/// Equality compares all four parts. Hashing only looks at `cell`, so ids
/// from different networks or levels that share a cell number land in the
/// same bucket. Maps keyed by `NodeId` stay correct (equality disambiguates)
/// but should not be expected to spread well across networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeId {
    pub level: i32,
    pub network: i32,
    pub cell: i32,
    pub secondary: i32,
}

impl NodeId {
    /// Sentinel for a part that is not set
    pub const UNSET: i32 = -1;

    pub const fn new(level: i32, network: i32, cell: i32, secondary: i32) -> Self {
        Self { level, network, cell, secondary }
    }

    pub const fn cell(level: i32, network: i32, cell: i32) -> Self {
        Self::new(level, network, cell, Self::UNSET)
    }

    pub const fn portal(level: i32, network: i32, first: i32, second: i32) -> Self {
        Self::new(level, network, first, second)
    }

    pub fn kind(&self) -> NodeKind {
        match (self.cell != Self::UNSET, self.secondary != Self::UNSET) {
            (true, false) => NodeKind::Cell,
            (true, true) => NodeKind::Portal,
            _ => NodeKind::Other,
        }
    }

    pub fn is_cell(&self) -> bool {
        self.kind() == NodeKind::Cell
    }

    pub fn is_portal(&self) -> bool {
        self.kind() == NodeKind::Portal
    }

    /// Identifier of one of the two cells a portal joins
    pub fn cell_side(&self, side: usize) -> NodeId {
        let cell = if side == 0 { self.cell } else { self.secondary };
        NodeId::cell(self.level, self.network, cell)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new(Self::UNSET, Self::UNSET, Self::UNSET, Self::UNSET)
    }
}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.hash(state);
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.level != Self::UNSET {
            write!(f, "{}{}", LEVEL_TAG, self.level)?;
        }
        if self.network != Self::UNSET {
            write!(f, "{}{}", NETWORK_TAG, self.network)?;
        }
        if self.cell != Self::UNSET {
            write!(f, "{}{}", CELL_TAG, self.cell)?;
        }
        if self.secondary != Self::UNSET {
            write!(f, "{}{}", CELL_TAG, self.secondary)?;
        }
        Ok(())
    }
}

/// Strip `tag<number>` off the front of `rest` if the tag is there.
///
/// Numbers are plain decimal digits; a sign is an error.
fn take_tag<'a>(name: &str, rest: &mut &'a str, tag: &'static str) -> Result<Option<i32>, NodeIdError> {
    let Some(after) = rest.strip_prefix(tag) else {
        return Ok(None);
    };
    let digits = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
    let value = after[..digits]
        .parse::<i32>()
        .map_err(|_| NodeIdError::InvalidNumber { name: name.to_string(), tag })?;
    *rest = &after[digits..];
    Ok(Some(value))
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let mut rest = name;
        let level = take_tag(name, &mut rest, LEVEL_TAG)?;
        let network = take_tag(name, &mut rest, NETWORK_TAG)?;
        let cell = take_tag(name, &mut rest, CELL_TAG)?;
        let secondary = if cell.is_some() {
            take_tag(name, &mut rest, CELL_TAG)?
        } else {
            None
        };

        if level.is_none() && network.is_none() && cell.is_none() {
            return Err(NodeIdError::NoTags(name.to_string()));
        }
        if !rest.is_empty() {
            return Err(NodeIdError::TrailingText { name: name.to_string(), rest: rest.to_string() });
        }

        Ok(NodeId::new(
            level.unwrap_or(Self::UNSET),
            network.unwrap_or(Self::UNSET),
            cell.unwrap_or(Self::UNSET),
            secondary.unwrap_or(Self::UNSET),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(id: &NodeId) -> u64 {
        let mut h = DefaultHasher::new();
        id.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_parse_cell_and_portal() {
        let cell: NodeId = "level0NID2CID7".parse().unwrap();
        assert_eq!(cell, NodeId::cell(0, 2, 7));
        assert_eq!(cell.kind(), NodeKind::Cell);

        let portal: NodeId = "level0NID2CID7CID8".parse().unwrap();
        assert_eq!(portal, NodeId::portal(0, 2, 7, 8));
        assert_eq!(portal.kind(), NodeKind::Portal);
        assert_eq!(portal.cell_side(1), NodeId::cell(0, 2, 8));
    }

    #[test]
    fn test_optional_tags() {
        let id: NodeId = "NID3".parse().unwrap();
        assert_eq!(id, NodeId::new(NodeId::UNSET, 3, NodeId::UNSET, NodeId::UNSET));
        assert_eq!(id.kind(), NodeKind::Other);
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["level1NID0CID12", "level1NID0CID12CID13", "NID4CID0"] {
            let id: NodeId = name.parse().unwrap();
            assert_eq!(id.to_string(), name);
        }
    }

    #[test]
    fn test_malformed_names() {
        assert!(matches!("wall".parse::<NodeId>(), Err(NodeIdError::NoTags(_))));
        assert!(matches!("".parse::<NodeId>(), Err(NodeIdError::NoTags(_))));
        assert!(matches!(
            "level0NIDxCID1".parse::<NodeId>(),
            Err(NodeIdError::InvalidNumber { tag: "NID", .. })
        ));
        assert!(matches!(
            "level0NID1CID2_mesh".parse::<NodeId>(),
            Err(NodeIdError::TrailingText { .. })
        ));
        // Negative numbers would collide with the unset marker
        assert!(matches!(
            "level0NID0CID3CID-1".parse::<NodeId>(),
            Err(NodeIdError::InvalidNumber { tag: "CID", .. })
        ));
        assert!("level-2NID0CID1".parse::<NodeId>().is_err());
        assert!("level0NID0CID+4".parse::<NodeId>().is_err());
        // Tags out of order
        assert!("CID1NID0".parse::<NodeId>().is_err());
        assert!("level0NID0CID1CID2CID3".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_equality_uses_all_parts() {
        let a = NodeId::cell(0, 1, 5);
        assert_eq!(a, NodeId::cell(0, 1, 5));
        assert_ne!(a, NodeId::cell(0, 2, 5));
        assert_ne!(a, NodeId::cell(0, 1, 6));
    }

    #[test]
    fn test_hash_only_sees_cell() {
        // Unequal ids sharing a cell number collide; this is expected
        let a = NodeId::cell(0, 1, 5);
        let b = NodeId::cell(3, 9, 5);
        assert_ne!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }
}
