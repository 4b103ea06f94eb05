//! Small levels shared by the unit tests

use crate::math::{Aabb, Camera, Vec3};
use crate::world::{Geometry, Level, NamedNode};

/// Cell `i` of a corridor: 10x10x10 box along +X
pub(crate) fn cell_box(i: usize) -> Aabb {
    let x = 10.0 * i as f32;
    Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 10.0, 10.0, 10.0))
}

/// Thin doorway on the wall at `x`, 6 high and 4 wide (z 3..7)
pub(crate) fn door_x(x: f32) -> Aabb {
    Aabb::new(Vec3::new(x - 0.1, 0.0, 3.0), Vec3::new(x + 0.1, 6.0, 7.0))
}

/// Thin doorway on the wall at `z`, 6 high and 4 wide
pub(crate) fn door_z(x: f32, z: f32) -> Aabb {
    Aabb::new(Vec3::new(x + 3.0, 0.0, z - 0.1), Vec3::new(x + 7.0, 6.0, z + 0.1))
}

pub(crate) fn node(name: &str, bounds: Aabb) -> NamedNode {
    NamedNode::new(name, Some(Geometry::cuboid(bounds)))
}

/// Nodes of `n` cells in a row, each linked to the next
pub(crate) fn corridor_nodes(n: usize) -> Vec<NamedNode> {
    let mut nodes: Vec<NamedNode> = (0..n)
        .map(|i| node(&format!("level0NID0CID{}", i), cell_box(i)))
        .collect();
    for i in 0..n.saturating_sub(1) {
        let x = 10.0 * (i + 1) as f32;
        nodes.push(node(&format!("level0NID0CID{}CID{}", i, i + 1), door_x(x)));
    }
    nodes
}

pub(crate) fn corridor(n: usize) -> Level {
    Level::build(corridor_nodes(n)).unwrap()
}

/// 2x2 ring of cells: 0 -> 1 -> 2 -> 3 -> 0
pub(crate) fn cycle() -> Level {
    let room = |x: f32, z: f32| Aabb::new(Vec3::new(x, 0.0, z), Vec3::new(x + 10.0, 10.0, z + 10.0));
    let shift_z = |b: Aabb| b.translated(Vec3::new(0.0, 0.0, 10.0));
    Level::build(vec![
        node("level0NID0CID0", room(0.0, 0.0)),
        node("level0NID0CID1", room(10.0, 0.0)),
        node("level0NID0CID2", room(10.0, 10.0)),
        node("level0NID0CID3", room(0.0, 10.0)),
        node("level0NID0CID0CID1", door_x(10.0)),
        node("level0NID0CID1CID2", door_z(10.0, 10.0)),
        node("level0NID0CID2CID3", shift_z(door_x(10.0))),
        node("level0NID0CID3CID0", door_z(0.0, 10.0)),
    ])
    .unwrap()
}

/// Cell 0 linked to each of `leaves` cells, portals in leaf order
pub(crate) fn star(leaves: usize) -> Level {
    let mut nodes = vec![node("level0NID0CID0", cell_box(0))];
    for i in 1..=leaves {
        nodes.push(node(&format!("level0NID0CID{}", i), cell_box(i)));
    }
    for i in 1..=leaves {
        nodes.push(node(&format!("level0NID0CID0CID{}", i), door_x(10.0)));
    }
    Level::build(nodes).unwrap()
}

/// Network 3 (one far room, listed first) and network 1 (two-cell corridor)
pub(crate) fn two_networks() -> Level {
    let far = Aabb::new(Vec3::new(100.0, 0.0, 0.0), Vec3::new(110.0, 10.0, 10.0));
    Level::build(vec![
        node("level0NID3CID0", far),
        node("level0NID1CID0", cell_box(0)),
        node("level0NID1CID1", cell_box(1)),
        node("level0NID1CID0CID1", door_x(10.0)),
    ])
    .unwrap()
}

/// Level camera with a 90 degree square view
pub(crate) fn camera(position: Vec3, yaw: f32) -> Camera {
    Camera::new(position, yaw, 0.0).with_lens(std::f32::consts::FRAC_PI_2, 1.0, 0.1)
}
