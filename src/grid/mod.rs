//! Grid assets and the topology store that owns them.

pub mod node;
/// Node graph with nearest-neighbour placement.
pub mod topology;

pub use node::{BLUEPRINTS, Blueprint, GridNode, MAP_CENTER, NodeId, NodeKind, NodeStatus, blueprint};
pub use topology::Topology;
