//! Topology store: the node graph and its structural invariants.

use std::collections::BTreeMap;

use tracing::info;

use super::node::{GridNode, MAP_CENTER, NodeId, NodeKind, NodeStatus, blueprint};

/// Number of existing nodes a newly placed node is wired to.
const PLACEMENT_FANOUT: usize = 2;

/// Owns every [`GridNode`] and keeps adjacency symmetric.
///
/// Nodes are kept in an ordered map so that iteration order, and with it
/// cascade resolution and jitter draws, is stable for a given topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    nodes: BTreeMap<NodeId, GridNode>,
}

impl Default for Topology {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Topology {
    /// Topology with no nodes at all.
    pub fn empty() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// The canonical seed: one gas plant feeding four substations wired in a ring.
    pub fn seeded() -> Self {
        let (lat, lng) = MAP_CENTER;
        let mut topo = Self::empty();

        let Some(plant_bp) = blueprint(NodeKind::Thermal) else {
            return topo;
        };
        let Some(sub_bp) = blueprint(NodeKind::Substation) else {
            return topo;
        };

        topo.insert(GridNode::from_blueprint(
            plant_bp,
            "plant_1",
            "Main Gas Plant",
            lat,
            lng,
        ));
        let subs = [
            ("sub_north", "North Substation", lat + 0.0018, lng),
            ("sub_south", "South Substation", lat - 0.0018, lng),
            ("sub_east", "East Substation", lat, lng + 0.00175),
            ("sub_west", "West Substation", lat, lng - 0.0021),
        ];
        for (id, name, sub_lat, sub_lng) in subs {
            topo.insert(GridNode::from_blueprint(sub_bp, id, name, sub_lat, sub_lng));
            topo.connect("plant_1", id);
        }
        topo.connect("sub_north", "sub_east");
        topo.connect("sub_east", "sub_south");
        topo.connect("sub_south", "sub_west");
        topo.connect("sub_west", "sub_north");
        topo
    }

    /// Resets to the seed topology, discarding every placed node.
    pub fn initialize(&mut self) {
        *self = Self::seeded();
        info!(nodes = self.nodes.len(), "topology initialized");
    }

    /// All nodes keyed by id.
    pub fn nodes(&self) -> &BTreeMap<NodeId, GridNode> {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&GridNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Places a node of `kind` at the given position.
    ///
    /// The node gets a unique id and name among its siblings (`solar_farm_1`,
    /// `"Solar Farm 1"`, ...) and is wired both ways to the two
    /// geographically nearest existing nodes.
    ///
    /// # Returns
    ///
    /// The new node id, or `None` if `kind` has no blueprint.
    pub fn place(&mut self, kind: NodeKind, lat: f64, lng: f64) -> Option<NodeId> {
        let bp = blueprint(kind)?;
        let neighbours = self.nearest(lat, lng, PLACEMENT_FANOUT);

        let mut n = 1 + self.nodes.values().filter(|x| x.kind == kind).count();
        while self.nodes.contains_key(&format!("{}_{n}", kind.as_str())) {
            n += 1;
        }
        let id = format!("{}_{n}", kind.as_str());
        let node = GridNode::from_blueprint(bp, id.clone(), format!("{} {n}", bp.label), lat, lng);

        self.insert(node);
        for other in &neighbours {
            self.connect(&id, other);
        }
        info!(%id, %kind, ?neighbours, "node placed");
        Some(id)
    }

    /// Deletes a node and strips it from every neighbour's adjacency.
    ///
    /// Returns `false` (and does nothing) when `id` is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };
        for other in &node.connections {
            if let Some(n) = self.nodes.get_mut(other) {
                n.connections.remove(id);
            }
        }
        // Catch one-sided edges left by a caller that bypassed `connect`.
        for n in self.nodes.values_mut() {
            n.connections.remove(id);
        }
        info!(%id, "node removed");
        true
    }

    /// Returns an offline node to service. Returns `false` for unknown ids.
    pub fn recover(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.is_offline() {
            node.status = NodeStatus::Normal;
            info!(%id, "node recovered");
        }
        true
    }

    /// Ids of the `count` nodes closest to a point, nearest first.
    ///
    /// Ties are broken by id.
    pub fn nearest(&self, lat: f64, lng: f64, count: usize) -> Vec<NodeId> {
        let mut by_distance: Vec<(f64, &NodeId)> = self
            .nodes
            .values()
            .map(|n| (n.distance_sq(lat, lng), &n.id))
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
        by_distance
            .into_iter()
            .take(count)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Returns `true` when every edge is present on both endpoints and
    /// every neighbour reference resolves.
    pub fn is_symmetric(&self) -> bool {
        self.nodes.values().all(|n| {
            n.connections.iter().all(|m| {
                self.nodes
                    .get(m)
                    .is_some_and(|other| other.connections.contains(&n.id))
            })
        })
    }

    /// Inserts a node as-is. Adjacency is the caller's job.
    pub fn insert(&mut self, node: GridNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Adds an undirected edge. No-op if either endpoint is missing or `a == b`.
    pub fn connect(&mut self, a: &str, b: &str) {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return;
        }
        if let Some(n) = self.nodes.get_mut(a) {
            n.connections.insert(b.to_string());
        }
        if let Some(n) = self.nodes.get_mut(b) {
            n.connections.insert(a.to_string());
        }
    }

    /// Swaps in a freshly computed node set.
    ///
    /// Only runtime fields may differ; structure is owned by this store, so
    /// ids that are not already present are ignored.
    pub(crate) fn commit(&mut self, computed: BTreeMap<NodeId, GridNode>) {
        for (id, next) in computed {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.current_load = next.current_load;
                node.generation = next.generation;
                node.status = next.status;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_plant_and_ring() {
        let topo = Topology::seeded();
        assert_eq!(topo.len(), 5);
        let plant = topo.get("plant_1").unwrap();
        assert_eq!(plant.connections.len(), 4);
        let north = topo.get("sub_north").unwrap();
        assert!(north.connections.contains("plant_1"));
        assert!(north.connections.contains("sub_east"));
        assert!(north.connections.contains("sub_west"));
        assert!(!north.connections.contains("sub_south"));
        assert!(topo.is_symmetric());
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut topo = Topology::seeded();
        topo.place(NodeKind::Solar, 37.776, -122.418);
        topo.initialize();
        let first = topo.clone();
        topo.initialize();
        assert_eq!(first, topo);
        assert!(topo.get("solar_farm_1").is_none());
    }

    #[test]
    fn place_wires_two_nearest_both_ways() {
        let mut topo = Topology::seeded();
        let (lat, lng) = MAP_CENTER;
        // Just north-east of the centre: nearest are plant_1 and sub_north.
        let id = topo.place(NodeKind::Solar, lat + 0.0012, lng + 0.0002).unwrap();
        assert_eq!(id, "solar_farm_1");
        let node = topo.get(&id).unwrap();
        assert_eq!(node.name, "Solar Farm 1");
        assert_eq!(node.connections.len(), 2);
        assert!(node.connections.contains("sub_north"));
        assert!(node.connections.contains("plant_1"));
        assert!(topo.get("sub_north").unwrap().connections.contains(&id));
        assert!(topo.is_symmetric());
    }

    #[test]
    fn place_names_unique_among_siblings() {
        let mut topo = Topology::seeded();
        let a = topo.place(NodeKind::Wind, 37.78, -122.42).unwrap();
        let b = topo.place(NodeKind::Wind, 37.77, -122.41).unwrap();
        assert_eq!(a, "wind_farm_1");
        assert_eq!(b, "wind_farm_2");
        topo.remove(&a);
        let c = topo.place(NodeKind::Wind, 37.77, -122.43).unwrap();
        assert_ne!(c, b);
        assert!(topo.is_symmetric());
    }

    #[test]
    fn place_into_empty_topology_has_no_neighbours() {
        let mut topo = Topology::empty();
        let id = topo.place(NodeKind::Hospital, 0.0, 0.0).unwrap();
        assert!(topo.get(&id).unwrap().connections.is_empty());
    }

    #[test]
    fn remove_strips_adjacency() {
        let mut topo = Topology::seeded();
        assert!(topo.remove("sub_east"));
        assert!(topo.get("sub_east").is_none());
        for node in topo.nodes().values() {
            assert!(!node.connections.contains("sub_east"));
        }
        assert!(topo.is_symmetric());
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut topo = Topology::seeded();
        let before = topo.clone();
        assert!(!topo.remove("nope"));
        assert_eq!(before, topo);
    }

    #[test]
    fn recover_clears_offline() {
        let mut topo = Topology::seeded();
        let mut nodes = topo.nodes().clone();
        nodes.get_mut("sub_west").unwrap().force_offline();
        topo.commit(nodes);
        assert!(topo.get("sub_west").unwrap().is_offline());
        assert!(topo.recover("sub_west"));
        assert_eq!(topo.get("sub_west").unwrap().status, NodeStatus::Normal);
        assert!(!topo.recover("ghost"));
    }

    #[test]
    fn commit_ignores_unknown_ids() {
        let mut topo = Topology::seeded();
        let mut nodes = topo.nodes().clone();
        let mut ghost = nodes["sub_north"].clone();
        ghost.id = "ghost".into();
        nodes.insert("ghost".into(), ghost);
        topo.commit(nodes);
        assert!(topo.get("ghost").is_none());
    }
}
