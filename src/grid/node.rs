//! Grid asset definitions: node kinds, operational status, and placement blueprints.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable node identifier (e.g. `"sub_north"`, `"solar_farm_2"`).
pub type NodeId = String;

/// Map centre of the seed topology (downtown San Francisco).
pub const MAP_CENTER: (f64, f64) = (37.7749, -122.4194);

/// Load ratio above which a node is reported as critical.
const CRITICAL_RATIO: f64 = 0.95;
/// Load ratio above which a node is reported as warning.
const WARNING_RATIO: f64 = 0.8;

/// Kind of grid asset.
///
/// Serialized names follow the placement palette ids (`power_plant`,
/// `solar_farm`, ...), which is also what [`FromStr`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Gas-fired thermal plant, load-following.
    #[serde(rename = "power_plant")]
    Thermal,
    /// Nuclear plant, fixed baseload.
    #[serde(rename = "nuclear_plant")]
    Nuclear,
    /// Utility-scale wind farm.
    #[serde(rename = "wind_farm")]
    Wind,
    /// Photovoltaic array.
    #[serde(rename = "solar_farm")]
    Solar,
    /// Hydroelectric dam.
    #[serde(rename = "hydro_plant")]
    Hydro,
    /// Distribution substation; the only kind subject to cascade tripping.
    #[serde(rename = "substation")]
    Substation,
    /// Grid-scale battery.
    #[serde(rename = "battery_storage")]
    BatteryStorage,
    /// Islanded district grid with both generation and load.
    #[serde(rename = "microgrid")]
    Microgrid,
    /// Hyperscale data centre.
    #[serde(rename = "data_center")]
    DataCenter,
    /// Fast-charge EV cluster.
    #[serde(rename = "ev_charging_hub")]
    EvHub,
    /// Critical-load hospital campus.
    #[serde(rename = "hospital")]
    Hospital,
    /// Event venue.
    #[serde(rename = "stadium")]
    Stadium,
}

impl NodeKind {
    /// Every node kind, in palette order.
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Thermal,
        NodeKind::Nuclear,
        NodeKind::Wind,
        NodeKind::Solar,
        NodeKind::Hydro,
        NodeKind::Substation,
        NodeKind::BatteryStorage,
        NodeKind::Microgrid,
        NodeKind::DataCenter,
        NodeKind::EvHub,
        NodeKind::Hospital,
        NodeKind::Stadium,
    ];

    /// Palette id of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thermal => "power_plant",
            Self::Nuclear => "nuclear_plant",
            Self::Wind => "wind_farm",
            Self::Solar => "solar_farm",
            Self::Hydro => "hydro_plant",
            Self::Substation => "substation",
            Self::BatteryStorage => "battery_storage",
            Self::Microgrid => "microgrid",
            Self::DataCenter => "data_center",
            Self::EvHub => "ev_charging_hub",
            Self::Hospital => "hospital",
            Self::Stadium => "stadium",
        }
    }

    /// Returns `true` for kinds that can put power onto the grid.
    pub fn is_source(self) -> bool {
        matches!(
            self,
            Self::Thermal
                | Self::Nuclear
                | Self::Wind
                | Self::Solar
                | Self::Hydro
                | Self::BatteryStorage
                | Self::Microgrid
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown node type \"{s}\""))
    }
}

/// Operational status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Normal,
    Warning,
    Critical,
    /// Tripped by a cascade or forced out by a scenario. Sticky until recovered.
    Offline,
}

impl NodeStatus {
    /// Status implied by a load-to-capacity ratio.
    ///
    /// Nodes without capacity or without load are always `Normal`.
    pub fn from_load(current_load: f64, capacity: f64) -> Self {
        if capacity <= 0.0 || current_load <= 0.0 {
            return Self::Normal;
        }
        let ratio = current_load / capacity;
        if ratio > CRITICAL_RATIO {
            Self::Critical
        } else if ratio > WARNING_RATIO {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Default parameters for a newly placed node of one kind.
#[derive(Debug, Clone, Copy)]
pub struct Blueprint {
    pub kind: NodeKind,
    /// Display label; placed nodes are named `"{label} {n}"`.
    pub label: &'static str,
    pub description: &'static str,
    /// Nameplate capacity (MW).
    pub capacity: f64,
    /// Pre-modifier demand baseline (MW).
    pub base_load: f64,
    /// Initial generation before the first tick (MW).
    pub generation: f64,
}

/// Placement catalogue, one entry per [`NodeKind`].
#[rustfmt::skip]
pub const BLUEPRINTS: &[Blueprint] = &[
    Blueprint { kind: NodeKind::Thermal, label: "Gas Power Plant", description: "Combined-cycle gas turbine, 1 GW", capacity: 1000.0, base_load: 0.0, generation: 1000.0 },
    Blueprint { kind: NodeKind::Nuclear, label: "Nuclear Plant", description: "Nuclear reactor, 1.2 GW baseload", capacity: 1200.0, base_load: 0.0, generation: 1200.0 },
    Blueprint { kind: NodeKind::Wind, label: "Wind Farm", description: "Utility-scale turbines, 400 MW", capacity: 400.0, base_load: 0.0, generation: 400.0 },
    Blueprint { kind: NodeKind::Solar, label: "Solar Farm", description: "Photovoltaic array, 200 MW", capacity: 200.0, base_load: 0.0, generation: 200.0 },
    Blueprint { kind: NodeKind::Hydro, label: "Hydro Plant", description: "Hydroelectric dam, 500 MW", capacity: 500.0, base_load: 0.0, generation: 500.0 },
    Blueprint { kind: NodeKind::Substation, label: "Substation", description: "Distribution hub, 250 MW", capacity: 250.0, base_load: 120.0, generation: 0.0 },
    Blueprint { kind: NodeKind::BatteryStorage, label: "Battery Storage", description: "Grid-scale BESS, 300 MW / 1200 MWh", capacity: 300.0, base_load: 0.0, generation: 150.0 },
    Blueprint { kind: NodeKind::Microgrid, label: "Microgrid", description: "Islanded district grid, 50 MW", capacity: 50.0, base_load: 20.0, generation: 30.0 },
    Blueprint { kind: NodeKind::DataCenter, label: "Data Center", description: "Hyperscale compute, 500 MW draw", capacity: 500.0, base_load: 400.0, generation: 0.0 },
    Blueprint { kind: NodeKind::EvHub, label: "EV Charging Hub", description: "Fast-charge station cluster, 50 MW", capacity: 50.0, base_load: 30.0, generation: 0.0 },
    Blueprint { kind: NodeKind::Hospital, label: "Hospital", description: "Critical-load medical campus, 100 MW", capacity: 100.0, base_load: 80.0, generation: 0.0 },
    Blueprint { kind: NodeKind::Stadium, label: "Stadium", description: "Event venue, 150 MW peak demand", capacity: 150.0, base_load: 100.0, generation: 0.0 },
];

/// Looks up the blueprint for `kind`.
pub fn blueprint(kind: NodeKind) -> Option<&'static Blueprint> {
    BLUEPRINTS.iter().find(|b| b.kind == kind)
}

/// A single grid asset.
///
/// Structural fields (`id`, `kind`, position, `connections`) belong to the
/// topology; runtime fields (`current_load`, `generation`, `status`) are
/// written only by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Nameplate ceiling (MW).
    pub capacity: f64,
    /// Demand drawn this tick (MW, >= 0).
    pub current_load: f64,
    /// Power produced this tick (MW, >= 0).
    pub generation: f64,
    /// Pre-modifier demand baseline (MW).
    pub base_load: f64,
    pub status: NodeStatus,
    pub lat: f64,
    pub lng: f64,
    /// Undirected adjacency; every edge appears on both endpoints.
    pub connections: BTreeSet<NodeId>,
}

impl GridNode {
    /// Builds a node from a blueprint with no connections.
    pub fn from_blueprint(
        bp: &Blueprint,
        id: impl Into<NodeId>,
        name: impl Into<String>,
        lat: f64,
        lng: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind: bp.kind,
            name: name.into(),
            capacity: bp.capacity,
            current_load: 0.0,
            generation: bp.generation,
            base_load: bp.base_load,
            status: NodeStatus::Normal,
            lat,
            lng,
            connections: BTreeSet::new(),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.status == NodeStatus::Offline
    }

    /// Load as a fraction of capacity, `0.0` when the node has no capacity.
    pub fn load_ratio(&self) -> f64 {
        if self.capacity > 0.0 {
            self.current_load / self.capacity
        } else {
            0.0
        }
    }

    /// Re-derives status from the load ratio. Offline nodes are left alone.
    pub fn refresh_status(&mut self) {
        if !self.is_offline() {
            self.status = NodeStatus::from_load(self.current_load, self.capacity);
        }
    }

    /// Takes the node out of service and zeroes its runtime output.
    pub fn force_offline(&mut self) {
        self.status = NodeStatus::Offline;
        self.current_load = 0.0;
        self.generation = 0.0;
    }

    /// Squared planar distance to a point, treating lat/lng as Euclidean.
    pub fn distance_sq(&self, lat: f64, lng: f64) -> f64 {
        let dlat = self.lat - lat;
        let dlng = self.lng - lng;
        dlat * dlat + dlng * dlng
    }
}
