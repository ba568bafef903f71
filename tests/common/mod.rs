//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use grid_sim::grid::{GridNode, NodeKind, blueprint};
use grid_sim::scenario::{ParamKey, ParamValue, ScenarioRegistry};
use grid_sim::sim::{GridSimulation, SimSettings};

/// Paused settings pinned at `hour`, so ticks recompute without moving the clock.
pub fn paused_at(hour: f64) -> SimSettings {
    SimSettings {
        start_hour: hour,
        playing: false,
        ..SimSettings::default()
    }
}

/// Seed-topology simulation frozen at `hour`.
pub fn sim_at(hour: f64) -> GridSimulation {
    GridSimulation::new(paused_at(hour))
}

/// Simulation frozen at `hour` whose first recompute already sees `values`.
pub fn sim_with(hour: f64, values: &[(ParamKey, ParamValue)]) -> GridSimulation {
    let mut reg = ScenarioRegistry::new();
    for (key, value) in values {
        reg.add(*key);
        reg.update(*key, value.clone())
            .unwrap_or_else(|e| panic!("{key} rejected: {e}"));
    }
    GridSimulation::with_scenarios(paused_at(hour), reg)
}

/// 200 MW of data centre on the south substation at 03:00, when every
/// substation carries 72 MW: the south one trips and its ring neighbours absorb it.
pub fn south_overload() -> GridSimulation {
    sim_with(
        3.0,
        &[
            (ParamKey::DcInterconnectPt, ParamValue::from("Sub B")),
            (ParamKey::DcLoad, ParamValue::Int(200)),
        ],
    )
}

/// Activates `key` and sets it to `value`, panicking on rejection.
pub fn set_scenario(sim: &mut GridSimulation, key: ParamKey, value: impl Into<ParamValue>) {
    sim.add_scenario(key);
    sim.update_scenario(key, value)
        .unwrap_or_else(|e| panic!("{key} rejected: {e}"));
}

/// Substation loads of the seed grid in id order.
pub fn substation_loads(sim: &GridSimulation) -> Vec<(String, f64)> {
    sim.nodes()
        .values()
        .filter(|n| n.kind == NodeKind::Substation)
        .map(|n| (n.id.clone(), n.current_load))
        .collect()
}

/// A bare substation carrying `load` MW with no connections.
pub fn substation(id: &str, load: f64) -> GridNode {
    let bp = blueprint(NodeKind::Substation).expect("substation blueprint");
    let mut node = GridNode::from_blueprint(bp, id, id, 0.0, 0.0);
    node.current_load = load;
    node
}
