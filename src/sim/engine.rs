//! The per-tick dispatch computation.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::grid::{GridNode, NodeId, NodeKind};
use crate::scenario::{ParamKey, ScenarioRegistry, interconnect_target};

use super::cascade::{self, CascadeReport, DEFAULT_MAX_PASSES};
use super::rates::Rates;
use super::signals::{DATACENTER_JITTER, DayProfile, FREQUENCY_JITTER, Jitter};
use super::snapshot::DispatchSnapshot;

/// Nominal grid frequency (Hz).
pub const NOMINAL_HZ: f64 = 60.0;
/// Temperature above which substation demand starts to climb (°F).
const HEATWAVE_THRESHOLD_F: f64 = 85.0;
/// Fractional demand increase per °F above the threshold.
const HEATWAVE_SLOPE: f64 = 0.02;
/// Maximum stability points lost to a generation deficit.
const DEFICIT_PENALTY: f64 = 30.0;
/// Interconnect used when `dc_interconnect_pt` is not active.
const DEFAULT_INTERCONNECT: &str = "Sub D";

/// Scenario-derived inputs to the per-kind formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifiers {
    /// Multiplier from `city_growth` (percent).
    pub growth: f64,
    /// Multiplier from `wx_temp` (°F).
    pub heatwave: f64,
    /// Extra data-centre demand from `dc_load` (MW) and the substation it is pinned to.
    pub dc_load: Option<(f64, &'static str)>,
    /// `plant_outage` forces thermal plants offline.
    pub plant_outage: bool,
}

impl Modifiers {
    /// Reads the active scenario values, falling back to neutral defaults.
    pub fn from_scenarios(scenarios: &ScenarioRegistry) -> Self {
        let growth = 1.0 + scenarios.float_or(ParamKey::CityGrowth, 0.0) / 100.0;
        let temp = scenarios.float_or(ParamKey::WxTemp, 72.0);
        let heatwave = 1.0 + HEATWAVE_SLOPE * (temp - HEATWAVE_THRESHOLD_F).max(0.0);

        let dc_load = scenarios.value_of(ParamKey::DcLoad).and_then(|v| v.as_f64()).map(|mw| {
            let point = scenarios.choice_or(ParamKey::DcInterconnectPt, DEFAULT_INTERCONNECT);
            let target = interconnect_target(point).unwrap_or("sub_west");
            (mw.max(0.0), target)
        });

        Self {
            growth,
            heatwave,
            dc_load,
            plant_outage: scenarios.bool_or(ParamKey::PlantOutage, false),
        }
    }
}

/// Everything one tick produces.
#[derive(Debug, Clone)]
pub struct TickOutput {
    /// Freshly computed node records, ready to be committed.
    pub nodes: BTreeMap<NodeId, GridNode>,
    pub snapshot: DispatchSnapshot,
    pub cascade: CascadeReport,
}

/// Computes node runtime fields and system metrics for one tick.
///
/// The engine never mutates the caller's nodes: it clones them, computes
/// into the copy, and hands the copy back in [`TickOutput`] so the caller
/// can swap it in atomically.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    rates: Rates,
    max_passes: usize,
    jitter: Jitter,
}

impl DispatchEngine {
    pub fn new(rates: Rates, max_passes: usize, jitter: Jitter) -> Self {
        Self {
            rates,
            max_passes,
            jitter,
        }
    }

    /// Engine with default rates, the default pass bound and no jitter.
    pub fn deterministic() -> Self {
        Self::new(Rates::default(), DEFAULT_MAX_PASSES, Jitter::Off)
    }

    pub fn rates(&self) -> &Rates {
        &self.rates
    }

    /// Replaces the jitter source, e.g. to re-seed on reset.
    pub fn set_jitter(&mut self, jitter: Jitter) {
        self.jitter = jitter;
    }

    /// Runs one dispatch computation at `hour`.
    ///
    /// # Arguments
    ///
    /// * `nodes` - Current node records (not modified)
    /// * `scenarios` - Active scenario overrides
    /// * `hour` - Simulated hour of day
    /// * `tick` - Tick counter stamped on the snapshot
    pub fn compute(
        &mut self,
        nodes: &BTreeMap<NodeId, GridNode>,
        scenarios: &ScenarioRegistry,
        hour: f64,
        tick: u64,
    ) -> TickOutput {
        let mut next = nodes.clone();
        let profile = DayProfile::at(hour, &mut self.jitter);
        let mods = Modifiers::from_scenarios(scenarios);

        // 1. Scenario-forced outages
        if mods.plant_outage {
            for node in next.values_mut() {
                if node.kind == NodeKind::Thermal && !node.is_offline() {
                    node.force_offline();
                    warn!(node = %node.id, "plant forced offline by scenario");
                }
            }
        }

        // 2. Per-kind load and generation
        for node in next.values_mut() {
            if node.is_offline() {
                node.current_load = 0.0;
                node.generation = 0.0;
                continue;
            }
            let (load, generation) = self.dispatch_node(node, &profile, &mods);
            node.current_load = load.max(0.0);
            node.generation = generation.max(0.0);
        }

        // 3. Injected data-centre load, pinned to a live substation if possible
        let mut flat_demand = 0.0;
        if let Some((mw, target)) = mods.dc_load {
            match next.get_mut(target) {
                Some(sub) if sub.kind == NodeKind::Substation && !sub.is_offline() => {
                    sub.current_load += mw;
                }
                _ => flat_demand += mw,
            }
        }

        // 4. Cascade, then re-derive status so redistributed load shows
        let cascade = cascade::relax(&mut next, self.max_passes);
        for node in next.values_mut() {
            node.refresh_status();
        }

        // 5. Aggregates
        let snapshot = self.aggregate(&next, &cascade, flat_demand, hour, tick);
        debug!(
            tick,
            hour = format_args!("{hour:.2}"),
            demand_mw = format_args!("{:.1}", snapshot.total_demand),
            capacity_mw = format_args!("{:.1}", snapshot.total_capacity),
            stability = format_args!("{:.1}", snapshot.grid_stability),
            "dispatch computed"
        );

        TickOutput {
            nodes: next,
            snapshot,
            cascade,
        }
    }

    /// `(load, generation)` for an in-service node.
    fn dispatch_node(&mut self, node: &GridNode, p: &DayProfile, m: &Modifiers) -> (f64, f64) {
        let cap = node.capacity;
        let base = node.base_load;
        match node.kind {
            NodeKind::Thermal => (0.0, cap * (0.7 + 0.3 * p.demand)),
            NodeKind::Hydro => (0.0, cap * (0.6 + 0.3 * p.demand)),
            NodeKind::Nuclear => (0.0, cap * 0.92),
            NodeKind::Wind => (0.0, cap * p.wind),
            NodeKind::Solar => (0.0, cap * p.solar),
            NodeKind::BatteryStorage => {
                let rate = if p.is_peak() { 0.8 } else { 0.1 };
                (0.0, cap * rate)
            }
            NodeKind::Substation => (base * m.growth * m.heatwave * p.demand, 0.0),
            NodeKind::DataCenter => {
                let burst = 1.0 + self.jitter.uniform(DATACENTER_JITTER);
                (base * m.heatwave * burst, 0.0)
            }
            NodeKind::EvHub => (base * m.growth * p.ev, 0.0),
            NodeKind::Hospital => (base * m.growth * (0.85 + 0.15 * p.demand), 0.0),
            NodeKind::Stadium => {
                let load = if (18.0..=22.0).contains(&p.hour) {
                    base * m.growth
                } else {
                    base * 0.1
                };
                (load, 0.0)
            }
            NodeKind::Microgrid => (base * m.growth * p.demand, cap * 0.5 * p.solar),
        }
    }

    fn aggregate(
        &mut self,
        nodes: &BTreeMap<NodeId, GridNode>,
        cascade: &CascadeReport,
        flat_demand: f64,
        hour: f64,
        tick: u64,
    ) -> DispatchSnapshot {
        let mut generation_by_source: BTreeMap<NodeKind, f64> = BTreeMap::new();
        let mut demand_by_category: BTreeMap<NodeKind, f64> = BTreeMap::new();
        let mut offline_nodes = 0;

        for node in nodes.values() {
            if node.is_offline() {
                offline_nodes += 1;
                continue;
            }
            if node.kind.is_source() {
                *generation_by_source.entry(node.kind).or_default() += node.generation;
            }
            if !node.kind.is_source() || node.kind == NodeKind::Microgrid {
                *demand_by_category.entry(node.kind).or_default() += node.current_load;
            }
        }
        if flat_demand > 0.0 {
            *demand_by_category.entry(NodeKind::DataCenter).or_default() += flat_demand;
        }

        let total_demand: f64 = demand_by_category.values().sum();
        let total_capacity: f64 = generation_by_source.values().sum();
        let net_headroom = total_capacity - total_demand;
        let deficit = (-net_headroom).max(0.0);

        let total_nodes = nodes.len();
        let grid_stability = stability(total_nodes, offline_nodes, total_demand, deficit);

        let frequency_hz =
            NOMINAL_HZ - 2.0 * deficit / total_capacity.max(1.0) + self.jitter.uniform(FREQUENCY_JITTER);

        let carbon_intensity = self.rates.emissions.weighted_average(&generation_by_source);
        let cost_per_hr = generation_by_source
            .iter()
            .filter_map(|(kind, mw)| self.rates.costs.get(*kind).map(|rate| rate * mw))
            .sum::<f64>()
            + self.rates.demand_surcharge * total_demand;

        DispatchSnapshot {
            tick,
            hour,
            elapsed_hours: 0.0,
            total_demand,
            total_capacity,
            net_headroom,
            grid_stability,
            carbon_intensity,
            cost_per_hr,
            frequency_hz,
            generation_by_source,
            demand_by_category,
            total_nodes,
            offline_nodes,
            tripped: cascade.tripped().map(str::to_string).collect(),
        }
    }
}

/// Stability score in `[0, 100]`.
///
/// An empty grid scores 100. Otherwise the score is the in-service share of
/// nodes, less up to [`DEFICIT_PENALTY`] points for unmet demand.
pub fn stability(total_nodes: usize, offline_nodes: usize, total_demand: f64, deficit: f64) -> f64 {
    if total_nodes == 0 {
        return 100.0;
    }
    let mut score = (100.0 - offline_nodes as f64 / total_nodes as f64 * 100.0).max(0.0);
    if deficit > 0.0 && total_demand > 0.0 {
        score -= DEFICIT_PENALTY * (deficit / total_demand).min(1.0);
    }
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Topology, blueprint};
    use crate::sim::signals;

    fn run(topo: &Topology, scenarios: &ScenarioRegistry, hour: f64) -> TickOutput {
        DispatchEngine::deterministic().compute(topo.nodes(), scenarios, hour, 1)
    }

    #[test]
    fn baseline_substation_load_follows_demand_curve() {
        let topo = Topology::seeded();
        let out = run(&topo, &ScenarioRegistry::new(), 14.0);
        let expected = 120.0 * signals::demand_curve(14.0);
        assert!((out.nodes["sub_north"].current_load - expected).abs() < 1e-9);
        assert_eq!(out.nodes["sub_north"].generation, 0.0);
    }

    #[test]
    fn input_nodes_are_untouched() {
        let topo = Topology::seeded();
        let before = topo.clone();
        let _ = run(&topo, &ScenarioRegistry::new(), 14.0);
        assert_eq!(before, topo);
    }

    #[test]
    fn heatwave_raises_substation_load() {
        let topo = Topology::seeded();
        let mut hot = ScenarioRegistry::new();
        hot.add(ParamKey::WxTemp);
        hot.update(ParamKey::WxTemp, 95.0).unwrap();
        let mild = run(&topo, &ScenarioRegistry::new(), 12.0);
        let warm = run(&topo, &hot, 12.0);
        let ratio = warm.nodes["sub_east"].current_load / mild.nodes["sub_east"].current_load;
        assert!((ratio - 1.2).abs() < 1e-9);
    }

    #[test]
    fn modifiers_default_to_neutral() {
        let m = Modifiers::from_scenarios(&ScenarioRegistry::new());
        assert_eq!(m.growth, 1.0);
        assert_eq!(m.heatwave, 1.0);
        assert_eq!(m.dc_load, None);
        assert!(!m.plant_outage);
    }

    #[test]
    fn dc_load_pins_to_selected_substation() {
        let topo = Topology::seeded();
        let mut s = ScenarioRegistry::new();
        s.add(ParamKey::DcLoad);
        s.update(ParamKey::DcLoad, 50_i64).unwrap();
        s.add(ParamKey::DcInterconnectPt);
        s.update(ParamKey::DcInterconnectPt, "Sub B").unwrap();
        let base = run(&topo, &ScenarioRegistry::new(), 3.0);
        let out = run(&topo, &s, 3.0);
        let diff = out.nodes["sub_south"].current_load - base.nodes["sub_south"].current_load;
        assert!((diff - 50.0).abs() < 1e-9);
        assert!((out.snapshot.total_demand - base.snapshot.total_demand - 50.0).abs() < 1e-9);
    }

    #[test]
    fn dc_load_without_target_is_flat_demand() {
        let mut topo = Topology::seeded();
        topo.remove("sub_west");
        let mut s = ScenarioRegistry::new();
        s.add(ParamKey::DcLoad);
        s.update(ParamKey::DcLoad, 100_i64).unwrap();
        let out = run(&topo, &s, 3.0);
        assert_eq!(out.snapshot.demand_by_category[&NodeKind::DataCenter], 100.0);
    }

    #[test]
    fn overload_trips_target_and_conserves_load() {
        let topo = Topology::seeded();
        let mut s = ScenarioRegistry::new();
        s.add(ParamKey::DcLoad);
        s.update(ParamKey::DcLoad, 420_i64).unwrap();
        let out = run(&topo, &s, 3.0);

        assert!(out.nodes["sub_west"].is_offline());
        let trip = &out.cascade.trips[0];
        assert_eq!(trip.node, "sub_west");
        let moved: f64 = trip.shares.iter().map(|(_, mw)| mw).sum();
        assert!((moved - trip.load).abs() < 1e-9);
        // 492 MW on a 250 MW ring: every substation goes down in turn.
        assert_eq!(out.snapshot.tripped.first().map(String::as_str), Some("sub_west"));
        assert_eq!(out.snapshot.tripped.len(), 4);
        assert!(out.cascade.dropped_load() > 0.0);
    }

    #[test]
    fn plant_outage_takes_thermal_offline() {
        let topo = Topology::seeded();
        let mut s = ScenarioRegistry::new();
        s.add(ParamKey::PlantOutage);
        let out = run(&topo, &s, 12.0);
        assert!(out.nodes["plant_1"].is_offline());
        assert_eq!(out.snapshot.total_capacity, 0.0);
        assert!(out.snapshot.is_deficit());
        // one of five nodes out, plus the full deficit penalty
        assert!((out.snapshot.grid_stability - 50.0).abs() < 1e-9);
    }

    #[test]
    fn solar_tracks_half_sine() {
        let mut topo = Topology::seeded();
        let id = topo.place(NodeKind::Solar, 37.78, -122.41).unwrap();
        let noon = run(&topo, &ScenarioRegistry::new(), 12.0);
        let cap = blueprint(NodeKind::Solar).unwrap().capacity;
        assert!((noon.nodes[&id].generation - cap * signals::solar_factor(12.0)).abs() < 1e-9);
        let night = run(&topo, &ScenarioRegistry::new(), 2.0);
        assert_eq!(night.nodes[&id].generation, 0.0);
    }

    #[test]
    fn stadium_only_draws_full_load_in_event_window() {
        let mut topo = Topology::seeded();
        let id = topo.place(NodeKind::Stadium, 37.78, -122.41).unwrap();
        let evening = run(&topo, &ScenarioRegistry::new(), 19.0);
        let morning = run(&topo, &ScenarioRegistry::new(), 9.0);
        assert_eq!(evening.nodes[&id].current_load, 100.0);
        assert_eq!(morning.nodes[&id].current_load, 10.0);
    }

    #[test]
    fn empty_grid_is_fully_stable() {
        let out = run(&Topology::empty(), &ScenarioRegistry::new(), 12.0);
        assert_eq!(out.snapshot.grid_stability, 100.0);
        assert_eq!(out.snapshot.carbon_intensity, 0.0);
        assert_eq!(out.snapshot.frequency_hz, NOMINAL_HZ);
        assert!(out.snapshot.cost_per_hr.is_finite());
    }

    #[test]
    fn carbon_of_gas_only_grid_is_gas_rate() {
        let out = run(&Topology::seeded(), &ScenarioRegistry::new(), 12.0);
        assert!((out.snapshot.carbon_intensity - 450.0).abs() < 1e-9);
    }

    #[test]
    fn stability_bounds() {
        assert_eq!(stability(0, 0, 0.0, 0.0), 100.0);
        assert_eq!(stability(4, 4, 100.0, 100.0), 0.0);
        assert_eq!(stability(4, 0, 100.0, 50.0), 85.0);
        assert_eq!(stability(4, 0, 100.0, 1000.0), 70.0);
    }

    #[test]
    fn seeded_engines_agree() {
        let topo = Topology::seeded();
        let s = ScenarioRegistry::new();
        let mut a = DispatchEngine::new(Rates::default(), 5, Jitter::seeded(9));
        let mut b = DispatchEngine::new(Rates::default(), 5, Jitter::seeded(9));
        for tick in 0..4 {
            let x = a.compute(topo.nodes(), &s, 12.0, tick);
            let y = b.compute(topo.nodes(), &s, 12.0, tick);
            assert_eq!(x.snapshot, y.snapshot);
        }
    }
}
