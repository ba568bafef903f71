//! The owned simulation context tying topology, scenarios, clock and engine together.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::{PlaybackError, ScenarioError};
use crate::grid::{GridNode, NodeId, NodeKind, Topology};
use crate::scenario::{ParamKey, ParamValue, ScenarioRegistry};

use super::cascade::{CascadeReport, DEFAULT_MAX_PASSES};
use super::clock::SimClock;
use super::engine::DispatchEngine;
use super::kpi::GridReport;
use super::rates::Rates;
use super::signals::Jitter;
use super::snapshot::{DEFAULT_HISTORY_WINDOW, DispatchSnapshot, GridMetrics, SnapshotHistory};
use super::summary::GridSummary;

/// Construction parameters for a [`GridSimulation`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    /// Jitter seed.
    pub seed: u64,
    /// Draw jitter from OS entropy instead of `seed`.
    pub entropy: bool,
    /// Simulated hours per tick at 1x.
    pub tick_hours: f64,
    pub speed: f64,
    pub start_hour: f64,
    pub playing: bool,
    pub history_window: usize,
    pub cascade_passes: usize,
    pub rates: Rates,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            entropy: false,
            tick_hours: 0.25,
            speed: 1.0,
            start_hour: 12.0,
            playing: true,
            history_window: DEFAULT_HISTORY_WINDOW,
            cascade_passes: DEFAULT_MAX_PASSES,
            rates: Rates::default(),
        }
    }
}

impl SimSettings {
    fn jitter(&self) -> Jitter {
        if self.entropy {
            Jitter::from_entropy()
        } else {
            Jitter::seeded(self.seed)
        }
    }

    fn clock(&self) -> SimClock {
        let mut clock = SimClock::new(self.start_hour, self.tick_hours);
        clock.set_playing(self.playing);
        if let Err(e) = clock.set_speed(self.speed) {
            warn!(%e, "running at 1x");
        }
        clock
    }
}

/// One independent grid simulation.
///
/// Every structural or scenario mutation recomputes before returning, so
/// the node records, the latest snapshot and the history are never stale.
/// Callers that want a timer drive [`tick`](Self::tick).
///
/// # Examples
///
/// ```
/// use grid_sim::grid::NodeKind;
/// use grid_sim::scenario::ParamKey;
/// use grid_sim::sim::{GridSimulation, SimSettings};
///
/// let mut sim = GridSimulation::new(SimSettings::default());
/// sim.place(NodeKind::Solar, 37.776, -122.418);
/// sim.add_scenario(ParamKey::WxTemp);
/// sim.update_scenario(ParamKey::WxTemp, 95.0).unwrap();
/// sim.tick();
/// assert!(sim.latest().grid_stability <= 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct GridSimulation {
    settings: SimSettings,
    topology: Topology,
    scenarios: ScenarioRegistry,
    clock: SimClock,
    engine: DispatchEngine,
    history: SnapshotHistory,
    latest: DispatchSnapshot,
    last_cascade: CascadeReport,
    /// Sequence number of the next snapshot.
    seq: u64,
}

impl GridSimulation {
    /// Seed topology, no active scenarios, one initial recompute.
    pub fn new(settings: SimSettings) -> Self {
        Self::with_scenarios(settings, ScenarioRegistry::new())
    }

    pub fn with_scenarios(settings: SimSettings, scenarios: ScenarioRegistry) -> Self {
        let engine = DispatchEngine::new(settings.rates.clone(), settings.cascade_passes, settings.jitter());
        let clock = settings.clock();
        let mut sim = Self {
            topology: Topology::seeded(),
            scenarios,
            latest: DispatchSnapshot::empty(clock.hour()),
            clock,
            engine,
            history: SnapshotHistory::new(settings.history_window),
            last_cascade: CascadeReport::default(),
            seq: 0,
            settings,
        };
        sim.recompute();
        sim
    }

    /// Resets the topology to the seed and recomputes. Scenarios are kept.
    pub fn initialize(&mut self) {
        self.topology.initialize();
        self.recompute();
    }

    /// Back to a fresh start: seed topology, no scenarios, clock at the
    /// configured start, empty history, re-seeded jitter.
    pub fn reset(&mut self) {
        self.topology.initialize();
        self.scenarios.clear();
        self.clock = self.settings.clock();
        self.engine.set_jitter(self.settings.jitter());
        self.history.clear();
        self.seq = 0;
        info!(hour = self.clock.hour(), "simulation reset");
        self.recompute();
    }

    /// Advances the clock (if playing) and recomputes.
    ///
    /// The snapshot records the simulated hours the tick covered:
    /// `tick_hours × speed` while playing, zero while paused.
    pub fn tick(&mut self) -> &DispatchSnapshot {
        let elapsed = if self.clock.is_playing() {
            self.clock.tick_hours() * self.clock.speed()
        } else {
            0.0
        };
        self.clock.advance();
        self.publish(elapsed);
        &self.latest
    }

    /// Runs `n` ticks.
    pub fn run(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Recomputes at the current hour without advancing the clock.
    pub fn recompute(&mut self) {
        self.publish(0.0);
    }

    fn publish(&mut self, elapsed_hours: f64) {
        let mut out = self
            .engine
            .compute(self.topology.nodes(), &self.scenarios, self.clock.hour(), self.seq);
        out.snapshot.elapsed_hours = elapsed_hours;
        self.seq += 1;
        self.topology.commit(out.nodes);
        self.history.push(out.snapshot.clone());
        self.latest = out.snapshot;
        self.last_cascade = out.cascade;
    }

    // --- structure ---

    /// Places a node and recomputes. See [`Topology::place`].
    pub fn place(&mut self, kind: NodeKind, lat: f64, lng: f64) -> Option<NodeId> {
        let id = self.topology.place(kind, lat, lng)?;
        self.recompute();
        Some(id)
    }

    /// Places a node by palette id. Unknown ids are a no-op.
    pub fn place_by_type(&mut self, kind: &str, lat: f64, lng: f64) -> Option<NodeId> {
        let kind = kind.parse::<NodeKind>().ok()?;
        self.place(kind, lat, lng)
    }

    /// Removes a node and recomputes. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.topology.remove(id);
        if removed {
            self.recompute();
        }
        removed
    }

    /// Returns an offline node to service and recomputes.
    pub fn recover(&mut self, id: &str) -> bool {
        let found = self.topology.recover(id);
        if found {
            self.recompute();
        }
        found
    }

    // --- scenarios ---

    pub fn add_scenario(&mut self, key: ParamKey) -> bool {
        let added = self.scenarios.add(key);
        if added {
            self.recompute();
        }
        added
    }

    pub fn remove_scenario(&mut self, key: ParamKey) -> bool {
        let removed = self.scenarios.remove(key);
        if removed {
            self.recompute();
        }
        removed
    }

    /// Updates an active scenario value and recomputes.
    ///
    /// # Errors
    ///
    /// Propagates [`ScenarioError`] from the registry; a rejected update
    /// changes nothing and does not recompute.
    pub fn update_scenario(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Result<(), ScenarioError> {
        self.scenarios.update(key, value)?;
        self.recompute();
        Ok(())
    }

    // --- playback ---

    /// Jumps the clock to `hour` and recomputes.
    pub fn set_hour(&mut self, hour: f64) {
        self.clock.set_hour(hour);
        self.recompute();
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.clock.set_playing(playing);
    }

    /// # Errors
    ///
    /// [`PlaybackError::UnsupportedSpeed`] unless `speed` is 0.5, 1, 2 or 4.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), PlaybackError> {
        self.clock.set_speed(speed)
    }

    pub fn step_speed(&mut self, direction: i32) {
        self.clock.step_speed(direction);
    }

    // --- read surfaces ---

    pub fn nodes(&self) -> &BTreeMap<NodeId, GridNode> {
        self.topology.nodes()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn scenarios(&self) -> &ScenarioRegistry {
        &self.scenarios
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn latest(&self) -> &DispatchSnapshot {
        &self.latest
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// Cascade outcome of the most recent recompute.
    pub fn last_cascade(&self) -> &CascadeReport {
        &self.last_cascade
    }

    pub fn metrics(&self) -> GridMetrics {
        GridMetrics::from(&self.latest)
    }

    pub fn summary(&self) -> GridSummary {
        GridSummary::build(self.topology.nodes(), &self.latest, &self.scenarios)
    }

    pub fn report(&self) -> GridReport {
        GridReport::from_history(self.topology.nodes(), self.history.iter())
    }
}
