//! TUI application state: the timer-driven simulation and operator toggles.

use std::time::Instant;

use crate::config::ScenarioConfig;
use crate::scenario::{ParamKey, ParamValue};
use crate::sim::{DispatchSnapshot, GridSimulation};

/// Wall-clock interval between ticks (ms). Playback speed scales simulated
/// time per tick, not this interval.
pub const TICK_INTERVAL_MS: u64 = 250;

/// Quick-toggle scenarios bound to keys: parameter and the value it is set to.
const HEATWAVE: (ParamKey, f64) = (ParamKey::WxTemp, 105.0);
const DC_LOAD: (ParamKey, f64) = (ParamKey::DcLoad, 420.0);
const GROWTH: (ParamKey, f64) = (ParamKey::CityGrowth, 4.0);

/// TUI application state.
pub struct App {
    pub sim: GridSimulation,
    /// Scenario the simulation was built from (kept for restart/preset switch).
    scenario: ScenarioConfig,
    pub preset_name: String,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
    /// Last rejected action, shown in the footer.
    pub message: Option<String>,
}

impl App {
    /// Creates a new app from a preset name, falling back to the baseline.
    pub fn new(preset: &str) -> Self {
        let (name, scenario) = match ScenarioConfig::from_preset(preset) {
            Ok(cfg) => (preset, cfg),
            Err(_) => ("baseline", ScenarioConfig::baseline()),
        };
        Self::from_scenario(name, scenario)
    }

    /// Creates a new app from an already loaded scenario.
    pub fn from_scenario(name: &str, scenario: ScenarioConfig) -> Self {
        let (sim, message) = build(&scenario);
        Self {
            sim,
            scenario,
            preset_name: name.to_string(),
            quit: false,
            last_tick: Instant::now(),
            message,
        }
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) {
        self.sim.tick();
    }

    pub fn is_playing(&self) -> bool {
        self.sim.clock().is_playing()
    }

    /// Toggles play/pause; paused time is frozen.
    pub fn toggle_pause(&mut self) {
        let playing = self.is_playing();
        self.sim.set_playing(!playing);
    }

    pub fn speed_up(&mut self) {
        self.sim.step_speed(1);
    }

    pub fn speed_down(&mut self) {
        self.sim.step_speed(-1);
    }

    /// Switches to a different preset, resetting simulation state.
    pub fn switch_preset(&mut self, name: &str) {
        let Ok(scenario) = ScenarioConfig::from_preset(name) else {
            return;
        };
        let (sim, message) = build(&scenario);
        self.sim = sim;
        self.scenario = scenario;
        self.preset_name = name.to_string();
        self.message = message;
    }

    /// Restarts the current scenario from the beginning.
    pub fn restart(&mut self) {
        let (sim, message) = build(&self.scenario);
        self.sim = sim;
        self.message = message;
    }

    pub fn toggle_heatwave(&mut self) {
        self.toggle(HEATWAVE);
    }

    pub fn toggle_dc_load(&mut self) {
        self.toggle(DC_LOAD);
    }

    pub fn toggle_growth(&mut self) {
        self.toggle(GROWTH);
    }

    fn toggle(&mut self, (key, value): (ParamKey, f64)) {
        if self.sim.scenarios().is_active(key) {
            self.sim.remove_scenario(key);
            return;
        }
        self.sim.add_scenario(key);
        let value = match key.spec().kind {
            crate::scenario::ParamKind::Number { .. } => ParamValue::Int(value as i64),
            _ => ParamValue::Float(value),
        };
        self.message = self.sim.update_scenario(key, value).err().map(|e| e.to_string());
    }

    /// Returns the most recent snapshot.
    pub fn latest(&self) -> &DispatchSnapshot {
        self.sim.latest()
    }
}

/// Builds from `scenario`, falling back to an unscenarioed run if a filter is bad.
fn build(scenario: &ScenarioConfig) -> (GridSimulation, Option<String>) {
    match scenario.build() {
        Ok(sim) => (sim, None),
        Err(e) => (GridSimulation::new(scenario.to_settings()), Some(e.to_string())),
    }
}
