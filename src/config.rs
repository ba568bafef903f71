//! TOML-based scenario configuration and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::scenario::{ParamKey, ParamValue, ScenarioRegistry};
use crate::sim::clock::SPEEDS;
use crate::sim::{GridSimulation, Rates, SimSettings};

/// Top-level scenario configuration parsed from TOML.
///
/// All sections are optional and default to the baseline scenario. Load
/// from TOML with [`ScenarioConfig::from_toml_file`] or pick a built-in
/// preset with [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Timing, seeding and engine bounds.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Emission and cost rate tables.
    #[serde(default)]
    pub rates: Rates,
    /// Scenario parameters to activate, keyed by parameter id.
    #[serde(default)]
    pub filters: BTreeMap<String, toml::Value>,
}

/// Timing, seeding and engine bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Jitter seed.
    pub seed: u64,
    /// Seed jitter from OS entropy, ignoring `seed`.
    pub entropy: bool,
    /// Ticks to run in batch mode (must be > 0).
    pub ticks: usize,
    /// Simulated hours per tick at 1x, in (0, 24].
    pub tick_hours: f64,
    /// Playback multiplier: 0.5, 1, 2 or 4.
    pub speed: f64,
    /// Hour of day at start, in [0, 24).
    pub start_hour: f64,
    pub playing: bool,
    /// Snapshots retained (must be > 0).
    pub history_window: usize,
    /// Cascade pass bound (must be > 0).
    pub cascade_passes: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let s = SimSettings::default();
        Self {
            seed: s.seed,
            entropy: s.entropy,
            ticks: 96,
            tick_hours: s.tick_hours,
            speed: s.speed,
            start_hour: s.start_hour,
            playing: s.playing,
            history_window: s.history_window,
            cascade_passes: s.cascade_passes,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.tick_hours"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// The seed grid at noon with no scenarios.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Hot afternoon in a growing city.
    pub fn heatwave() -> Self {
        Self::default()
            .with_filter(ParamKey::WxTemp, toml::Value::Float(105.0))
            .with_filter(ParamKey::CityGrowth, toml::Value::Float(4.0))
    }

    /// A 420 MW data centre landing on the south substation.
    pub fn datacenter_boom() -> Self {
        Self::default()
            .with_filter(ParamKey::DcLoad, toml::Value::Integer(420))
            .with_filter(ParamKey::DcInterconnectPt, toml::Value::String("Sub B".into()))
    }

    /// Starts at 17:00 on a warm day and runs through the evening peak.
    pub fn evening_peak() -> Self {
        let mut cfg = Self::default()
            .with_filter(ParamKey::CityGrowth, toml::Value::Float(3.0))
            .with_filter(ParamKey::WxTemp, toml::Value::Float(88.0));
        cfg.simulation.start_hour = 17.0;
        cfg
    }

    fn with_filter(mut self, key: ParamKey, value: toml::Value) -> Self {
        self.filters.insert(key.id().to_string(), value);
        self
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "heatwave", "datacenter_boom", "evening_peak"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "heatwave" => Ok(Self::heatwave()),
            "datacenter_boom" => Ok(Self::datacenter_boom()),
            "evening_peak" => Ok(Self::evening_peak()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.ticks == 0 {
            errors.push(ConfigError::new("simulation.ticks", "must be > 0"));
        }
        if !(s.tick_hours > 0.0 && s.tick_hours <= 24.0) {
            errors.push(ConfigError::new("simulation.tick_hours", "must be in (0, 24]"));
        }
        if !SPEEDS.contains(&s.speed) {
            errors.push(ConfigError::new(
                "simulation.speed",
                format!("must be one of 0.5, 1, 2, 4, got {}", s.speed),
            ));
        }
        if !(0.0..24.0).contains(&s.start_hour) {
            errors.push(ConfigError::new("simulation.start_hour", "must be in [0, 24)"));
        }
        if s.history_window == 0 {
            errors.push(ConfigError::new("simulation.history_window", "must be > 0"));
        }
        if s.cascade_passes == 0 {
            errors.push(ConfigError::new("simulation.cascade_passes", "must be > 0"));
        }

        for (table, rates) in [("emissions", &self.rates.emissions), ("costs", &self.rates.costs)] {
            for (source, value) in rates.entries() {
                if value.is_nan() || value < 0.0 {
                    errors.push(ConfigError::new(format!("rates.{table}.{source}"), "must be >= 0"));
                }
            }
        }
        if self.rates.demand_surcharge.is_nan() || self.rates.demand_surcharge < 0.0 {
            errors.push(ConfigError::new("rates.demand_surcharge", "must be >= 0"));
        }

        for (id, value) in &self.filters {
            if let Err(e) = apply_filter(&mut ScenarioRegistry::new(), id, value) {
                errors.push(e);
            }
        }

        errors
    }

    /// Engine and clock settings from the `[simulation]` and `[rates]` sections.
    pub fn to_settings(&self) -> SimSettings {
        let s = &self.simulation;
        SimSettings {
            seed: s.seed,
            entropy: s.entropy,
            tick_hours: s.tick_hours,
            speed: s.speed,
            start_hour: s.start_hour,
            playing: s.playing,
            history_window: s.history_window,
            cascade_passes: s.cascade_passes,
            rates: self.rates.clone(),
        }
    }

    /// Activates every `[filters]` entry on a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns the first filter that names an unknown parameter or carries
    /// a value outside its domain.
    pub fn scenarios(&self) -> Result<ScenarioRegistry, ConfigError> {
        let mut reg = ScenarioRegistry::new();
        for (id, value) in &self.filters {
            apply_filter(&mut reg, id, value)?;
        }
        Ok(reg)
    }

    /// Builds a ready-to-run simulation.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid filter. Run [`validate`](Self::validate)
    /// first for a complete list of problems.
    pub fn build(&self) -> Result<GridSimulation, ConfigError> {
        Ok(GridSimulation::with_scenarios(self.to_settings(), self.scenarios()?))
    }
}

fn apply_filter(reg: &mut ScenarioRegistry, id: &str, value: &toml::Value) -> Result<(), ConfigError> {
    let field = format!("filters.{id}");
    let key: ParamKey = id.parse().map_err(|e| ConfigError::new(&field, format!("{e}")))?;
    let value = match value {
        toml::Value::Boolean(b) => ParamValue::Bool(*b),
        toml::Value::Integer(i) => ParamValue::Int(*i),
        toml::Value::Float(f) => ParamValue::Float(*f),
        toml::Value::String(s) => ParamValue::Choice(s.clone()),
        other => {
            return Err(ConfigError::new(
                field,
                format!("unsupported value type {}", other.type_str()),
            ));
        }
    };
    reg.add(key);
    reg.update(key, value).map_err(|e| ConfigError::new(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
seed = 7
ticks = 48
tick_hours = 0.5
speed = 2.0
start_hour = 6.0
history_window = 48
cascade_passes = 3

[rates]
demand_surcharge = 15.0

[rates.emissions]
thermal = 400.0
nuclear = 12.0
hydro = 24.0
wind = 11.0
solar = 45.0
battery = 20.0
microgrid = 30.0

[filters]
wx_temp = 95
dc_load = 300
dc_interconnect_pt = "Sub A"
plant_outage = false
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert_eq!(cfg.simulation.ticks, 48);
        assert_eq!(cfg.rates.emissions.thermal, 400.0);

        let reg = cfg.scenarios().unwrap();
        assert_eq!(reg.float_or(ParamKey::WxTemp, 0.0), 95.0);
        assert_eq!(reg.choice_or(ParamKey::DcInterconnectPt, ""), "Sub A");
        assert!(!reg.bool_or(ParamKey::PlantOutage, true));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
ticks = 24
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_timing() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.ticks = 0;
        cfg.simulation.tick_hours = 0.0;
        cfg.simulation.speed = 3.0;
        cfg.simulation.start_hour = 24.0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        for f in [
            "simulation.ticks",
            "simulation.tick_hours",
            "simulation.speed",
            "simulation.start_hour",
        ] {
            assert!(fields.iter().any(|x| x == f), "missing {f}: {fields:?}");
        }
    }

    #[test]
    fn validation_catches_negative_rate() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.rates.costs.wind = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "rates.costs.wind"));
    }

    #[test]
    fn validation_catches_bad_filters() {
        let toml = r#"
[filters]
warp_drive = true
wx_temp = 500.0
dc_load = "lots"
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["filters.dc_load", "filters.warp_drive", "filters.wx_temp"]
        );
        assert!(cfg.build().is_err());
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn heatwave_raises_temperature() {
        let reg = ScenarioConfig::heatwave().scenarios().unwrap();
        assert_eq!(reg.float_or(ParamKey::WxTemp, 72.0), 105.0);
        assert_eq!(reg.float_or(ParamKey::CityGrowth, 0.0), 4.0);
    }

    #[test]
    fn evening_peak_starts_at_five() {
        let sim = ScenarioConfig::evening_peak().build().unwrap();
        assert_eq!(sim.clock().hour(), 17.0);
        assert_eq!(sim.scenarios().len(), 2);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.seed, 99);
        assert_eq!(cfg.simulation.ticks, 96);
        assert_eq!(cfg.simulation.tick_hours, 0.25);
        assert_eq!(cfg.rates, Rates::default());
        assert!(cfg.filters.is_empty());
    }
}
