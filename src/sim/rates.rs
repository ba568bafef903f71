//! Per-source emission and cost rate tables.
//!
//! These are simulation flavour constants, not physical ground truth. The
//! `[rates]` section of a scenario file replaces either table wholesale.

use serde::{Deserialize, Serialize};

use crate::grid::NodeKind;

/// One value per generating source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTable {
    pub thermal: f64,
    pub nuclear: f64,
    pub hydro: f64,
    pub wind: f64,
    pub solar: f64,
    pub battery: f64,
    pub microgrid: f64,
}

impl RateTable {
    /// Emission rates in g CO₂/kWh.
    pub const EMISSIONS: Self = Self {
        thermal: 450.0,
        nuclear: 12.0,
        hydro: 24.0,
        wind: 11.0,
        solar: 45.0,
        battery: 20.0,
        microgrid: 30.0,
    };

    /// Cost rates in $/MWh.
    pub const COSTS: Self = Self {
        thermal: 65.0,
        nuclear: 30.0,
        hydro: 20.0,
        wind: 25.0,
        solar: 22.0,
        battery: 55.0,
        microgrid: 40.0,
    };

    /// Rate for `kind`; load-only kinds have no rate.
    pub fn get(&self, kind: NodeKind) -> Option<f64> {
        match kind {
            NodeKind::Thermal => Some(self.thermal),
            NodeKind::Nuclear => Some(self.nuclear),
            NodeKind::Hydro => Some(self.hydro),
            NodeKind::Wind => Some(self.wind),
            NodeKind::Solar => Some(self.solar),
            NodeKind::BatteryStorage => Some(self.battery),
            NodeKind::Microgrid => Some(self.microgrid),
            NodeKind::Substation
            | NodeKind::DataCenter
            | NodeKind::EvHub
            | NodeKind::Hospital
            | NodeKind::Stadium => None,
        }
    }

    /// `(name, value)` pairs, used for validation messages.
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("thermal", self.thermal),
            ("nuclear", self.nuclear),
            ("hydro", self.hydro),
            ("wind", self.wind),
            ("solar", self.solar),
            ("battery", self.battery),
            ("microgrid", self.microgrid),
        ]
    }

    /// Generation-weighted average over `(kind, MW)` pairs; `0.0` without generation.
    pub fn weighted_average<'a>(&self, generation: impl IntoIterator<Item = (&'a NodeKind, &'a f64)>) -> f64 {
        let mut total = 0.0;
        let mut weighted = 0.0;
        for (kind, mw) in generation {
            if let Some(rate) = self.get(*kind) {
                total += mw;
                weighted += mw * rate;
            }
        }
        if total > 0.0 { weighted / total } else { 0.0 }
    }
}

/// Emission and cost tables plus the flat demand surcharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rates {
    pub emissions: RateTable,
    pub costs: RateTable,
    /// $/MWh charged on every MW of demand.
    pub demand_surcharge: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            emissions: RateTable::EMISSIONS,
            costs: RateTable::COSTS,
            demand_surcharge: 12.0,
        }
    }
}
