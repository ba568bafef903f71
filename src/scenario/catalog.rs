//! Static catalogue of scenario parameters.
//!
//! Every parameter the control surface can offer is a [`ParamKey`] variant;
//! its label, theme, value domain and default live in [`ParamKey::spec`].
//! Only a handful feed the dispatch formulas directly (`city_growth`,
//! `wx_temp`, `dc_load`, `dc_interconnect_pt`, `plant_outage`); the rest are
//! carried for display and for the operator summary.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ScenarioError;

/// Thematic grouping shown in the filter palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Theme {
    Demand,
    Generation,
    Storage,
    #[serde(rename = "Grid Assets")]
    GridAssets,
    #[serde(rename = "DER & EV")]
    DerEv,
    Reliability,
    Policy,
    Markets,
    Environment,
}

/// Value domain of a parameter, including its default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Toggle { default: bool },
    /// Continuous value in `[min, max]`.
    Slider { min: f64, max: f64, step: f64, default: f64 },
    /// Integral value in `[min, max]`.
    Number { min: i64, max: i64, default: i64 },
    Dropdown {
        options: &'static [&'static str],
        default: &'static str,
    },
}

impl ParamKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Toggle { .. } => "boolean",
            Self::Slider { .. } => "numeric",
            Self::Number { .. } => "integer",
            Self::Dropdown { .. } => "option",
        }
    }
}

/// A typed scenario value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Float(f64),
    Int(i64),
    Choice(String),
}

impl ParamValue {
    /// Numeric view of the value; `None` for toggles and dropdowns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(_) | Self::Choice(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Choice(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Choice(v.to_string())
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub key: ParamKey,
    pub label: &'static str,
    pub theme: Theme,
    pub kind: ParamKind,
    pub unit: Option<&'static str>,
}

impl ParamSpec {
    /// The catalogue default as a value.
    pub fn default_value(&self) -> ParamValue {
        match self.kind {
            ParamKind::Toggle { default } => ParamValue::Bool(default),
            ParamKind::Slider { default, .. } => ParamValue::Float(default),
            ParamKind::Number { default, .. } => ParamValue::Int(default),
            ParamKind::Dropdown { default, .. } => ParamValue::Choice(default.to_string()),
        }
    }

    /// Checks `value` against this parameter's domain.
    ///
    /// Integers are accepted for sliders (widened to float); nothing else is
    /// coerced. Out-of-range values are rejected, never clamped.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::TypeMismatch`], [`ScenarioError::OutOfRange`]
    /// or [`ScenarioError::InvalidOption`].
    pub fn validate(&self, value: ParamValue) -> Result<ParamValue, ScenarioError> {
        let key = self.key;
        let mismatch = || ScenarioError::TypeMismatch {
            key,
            expected: self.kind.type_name(),
        };
        match (self.kind, value) {
            (ParamKind::Toggle { .. }, v @ ParamValue::Bool(_)) => Ok(v),
            (ParamKind::Slider { min, max, .. }, v) => {
                let x = match v {
                    ParamValue::Float(x) => x,
                    ParamValue::Int(i) => i as f64,
                    _ => return Err(mismatch()),
                };
                if !x.is_finite() || x < min || x > max {
                    return Err(ScenarioError::OutOfRange {
                        key,
                        value: x,
                        min,
                        max,
                    });
                }
                Ok(ParamValue::Float(x))
            }
            (ParamKind::Number { min, max, .. }, ParamValue::Int(i)) => {
                if i < min || i > max {
                    return Err(ScenarioError::OutOfRange {
                        key,
                        value: i as f64,
                        min: min as f64,
                        max: max as f64,
                    });
                }
                Ok(ParamValue::Int(i))
            }
            (ParamKind::Dropdown { options, .. }, ParamValue::Choice(s)) => {
                if options.contains(&s.as_str()) {
                    Ok(ParamValue::Choice(s))
                } else {
                    Err(ScenarioError::InvalidOption { key, value: s })
                }
            }
            _ => Err(mismatch()),
        }
    }
}

/// Closed set of scenario parameter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    DcLoad,
    DcShape,
    DcInterconnectPt,
    CityGrowth,
    ResElectrif,
    HospitalLoad,
    VolatilityIdx,
    FeedTopo,
    Interties,
    ImportLim,
    ResMargin,
    N1Enforce,
    ShedStages,
    PlantOutage,
    GridBatt,
    EvFast,
    ManagedCharge,
    GenBlackstart,
    DcHeatReuse,
    TouActive,
    Scarcity,
    WxTemp,
    WxWind,
}

/// Interconnect options for `dc_interconnect_pt`, mapped to seed substations.
///
/// Only substations are offered. The grid has no feeder nodes, so the
/// `Feeder X`, `Feeder Y` and `Feeder Z` points are deliberately left out,
/// and `Sub D` is added for the west substation. The default is `Sub D`,
/// so data-centre load lands on `sub_west` unless a point is chosen.
pub const INTERCONNECT_POINTS: &[(&str, &str)] = &[
    ("Sub A", "sub_north"),
    ("Sub B", "sub_south"),
    ("Sub C", "sub_east"),
    ("Sub D", "sub_west"),
];

const INTERCONNECT_OPTIONS: &[&str] = &["Sub A", "Sub B", "Sub C", "Sub D"];

impl ParamKey {
    /// Every key, in palette order.
    pub const ALL: [ParamKey; 23] = [
        ParamKey::DcLoad,
        ParamKey::DcShape,
        ParamKey::DcInterconnectPt,
        ParamKey::CityGrowth,
        ParamKey::ResElectrif,
        ParamKey::HospitalLoad,
        ParamKey::VolatilityIdx,
        ParamKey::FeedTopo,
        ParamKey::Interties,
        ParamKey::ImportLim,
        ParamKey::ResMargin,
        ParamKey::N1Enforce,
        ParamKey::ShedStages,
        ParamKey::PlantOutage,
        ParamKey::GridBatt,
        ParamKey::EvFast,
        ParamKey::ManagedCharge,
        ParamKey::GenBlackstart,
        ParamKey::DcHeatReuse,
        ParamKey::TouActive,
        ParamKey::Scarcity,
        ParamKey::WxTemp,
        ParamKey::WxWind,
    ];

    /// Wire id used in config files and summaries.
    pub fn id(self) -> &'static str {
        match self {
            Self::DcLoad => "dc_load",
            Self::DcShape => "dc_shape",
            Self::DcInterconnectPt => "dc_interconnect_pt",
            Self::CityGrowth => "city_growth",
            Self::ResElectrif => "res_electrif",
            Self::HospitalLoad => "hospital_load",
            Self::VolatilityIdx => "volatility_idx",
            Self::FeedTopo => "feed_topo",
            Self::Interties => "interties",
            Self::ImportLim => "import_lim",
            Self::ResMargin => "res_margin",
            Self::N1Enforce => "n1_enforce",
            Self::ShedStages => "shed_stages",
            Self::PlantOutage => "plant_outage",
            Self::GridBatt => "grid_batt",
            Self::EvFast => "ev_fast",
            Self::ManagedCharge => "managed_charge",
            Self::GenBlackstart => "gen_blackstart",
            Self::DcHeatReuse => "dc_heat_reuse",
            Self::TouActive => "tou_active",
            Self::Scarcity => "scarcity",
            Self::WxTemp => "wx_temp",
            Self::WxWind => "wx_wind",
        }
    }

    /// Full catalogue entry for this key.
    #[rustfmt::skip]
    pub fn spec(self) -> ParamSpec {
        use ParamKind::*;
        use Theme::*;
        let (label, theme, kind, unit) = match self {
            Self::DcLoad => ("Data center load", Demand, Number { min: 1, max: 500, default: 250 }, Some("MW")),
            Self::DcShape => ("Data center load shape", Demand, Dropdown { options: &["flat", "diurnal", "bursty", "batch-jobs"], default: "flat" }, None),
            Self::DcInterconnectPt => ("Interconnect point", GridAssets, Dropdown { options: INTERCONNECT_OPTIONS, default: "Sub D" }, None),
            Self::CityGrowth => ("Population growth rate", Demand, Slider { min: -1.0, max: 6.0, step: 0.1, default: 1.5 }, Some("%/yr")),
            Self::ResElectrif => ("Res. electrification", Demand, Slider { min: 0.0, max: 100.0, step: 1.0, default: 20.0 }, Some("%")),
            Self::HospitalLoad => ("Hospital load", Demand, Number { min: 0, max: 300, default: 40 }, Some("MW")),
            Self::VolatilityIdx => ("Demand volatility index", Demand, Slider { min: 0.0, max: 1.0, step: 0.05, default: 0.3 }, None),
            Self::FeedTopo => ("Feeder topology", GridAssets, Dropdown { options: &["Radial", "Loop", "Network"], default: "Radial" }, None),
            Self::Interties => ("Distribution interties", GridAssets, Toggle { default: true }, None),
            Self::ImportLim => ("Import limits", GridAssets, Number { min: 0, max: 10_000, default: 5000 }, Some("MW")),
            Self::ResMargin => ("Reserve margin", Reliability, Slider { min: 0.0, max: 40.0, step: 1.0, default: 15.0 }, Some("%")),
            Self::N1Enforce => ("N-1 enforcement", Reliability, Toggle { default: true }, None),
            Self::ShedStages => ("Load shedding stages", Reliability, Number { min: 1, max: 5, default: 3 }, None),
            Self::PlantOutage => ("Main plant outage", Reliability, Toggle { default: true }, None),
            Self::GridBatt => ("Grid battery capacity", Storage, Number { min: 0, max: 1000, default: 200 }, Some("MW")),
            Self::EvFast => ("EV fast chargers", DerEv, Number { min: 0, max: 1000, default: 120 }, None),
            Self::ManagedCharge => ("Managed charging share", DerEv, Slider { min: 0.0, max: 100.0, step: 1.0, default: 15.0 }, Some("%")),
            Self::GenBlackstart => ("Black-start resources", Generation, Toggle { default: true }, None),
            Self::DcHeatReuse => ("Heat reuse district connection", Policy, Toggle { default: false }, None),
            Self::TouActive => ("Time-of-use pricing", Markets, Toggle { default: true }, None),
            Self::Scarcity => ("Scarcity pricing mult.", Markets, Slider { min: 1.0, max: 10.0, step: 0.5, default: 1.0 }, None),
            Self::WxTemp => ("Ambient temperature", Environment, Slider { min: -20.0, max: 120.0, step: 1.0, default: 72.0 }, Some("°F")),
            Self::WxWind => ("Wind speed", Environment, Slider { min: 0.0, max: 100.0, step: 1.0, default: 5.0 }, Some("mph")),
        };
        ParamSpec { key: self, label, theme, kind, unit }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ParamKey {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| ScenarioError::UnknownParameter(s.to_string()))
    }
}

impl Serialize for ParamKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// Maps a `dc_interconnect_pt` option to the substation id it feeds.
pub fn interconnect_target(option: &str) -> Option<&'static str> {
    INTERCONNECT_POINTS
        .iter()
        .find(|(label, _)| *label == option)
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_parse_back() {
        for key in ParamKey::ALL {
            assert_eq!(key.id().parse::<ParamKey>(), Ok(key));
            assert_eq!(key.spec().key, key);
        }
        let mut ids: Vec<_> = ParamKey::ALL.iter().map(|k| k.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ParamKey::ALL.len());
    }

    #[test]
    fn unknown_id_is_an_error() {
        assert_eq!(
            "flux_capacitor".parse::<ParamKey>(),
            Err(ScenarioError::UnknownParameter("flux_capacitor".into()))
        );
    }

    #[test]
    fn defaults_satisfy_their_own_domain() {
        for key in ParamKey::ALL {
            let spec = key.spec();
            let v = spec.default_value();
            assert_eq!(spec.validate(v.clone()), Ok(v), "default of {key}");
        }
    }

    #[test]
    fn slider_rejects_out_of_range() {
        let spec = ParamKey::WxTemp.spec();
        assert!(spec.validate(ParamValue::Float(95.0)).is_ok());
        assert!(matches!(
            spec.validate(ParamValue::Float(121.0)),
            Err(ScenarioError::OutOfRange { .. })
        ));
        assert!(matches!(
            spec.validate(ParamValue::Float(f64::NAN)),
            Err(ScenarioError::OutOfRange { .. })
        ));
    }

    #[test]
    fn slider_widens_integers() {
        let spec = ParamKey::WxTemp.spec();
        assert_eq!(spec.validate(ParamValue::Int(95)), Ok(ParamValue::Float(95.0)));
    }

    #[test]
    fn number_rejects_floats() {
        let spec = ParamKey::DcLoad.spec();
        assert!(matches!(
            spec.validate(ParamValue::Float(250.5)),
            Err(ScenarioError::TypeMismatch { .. })
        ));
        assert!(matches!(
            spec.validate(ParamValue::Int(501)),
            Err(ScenarioError::OutOfRange { .. })
        ));
    }

    #[test]
    fn dropdown_rejects_unknown_option() {
        let spec = ParamKey::DcInterconnectPt.spec();
        assert!(spec.validate(ParamValue::from("Sub B")).is_ok());
        assert!(matches!(
            spec.validate(ParamValue::from("Feeder Q")),
            Err(ScenarioError::InvalidOption { .. })
        ));
    }

    #[test]
    fn toggle_rejects_numbers() {
        let spec = ParamKey::PlantOutage.spec();
        assert!(matches!(
            spec.validate(ParamValue::Int(1)),
            Err(ScenarioError::TypeMismatch { expected: "boolean", .. })
        ));
    }

    #[test]
    fn interconnect_options_all_resolve() {
        if let ParamKind::Dropdown { options, .. } = ParamKey::DcInterconnectPt.spec().kind {
            for opt in options {
                assert!(interconnect_target(opt).is_some());
            }
        }
        assert_eq!(interconnect_target("Sub D"), Some("sub_west"));
        assert_eq!(interconnect_target("Feeder X"), None);
    }

    #[test]
    fn interconnect_offers_substations_only() {
        let ParamKind::Dropdown { options, default } = ParamKey::DcInterconnectPt.spec().kind else {
            panic!("interconnect point is a dropdown");
        };
        assert_eq!(options, ["Sub A", "Sub B", "Sub C", "Sub D"]);
        assert_eq!(default, "Sub D");
        assert!(options.iter().all(|o| !o.starts_with("Feeder")));
    }
}
