/// Parameter catalogue: keys, domains and defaults.
pub mod catalog;
pub mod registry;

pub use catalog::{ParamKey, ParamKind, ParamSpec, ParamValue, Theme, interconnect_target};
pub use registry::ScenarioRegistry;
