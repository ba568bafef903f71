//! City power-grid dispatch simulator.
//!
//! A topology of grid assets is re-dispatched every tick from time-of-day
//! curves and operator scenarios; overloaded substations trip and shed load
//! to their neighbours, and each tick yields one [`sim::DispatchSnapshot`].

#[cfg(feature = "api")]
pub mod api;
/// Scenario file loading, presets and validation.
pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod scenario;
/// Dispatch engine, cascade, clock and the owned simulation context.
pub mod sim;
#[cfg(feature = "tui")]
pub mod tui;
