/// Bounded cascading-failure relaxation.
pub mod cascade;
/// Simulated time-of-day and playback controls.
pub mod clock;
pub mod engine;
pub mod kpi;
pub mod rates;
/// Daily shaping curves and the jitter source.
pub mod signals;
pub mod simulation;
pub mod snapshot;
pub mod summary;

pub use cascade::{CascadeReport, Trip};
pub use engine::{DispatchEngine, TickOutput};
pub use kpi::GridReport;
pub use rates::{RateTable, Rates};
pub use signals::Jitter;
pub use simulation::{GridSimulation, SimSettings};
pub use snapshot::{DispatchSnapshot, GridMetrics, SnapshotHistory};
pub use summary::{GridSummary, NodeAlert};
