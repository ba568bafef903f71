//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::sim::{DispatchSnapshot, GridMetrics, GridReport};

/// Combined state response: metrics, report, and the latest snapshot.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub metrics: GridMetrics,
    pub report: GridReport,
    pub latest: DispatchSnapshot,
}

/// Optional tick range for the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// First tick (inclusive).
    pub from: Option<u64>,
    /// Last tick (inclusive).
    pub to: Option<u64>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
