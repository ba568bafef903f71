//! REST API for grid state and snapshot history.
//!
//! Provides four GET endpoints:
//! - `/state`: headline metrics, grid report, and latest snapshot
//! - `/nodes`: every node with its runtime fields
//! - `/history`: retained snapshots with optional tick range filtering
//! - `/summary`: the compact narration summary

mod handlers;
mod types;

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::grid::{GridNode, NodeId};
use crate::sim::{DispatchSnapshot, GridReport, GridSimulation, GridSummary};

pub use types::{ErrorResponse, HistoryQuery, StateResponse};

/// Immutable application state shared across all request handlers.
///
/// Captured once from a finished simulation and wrapped in `Arc`; no locks
/// are needed since all data is read-only.
pub struct AppState {
    pub nodes: BTreeMap<NodeId, GridNode>,
    /// Retained snapshots, oldest first.
    pub history: Vec<DispatchSnapshot>,
    pub latest: DispatchSnapshot,
    pub summary: GridSummary,
    pub report: GridReport,
}

impl AppState {
    /// Copies every read surface out of `sim`.
    pub fn capture(sim: &GridSimulation) -> Self {
        Self {
            nodes: sim.nodes().clone(),
            history: sim.history().to_vec(),
            latest: sim.latest().clone(),
            summary: sim.summary(),
            report: sim.report(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/nodes", get(handlers::get_nodes))
        .route("/history", get(handlers::get_history))
        .route("/summary", get(handlers::get_summary))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
