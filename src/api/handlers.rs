//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, HistoryQuery, StateResponse};
use crate::grid::GridNode;
use crate::sim::{DispatchSnapshot, GridMetrics, GridSummary};

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        metrics: GridMetrics::from(&state.latest),
        report: state.report.clone(),
        latest: state.latest.clone(),
    })
}

/// `GET /nodes` → 200 + node array ordered by id
pub async fn get_nodes(State(state): State<Arc<AppState>>) -> Json<Vec<GridNode>> {
    Json(state.nodes.values().cloned().collect())
}

/// Returns retained snapshots, optionally filtered by tick range.
///
/// `GET /history` → 200 + `Vec<DispatchSnapshot>` JSON
/// `GET /history?from=N&to=M` → filtered range (inclusive)
/// `GET /history?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(u64::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let snapshots: Vec<DispatchSnapshot> = state
        .history
        .iter()
        .filter(|s| (from..=to).contains(&s.tick))
        .cloned()
        .collect();

    Ok(Json(snapshots))
}

/// `GET /summary` → 200 + `GridSummary` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<GridSummary> {
    Json(state.summary.clone())
}
