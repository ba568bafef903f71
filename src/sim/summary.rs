//! Serializable state summary for narrating collaborators.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::grid::{GridNode, NodeId, NodeKind, NodeStatus};
use crate::scenario::ScenarioRegistry;

use super::snapshot::{DispatchSnapshot, GridMetrics};

/// A node whose status is not normal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAlert {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub status: NodeStatus,
    /// `round(load / capacity × 100)`, 0 for capacity-less nodes.
    pub load_pct: i64,
}

/// Compact view of the grid: metrics, active scenarios and alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    pub hour: f64,
    pub metrics: GridMetrics,
    pub active_scenarios: Vec<String>,
    pub alerts: Vec<NodeAlert>,
}

impl GridSummary {
    /// Builds the summary in one pass over the nodes.
    pub fn build(
        nodes: &BTreeMap<NodeId, GridNode>,
        latest: &DispatchSnapshot,
        scenarios: &ScenarioRegistry,
    ) -> Self {
        let alerts = nodes
            .values()
            .filter(|n| n.status != NodeStatus::Normal)
            .map(|n| NodeAlert {
                id: n.id.clone(),
                name: n.name.clone(),
                kind: n.kind,
                status: n.status,
                load_pct: (n.load_ratio() * 100.0).round() as i64,
            })
            .collect();

        Self {
            hour: latest.hour,
            metrics: GridMetrics::from(latest),
            active_scenarios: scenarios.labels().into_iter().map(str::to_string).collect(),
            alerts,
        }
    }

    /// JSON rendering for chat prompts and the REST surface.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails, which plain data cannot do.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
