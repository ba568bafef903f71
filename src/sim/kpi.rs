//! Post-hoc grid report computed from the snapshot history.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::grid::{GridNode, NodeId, NodeKind};

use super::snapshot::DispatchSnapshot;

/// Reserve margin below which the report flags thin reserves.
const THIN_RESERVE_FRACTION: f64 = 0.1;
/// Gas share of generation above which the report flags fuel concentration.
const GAS_SHARE_LIMIT: f64 = 0.5;
/// Carbon intensity above which the report flags emissions (g/kWh).
const CARBON_LIMIT: f64 = 300.0;

/// Aggregate indicators over a run plus operator observations.
///
/// Computed from the retained snapshots and the final node set, so it is
/// always consistent with what the history and the map show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridReport {
    /// Number of snapshots the report covers.
    pub ticks: usize,
    /// Peak demand (MW).
    pub peak_demand_mw: f64,
    /// Peak generation (MW).
    pub peak_generation_mw: f64,
    /// Lowest stability score seen.
    pub min_stability: f64,
    /// Lowest frequency seen (Hz).
    pub min_frequency_hz: f64,
    /// Mean carbon intensity (g/kWh).
    pub avg_carbon_intensity: f64,
    /// Cost over the window: `cost_per_hr × elapsed_hours`, summed ($).
    /// Recomputes that did not advance the clock cost nothing.
    pub total_cost: f64,
    /// Snapshots with negative headroom.
    pub deficit_ticks: usize,
    /// Nodes offline at the end of the run.
    pub offline_nodes: Vec<NodeId>,
    pub observations: Vec<String>,
}

impl GridReport {
    /// Builds the report.
    ///
    /// # Arguments
    ///
    /// * `nodes` - Final node records
    /// * `history` - Retained snapshots, oldest first
    pub fn from_history<'a>(
        nodes: &BTreeMap<NodeId, GridNode>,
        history: impl IntoIterator<Item = &'a DispatchSnapshot>,
    ) -> Self {
        let mut ticks = 0_usize;
        let mut peak_demand = 0.0_f64;
        let mut peak_generation = 0.0_f64;
        let mut min_stability = f64::INFINITY;
        let mut min_frequency = f64::INFINITY;
        let mut carbon_sum = 0.0;
        let mut total_cost = 0.0;
        let mut deficit_ticks = 0_usize;
        let mut latest = None;

        for s in history {
            ticks += 1;
            peak_demand = peak_demand.max(s.total_demand);
            peak_generation = peak_generation.max(s.total_capacity);
            min_stability = min_stability.min(s.grid_stability);
            min_frequency = min_frequency.min(s.frequency_hz);
            carbon_sum += s.carbon_intensity;
            total_cost += s.cost_per_hr * s.elapsed_hours;
            if s.is_deficit() {
                deficit_ticks += 1;
            }
            latest = Some(s);
        }

        let offline_nodes: Vec<NodeId> = nodes
            .values()
            .filter(|n| n.is_offline())
            .map(|n| n.id.clone())
            .collect();

        let observations = observe(latest, nodes, offline_nodes.len());

        if ticks == 0 {
            min_stability = 100.0;
            min_frequency = 60.0;
        }

        Self {
            ticks,
            peak_demand_mw: peak_demand,
            peak_generation_mw: peak_generation,
            min_stability,
            min_frequency_hz: min_frequency,
            avg_carbon_intensity: if ticks > 0 { carbon_sum / ticks as f64 } else { 0.0 },
            total_cost,
            deficit_ticks,
            offline_nodes,
            observations,
        }
    }
}

fn observe(
    latest: Option<&DispatchSnapshot>,
    nodes: &BTreeMap<NodeId, GridNode>,
    offline: usize,
) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(s) = latest {
        if s.net_headroom < 0.0 {
            out.push(
                "Generation deficit: demand exceeds supply. Add solar, wind or battery capacity."
                    .to_string(),
            );
        } else if s.net_headroom < s.total_capacity * THIN_RESERVE_FRACTION {
            out.push(
                "Reserve margin below 10%. Standby generation or demand response would help at peak."
                    .to_string(),
            );
        } else {
            out.push("Healthy reserve margin; the grid can absorb demand surges.".to_string());
        }

        let gas = s.generation_by_source.get(&NodeKind::Thermal).copied().unwrap_or(0.0);
        if gas / s.total_capacity.max(1.0) > GAS_SHARE_LIMIT {
            out.push("Gas supplies over 50% of generation; more renewables would cut carbon and cost.".to_string());
        }
        if s.carbon_intensity > CARBON_LIMIT {
            out.push(format!(
                "Carbon intensity is elevated at {:.0} g/kWh.",
                s.carbon_intensity
            ));
        }
    }
    if offline > 0 {
        out.push(format!(
            "{offline} asset(s) offline; restoring them would raise capacity and stability."
        ));
    }
    if nodes.values().any(|n| n.kind == NodeKind::EvHub) {
        out.push("EV charging present; co-located storage would flatten the evening peak.".to_string());
    }
    if out.is_empty() {
        out.push("No immediate concerns.".to_string());
    }
    out
}

impl fmt::Display for GridReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Grid Report ({} ticks) ---", self.ticks)?;
        writeln!(f, "Peak demand:           {:.1} MW", self.peak_demand_mw)?;
        writeln!(f, "Peak generation:       {:.1} MW", self.peak_generation_mw)?;
        writeln!(f, "Minimum stability:     {:.1}%", self.min_stability)?;
        writeln!(f, "Minimum frequency:     {:.3} Hz", self.min_frequency_hz)?;
        writeln!(f, "Avg carbon intensity:  {:.1} g/kWh", self.avg_carbon_intensity)?;
        writeln!(f, "Total cost:            ${:.0}", self.total_cost)?;
        writeln!(f, "Deficit ticks:         {}", self.deficit_ticks)?;
        writeln!(f, "Offline nodes:         {}", self.offline_nodes.len())?;
        write!(f, "Observations:")?;
        for obs in &self.observations {
            write!(f, "\n  - {obs}")?;
        }
        Ok(())
    }
}
