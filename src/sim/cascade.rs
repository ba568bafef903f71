//! Bounded cascading-failure relaxation over substations.
//!
//! Cascades longer than [`DEFAULT_MAX_PASSES`] hops are not modelled: the
//! loop stops after that many passes even if substations are still
//! overloaded, which is what guarantees termination on rings and dense
//! meshes where redistributed load keeps re-tripping neighbours.
//!
//! A substation that trips with no active substation neighbour loses its
//! load outright. That load is reported in [`Trip::dropped`] rather than
//! modelled as a wider blackout.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::grid::{GridNode, NodeId, NodeKind};

/// Pass bound used when nothing else is configured.
pub const DEFAULT_MAX_PASSES: usize = 5;

/// One substation trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub node: NodeId,
    /// 1-based pass the trip happened in.
    pub pass: usize,
    /// Load carried at the moment of tripping (MW).
    pub load: f64,
    /// Load handed to each active substation neighbour (MW).
    pub shares: Vec<(NodeId, f64)>,
}

impl Trip {
    /// Load lost because no neighbour could take it (MW).
    pub fn dropped(&self) -> f64 {
        if self.shares.is_empty() { self.load } else { 0.0 }
    }
}

/// Outcome of a relaxation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeReport {
    /// Passes executed, including the final quiet one.
    pub passes: usize,
    pub trips: Vec<Trip>,
}

impl CascadeReport {
    pub fn tripped(&self) -> impl Iterator<Item = &str> {
        self.trips.iter().map(|t| t.node.as_str())
    }

    /// Total load lost to trips with nowhere to go (MW).
    pub fn dropped_load(&self) -> f64 {
        self.trips.iter().map(Trip::dropped).sum()
    }
}

/// Trips overloaded substations and spreads their load until quiet.
///
/// Each pass visits substations in id order. A substation that is not
/// offline and carries more load than its capacity goes offline, its load
/// is split evenly across neighbours that are active substations, and its
/// own load is zeroed. Neighbour ids that do not resolve are skipped. The
/// loop ends after a pass with no trips or after `max_passes` passes.
pub fn relax(nodes: &mut BTreeMap<NodeId, GridNode>, max_passes: usize) -> CascadeReport {
    let mut report = CascadeReport::default();

    while report.passes < max_passes {
        report.passes += 1;
        let pass = report.passes;

        let overloaded: Vec<NodeId> = nodes
            .values()
            .filter(|n| n.kind == NodeKind::Substation && !n.is_offline())
            .filter(|n| n.current_load > n.capacity)
            .map(|n| n.id.clone())
            .collect();

        let mut unstable = false;
        for id in overloaded {
            // An earlier trip in this pass may have changed this node.
            let Some(node) = nodes.get_mut(&id) else {
                continue;
            };
            if node.is_offline() || node.current_load <= node.capacity {
                continue;
            }
            let load = node.current_load;
            let neighbours = node.connections.clone();
            node.force_offline();
            unstable = true;

            let receivers: Vec<NodeId> = neighbours
                .into_iter()
                .filter(|m| {
                    nodes
                        .get(m)
                        .is_some_and(|n| n.kind == NodeKind::Substation && !n.is_offline())
                })
                .collect();

            let mut shares = Vec::with_capacity(receivers.len());
            if !receivers.is_empty() {
                let share = load / receivers.len() as f64;
                for m in receivers {
                    if let Some(n) = nodes.get_mut(&m) {
                        n.current_load += share;
                    }
                    shares.push((m, share));
                }
            }

            warn!(node = %id, pass, load_mw = load, receivers = shares.len(), "substation tripped");
            report.trips.push(Trip {
                node: id,
                pass,
                load,
                shares,
            });
        }

        if !unstable {
            break;
        }
    }

    report
}
