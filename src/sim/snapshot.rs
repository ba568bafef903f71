//! Dispatch snapshots, headline metrics, and the bounded snapshot history.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::grid::{NodeId, NodeKind};

/// Default number of snapshots retained (one day at 15-minute ticks).
pub const DEFAULT_HISTORY_WINDOW: usize = 96;

/// Immutable record of one tick's engine output.
///
/// Owns all of its data; nothing here aliases live node records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSnapshot {
    /// Tick counter since the last reset (0 is the initial recompute).
    pub tick: u64,
    /// Simulated hour of day in `[0, 24)`.
    pub hour: f64,
    /// Simulated hours since the previous snapshot. Zero for recomputes
    /// that did not advance the clock.
    pub elapsed_hours: f64,
    /// Sum of active load plus scenario-injected flat load (MW).
    pub total_demand: f64,
    /// Sum of generation (MW).
    pub total_capacity: f64,
    /// `total_capacity - total_demand` (MW); negative is a deficit.
    pub net_headroom: f64,
    /// Stability score in `[0, 100]`.
    pub grid_stability: f64,
    /// g CO₂/kWh.
    pub carbon_intensity: f64,
    /// $/hr.
    pub cost_per_hr: f64,
    /// Hz; 60 nominal, unclamped below.
    pub frequency_hz: f64,
    pub generation_by_source: BTreeMap<NodeKind, f64>,
    pub demand_by_category: BTreeMap<NodeKind, f64>,
    pub total_nodes: usize,
    pub offline_nodes: usize,
    /// Substations tripped by this tick's cascade.
    pub tripped: Vec<NodeId>,
}

impl DispatchSnapshot {
    /// Snapshot of a grid before its first tick: all zero, fully stable.
    pub fn empty(hour: f64) -> Self {
        Self {
            tick: 0,
            hour,
            elapsed_hours: 0.0,
            total_demand: 0.0,
            total_capacity: 0.0,
            net_headroom: 0.0,
            grid_stability: 100.0,
            carbon_intensity: 0.0,
            cost_per_hr: 0.0,
            frequency_hz: 60.0,
            generation_by_source: BTreeMap::new(),
            demand_by_category: BTreeMap::new(),
            total_nodes: 0,
            offline_nodes: 0,
            tripped: Vec::new(),
        }
    }

    pub fn is_deficit(&self) -> bool {
        self.net_headroom < 0.0
    }
}

impl fmt::Display for DispatchSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = (self.hour * 60.0).round() as u64 % (24 * 60);
        write!(
            f,
            "t={:>3} ({:02}:{:02}) | demand={:>7.1} MW  gen={:>7.1} MW  \
             headroom={:>7.1} MW | stab={:>5.1}%  f={:.3} Hz | \
             {:>5.1} g/kWh  ${:>8.0}/hr | offline={}/{}",
            self.tick,
            minutes / 60,
            minutes % 60,
            self.total_demand,
            self.total_capacity,
            self.net_headroom,
            self.grid_stability,
            self.frequency_hz,
            self.carbon_intensity,
            self.cost_per_hr,
            self.offline_nodes,
            self.total_nodes,
        )
    }
}

/// Headline figures for dashboards and the chat summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridMetrics {
    pub total_demand: f64,
    pub total_capacity: f64,
    pub net_headroom: f64,
    pub grid_stability: f64,
    pub frequency_hz: f64,
    pub carbon_intensity: f64,
    pub cost_per_hr: f64,
    pub active_nodes: usize,
    pub offline_nodes: usize,
    pub total_nodes: usize,
}

impl From<&DispatchSnapshot> for GridMetrics {
    fn from(s: &DispatchSnapshot) -> Self {
        Self {
            total_demand: s.total_demand,
            total_capacity: s.total_capacity,
            net_headroom: s.net_headroom,
            grid_stability: s.grid_stability,
            frequency_hz: s.frequency_hz,
            carbon_intensity: s.carbon_intensity,
            cost_per_hr: s.cost_per_hr,
            active_nodes: s.total_nodes - s.offline_nodes.min(s.total_nodes),
            offline_nodes: s.offline_nodes,
            total_nodes: s.total_nodes,
        }
    }
}

/// Rolling window of the most recent snapshots, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotHistory {
    window: usize,
    entries: VecDeque<DispatchSnapshot>,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl SnapshotHistory {
    /// A window of zero is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            entries: VecDeque::with_capacity(window),
        }
    }

    /// Appends a snapshot, evicting the oldest beyond the window.
    pub fn push(&mut self, snapshot: DispatchSnapshot) {
        while self.entries.len() >= self.window {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<&DispatchSnapshot> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DispatchSnapshot> {
        self.entries.iter()
    }

    /// Snapshots whose tick lies in `[from, to]`.
    pub fn range(&self, from: u64, to: u64) -> Vec<DispatchSnapshot> {
        self.entries
            .iter()
            .filter(|s| (from..=to).contains(&s.tick))
            .cloned()
            .collect()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned copy of the retained snapshots.
    pub fn to_vec(&self) -> Vec<DispatchSnapshot> {
        self.entries.iter().cloned().collect()
    }
}
