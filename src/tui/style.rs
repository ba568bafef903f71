//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

use crate::grid::NodeStatus;

/// Demand line color.
pub const DEMAND_COLOR: Color = Color::Cyan;
/// Generation line color.
pub const GENERATION_COLOR: Color = Color::Green;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Footer error text color.
pub const ERROR_FG: Color = Color::Red;

/// Color for a node status, matching the map legend.
pub fn status_color(status: NodeStatus) -> Color {
    match status {
        NodeStatus::Normal => Color::Green,
        NodeStatus::Warning => Color::Yellow,
        NodeStatus::Critical => Color::LightRed,
        NodeStatus::Offline => Color::DarkGray,
    }
}

/// Color for a stability score.
pub fn stability_color(score: f64) -> Color {
    if score >= 90.0 {
        Color::Green
    } else if score >= 60.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Computes Y-axis bounds from chart data points with 10% padding.
pub fn auto_bounds_y(a: &[(f64, f64)], b: &[(f64, f64)]) -> [f64; 2] {
    let all = a.iter().chain(b.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(1.0);
    let pad = range * 0.1;
    [(min - pad).min(0.0), max + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_and_include_zero() {
        let b = auto_bounds_y(&[(0.0, 100.0), (1.0, 200.0)], &[(0.0, 150.0)]);
        assert_eq!(b, [0.0, 210.0]);
    }

    #[test]
    fn empty_series_get_unit_bounds() {
        assert_eq!(auto_bounds_y(&[], &[]), [0.0, 1.0]);
    }
}
