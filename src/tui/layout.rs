//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, Gauge, Paragraph, Row, Table};

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(10),   // chart
            Constraint::Length(3), // stability gauge
            Constraint::Min(8),    // node table
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_chart(frame, app, chunks[1]);
    render_stability(frame, app, chunks[2]);
    render_nodes(frame, app, chunks[3]);
    render_footer(frame, app, chunks[4]);
}

fn clock_label(hour: f64) -> String {
    let minutes = (hour * 60.0).round() as u32 % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Header bar: preset, time of day, speed, play state, active scenarios.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let clock = app.sim.clock();
    let (icon, label) = if clock.is_playing() {
        ("▶", "PLAYING")
    } else {
        ("‖", "PAUSED")
    };
    let scenarios = app.sim.scenarios().labels().join(", ");

    let header = Line::from(vec![
        Span::styled(
            " GRID-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(&app.preset_name, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ {} │ {}x │ {icon} {label} │ {scenarios}",
            clock_label(clock.hour()),
            clock.speed(),
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Demand vs generation over the retained history.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.sim.history();
    let demand: Vec<(f64, f64)> = history
        .iter()
        .map(|s| (s.tick as f64, s.total_demand))
        .collect();
    let generation: Vec<(f64, f64)> = history
        .iter()
        .map(|s| (s.tick as f64, s.total_capacity))
        .collect();

    let y_bounds = style::auto_bounds_y(&demand, &generation);
    let x_lo = demand.first().map_or(0.0, |p| p.0);
    let x_hi = demand.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let datasets = vec![
        Dataset::default()
            .name("Demand")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::DEMAND_COLOR))
            .data(&demand),
        Dataset::default()
            .name("Generation")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::GENERATION_COLOR))
            .data(&generation),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Demand vs Generation ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("tick")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{}", x_lo as u64), format!("{}", x_hi as u64)]),
        )
        .y_axis(
            Axis::default()
                .title("MW")
                .bounds(y_bounds)
                .labels(vec![format!("{:.0}", y_bounds[0]), format!("{:.0}", y_bounds[1])]),
        );

    frame.render_widget(chart, area);
}

/// Stability gauge next to frequency, carbon and cost readouts.
fn render_stability(frame: &mut Frame, app: &App, area: Rect) {
    let latest = app.latest();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(44)])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().title(" Stability ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::stability_color(latest.grid_stability)))
        .ratio((latest.grid_stability / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", latest.grid_stability));
    frame.render_widget(gauge, chunks[0]);

    let readout = Paragraph::new(Line::from(format!(
        " {:.2} Hz  {:.0} g/kWh  ${:.0}/hr",
        latest.frequency_hz, latest.carbon_intensity, latest.cost_per_hr,
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(readout, chunks[1]);
}

/// Node table, one row per node, coloured by status.
fn render_nodes(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.sim.nodes().values().map(|node| {
        let color = style::status_color(node.status);
        Row::new(vec![
            Cell::from(node.id.clone()),
            Cell::from(node.kind.as_str()),
            Cell::from(format!("{:.1}", node.current_load)),
            Cell::from(format!("{:.1}", node.generation)),
            Cell::from(format!("{:.0}", node.capacity)),
            Cell::from(node.status.to_string()),
        ])
        .style(Style::default().fg(color))
    });

    let widths = [
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["id", "type", "load", "gen", "cap", "status"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title(" Nodes ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

/// Footer with keybinding hints, or the last rejected action.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.message {
        Some(msg) => Span::styled(format!(" {msg}"), Style::default().fg(style::ERROR_FG)),
        None => Span::styled(
            " q:Quit  Space:Play/Pause  +/-:Speed  1-4:Preset  r:Restart  h:Heat  w:DC  g:Growth",
            Style::default().fg(style::FOOTER_FG),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(line)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_label_formats_hours() {
        assert_eq!(clock_label(0.0), "00:00");
        assert_eq!(clock_label(13.5), "13:30");
        assert_eq!(clock_label(23.99), "23:59");
    }
}
