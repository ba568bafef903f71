//! CSV export for dispatch snapshots.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::DispatchSnapshot;

/// Column header for CSV telemetry export.
const HEADER: &str = "tick,hour,total_demand_mw,total_capacity_mw,net_headroom_mw,\
                      grid_stability,frequency_hz,carbon_intensity,cost_per_hr,offline_nodes";

/// Exports snapshots to a CSV file at the given path.
///
/// Writes a header row followed by one data row per snapshot. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `snapshots` - Snapshots to export, oldest first
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv<'a>(
    snapshots: impl IntoIterator<Item = &'a DispatchSnapshot>,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(snapshots, buf)
}

/// Writes snapshots as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv<'a>(
    snapshots: impl IntoIterator<Item = &'a DispatchSnapshot>,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for s in snapshots {
        wtr.write_record(&[
            s.tick.to_string(),
            format!("{:.2}", s.hour),
            format!("{:.3}", s.total_demand),
            format!("{:.3}", s.total_capacity),
            format!("{:.3}", s.net_headroom),
            format!("{:.2}", s.grid_stability),
            format!("{:.4}", s.frequency_hz),
            format!("{:.2}", s.carbon_intensity),
            format!("{:.2}", s.cost_per_hr),
            s.offline_nodes.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
