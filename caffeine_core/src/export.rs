//! CSV export of sampled charts and overlay intervals.
//!
//! Levels are rounded to whole mg here; the engine keeps full precision.

use crate::{Chart, ResolvedInterval, Result};
use std::io::Write;
use std::path::Path;

/// Write a chart as CSV: `time`, `timestamp`, then one column per series
pub fn write_chart_csv<W: Write>(chart: &Chart, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["time".to_string(), "timestamp".to_string()];
    header.extend(chart.series.iter().map(|s| s.name.clone()));
    csv.write_record(&header)?;

    for point in &chart.points {
        let mut row = vec![point.label.clone(), point.at.to_rfc3339()];
        row.extend(point.values.iter().map(|(_, v)| format!("{:.0}", v)));
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write overlay intervals as CSV (`start,end` in RFC 3339)
pub fn write_intervals_csv<W: Write>(intervals: &[ResolvedInterval], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["start", "end"])?;
    for interval in intervals {
        csv.write_record([interval.start.to_rfc3339(), interval.end.to_rfc3339()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Save a chart to `path`, creating parent directories
pub fn save_chart_csv(chart: &Chart, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_chart_csv(chart, std::io::BufWriter::new(file))?;
    tracing::info!("Wrote {} chart rows to {:?}", chart.points.len(), path);
    Ok(())
}

/// Save overlay intervals to `path`, creating parent directories
pub fn save_intervals_csv(intervals: &[ResolvedInterval], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_intervals_csv(intervals, std::io::BufWriter::new(file))?;
    tracing::info!("Wrote {} intervals to {:?}", intervals.len(), path);
    Ok(())
}
