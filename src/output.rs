//! Hand-off surfaces for downstream consumers of the cleaned dataset.
//!
//! Supports a fixed schema description, CSV snapshots of the derived dataset,
//! and JSON rendering of a run summary.

use chrono::NaiveDateTime;
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{EtlError, Result};
use crate::pipeline::RunSummary;
use crate::record::DerivedTrip;

/// Column description of the derived dataset, for consumers that need a
/// textual schema alongside the snapshot.
pub const SCHEMA_DESCRIPTION: &str = "\
DATA SCHEMA:
- vendor_id (int): Taxi provider identifier
- pickup_datetime (datetime): Trip pickup timestamp
- dropoff_datetime (datetime): Trip dropoff timestamp
- passenger_count (int): Number of passengers, always > 0
- trip_distance (float): Trip distance in miles, always > 0
- total_amount (float): Total charged amount, may be empty
- pickup_hour (int): Hour of day (0-23)
- pickup_month (int): Month number (1-12)
- pickup_day_of_week (int): Day of week (1=Sun .. 7=Sat)
- is_peak (bool): Pickup hour falls in the peak window
- revenue_per_mile (float): total_amount / trip_distance, empty when total_amount is empty
";

const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One CSV row of a derived-dataset snapshot.
#[derive(Debug, Serialize)]
struct SnapshotRow {
    vendor_id: Option<i64>,
    pickup_datetime: String,
    dropoff_datetime: String,
    passenger_count: i64,
    trip_distance: f64,
    total_amount: Option<f64>,
    pickup_hour: u32,
    pickup_month: u32,
    pickup_day_of_week: u32,
    is_peak: bool,
    revenue_per_mile: Option<f64>,
}

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()
}

impl From<&DerivedTrip> for SnapshotRow {
    fn from(d: &DerivedTrip) -> Self {
        SnapshotRow {
            vendor_id: d.trip.vendor_id,
            pickup_datetime: format_ts(&d.trip.pickup),
            dropoff_datetime: format_ts(&d.trip.dropoff),
            passenger_count: d.trip.passenger_count,
            trip_distance: d.trip.trip_distance,
            total_amount: d.trip.total_amount,
            pickup_hour: d.pickup_hour,
            pickup_month: d.pickup_month,
            pickup_day_of_week: d.pickup_day_of_week,
            is_peak: d.is_peak,
            revenue_per_mile: d.revenue_per_mile,
        }
    }
}

/// Writes the derived dataset to `path` as CSV with a header row.
///
/// Any existing file is replaced only once the new snapshot is complete.
#[tracing::instrument(skip(trips), fields(path = %path.display(), rows = trips.len()))]
pub fn export_snapshot(path: &Path, trips: &[DerivedTrip]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| EtlError::io(dir, e))?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| EtlError::io(dir, e))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(tmp);

    for trip in trips {
        writer.serialize(SnapshotRow::from(trip))?;
    }
    writer.flush().map_err(|e| EtlError::io(path, e))?;

    let tmp = writer
        .into_inner()
        .map_err(|e| EtlError::io(path, e.into_error()))?;
    tmp.persist(path).map_err(|e| EtlError::io(path, e.error))?;

    info!("Snapshot exported");
    Ok(())
}

/// Logs a run summary as pretty-printed JSON.
pub fn print_summary_json(summary: &RunSummary) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
