//! Delimited-text loader for trip records.

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::record::RawTrip;
use crate::schema::{ColumnSpec, ColumnType, Role, TripSchema};

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Header positions of the declared columns.
struct ColumnIndex {
    vendor_id: usize,
    pickup: usize,
    dropoff: usize,
    passenger_count: usize,
    trip_distance: usize,
    total_amount: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, schema: &TripSchema) -> Result<Self> {
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(EtlError::schema("<header>", "header row is missing"));
        }

        let find = |role: Role| -> Result<usize> {
            let spec = schema.column(role);
            headers
                .iter()
                .position(|h| h == spec.name)
                .ok_or_else(|| EtlError::schema(&spec.name, "required column is absent"))
        };

        Ok(Self {
            vendor_id: find(Role::VendorId)?,
            pickup: find(Role::Pickup)?,
            dropoff: find(Role::Dropoff)?,
            passenger_count: find(Role::PassengerCount)?,
            trip_distance: find(Role::TripDistance)?,
            total_amount: find(Role::TotalAmount)?,
        })
    }
}

/// Reads a delimited file at `path` into [`RawTrip`] rows using `schema`.
///
/// # Errors
///
/// Returns [`EtlError::SchemaMismatch`] if the header is missing, a declared
/// column is absent, or a numeric cell cannot be read as its declared type.
#[tracing::instrument(skip(schema), fields(path = %path.display()))]
pub fn load_trips(path: &Path, schema: &TripSchema, delimiter: u8) -> Result<Vec<RawTrip>> {
    let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
    let trips = load_trips_from_reader(file, schema, delimiter)?;
    info!(rows = trips.len(), "Loaded trip records");
    Ok(trips)
}

/// Same as [`load_trips`] over any reader.
pub fn load_trips_from_reader<R: Read>(
    reader: R,
    schema: &TripSchema,
    delimiter: u8,
) -> Result<Vec<RawTrip>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index = ColumnIndex::resolve(&headers, schema)?;
    debug!(columns = headers.len(), "Header validated");

    let mut trips = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let cell = |idx: usize| record.get(idx).unwrap_or("");

        trips.push(RawTrip {
            vendor_id: parse_integer(
                cell(index.vendor_id),
                schema.column(Role::VendorId),
                line,
            )?,
            pickup: parse_timestamp(cell(index.pickup)),
            dropoff: parse_timestamp(cell(index.dropoff)),
            passenger_count: parse_integer(
                cell(index.passenger_count),
                schema.column(Role::PassengerCount),
                line,
            )?,
            trip_distance: parse_float(
                cell(index.trip_distance),
                schema.column(Role::TripDistance),
                line,
            )?,
            total_amount: parse_float(
                cell(index.total_amount),
                schema.column(Role::TotalAmount),
                line,
            )?,
        });
    }

    Ok(trips)
}

fn untypeable(spec: &ColumnSpec, value: &str, line: u64) -> EtlError {
    EtlError::schema(
        &spec.name,
        format!("line {line}: '{value}' is not a valid {:?}", spec.ty),
    )
}

/// Parses an integer cell; `"1.0"` is accepted, `"1.5"` and `"1e300"` are not.
fn parse_integer(value: &str, spec: &ColumnSpec, line: u64) -> Result<Option<i64>> {
    debug_assert_eq!(spec.ty, ColumnType::Integer);
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = value.parse::<i64>() {
        return Ok(Some(v));
    }
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    match value.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        _ => Err(untypeable(spec, value, line)),
    }
}

/// Parses a float cell; `NaN` and infinities are untypeable.
fn parse_float(value: &str, spec: &ColumnSpec, line: u64) -> Result<Option<f64>> {
    debug_assert_eq!(spec.ty, ColumnType::Float);
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(untypeable(spec, value, line)),
    }
}

/// Unparseable timestamps become `None` and are dropped by the cleaner.
pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const HEADER: &str =
        "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,total_amount";

    fn load(body: &str) -> Result<Vec<RawTrip>> {
        load_trips_from_reader(body.as_bytes(), &TripSchema::default(), b',')
    }

    #[test]
    fn test_load_typed_rows() {
        let input = format!("{HEADER}\n1,2024-01-15 08:00:00,2024-01-15 08:20:00,1,2.0,25.0\n");
        let trips = load(&input).unwrap();

        assert_eq!(trips.len(), 1);
        let t = &trips[0];
        assert_eq!(t.vendor_id, Some(1));
        assert_eq!(t.pickup.unwrap().hour(), 8);
        assert_eq!(t.dropoff.unwrap().minute(), 20);
        assert_eq!(t.passenger_count, Some(1));
        assert_eq!(t.trip_distance, Some(2.0));
        assert_eq!(t.total_amount, Some(25.0));
    }

    #[test]
    fn test_extra_columns_and_order_are_ignored() {
        let input = "tip_amount,total_amount,trip_distance,passenger_count,tpep_dropoff_datetime,tpep_pickup_datetime,VendorID\n\
                     3.5,10.0,1.5,2,2024-03-01 09:10:00,2024-03-01 09:00:00,2\n";
        let trips = load(input).unwrap();

        assert_eq!(trips[0].vendor_id, Some(2));
        assert_eq!(trips[0].total_amount, Some(10.0));
        assert_eq!(trips[0].pickup.unwrap().month(), 3);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let input = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance\n";
        match load(input) {
            Err(EtlError::SchemaMismatch { column, .. }) => assert_eq!(column, "total_amount"),
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_schema_mismatch() {
        assert!(matches!(load(""), Err(EtlError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_untypeable_numeric_is_schema_mismatch() {
        let input = format!("{HEADER}\n1,2024-01-15 08:00:00,2024-01-15 08:20:00,one,2.0,25.0\n");
        match load(&input) {
            Err(EtlError::SchemaMismatch { column, reason }) => {
                assert_eq!(column, "passenger_count");
                assert!(reason.contains("line 2"));
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    fn mismatch_column(passenger_count: &str, distance: &str, amount: &str) -> String {
        let input = format!(
            "{HEADER}\n1,2024-01-15 08:00:00,2024-01-15 08:20:00,{passenger_count},{distance},{amount}\n"
        );
        match load(&input) {
            Err(EtlError::SchemaMismatch { column, .. }) => column,
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_untypeable_float_is_schema_mismatch() {
        assert_eq!(mismatch_column("1", "2.0x", "25.0"), "trip_distance");
        assert_eq!(mismatch_column("1", "2.0", "abc"), "total_amount");
    }

    #[test]
    fn test_non_finite_floats_are_schema_mismatch() {
        assert_eq!(mismatch_column("1", "inf", "25.0"), "trip_distance");
        assert_eq!(mismatch_column("1", "infinity", "25.0"), "trip_distance");
        assert_eq!(mismatch_column("1", "2.0", "NaN"), "total_amount");
        assert_eq!(mismatch_column("1", "2.0", "-inf"), "total_amount");
    }

    #[test]
    fn test_out_of_range_integer_is_schema_mismatch() {
        assert_eq!(mismatch_column("1e300", "2.0", "25.0"), "passenger_count");
        assert_eq!(mismatch_column("9223372036854775808", "2.0", "25.0"), "passenger_count");
        assert_eq!(mismatch_column("inf", "2.0", "25.0"), "passenger_count");
        assert_eq!(mismatch_column("NaN", "2.0", "25.0"), "passenger_count");
    }

    #[test]
    fn test_non_finite_row_aborts_whole_load() {
        let input = format!(
            "{HEADER}\n\
             1,2024-01-15 08:00:00,2024-01-15 08:20:00,1,2.0,25.0\n\
             1,2024-01-15 09:00:00,2024-01-15 09:20:00,1e300,inf,NaN\n"
        );
        match load(&input) {
            Err(EtlError::SchemaMismatch { reason, .. }) => assert!(reason.contains("line 3")),
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_cells_and_bad_timestamps_are_null() {
        let input = format!("{HEADER}\n,not-a-date,2024-01-15 08:20:00,,,\n");
        let trips = load(&input).unwrap();

        assert_eq!(trips[0], RawTrip {
            dropoff: parse_timestamp("2024-01-15 08:20:00"),
            ..Default::default()
        });
    }

    #[test]
    fn test_integer_with_zero_fraction_is_accepted() {
        let input = format!("{HEADER}\n1.0,2024-01-15 08:00:00,2024-01-15 08:20:00,2.0,2.0,25.0\n");
        let trips = load(&input).unwrap();
        assert_eq!(trips[0].vendor_id, Some(1));
        assert_eq!(trips[0].passenger_count, Some(2));

        let input = format!("{HEADER}\n1,2024-01-15 08:00:00,2024-01-15 08:20:00,1.5,2.0,25.0\n");
        assert!(load(&input).is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-01-15 08:00:00").is_some());
        assert!(parse_timestamp("2024-01-15T08:00:00").is_some());
        assert!(parse_timestamp("2024-01-15 08:00:00.250").is_some());
        assert_eq!(
            parse_timestamp("2024-01-15T08:00:00+02:00").unwrap().hour(),
            6
        );
        assert!(parse_timestamp("15/01/2024").is_none());
    }

    #[test]
    fn test_custom_delimiter() {
        let input = HEADER.replace(',', ";")
            + "\n1;2024-01-15 08:00:00;2024-01-15 08:20:00;1;2.0;25.0\n";
        let trips = load_trips_from_reader(input.as_bytes(), &TripSchema::default(), b';').unwrap();
        assert_eq!(trips.len(), 1);
    }
}
