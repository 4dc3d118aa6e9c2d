//! Record-validity filtering.
//!
//! A trip survives only if both timestamps parsed, the dropoff is not before
//! the pickup, and passenger count and distance are positive. Failing rows are
//! counted and dropped; they never raise.

use serde::Serialize;
use tracing::info;

use crate::record::{RawTrip, TripRecord};

/// Why a row was dropped. Only the first failing check is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingTimestamp,
    DropoffBeforePickup,
    NonPositivePassengers,
    NonPositiveDistance,
}

/// Row counts observed while cleaning.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub kept_rows: usize,
    pub missing_timestamp: usize,
    pub dropoff_before_pickup: usize,
    pub non_positive_passengers: usize,
    pub non_positive_distance: usize,
}

impl CleanReport {
    pub fn dropped_rows(&self) -> usize {
        self.input_rows - self.kept_rows
    }

    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingTimestamp => self.missing_timestamp += 1,
            DropReason::DropoffBeforePickup => self.dropoff_before_pickup += 1,
            DropReason::NonPositivePassengers => self.non_positive_passengers += 1,
            DropReason::NonPositiveDistance => self.non_positive_distance += 1,
        }
    }
}

/// Output of [`clean`]: the surviving trips and what was dropped.
#[derive(Debug)]
pub struct Cleaned {
    pub trips: Vec<TripRecord>,
    pub report: CleanReport,
}

/// Checks one row against every validity rule.
pub fn validate(raw: &RawTrip) -> Result<TripRecord, DropReason> {
    let (Some(pickup), Some(dropoff)) = (raw.pickup, raw.dropoff) else {
        return Err(DropReason::MissingTimestamp);
    };
    if dropoff < pickup {
        return Err(DropReason::DropoffBeforePickup);
    }
    let passenger_count = match raw.passenger_count {
        Some(n) if n > 0 => n,
        _ => return Err(DropReason::NonPositivePassengers),
    };
    // NaN fails this comparison too
    let trip_distance = match raw.trip_distance {
        Some(d) if d > 0.0 => d,
        _ => return Err(DropReason::NonPositiveDistance),
    };

    Ok(TripRecord {
        vendor_id: raw.vendor_id,
        pickup,
        dropoff,
        passenger_count,
        trip_distance,
        total_amount: raw.total_amount,
    })
}

/// Keeps the rows that pass [`validate`], preserving input order.
#[tracing::instrument(skip_all, fields(input_rows = raw.len()))]
pub fn clean(raw: Vec<RawTrip>) -> Cleaned {
    let mut report = CleanReport {
        input_rows: raw.len(),
        ..Default::default()
    };

    let trips: Vec<TripRecord> = raw
        .iter()
        .filter_map(|row| match validate(row) {
            Ok(trip) => Some(trip),
            Err(reason) => {
                report.record_drop(reason);
                None
            }
        })
        .collect();

    report.kept_rows = trips.len();

    info!(
        kept = report.kept_rows,
        dropped = report.dropped_rows(),
        missing_timestamp = report.missing_timestamp,
        dropoff_before_pickup = report.dropoff_before_pickup,
        non_positive_passengers = report.non_positive_passengers,
        non_positive_distance = report.non_positive_distance,
        "Cleaned trip records"
    );

    Cleaned { trips, report }
}
