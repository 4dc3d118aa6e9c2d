//! Row types for each pipeline stage.
//!
//! Each stage produces a new, narrower type: the cleaner turns [`RawTrip`]
//! into [`TripRecord`], whose non-optional fields carry the validity
//! invariants, and the feature deriver wraps that in [`DerivedTrip`].

use chrono::NaiveDateTime;

/// One data row as read from the source, before any validity checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrip {
    pub vendor_id: Option<i64>,
    pub pickup: Option<NaiveDateTime>,
    pub dropoff: Option<NaiveDateTime>,
    pub passenger_count: Option<i64>,
    pub trip_distance: Option<f64>,
    pub total_amount: Option<f64>,
}

/// A trip that passed every cleaner check.
///
/// `dropoff >= pickup`, `passenger_count > 0` and `trip_distance > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub vendor_id: Option<i64>,
    pub pickup: NaiveDateTime,
    pub dropoff: NaiveDateTime,
    pub passenger_count: i64,
    pub trip_distance: f64,
    pub total_amount: Option<f64>,
}

/// A cleaned trip extended with derived features.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTrip {
    pub trip: TripRecord,
    pub pickup_hour: u32,
    pub pickup_month: u32,
    /// 1 = Sunday .. 7 = Saturday.
    pub pickup_day_of_week: u32,
    pub is_peak: bool,
    /// `None` only when `total_amount` is missing.
    pub revenue_per_mile: Option<f64>,
}
