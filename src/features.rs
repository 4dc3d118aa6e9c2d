//! Derived temporal and economic features.

use chrono::{Datelike, Timelike};
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::record::{DerivedTrip, TripRecord};

/// Hours of the day counted as peak traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakHours([bool; 24]);

impl PeakHours {
    /// Morning 07–09 and evening 16–18.
    pub const RUSH_HOURS: [u32; 6] = [7, 8, 9, 16, 17, 18];

    pub fn new(hours: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut set = [false; 24];
        for hour in hours {
            let slot = set
                .get_mut(hour as usize)
                .ok_or_else(|| EtlError::InvalidConfig(format!("peak hour {hour} is not in 0..=23")))?;
            *slot = true;
        }
        Ok(Self(set))
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.0.get(hour as usize).copied().unwrap_or(false)
    }

    pub fn hours(&self) -> Vec<u32> {
        (0..24).filter(|h| self.contains(*h)).collect()
    }
}

impl Default for PeakHours {
    fn default() -> Self {
        let mut set = [false; 24];
        for hour in Self::RUSH_HOURS {
            set[hour as usize] = true;
        }
        Self(set)
    }
}

/// Adds hour/month/weekday, peak flag and revenue per mile to cleaned trips.
#[derive(Debug, Clone, Default)]
pub struct FeatureDeriver {
    peak_hours: PeakHours,
}

impl FeatureDeriver {
    pub fn new(peak_hours: PeakHours) -> Self {
        Self { peak_hours }
    }

    pub fn derive_one(&self, trip: TripRecord) -> DerivedTrip {
        let pickup_hour = trip.pickup.hour();
        // trip_distance > 0 is guaranteed by the cleaner
        let revenue_per_mile = trip.total_amount.map(|amount| amount / trip.trip_distance);

        DerivedTrip {
            pickup_hour,
            pickup_month: trip.pickup.month(),
            pickup_day_of_week: trip.pickup.weekday().number_from_sunday(),
            is_peak: self.peak_hours.contains(pickup_hour),
            revenue_per_mile,
            trip,
        }
    }

    #[tracing::instrument(skip_all, fields(rows = trips.len()))]
    pub fn derive(&self, trips: Vec<TripRecord>) -> Vec<DerivedTrip> {
        let derived: Vec<DerivedTrip> = trips.into_iter().map(|t| self.derive_one(t)).collect();
        debug!(
            peak = derived.iter().filter(|t| t.is_peak).count(),
            "Derived trip features"
        );
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;

    fn trip(pickup: &str, distance: f64, amount: Option<f64>) -> TripRecord {
        let pickup = parse_timestamp(pickup).unwrap();
        TripRecord {
            vendor_id: Some(1),
            pickup,
            dropoff: pickup,
            passenger_count: 1,
            trip_distance: distance,
            total_amount: amount,
        }
    }

    #[test]
    fn test_default_peak_hours() {
        let peak = PeakHours::default();
        assert_eq!(peak.hours(), vec![7, 8, 9, 16, 17, 18]);
        assert!(!peak.contains(10));
        assert!(!peak.contains(99));
    }

    #[test]
    fn test_peak_hours_rejects_out_of_range() {
        assert!(PeakHours::new([7, 24]).is_err());
        assert_eq!(PeakHours::new([6]).unwrap().hours(), vec![6]);
    }

    #[test]
    fn test_derive_features() {
        // 2024-01-15 is a Monday
        let d = FeatureDeriver::default().derive_one(trip("2024-01-15 08:00:00", 2.0, Some(25.0)));

        assert_eq!(d.pickup_hour, 8);
        assert_eq!(d.pickup_month, 1);
        assert_eq!(d.pickup_day_of_week, 2);
        assert!(d.is_peak);
        assert_eq!(d.revenue_per_mile, Some(12.5));
    }

    #[test]
    fn test_sunday_is_day_one() {
        let d = FeatureDeriver::default().derive_one(trip("2024-01-14 23:59:00", 1.0, Some(5.0)));
        assert_eq!(d.pickup_day_of_week, 1);
        assert!(!d.is_peak);
    }

    #[test]
    fn test_missing_amount_has_no_revenue_per_mile() {
        let d = FeatureDeriver::default().derive_one(trip("2024-01-15 08:00:00", 2.0, None));
        assert_eq!(d.revenue_per_mile, None);
    }

    #[test]
    fn test_custom_peak_window() {
        let deriver = FeatureDeriver::new(PeakHours::new([10]).unwrap());
        let derived = deriver.derive(vec![
            trip("2024-01-15 08:00:00", 2.0, Some(1.0)),
            trip("2024-01-15 10:30:00", 2.0, Some(1.0)),
        ]);
        assert!(!derived[0].is_peak);
        assert!(derived[1].is_peak);
    }
}
