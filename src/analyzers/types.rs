//! Row types for the three summary views.

use std::fmt;

/// Logical name of a view; also the artifact name it is written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    MonthlyRevenue,
    PeakCongestion,
    HighValueTrips,
}

impl ViewName {
    pub const ALL: [ViewName; 3] = [
        ViewName::MonthlyRevenue,
        ViewName::PeakCongestion,
        ViewName::HighValueTrips,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewName::MonthlyRevenue => "monthly_revenue",
            ViewName::PeakCongestion => "peak_congestion",
            ViewName::HighValueTrips => "high_value_trips",
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revenue for one pickup month. `None` when every amount in the month was missing.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenueRow {
    pub pickup_month: i32,
    pub monthly_revenue: Option<f64>,
}

/// Trip volume and mean distance for one side of the peak window.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakCongestionRow {
    pub is_peak: bool,
    pub trip_count: i64,
    /// `None` for an empty bucket.
    pub avg_trip_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighValueTripRow {
    pub pickup_hour: i32,
    pub pickup_month: i32,
    pub trip_distance: f64,
    pub total_amount: f64,
    pub revenue_per_mile: f64,
}

/// All three views computed from one derived dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Views {
    pub monthly_revenue: Vec<MonthlyRevenueRow>,
    pub peak_congestion: Vec<PeakCongestionRow>,
    pub high_value_trips: Vec<HighValueTripRow>,
}

impl Views {
    pub fn row_count(&self, name: ViewName) -> usize {
        match name {
            ViewName::MonthlyRevenue => self.monthly_revenue.len(),
            ViewName::PeakCongestion => self.peak_congestion.len(),
            ViewName::HighValueTrips => self.high_value_trips.len(),
        }
    }
}
