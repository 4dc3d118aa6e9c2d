use crate::analyzers::types::{HighValueTripRow, MonthlyRevenueRow, PeakCongestionRow, Views};
use crate::analyzers::utility::{add_present, mean};
use crate::error::{EtlError, Result};
use crate::record::DerivedTrip;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Revenue per mile above which a trip counts as high value.
pub const DEFAULT_HIGH_VALUE_THRESHOLD: f64 = 10.0;

/// Policy values the aggregations depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    pub high_value_threshold: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
        }
    }
}

/// Computes the summary views over a derived dataset.
///
/// Every reduction reads the dataset without modifying it, so the three can
/// run in any order or at the same time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        if !config.high_value_threshold.is_finite() {
            return Err(EtlError::InvalidConfig(format!(
                "high value threshold must be finite, got {}",
                config.high_value_threshold
            )));
        }
        Ok(Self { config })
    }

    /// Sums `total_amount` per pickup month, ascending by month.
    pub fn monthly_revenue(&self, trips: &[DerivedTrip]) -> Vec<MonthlyRevenueRow> {
        let mut by_month: BTreeMap<u32, Option<f64>> = BTreeMap::new();

        for t in trips {
            let entry = by_month.entry(t.pickup_month).or_insert(None);
            *entry = add_present(*entry, t.trip.total_amount);
        }

        by_month
            .into_iter()
            .map(|(month, revenue)| MonthlyRevenueRow {
                pickup_month: month as i32,
                monthly_revenue: revenue,
            })
            .collect()
    }

    /// Trip count and mean distance inside and outside the peak window.
    ///
    /// Always returns two rows, off-peak first.
    pub fn peak_congestion(&self, trips: &[DerivedTrip]) -> Vec<PeakCongestionRow> {
        // index 0 = off-peak, 1 = peak
        let mut counts = [0usize; 2];
        let mut distance_sums = [0.0f64; 2];

        for t in trips {
            let bucket = usize::from(t.is_peak);
            counts[bucket] += 1;
            distance_sums[bucket] += t.trip.trip_distance;
        }

        [false, true]
            .into_iter()
            .map(|is_peak| {
                let bucket = usize::from(is_peak);
                PeakCongestionRow {
                    is_peak,
                    trip_count: counts[bucket] as i64,
                    avg_trip_distance: mean(distance_sums[bucket], counts[bucket]),
                }
            })
            .collect()
    }

    /// Trips whose revenue per mile exceeds the configured threshold, in input order.
    pub fn high_value_trips(&self, trips: &[DerivedTrip]) -> Vec<HighValueTripRow> {
        let threshold = self.config.high_value_threshold;

        trips
            .iter()
            .filter_map(|t| {
                let total_amount = t.trip.total_amount?;
                let revenue_per_mile = t.revenue_per_mile?;
                (revenue_per_mile > threshold).then(|| HighValueTripRow {
                    pickup_hour: t.pickup_hour as i32,
                    pickup_month: t.pickup_month as i32,
                    trip_distance: t.trip.trip_distance,
                    total_amount,
                    revenue_per_mile,
                })
            })
            .collect()
    }

    /// Runs the three reductions concurrently on the blocking pool.
    #[tracing::instrument(skip_all, fields(rows = trips.len()))]
    pub async fn compute_views(&self, trips: Arc<Vec<DerivedTrip>>) -> Result<Views> {
        let aggregator = *self;

        let monthly = {
            let trips = Arc::clone(&trips);
            tokio::task::spawn_blocking(move || aggregator.monthly_revenue(&trips))
        };
        let peak = {
            let trips = Arc::clone(&trips);
            tokio::task::spawn_blocking(move || aggregator.peak_congestion(&trips))
        };
        let high_value = {
            let trips = Arc::clone(&trips);
            tokio::task::spawn_blocking(move || aggregator.high_value_trips(&trips))
        };

        let (monthly_revenue, peak_congestion, high_value_trips) =
            tokio::try_join!(monthly, peak, high_value)
                .map_err(|e| EtlError::TaskJoin(e.to_string()))?;

        debug!(
            months = monthly_revenue.len(),
            high_value = high_value_trips.len(),
            "Views computed"
        );
        info!(
            threshold = self.config.high_value_threshold,
            "Aggregation complete"
        );

        Ok(Views {
            monthly_revenue,
            peak_congestion,
            high_value_trips,
        })
    }
}
