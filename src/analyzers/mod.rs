//! Summary views over the derived trip dataset.
//!
//! This module computes monthly revenue, peak-window congestion and
//! high-value trips, and can describe how the monthly revenue view is
//! produced for diagnostics.

pub mod aggregate;
pub mod plan;
pub mod types;
pub mod utility;

pub use aggregate::{Aggregator, AggregatorConfig, DEFAULT_HIGH_VALUE_THRESHOLD};
pub use types::{HighValueTripRow, MonthlyRevenueRow, PeakCongestionRow, ViewName, Views};
