//! Arrow representations of the summary views.

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::analyzers::{HighValueTripRow, MonthlyRevenueRow, PeakCongestionRow, ViewName, Views};
use crate::error::Result;

/// Converts a view's rows into a single Arrow [`RecordBatch`].
pub trait ToRecordBatch: Sized {
    fn schema() -> SchemaRef;
    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch>;
}

impl ToRecordBatch for MonthlyRevenueRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("pickup_month", DataType::Int32, false),
            Field::new("monthly_revenue", DataType::Float64, true),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.pickup_month))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.monthly_revenue))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl ToRecordBatch for PeakCongestionRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("is_peak", DataType::Boolean, false),
            Field::new("trip_count", DataType::Int64, false),
            Field::new("avg_trip_distance", DataType::Float64, true),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(BooleanArray::from_iter(rows.iter().map(|r| Some(r.is_peak)))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.trip_count))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.avg_trip_distance))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl ToRecordBatch for HighValueTripRow {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("pickup_hour", DataType::Int32, false),
            Field::new("pickup_month", DataType::Int32, false),
            Field::new("trip_distance", DataType::Float64, false),
            Field::new("total_amount", DataType::Float64, false),
            Field::new("revenue_per_mile", DataType::Float64, false),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.pickup_hour))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.pickup_month))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.trip_distance))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_amount))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.revenue_per_mile))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

/// Builds the record batch for the named view.
pub fn view_batch(views: &Views, name: ViewName) -> Result<RecordBatch> {
    match name {
        ViewName::MonthlyRevenue => MonthlyRevenueRow::to_record_batch(&views.monthly_revenue),
        ViewName::PeakCongestion => PeakCongestionRow::to_record_batch(&views.peak_congestion),
        ViewName::HighValueTrips => HighValueTripRow::to_record_batch(&views.high_value_trips),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn test_monthly_revenue_batch_keeps_nulls() {
        let rows = vec![
            MonthlyRevenueRow { pickup_month: 1, monthly_revenue: Some(10.0) },
            MonthlyRevenueRow { pickup_month: 2, monthly_revenue: None },
        ];
        let batch = MonthlyRevenueRow::to_record_batch(&rows).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).name(), "monthly_revenue");
        assert!(batch.column(1).is_null(1));
    }

    #[test]
    fn test_empty_high_value_batch_has_schema() {
        let batch = HighValueTripRow::to_record_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 5);
    }
}
