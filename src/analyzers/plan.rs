//! Human-readable description of how the monthly revenue view is computed.
//!
//! Diagnostic output only. Nothing reads it back.

use std::fmt;

use crate::cleaner::CleanReport;

/// Row counts observed at each step of the monthly revenue computation.
#[derive(Debug, Clone)]
pub struct MonthlyRevenuePlan {
    pub source: String,
    pub clean: CleanReport,
    pub derived_rows: usize,
    pub groups: usize,
}

impl fmt::Display for MonthlyRevenuePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Monthly revenue plan ==")?;
        writeln!(f, "Sort [pickup_month ASC]  rows={}", self.groups)?;
        writeln!(
            f,
            "  Aggregate [group_by=pickup_month, sum(total_amount) AS monthly_revenue]  groups={}",
            self.groups
        )?;
        writeln!(
            f,
            "    Project [pickup_month := month(pickup), total_amount]  rows={}",
            self.derived_rows
        )?;
        writeln!(
            f,
            "      Filter [pickup IS NOT NULL AND dropoff IS NOT NULL AND dropoff >= pickup \
             AND passenger_count > 0 AND trip_distance > 0]  rows_in={} rows_out={}",
            self.clean.input_rows, self.clean.kept_rows
        )?;
        write!(
            f,
            "        Scan [{}]  rows={}",
            self.source, self.clean.input_rows
        )
    }
}

/// Builds the plan text for one run.
pub fn explain_monthly_revenue(
    source: &str,
    clean: &CleanReport,
    derived_rows: usize,
    groups: usize,
) -> String {
    MonthlyRevenuePlan {
        source: source.to_string(),
        clean: clean.clone(),
        derived_rows,
        groups,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_lists_every_step_with_counts() {
        let clean = CleanReport {
            input_rows: 3,
            kept_rows: 1,
            dropoff_before_pickup: 1,
            non_positive_passengers: 1,
            ..Default::default()
        };
        let plan = explain_monthly_revenue("trips.csv", &clean, 1, 1);

        let lines: Vec<_> = plan.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("Sort"));
        assert!(lines[4].contains("rows_in=3 rows_out=1"));
        assert!(lines[5].contains("Scan [trips.csv]"));
    }
}
