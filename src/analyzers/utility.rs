/// Computes the arithmetic mean from a running sum. Returns `None` for an empty group.
pub fn mean(sum: f64, count: usize) -> Option<f64> {
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Adds `value` into an accumulator that stays `None` until a value is seen.
///
/// Missing values are skipped, so a group of only missing values sums to `None`.
pub fn add_present(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(a + v),
        (None, v) => v,
        (a, None) => a,
    }
}
