//! Centered moving average used by both changepoint detectors
//!
//! Element `i` of the output is the mean of `y[i - W/2 .. i + ceil(W/2))`,
//! clipped to the series bounds. Near the edges the window shrinks instead of
//! leaving the value undefined, so the output always has the input's length.

/// Default smoothing window, in observations
pub const DEFAULT_WINDOW: usize = 10;

/// Bounds `[start, end)` of the window centered on `index`
///
/// For an even `window` the window holds one more element before `index`
/// than after it, matching a centered rolling mean with `min_periods = 1`.
pub fn window_bounds(index: usize, len: usize, window: usize) -> (usize, usize) {
    let window = window.max(1);
    let before = window / 2;
    let after = window - before;
    let start = index.saturating_sub(before);
    let end = (index + after).min(len);
    (start, end)
}

/// Centered moving average with shrinking edge windows
///
/// Returns an empty vector for empty input; callers are expected to pass a
/// non-empty series.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let len = values.len();
    (0..len)
        .map(|i| {
            let (start, end) = window_bounds(i, len, window);
            let slice = &values[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`); `None` for an empty slice
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}
