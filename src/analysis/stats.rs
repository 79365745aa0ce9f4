//! Descriptive statistics over `f64` slices.
//!
//! Non-finite values are never passed in by the aggregator; callers filter
//! them first with [`finite_sorted`].

use crate::error::StatsError;
use crate::models::BoxStats;

/// Finite values from an iterator, sorted ascending.
pub fn finite_sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    finite.sort_by(|a, b| a.total_cmp(b));
    finite
}

/// Median of the finite values; NaN when there are none.
///
/// Even-length inputs average the two central values.
pub fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    let sorted = finite_sorted(values);
    quantile_sorted(&sorted, 0.5).unwrap_or(f64::NAN)
}

/// `p`-quantile of ascending data by linear interpolation between closest
/// ranks (`h = (n - 1) * p`).
///
/// Returns `None` for empty input or `p` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        Some(sorted[n - 1])
    } else {
        Some(sorted[j] + g * (sorted[j + 1] - sorted[j]))
    }
}

/// Tukey box-plot summary of ascending data.
///
/// Whiskers are the most extreme observed values within
/// `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`. At least two values are required, all
/// of them finite.
pub fn box_stats(sorted: &[f64]) -> Result<BoxStats, StatsError> {
    if sorted.len() < 2 {
        return Err(StatsError::TooFewValues {
            needed: 2,
            got: sorted.len(),
        });
    }
    if sorted.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite);
    }
    if sorted.windows(2).any(|w| w[0] > w[1]) {
        return Err(StatsError::Unsorted);
    }

    let quartile = |p: f64| quantile_sorted(sorted, p).unwrap_or(f64::NAN);
    let q1 = quartile(0.25);
    let median = quartile(0.5);
    let q3 = quartile(0.75);

    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|v| *v >= low_fence)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= high_fence)
        .unwrap_or(q3);

    Ok(BoxStats {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        count: sorted.len(),
    })
}

/// Smallest and largest finite values.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
