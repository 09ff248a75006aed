//! Shared statistical utilities.
//!
//! ## Core Statistics
//!
//! - [`Summary`]: Descriptive statistics (mean, median, std_dev, percentiles)
//! - [`mean`]: Arithmetic mean
//! - [`percentile`]: Percentile calculation (R-7 interpolation)
//!
//! ## Classifier Statistics
//!
//! - [`roc_auc`]: Rank-based ROC-AUC, ties counted as one half
//! - [`Bootstrap`]: Percentile bootstrap confidence intervals with an
//!   injected, seedable resampling source

mod auc;
pub mod bootstrap;

pub use auc::roc_auc;
pub use bootstrap::{Bootstrap, ResampleSource, SeededSampler};

use serde::{Deserialize, Serialize};

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Median value.
    pub median: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// 5th percentile.
    pub p5: f64,
    /// 95th percentile.
    pub p95: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Returns `None` if the slice is empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sorted = sorted_copy(values);

        let count = sorted.len();
        let mean = mean(&sorted);

        let variance: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            median: percentile_sorted(&sorted, 0.5),
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            p5: percentile_sorted(&sorted, 0.05),
            p95: percentile_sorted(&sorted, 0.95),
        })
    }
}

//=============================================================================
// Core Statistical Functions
//=============================================================================

/// Compute arithmetic mean.
///
/// Returns `0.0` for an empty slice.
///
/// # Example
///
/// ```
/// use fair_eval::stats::mean;
///
/// assert!((mean(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 3.0).abs() < 0.001);
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute percentile using linear interpolation (R-7 method).
///
/// This is the default method used by R, NumPy, and Excel.
/// The percentile `p` should be in the range 0.0 to 1.0.
///
/// # Example
///
/// ```
/// use fair_eval::stats::percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert!((percentile(&values, 0.5) - 3.0).abs() < 0.001);  // median
/// assert!((percentile(&values, 0.25) - 2.0).abs() < 0.001); // Q1
/// assert!((percentile(&values, 0.975) - 4.9).abs() < 0.001);
/// ```
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted_copy(values), p)
}

/// Calculate percentile from pre-sorted values. `p` is in `0.0..=1.0`.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let p = p.clamp(0.0, 1.0);

    let idx = p * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Ratio with the zero-denominator convention: `0.0` when `den == 0`.
#[inline]
pub(crate) fn safe_ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
