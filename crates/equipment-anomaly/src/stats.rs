//! Per-column distributional statistics.
//!
//! Quartiles use a floor-index positional estimator with no interpolation:
//! `q1 = sorted[floor(n * 0.25)]`, `median = sorted[floor(n * 0.5)]`,
//! `q3 = sorted[floor(n * 0.75)]`. Tooltips and highlight thresholds depend
//! on these exact values, so this must not be swapped for an interpolated
//! percentile.

use crate::config::DetectorConfig;
use crate::types::{CellValue, ColumnStatistics};

/// Compute statistics over the finite numbers in `values`, using the
/// default fence multipliers.
///
/// Returns `None` when no finite number is present, meaning no anomaly can
/// be reported for the column.
pub fn calculate_statistics<'a, I>(values: I) -> Option<ColumnStatistics>
where
    I: IntoIterator<Item = &'a CellValue>,
{
    calculate_statistics_with(values, &DetectorConfig::default())
}

/// Same as [`calculate_statistics`] with explicit fence multipliers.
pub fn calculate_statistics_with<'a, I>(
    values: I,
    config: &DetectorConfig,
) -> Option<ColumnStatistics>
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let finite: Vec<f64> = values.into_iter().filter_map(CellValue::as_finite).collect();
    statistics_from_finite(finite, config)
}

/// Compute statistics over raw floats; non-finite entries are dropped.
pub fn calculate_statistics_f64(
    values: &[f64],
    config: &DetectorConfig,
) -> Option<ColumnStatistics> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    statistics_from_finite(finite, config)
}

fn statistics_from_finite(
    mut sorted: Vec<f64>,
    config: &DetectorConfig,
) -> Option<ColumnStatistics> {
    if sorted.is_empty() {
        return None;
    }

    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();

    let q1 = sorted[quantile_index(n, 0.25)];
    let median = sorted[quantile_index(n, 0.5)];
    let q3 = sorted[quantile_index(n, 0.75)];
    let iqr = q3 - q1;

    let mean = sorted.iter().sum::<f64>() / n as f64;

    Some(ColumnStatistics {
        q1,
        q3,
        iqr,
        median,
        mean,
        min: sorted[0],
        max: sorted[n - 1],
        lower_bound: q1 - config.mild_multiplier * iqr,
        upper_bound: q3 + config.mild_multiplier * iqr,
        lower_extreme: q1 - config.extreme_multiplier * iqr,
        upper_extreme: q3 + config.extreme_multiplier * iqr,
        count: n,
    })
}

/// `floor(n * p)`; always a valid index for `n >= 1` and `p < 1`.
#[inline]
fn quantile_index(n: usize, p: f64) -> usize {
    (n as f64 * p) as usize
}
