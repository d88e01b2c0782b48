//! Cell classification against Tukey fences, and tooltip text.

use crate::config::DetectorConfig;
use crate::format::to_fixed;
use crate::types::{AnomalyInfo, AnomalyType, CellValue, ColumnStatistics, Severity};

/// Classify one value against its column statistics.
///
/// Extreme fences are checked before mild ones, so a value is only "mild"
/// when it lies between the two. With `iqr == 0` both fence pairs collapse
/// onto `q1`/`q3` and any deviation is classified as extreme.
pub fn detect_anomaly(value: &CellValue, stats: Option<&ColumnStatistics>) -> AnomalyInfo {
    let (Some(stats), Some(value)) = (stats, value.as_finite()) else {
        return AnomalyInfo::NONE;
    };

    if value < stats.lower_extreme {
        AnomalyInfo::flagged(AnomalyType::Low, Severity::Extreme)
    } else if value > stats.upper_extreme {
        AnomalyInfo::flagged(AnomalyType::High, Severity::Extreme)
    } else if value < stats.lower_bound {
        AnomalyInfo::flagged(AnomalyType::Low, Severity::Mild)
    } else if value > stats.upper_bound {
        AnomalyInfo::flagged(AnomalyType::High, Severity::Mild)
    } else {
        AnomalyInfo::NONE
    }
}

/// Tooltip text for a classified cell, with the default configuration.
///
/// Empty when the cell is not an anomaly. The percent-from-mean figure is
/// `|value - mean| / mean * 100` and is not guarded: a zero mean renders as
/// `Infinity` (or `NaN` when the value is also zero).
pub fn anomaly_tooltip(
    anomaly: &AnomalyInfo,
    stats: Option<&ColumnStatistics>,
    value: &CellValue,
) -> String {
    anomaly_tooltip_with(anomaly, stats, value, &DetectorConfig::default())
}

/// Tooltip text honoring `config.guard_zero_mean`.
pub fn anomaly_tooltip_with(
    anomaly: &AnomalyInfo,
    stats: Option<&ColumnStatistics>,
    value: &CellValue,
    config: &DetectorConfig,
) -> String {
    if !anomaly.is_anomaly {
        return String::new();
    }
    let (Some(stats), Some(value), Some(anomaly_type), Some(severity)) = (
        stats,
        value.as_finite(),
        anomaly.anomaly_type,
        anomaly.severity,
    ) else {
        return String::new();
    };

    let direction = anomaly_type.direction();
    let bound = match anomaly_type {
        AnomalyType::High => stats.upper_bound,
        AnomalyType::Low => stats.lower_bound,
    };
    let deviation_from_bound = to_fixed((value - bound).abs(), 2);

    let mean_clause = if config.guard_zero_mean && stats.mean == 0.0 {
        format!("{direction} the column mean (mean is zero)")
    } else {
        let percent_from_mean = (value - stats.mean).abs() / stats.mean * 100.0;
        format!("{}% {direction} the column mean", to_fixed(percent_from_mean, 1))
    };

    match severity {
        Severity::Extreme => format!(
            "Extreme anomaly: value is {mean_clause} and {deviation_from_bound} {direction} the expected range"
        ),
        Severity::Mild => format!("Possible anomaly: value is {mean_clause}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::calculate_statistics;

    fn scenario_stats() -> ColumnStatistics {
        let values: Vec<CellValue> = [10.0, 12.0, 11.0, 13.0, 100.0]
            .into_iter()
            .map(CellValue::Number)
            .collect();
        calculate_statistics(&values).unwrap()
    }

    fn zero_mean_stats() -> ColumnStatistics {
        ColumnStatistics {
            q1: -1.0,
            q3: 1.0,
            iqr: 2.0,
            median: 0.0,
            mean: 0.0,
            min: -1.0,
            max: 1.0,
            lower_bound: -4.0,
            upper_bound: 4.0,
            lower_extreme: -7.0,
            upper_extreme: 7.0,
            count: 4,
        }
    }

    // ==================== detect_anomaly tests ====================

    #[test]
    fn test_extreme_high() {
        // bounds [8, 16], extremes [5, 19]
        let stats = scenario_stats();
        let info = detect_anomaly(&CellValue::Number(100.0), Some(&stats));
        assert_eq!(info, AnomalyInfo::flagged(AnomalyType::High, Severity::Extreme));
    }

    #[test]
    fn test_all_five_outcomes() {
        let stats = scenario_stats();
        let cases = [
            (4.0, AnomalyInfo::flagged(AnomalyType::Low, Severity::Extreme)),
            (20.0, AnomalyInfo::flagged(AnomalyType::High, Severity::Extreme)),
            (7.0, AnomalyInfo::flagged(AnomalyType::Low, Severity::Mild)),
            (17.0, AnomalyInfo::flagged(AnomalyType::High, Severity::Mild)),
            (12.0, AnomalyInfo::NONE),
        ];
        for (value, expected) in cases {
            assert_eq!(
                detect_anomaly(&CellValue::Number(value), Some(&stats)),
                expected,
                "value {value}"
            );
        }
    }

    #[test]
    fn test_fence_values_are_not_anomalies() {
        // comparisons are strict
        let stats = scenario_stats();
        assert_eq!(detect_anomaly(&CellValue::Number(16.0), Some(&stats)), AnomalyInfo::NONE);
        assert_eq!(detect_anomaly(&CellValue::Number(8.0), Some(&stats)), AnomalyInfo::NONE);
        assert_eq!(
            detect_anomaly(&CellValue::Number(19.0), Some(&stats)),
            AnomalyInfo::flagged(AnomalyType::High, Severity::Mild)
        );
    }

    #[test]
    fn test_no_stats_or_non_numeric() {
        let stats = scenario_stats();
        assert_eq!(detect_anomaly(&CellValue::Number(1e9), None), AnomalyInfo::NONE);
        assert_eq!(detect_anomaly(&CellValue::from("1e9"), Some(&stats)), AnomalyInfo::NONE);
        assert_eq!(detect_anomaly(&CellValue::Missing, Some(&stats)), AnomalyInfo::NONE);
        assert_eq!(
            detect_anomaly(&CellValue::Number(f64::NAN), Some(&stats)),
            AnomalyInfo::NONE
        );
    }

    #[test]
    fn test_zero_iqr_goes_straight_to_extreme() {
        let values = vec![CellValue::Number(5.0); 6];
        let stats = calculate_statistics(&values).unwrap();
        assert_eq!(stats.iqr, 0.0);
        assert_eq!(
            detect_anomaly(&CellValue::Number(5.01), Some(&stats)),
            AnomalyInfo::flagged(AnomalyType::High, Severity::Extreme)
        );
        assert_eq!(
            detect_anomaly(&CellValue::Number(4.99), Some(&stats)),
            AnomalyInfo::flagged(AnomalyType::Low, Severity::Extreme)
        );
        assert_eq!(detect_anomaly(&CellValue::Number(5.0), Some(&stats)), AnomalyInfo::NONE);
    }

    #[test]
    fn test_is_anomaly_iff_type_and_severity_set() {
        let stats = scenario_stats();
        for value in [-50.0, 0.0, 7.5, 8.0, 12.0, 16.5, 18.0, 25.0, 100.0] {
            let info = detect_anomaly(&CellValue::Number(value), Some(&stats));
            assert_eq!(info.is_anomaly, info.anomaly_type.is_some());
            assert_eq!(info.is_anomaly, info.severity.is_some());
        }
    }

    // ==================== tooltip tests ====================

    #[test]
    fn test_tooltip_empty_for_normal_value() {
        let stats = scenario_stats();
        let value = CellValue::Number(12.0);
        let info = detect_anomaly(&value, Some(&stats));
        assert_eq!(anomaly_tooltip(&info, Some(&stats), &value), "");
    }

    #[test]
    fn test_tooltip_extreme_includes_both_figures() {
        let stats = scenario_stats();
        let value = CellValue::Number(100.0);
        let info = detect_anomaly(&value, Some(&stats));
        let tooltip = anomaly_tooltip(&info, Some(&stats), &value);

        // |100 - 29.2| / 29.2 * 100 = 242.465...; |100 - 16| = 84
        assert!(tooltip.starts_with("Extreme anomaly"));
        assert!(tooltip.contains("242.5%"), "{tooltip}");
        assert!(tooltip.contains("84.00"), "{tooltip}");
        assert!(tooltip.contains("above"));
    }

    #[test]
    fn test_tooltip_deviation_tie_rounds_up() {
        let stats = scenario_stats();
        let value = CellValue::Number(19.125);
        let info = detect_anomaly(&value, Some(&stats));
        assert_eq!(info.severity, Some(Severity::Extreme));

        // |19.125 - 16| = 3.125 exactly
        let tooltip = anomaly_tooltip(&info, Some(&stats), &value);
        assert!(tooltip.contains("and 3.13 above"), "{tooltip}");
    }

    #[test]
    fn test_tooltip_mild_is_softer() {
        let stats = scenario_stats();
        let value = CellValue::Number(7.0);
        let info = detect_anomaly(&value, Some(&stats));
        let tooltip = anomaly_tooltip(&info, Some(&stats), &value);

        // |7 - 29.2| / 29.2 * 100 = 76.027...
        assert!(tooltip.starts_with("Possible anomaly"));
        assert!(tooltip.contains("76.0%"), "{tooltip}");
        assert!(tooltip.contains("below"));
        assert!(!tooltip.contains("expected range"));
    }

    #[test]
    fn test_tooltip_zero_mean_renders_infinity() {
        let stats = zero_mean_stats();
        let value = CellValue::Number(5.0);
        let info = detect_anomaly(&value, Some(&stats));
        assert_eq!(info, AnomalyInfo::flagged(AnomalyType::High, Severity::Mild));

        let tooltip = anomaly_tooltip(&info, Some(&stats), &value);
        assert!(tooltip.contains("Infinity%"), "{tooltip}");
    }

    #[test]
    fn test_tooltip_zero_mean_guarded() {
        let stats = zero_mean_stats();
        let value = CellValue::Number(5.0);
        let info = detect_anomaly(&value, Some(&stats));
        let config = DetectorConfig::builder().guard_zero_mean(true).build().unwrap();

        let tooltip = anomaly_tooltip_with(&info, Some(&stats), &value, &config);
        assert!(!tooltip.contains("Infinity"));
        assert!(tooltip.contains("mean is zero"), "{tooltip}");
        assert!(tooltip.contains("above"));
    }
}
