//! Dataset-level anomaly analysis.
//!
//! Runs the statistics engine and classifier over every numeric column of a
//! table and aggregates anomaly counts for the rendering layer.

use crate::config::DetectorConfig;
use crate::detector::{anomaly_tooltip, anomaly_tooltip_with, detect_anomaly};
use crate::stats::calculate_statistics_with;
use crate::types::{AnalysisResult, AnomalyInfo, CellValue, ColumnStatistics, Row, Table, cell};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Analyzes whole tables.
///
/// Holds only configuration; every call is a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetAnalyzer {
    config: DetectorConfig,
}

impl DatasetAnalyzer {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze `data` over `columns`.
    ///
    /// Returns `None` when there are no rows or no columns; callers should
    /// show no anomaly UI in that case. A column is numeric when at least one
    /// of its cells is a finite number. Text, missing and `NaN` cells in a
    /// numeric column are excluded from its statistics and never counted.
    pub fn analyze_dataset(&self, data: &[Row], columns: &[String]) -> Option<AnalysisResult> {
        if data.is_empty() || columns.is_empty() {
            debug!("Skipping anomaly analysis: no rows or no columns");
            return None;
        }

        let mut column_stats = HashMap::new();
        let mut anomaly_counts = HashMap::new();
        let mut numeric_columns = Vec::new();

        for column in columns {
            let is_numeric = data.iter().any(|row| cell(row, column).is_finite_number());
            if !is_numeric {
                debug!("Column '{}' has no numeric values, skipping", column);
                continue;
            }

            let Some(stats) =
                calculate_statistics_with(data.iter().map(|row| cell(row, column)), &self.config)
            else {
                continue;
            };

            let count = data
                .iter()
                .filter(|row| detect_anomaly(cell(row, column), Some(&stats)).is_anomaly)
                .count();

            debug!(
                "Column '{}': n={}, q1={}, q3={}, iqr={}, anomalies={}",
                column, stats.count, stats.q1, stats.q3, stats.iqr, count
            );

            numeric_columns.push(column.clone());
            column_stats.insert(column.clone(), stats);
            anomaly_counts.insert(column.clone(), count);
        }

        let total_anomalies = anomaly_counts.values().sum();
        info!(
            "Analyzed {} rows: {} numeric of {} columns, {} anomalies",
            data.len(),
            numeric_columns.len(),
            columns.len(),
            total_anomalies
        );

        Some(AnalysisResult {
            column_stats,
            anomaly_counts,
            numeric_columns,
            total_anomalies,
        })
    }

    /// Convenience wrapper over [`Self::analyze_dataset`] for a [`Table`].
    pub fn analyze_table(&self, table: &Table) -> Option<AnalysisResult> {
        self.analyze_dataset(&table.rows, &table.columns)
    }

    /// Tooltip for one cell using this analyzer's configuration.
    pub fn tooltip(&self, result: &AnalysisResult, column: &str, value: &CellValue) -> String {
        let stats = result.stats(column);
        let info = detect_anomaly(value, stats);
        anomaly_tooltip_with(&info, stats, value, &self.config)
    }
}

/// Analyze with the default configuration.
pub fn analyze_dataset(data: &[Row], columns: &[String]) -> Option<AnalysisResult> {
    DatasetAnalyzer::default().analyze_dataset(data, columns)
}

/// One anomalous cell, located by row index and column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalousCell {
    pub row_index: usize,
    pub column: String,
    pub value: f64,
    pub info: AnomalyInfo,
    pub tooltip: String,
}

impl AnalysisResult {
    /// Statistics for a column, `None` for non-numeric or unknown columns.
    pub fn stats(&self, column: &str) -> Option<&ColumnStatistics> {
        self.column_stats.get(column)
    }

    /// Anomaly count for a column; zero for non-numeric columns.
    pub fn column_anomalies(&self, column: &str) -> usize {
        self.anomaly_counts.get(column).copied().unwrap_or(0)
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.column_stats.contains_key(column)
    }

    /// Classify one cell of `column`. This is the per-render entry point.
    pub fn classify(&self, column: &str, value: &CellValue) -> AnomalyInfo {
        detect_anomaly(value, self.stats(column))
    }

    /// Tooltip for one cell of `column` with the default configuration.
    ///
    /// Empty for cells that are not anomalous.
    pub fn tooltip(&self, column: &str, value: &CellValue) -> String {
        let stats = self.stats(column);
        anomaly_tooltip(&detect_anomaly(value, stats), stats, value)
    }

    /// Every anomalous cell of `data`, in row order then column order.
    ///
    /// `data` must be the rows this result was computed from.
    pub fn anomalous_cells(&self, data: &[Row], config: &DetectorConfig) -> Vec<AnomalousCell> {
        let mut cells = Vec::with_capacity(self.total_anomalies);
        for (row_index, row) in data.iter().enumerate() {
            for column in &self.numeric_columns {
                let value = cell(row, column);
                let stats = self.stats(column);
                let info = detect_anomaly(value, stats);
                if let (true, Some(x)) = (info.is_anomaly, value.as_finite()) {
                    cells.push(AnomalousCell {
                        row_index,
                        column: column.clone(),
                        value: x,
                        info,
                        tooltip: anomaly_tooltip_with(&info, stats, value, config),
                    });
                }
            }
        }
        cells
    }
}

static_assertions::assert_impl_all!(AnalysisResult: Send, Sync);
static_assertions::assert_impl_all!(DatasetAnalyzer: Send, Sync);
