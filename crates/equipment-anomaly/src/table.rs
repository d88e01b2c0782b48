//! Cell annotation for the data-table view.
//!
//! The table widget renders every cell with its display text and, when
//! highlighting is switched on, an anomaly class and tooltip. It also
//! offers a free-text search that hides non-matching rows.

use crate::config::DetectorConfig;
use crate::detector::{anomaly_tooltip_with, detect_anomaly};
use crate::format::display_cell;
use crate::types::{AnalysisResult, AnomalyInfo, Row, Table, cell};
use serde::Serialize;

/// Everything the renderer needs for one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedCell {
    pub column: String,
    pub display: String,
    pub anomaly: AnomalyInfo,
    /// Empty unless the cell is highlighted.
    pub tooltip: String,
    /// CSS-style class when highlighted, e.g. `anomaly-mild-low`.
    pub highlight: Option<&'static str>,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRow {
    pub row_index: usize,
    pub cells: Vec<AnnotatedCell>,
}

/// Annotates a table against an analysis of that same table.
///
/// `analysis` is `None` when the analyzer returned its "no analysis"
/// sentinel; cells then render plain.
pub struct TableAnnotator<'a> {
    table: &'a Table,
    analysis: Option<&'a AnalysisResult>,
    config: DetectorConfig,
    highlight: bool,
}

impl<'a> TableAnnotator<'a> {
    pub fn new(table: &'a Table, analysis: Option<&'a AnalysisResult>) -> Self {
        Self {
            table,
            analysis,
            config: DetectorConfig::default(),
            highlight: true,
        }
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggle anomaly highlighting. Classification still runs so counts in
    /// the legend stay correct; only tooltip and class are suppressed.
    pub fn highlight(mut self, enabled: bool) -> Self {
        self.highlight = enabled;
        self
    }

    /// Whether the anomaly legend/toggle should be shown at all.
    pub fn has_anomalies(&self) -> bool {
        self.analysis.is_some_and(|a| a.total_anomalies > 0)
    }

    /// Annotate a single cell.
    pub fn annotate_cell(&self, row: &Row, column: &str) -> AnnotatedCell {
        let value = cell(row, column);
        let stats = self.analysis.and_then(|a| a.stats(column));
        let anomaly = detect_anomaly(value, stats);

        let (tooltip, highlight) = if self.highlight && anomaly.is_anomaly {
            (
                anomaly_tooltip_with(&anomaly, stats, value, &self.config),
                anomaly.highlight_class(),
            )
        } else {
            (String::new(), None)
        };

        AnnotatedCell {
            column: column.to_string(),
            display: display_cell(value),
            anomaly,
            tooltip,
            highlight,
        }
    }

    /// Annotate one row in column order.
    pub fn annotate_row(&self, row_index: usize) -> Option<AnnotatedRow> {
        let row = self.table.rows.get(row_index)?;
        Some(AnnotatedRow {
            row_index,
            cells: self
                .table
                .columns
                .iter()
                .map(|column| self.annotate_cell(row, column))
                .collect(),
        })
    }

    /// Annotate the given rows, skipping indices out of range.
    pub fn annotate_rows(&self, indices: &[usize]) -> Vec<AnnotatedRow> {
        indices
            .iter()
            .filter_map(|&index| self.annotate_row(index))
            .collect()
    }

    /// Annotate every row.
    pub fn annotate_all(&self) -> Vec<AnnotatedRow> {
        (0..self.table.height())
            .filter_map(|index| self.annotate_row(index))
            .collect()
    }

    /// Indices of rows containing at least one anomalous cell.
    pub fn anomalous_rows(&self) -> Vec<usize> {
        let Some(analysis) = self.analysis else {
            return Vec::new();
        };
        self.table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                analysis
                    .numeric_columns
                    .iter()
                    .any(|column| analysis.classify(column, cell(row, column)).is_anomaly)
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Rows a view shows, in table order: those matching `query` (all rows
    /// when `None`), optionally narrowed to rows with an anomalous cell.
    pub fn view_rows(&self, query: Option<&str>, only_anomalies: bool) -> Vec<usize> {
        let mut rows = match query {
            Some(query) => search_rows(self.table, query).visible_rows,
            None => (0..self.table.height()).collect(),
        };
        if only_anomalies {
            let anomalous = self.anomalous_rows();
            rows.retain(|index| anomalous.binary_search(index).is_ok());
        }
        rows
    }
}

/// Result of a text search over the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub visible_rows: Vec<usize>,
    pub total_rows: usize,
    pub label: String,
}

/// Case-insensitive substring search over the display text of every cell.
///
/// An empty query matches all rows.
pub fn search_rows(table: &Table, query: &str) -> SearchResult {
    let needle = query.to_lowercase();
    let visible_rows: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            needle.is_empty()
                || table
                    .columns
                    .iter()
                    .any(|column| display_cell(cell(row, column)).to_lowercase().contains(&needle))
        })
        .map(|(index, _)| index)
        .collect();

    let total_rows = table.height();
    let label = if needle.is_empty() {
        format!("{} records", total_rows)
    } else {
        format!("Showing {} of {} records", visible_rows.len(), total_rows)
    };

    SearchResult {
        visible_rows,
        total_rows,
        label,
    }
}
