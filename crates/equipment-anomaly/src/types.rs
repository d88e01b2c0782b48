use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Cell values and rows
// ============================================================================

/// A single table cell as delivered by the upload layer.
///
/// Cells in an uploaded sheet can hold numbers, free text or nothing at all,
/// interchangeably per row. Deserializes untagged from JSON numbers, strings
/// and `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

static MISSING: CellValue = CellValue::Missing;

impl CellValue {
    /// The numeric value, if this cell holds a finite number.
    ///
    /// `NaN` and infinities are treated like text: they never contribute to
    /// statistics and are never classified.
    #[inline]
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            CellValue::Number(x) if x.is_finite() => Some(*x),
            _ => None,
        }
    }

    #[inline]
    pub fn is_finite_number(&self) -> bool {
        self.as_finite().is_some()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

/// One table row: column name to cell value.
pub type Row = HashMap<String, CellValue>;

/// Look up a cell, treating an absent key as [`CellValue::Missing`].
#[inline]
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&MISSING)
}

/// A rectangular dataset: ordered column names plus rows in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Project one column across all rows, in row order.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> {
        self.rows.iter().map(move |row| cell(row, column))
    }
}

// ============================================================================
// Statistics and classification
// ============================================================================

/// Distributional statistics for one numeric column.
///
/// Computed once per analysis pass and never updated in place; any change to
/// the column's data requires recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub median: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Mild low fence, `q1 - 1.5 * iqr` by default.
    pub lower_bound: f64,
    /// Mild high fence, `q3 + 1.5 * iqr` by default.
    pub upper_bound: f64,
    /// Extreme low fence, `q1 - 3 * iqr` by default.
    pub lower_extreme: f64,
    /// Extreme high fence, `q3 + 3 * iqr` by default.
    pub upper_extreme: f64,
    /// Number of finite values the statistics were computed from.
    pub count: usize,
}

impl ColumnStatistics {
    /// `lower_extreme <= lower_bound <= upper_bound <= upper_extreme`.
    pub fn fences_ordered(&self) -> bool {
        self.lower_extreme <= self.lower_bound
            && self.lower_bound <= self.upper_bound
            && self.upper_bound <= self.upper_extreme
    }
}

/// Which side of the distribution an anomaly lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyType {
    High,
    Low,
}

impl AnomalyType {
    /// "above" for high values, "below" for low ones.
    pub fn direction(&self) -> &'static str {
        match self {
            AnomalyType::High => "above",
            AnomalyType::Low => "below",
        }
    }
}

/// How far outside the fences an anomaly lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Extreme,
}

/// Classification of a single cell against its column statistics.
///
/// `is_anomaly` is false exactly when both `anomaly_type` and `severity`
/// are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyInfo {
    pub is_anomaly: bool,
    #[serde(rename = "type")]
    pub anomaly_type: Option<AnomalyType>,
    pub severity: Option<Severity>,
}

impl AnomalyInfo {
    /// The "not an anomaly" outcome.
    pub const NONE: AnomalyInfo = AnomalyInfo {
        is_anomaly: false,
        anomaly_type: None,
        severity: None,
    };

    pub fn flagged(anomaly_type: AnomalyType, severity: Severity) -> Self {
        Self {
            is_anomaly: true,
            anomaly_type: Some(anomaly_type),
            severity: Some(severity),
        }
    }

    /// Short label for legends and badges, e.g. "Extreme high".
    pub fn label(&self) -> Option<&'static str> {
        match (self.severity?, self.anomaly_type?) {
            (Severity::Extreme, AnomalyType::High) => Some("Extreme high"),
            (Severity::Extreme, AnomalyType::Low) => Some("Extreme low"),
            (Severity::Mild, AnomalyType::High) => Some("Mild high"),
            (Severity::Mild, AnomalyType::Low) => Some("Mild low"),
        }
    }

    /// Style hook for the table renderer, e.g. `"anomaly-extreme-high"`.
    pub fn highlight_class(&self) -> Option<&'static str> {
        match (self.severity?, self.anomaly_type?) {
            (Severity::Extreme, AnomalyType::High) => Some("anomaly-extreme-high"),
            (Severity::Extreme, AnomalyType::Low) => Some("anomaly-extreme-low"),
            (Severity::Mild, AnomalyType::High) => Some("anomaly-mild-high"),
            (Severity::Mild, AnomalyType::Low) => Some("anomaly-mild-low"),
        }
    }
}

impl Default for AnomalyInfo {
    fn default() -> Self {
        Self::NONE
    }
}

/// Output of one dataset analysis.
///
/// Only valid for the exact `(data, columns)` pair it was computed from;
/// callers must recompute (or go through [`crate::AnalysisCache`]) when
/// either changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Statistics per numeric column. Non-numeric columns have no entry.
    pub column_stats: HashMap<String, ColumnStatistics>,
    /// Anomalous cell count per numeric column.
    pub anomaly_counts: HashMap<String, usize>,
    /// Numeric columns in the caller's column order.
    pub numeric_columns: Vec<String>,
    /// Sum of `anomaly_counts`.
    pub total_anomalies: usize,
}
