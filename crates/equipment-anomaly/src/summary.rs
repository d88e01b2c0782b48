//! Upload summary: record count, per-parameter averages and the category
//! distribution shown next to the table.

use crate::format::{display_cell, round_to};
use crate::types::{CellValue, Table, cell};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Maximum number of categories kept in the distribution.
pub const MAX_DISTRIBUTION_CATEGORIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Summary statistics for an uploaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_count: usize,
    /// Mean per numeric column, rounded to 2 decimals. Keys are lowercased
    /// with spaces replaced by underscores (`"Flow Rate"` -> `"flow_rate"`).
    pub averages: BTreeMap<String, f64>,
    /// Most frequent values of `distribution_column`, most common first.
    pub type_distribution: Vec<CategoryCount>,
    pub column_names: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub distribution_column: Option<String>,
}

/// How a column's cells are typed as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every present cell is a finite number.
    Numeric,
    /// At least one present cell is text (or a non-finite number).
    Categorical,
    /// No present cells.
    Empty,
}

/// Classify a column for summary purposes.
///
/// This is stricter than the analyzer's notion of "numeric": a column mixing
/// numbers and text is categorical here but still analyzed for anomalies.
pub fn column_kind(table: &Table, column: &str) -> ColumnKind {
    let mut saw_value = false;
    for value in table.column_values(column) {
        match value {
            CellValue::Missing => {}
            v if v.is_finite_number() => saw_value = true,
            _ => return ColumnKind::Categorical,
        }
    }
    if saw_value {
        ColumnKind::Numeric
    } else {
        ColumnKind::Empty
    }
}

/// Normalize a column name into an averages key.
pub fn average_key(column: &str) -> String {
    column.to_lowercase().replace(' ', "_")
}

impl DatasetSummary {
    pub fn from_table(table: &Table) -> Self {
        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();
        for column in &table.columns {
            match column_kind(table, column) {
                ColumnKind::Numeric => numeric_columns.push(column.clone()),
                ColumnKind::Categorical => categorical_columns.push(column.clone()),
                ColumnKind::Empty => {}
            }
        }

        let averages = numeric_columns
            .iter()
            .map(|column| {
                let (sum, n) = table
                    .column_values(column)
                    .filter_map(CellValue::as_finite)
                    .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
                let avg = if n > 0 { round_to(sum / n as f64, 2) } else { 0.0 };
                (average_key(column), avg)
            })
            .collect();

        let distribution_column = categorical_columns
            .first()
            .or_else(|| table.columns.first())
            .cloned();

        let type_distribution = distribution_column
            .as_deref()
            .map(|column| value_counts(table, column, MAX_DISTRIBUTION_CATEGORIES))
            .unwrap_or_default();

        Self {
            total_count: table.height(),
            averages,
            type_distribution,
            column_names: table.columns.clone(),
            numeric_columns,
            categorical_columns,
            distribution_column,
        }
    }
}

/// Count distinct non-missing values, most frequent first, ties by value.
pub fn value_counts(table: &Table, column: &str, limit: usize) -> Vec<CategoryCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        let value = cell(row, column);
        if value.is_missing() {
            continue;
        }
        *counts.entry(display_cell(value)).or_insert(0) += 1;
    }

    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount { value, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;
    use pretty_assertions::assert_eq;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        let columns: Vec<String> = columns.iter().map(|s| s.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| -> Row { columns.iter().cloned().zip(values).collect() })
            .collect();
        Table::new(columns, rows)
    }

    fn equipment() -> Table {
        table(
            &["Equipment Name", "Type", "Flowrate", "Pressure"],
            vec![
                vec!["Pump-1".into(), "Pump".into(), 120.0.into(), 5.2.into()],
                vec!["Pump-2".into(), "Pump".into(), 130.0.into(), 5.4.into()],
                vec!["Valve-1".into(), "Valve".into(), 60.0.into(), CellValue::Missing],
                vec!["HX-1".into(), "HeatExchanger".into(), 150.5.into(), 6.1.into()],
            ],
        )
    }

    #[test]
    fn test_summary_columns_and_counts() {
        let summary = DatasetSummary::from_table(&equipment());
        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.numeric_columns, vec!["Flowrate", "Pressure"]);
        assert_eq!(summary.categorical_columns, vec!["Equipment Name", "Type"]);
        assert_eq!(summary.distribution_column.as_deref(), Some("Equipment Name"));
    }

    #[test]
    fn test_summary_averages_rounded_and_keyed() {
        let summary = DatasetSummary::from_table(&equipment());
        // (120 + 130 + 60 + 150.5) / 4 = 115.125, an exact tie
        assert_eq!(summary.averages["flowrate"], 115.12);
        // (5.2 + 5.4 + 6.1) / 3 = 5.5666...
        assert_eq!(summary.averages["pressure"], 5.57);
    }

    #[test]
    fn test_average_key() {
        assert_eq!(average_key("Flow Rate"), "flow_rate");
        assert_eq!(average_key("Temperature"), "temperature");
    }

    #[test]
    fn test_value_counts_ordering() {
        let counts = value_counts(&equipment(), "Type", 10);
        assert_eq!(
            counts,
            vec![
                CategoryCount { value: "Pump".to_string(), count: 2 },
                CategoryCount { value: "HeatExchanger".to_string(), count: 1 },
                CategoryCount { value: "Valve".to_string(), count: 1 },
            ]
        );
        assert_eq!(value_counts(&equipment(), "Type", 1).len(), 1);
    }

    #[test]
    fn test_distribution_falls_back_to_first_column() {
        let t = table(&["a", "b"], vec![vec![1.0.into(), 2.0.into()], vec![1.0.into(), 3.0.into()]]);
        let summary = DatasetSummary::from_table(&t);
        assert!(summary.categorical_columns.is_empty());
        assert_eq!(summary.distribution_column.as_deref(), Some("a"));
        assert_eq!(summary.type_distribution[0], CategoryCount { value: "1".to_string(), count: 2 });
    }

    #[test]
    fn test_column_kind() {
        let t = table(
            &["num", "mixed", "empty"],
            vec![
                vec![1.0.into(), 1.0.into(), CellValue::Missing],
                vec![2.0.into(), "n/a".into(), CellValue::Missing],
            ],
        );
        assert_eq!(column_kind(&t, "num"), ColumnKind::Numeric);
        assert_eq!(column_kind(&t, "mixed"), ColumnKind::Categorical);
        assert_eq!(column_kind(&t, "empty"), ColumnKind::Empty);
    }
}
