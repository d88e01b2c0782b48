//! Caller-owned memo for analysis results.
//!
//! A rendering layer re-renders far more often than its data changes. The
//! cache keeps the last `(data, columns) -> result` pair and recomputes only
//! when a structural hash of the inputs changes. It is owned by the caller;
//! the analyzer itself keeps no state between calls.

use crate::analyzer::DatasetAnalyzer;
use crate::types::{AnalysisResult, CellValue, Row};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Memo of the most recent analysis.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    analyzer: DatasetAnalyzer,
    entry: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

#[derive(Debug)]
struct CacheEntry {
    key: u64,
    row_count: usize,
    columns: Vec<String>,
    result: Option<AnalysisResult>,
}

impl CacheEntry {
    /// Hash match, confirmed by shape so a key collision between tables of
    /// different shape never serves a stale result.
    fn matches(&self, key: u64, data: &[Row], columns: &[String]) -> bool {
        self.key == key && self.row_count == data.len() && self.columns == columns
    }
}

impl AnalysisCache {
    pub fn new(analyzer: DatasetAnalyzer) -> Self {
        Self {
            analyzer,
            ..Self::default()
        }
    }

    /// Return the analysis for `(data, columns)`, recomputing only when the
    /// inputs differ from the previous call.
    ///
    /// The "no analysis" outcome (`None`) is memoized like any other.
    pub fn get_or_analyze(&mut self, data: &[Row], columns: &[String]) -> Option<&AnalysisResult> {
        let key = input_key(data, columns);

        let fresh = matches!(&self.entry, Some(entry) if entry.matches(key, data, columns));
        if fresh {
            self.hits += 1;
        } else {
            self.misses += 1;
            debug!("Analysis inputs changed, recomputing");
            self.entry = Some(CacheEntry {
                key,
                row_count: data.len(),
                columns: columns.to_vec(),
                result: self.analyzer.analyze_dataset(data, columns),
            });
        }

        self.entry.as_ref().and_then(|entry| entry.result.as_ref())
    }

    /// Drop the memoized result.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

static_assertions::assert_impl_all!(AnalysisCache: Send);

/// Structural hash of the analysis inputs.
///
/// Rows hash their cells in the caller's column order, so key order inside
/// a row map does not matter. Numbers hash by bit pattern.
fn input_key(data: &[Row], columns: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    columns.hash(&mut hasher);
    data.len().hash(&mut hasher);
    for row in data {
        for column in columns {
            hash_cell(row.get(column), &mut hasher);
        }
    }
    hasher.finish()
}

fn hash_cell<H: Hasher>(value: Option<&CellValue>, state: &mut H) {
    match value {
        None | Some(CellValue::Missing) => 0u8.hash(state),
        Some(CellValue::Number(x)) => {
            1u8.hash(state);
            x.to_bits().hash(state);
        }
        Some(CellValue::Text(s)) => {
            2u8.hash(state);
            s.hash(state);
        }
    }
}
