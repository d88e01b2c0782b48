//! Equipment Reading Anomaly Detection
//!
//! Statistical outlier detection for uploaded tables of equipment readings,
//! plus the cell metadata a table view needs to highlight them.
//!
//! # Overview
//!
//! - **Statistics** ([`stats`]): quartiles, median, mean and Tukey fences per
//!   column, using a floor-index quartile estimator
//! - **Classification** ([`detector`]): none / mild / extreme, high or low,
//!   with tooltip text
//! - **Dataset analysis** ([`analyzer`]): numeric-column detection, per-column
//!   statistics and anomaly counts
//! - **Table view** ([`table`]): annotated cells, highlight toggle, text search
//! - **Upload summary** ([`summary`]) and **CSV loading** ([`loader`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use equipment_anomaly::{DatasetAnalyzer, TableAnnotator, loader};
//!
//! let table = loader::load_csv("readings.csv")?;
//! let analysis = DatasetAnalyzer::default().analyze_table(&table);
//!
//! if let Some(result) = &analysis {
//!     println!("{} anomalies found", result.total_anomalies);
//! }
//!
//! let rows = TableAnnotator::new(&table, analysis.as_ref()).annotate_all();
//! for cell in rows.iter().flat_map(|r| &r.cells) {
//!     if let Some(class) = cell.highlight {
//!         println!("{} [{}]: {}", cell.display, class, cell.tooltip);
//!     }
//! }
//! ```
//!
//! # Caching
//!
//! Analysis is pure and recomputed from scratch on every call. Renderers that
//! redraw frequently should hold an [`AnalysisCache`], which recomputes only
//! when the `(data, columns)` pair changes.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod detector;
pub mod error;
pub mod format;
pub mod loader;
pub mod stats;
pub mod summary;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analyzer::{AnomalousCell, DatasetAnalyzer, analyze_dataset};
pub use cache::AnalysisCache;
pub use config::{ConfigValidationError, DetectorConfig, DetectorConfigBuilder};
pub use detector::{anomaly_tooltip, anomaly_tooltip_with, detect_anomaly};
pub use error::{AnalysisError, Result as AnomalyResult, ResultExt};
pub use stats::{calculate_statistics, calculate_statistics_f64, calculate_statistics_with};
pub use summary::DatasetSummary;
pub use table::{AnnotatedCell, AnnotatedRow, SearchResult, TableAnnotator, search_rows};
pub use types::{
    AnalysisResult, AnomalyInfo, AnomalyType, CellValue, ColumnStatistics, Row, Severity, Table,
};
