//! CLI entry point: analyze a CSV of equipment readings for outliers.

use anyhow::{Result, anyhow};
use clap::Parser;
use equipment_anomaly::{
    AnalysisError, AnalysisResult, AnnotatedRow, AnomalousCell, DatasetAnalyzer, DatasetSummary,
    DetectorConfig, Table, TableAnnotator, loader,
};
use serde::Serialize;
use std::path::Path;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Detect outliers in equipment readings",
    long_about = "Flags unusual readings in a CSV file using Tukey fences on each numeric column.\n\n\
                  A value outside Q1 - 1.5*IQR .. Q3 + 1.5*IQR is a mild anomaly; outside\n\
                  Q1 - 3*IQR .. Q3 + 3*IQR it is extreme.\n\n\
                  EXAMPLES:\n  \
                  # Report all anomalies\n  \
                  equipment-anomaly -i readings.csv\n\n  \
                  # Only look at two parameters, with the upload summary\n  \
                  equipment-anomaly -i readings.csv -c Pressure -c Temperature --summary\n\n  \
                  # Show only valve rows that contain an anomaly\n  \
                  equipment-anomaly -i readings.csv -s valve --only-anomalies\n\n  \
                  # Machine-readable output\n  \
                  equipment-anomaly -i readings.csv --json | jq .analysis.total_anomalies"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Restrict analysis to these columns (repeatable)
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// Only show rows whose text matches this search
    #[arg(short, long)]
    search: Option<String>,

    /// Only show rows containing at least one anomalous cell
    #[arg(long)]
    only_anomalies: bool,

    /// IQR multiplier for mild anomalies
    #[arg(long, default_value = "1.5")]
    mild_multiplier: f64,

    /// IQR multiplier for extreme anomalies
    #[arg(long, default_value = "3.0")]
    extreme_multiplier: f64,

    /// Replace the percent-from-mean figure when a column mean is zero
    #[arg(long)]
    guard_zero_mean: bool,

    /// Include the upload summary (averages and category distribution)
    #[arg(long)]
    summary: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the human-readable report
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a str,
    rows: usize,
    columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<DatasetSummary>,
    analysis: Option<&'a AnalysisResult>,
    anomalies: Vec<AnomalousCell>,
    table: Vec<AnnotatedRow>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = DetectorConfig::builder()
        .mild_multiplier(args.mild_multiplier)
        .extreme_multiplier(args.extreme_multiplier)
        .guard_zero_mean(args.guard_zero_mean)
        .build()?;

    let table = match loader::load_csv(&args.input) {
        Ok(table) => table,
        Err(e) => {
            error!("Could not load {}: {}", args.input, e);
            return Err(e.into());
        }
    };

    let columns = select_columns(&table, &args.columns)?;
    let analyzer = DatasetAnalyzer::new(config);
    let analysis = analyzer.analyze_dataset(&table.rows, &columns);

    let annotator = TableAnnotator::new(&table, analysis.as_ref()).with_config(config);
    let view = annotator.view_rows(args.search.as_deref(), args.only_anomalies);
    if args.search.is_some() || args.only_anomalies {
        info!("Showing {} of {} records", view.len(), table.height());
    }

    let anomalies: Vec<AnomalousCell> = analysis
        .as_ref()
        .map(|result| {
            result
                .anomalous_cells(&table.rows, &config)
                .into_iter()
                .filter(|c| view.binary_search(&c.row_index).is_ok())
                .collect()
        })
        .unwrap_or_default();
    let rows = annotator.annotate_rows(&view);

    if args.json {
        let report = JsonReport {
            input: &args.input,
            rows: table.height(),
            columns: table.width(),
            summary: args.summary.then(|| DatasetSummary::from_table(&table)),
            analysis: analysis.as_ref(),
            anomalies,
            table: rows,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&args, &table, &columns, analysis.as_ref(), &anomalies, &rows);
    Ok(())
}

/// Resolve the `--column` filter against the table header.
fn select_columns(table: &Table, requested: &[String]) -> Result<Vec<String>, AnalysisError> {
    if requested.is_empty() {
        return Ok(table.columns.clone());
    }
    for name in requested {
        if !table.columns.contains(name) {
            return Err(AnalysisError::ColumnNotFound(name.clone()));
        }
    }
    // keep header order
    Ok(table
        .columns
        .iter()
        .filter(|c| requested.contains(c))
        .cloned()
        .collect())
}

/// Print the human-readable report.
///
/// Uses `println!` on purpose: this is the command's primary output and must
/// show regardless of log level.
fn print_report(
    args: &Args,
    table: &Table,
    columns: &[String],
    analysis: Option<&AnalysisResult>,
    anomalies: &[AnomalousCell],
    rows: &[AnnotatedRow],
) {
    println!();
    println!("{}", "=".repeat(80));
    println!("ANOMALY REPORT");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Input: {} ({} rows x {} columns)",
        args.input,
        table.height(),
        table.width()
    );

    if args.summary {
        print_summary(&DatasetSummary::from_table(table));
    }

    let Some(result) = analysis else {
        println!();
        println!("No data to analyze.");
        println!("{}", "=".repeat(80));
        return;
    };

    println!(
        "Numeric columns: {} of {}    Total anomalies: {}",
        result.numeric_columns.len(),
        columns.len(),
        result.total_anomalies
    );
    println!();

    println!("COLUMN STATISTICS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>9}",
        "Column", "Count", "Q1", "Median", "Q3", "Mean", "Upper", "Anomalies"
    );
    println!("{}", "-".repeat(92));
    for column in &result.numeric_columns {
        if let Some(stats) = result.stats(column) {
            println!(
                "{:<20} {:>6} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>9}",
                truncate_str(column, 19),
                stats.count,
                stats.q1,
                stats.median,
                stats.q3,
                stats.mean,
                stats.upper_bound,
                result.column_anomalies(column)
            );
        }
    }
    println!();

    println!("ANOMALIES");
    println!("{}", "-".repeat(40));
    if anomalies.is_empty() {
        println!("  No anomalies detected");
    } else {
        for cell in anomalies {
            println!(
                "  row {:<5} {:<20} {:>12.2}  [{}] {}",
                cell.row_index + 1,
                truncate_str(&cell.column, 19),
                cell.value,
                cell.info.label().unwrap_or("Anomaly"),
                cell.tooltip
            );
        }
    }
    println!();

    print_rows(table, rows);
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

/// Print the visible rows; anomalous cells are marked with `*`.
fn print_rows(table: &Table, rows: &[AnnotatedRow]) {
    println!("ROWS ({} of {})", rows.len(), table.height());
    println!("{}", "-".repeat(40));
    if rows.is_empty() {
        println!("  No rows to show");
        println!();
        return;
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{:<15}", truncate_str(c, 14)))
        .collect();
    println!("  {:<5} {}", "row", header.join(" "));
    for row in rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|c| {
                let marker = if c.anomaly.is_anomaly { "*" } else { "" };
                format!("{:<15}", truncate_str(&format!("{}{}", c.display, marker), 14))
            })
            .collect();
        println!("  {:<5} {}", row.row_index + 1, cells.join(" "));
    }
    println!();
}

fn print_summary(summary: &DatasetSummary) {
    println!();
    println!("UPLOAD SUMMARY");
    println!("{}", "-".repeat(40));
    println!("  Records: {}", summary.total_count);
    for (key, avg) in &summary.averages {
        println!("  Average {}: {:.2}", key, avg);
    }
    if let Some(column) = &summary.distribution_column {
        println!("  Distribution by {}:", column);
        for entry in &summary.type_distribution {
            println!("    {:<24} {}", truncate_str(&entry.value, 23), entry.count);
        }
    }
    println!();
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
