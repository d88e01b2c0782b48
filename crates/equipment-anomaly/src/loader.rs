//! CSV ingestion: turns an uploaded file into a [`Table`].
//!
//! Uploads are decoded as UTF-8 (a leading BOM is dropped) and fall back to
//! Windows-1252, which also covers Latin-1 exports from spreadsheet tools.
//! Parsing goes through polars. Numeric columns map to
//! [`CellValue::Number`], nulls to [`CellValue::Missing`] and everything
//! else to [`CellValue::Text`]. Text columns where at least half of the rows
//! parse as formatted numbers (`"1,250.5"`) are coerced to numbers; cells
//! that do not parse become missing. Header names are trimmed, and names
//! that collide afterwards get a `.1`, `.2`, ... suffix.

use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{CellValue, Row, Table};
use crate::utils::{
    NUMERIC_COERCION_RATIO, clean_csv_content, is_numeric_dtype, parse_numeric_string,
};
use encoding_rs::{UTF_8, WINDOWS_1252};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rows sampled for schema inference on the first attempt.
const INFER_SCHEMA_ROWS: usize = 100;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Load a CSV file from disk.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    info!("Loading readings from: {}", path.display());

    let bytes = std::fs::read(path)
        .map_err(AnalysisError::from)
        .context(format!("Reading {}", path.display()))?;
    load_csv_bytes(&bytes)
}

/// Load CSV content already held in memory, e.g. an upload body.
///
/// Parsing is attempted in order of cost:
/// 1. schema inferred from the first rows
/// 2. schema inferred from every row, for columns that turn textual late
/// 3. blank lines and doubled quotes cleaned up, every row inferred
pub fn load_csv_bytes(bytes: &[u8]) -> Result<Table> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalysisError::EmptyDataset);
    }

    let text = decode_upload(bytes);

    let df = match read_frame(text.as_bytes().to_vec(), Some(INFER_SCHEMA_ROWS)) {
        Ok(df) => df,
        Err(e) => {
            debug!("CSV parse with sampled schema failed: {}", e);
            match read_frame(text.as_bytes().to_vec(), None) {
                Ok(df) => df,
                Err(e) => {
                    debug!("CSV parse with full schema scan failed: {}", e);
                    read_frame(clean_csv_content(&text).into_bytes(), None)
                        .map_err(|e| AnalysisError::CsvValidation(e.to_string()))?
                }
            }
        }
    };

    dataframe_to_table(&df)
}

/// Decode upload bytes to text, dropping a UTF-8 BOM.
///
/// Bytes that are not valid UTF-8 are read as Windows-1252, a superset of
/// the printable Latin-1 range.
fn decode_upload(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return text;
    }
    warn!("Upload is not valid UTF-8, decoding as {}", WINDOWS_1252.name());
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text
}

/// `None` scans every row.
fn read_frame(bytes: Vec<u8>, infer_rows: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(infer_rows)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Convert a DataFrame into rows of [`CellValue`]s.
///
/// Column names are trimmed of surrounding whitespace. A name that repeats
/// an earlier one gets the first free `.N` suffix, so `" a"` and `"a"`
/// become `a` and `a.1`.
pub fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    if df.width() == 0 {
        return Err(AnalysisError::NoColumns);
    }
    if df.height() == 0 {
        return Err(AnalysisError::EmptyDataset);
    }

    let height = df.height();
    let mut columns = Vec::with_capacity(df.width());
    let mut rows: Vec<Row> = (0..height).map(|_| Row::with_capacity(df.width())).collect();

    for column in df.get_columns() {
        let name = unique_column_name(column.name().trim(), &columns);
        let series = column.as_materialized_series();
        let values = series_to_cells(series)
            .context(format!("Converting column '{}'", name))?;

        for (row, value) in rows.iter_mut().zip(values) {
            row.insert(name.clone(), value);
        }
        columns.push(name);
    }

    info!("Loaded table: {} rows x {} columns", height, columns.len());
    Ok(Table::new(columns, rows))
}

fn unique_column_name(name: &str, taken: &[String]) -> String {
    if !taken.iter().any(|t| t == name) {
        return name.to_string();
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{name}.{suffix}");
        if !taken.contains(&candidate) {
            debug!("Duplicate column '{}' renamed to '{}'", name, candidate);
            return candidate;
        }
        suffix += 1;
    }
}

fn series_to_cells(series: &Series) -> Result<Vec<CellValue>> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) {
        let floats = series.cast(&DataType::Float64)?;
        return Ok(floats
            .f64()?
            .into_iter()
            .map(|v| v.map(CellValue::Number).unwrap_or_default())
            .collect());
    }

    let strings = series.cast(&DataType::String)?;
    let text: Vec<Option<&str>> = strings.str()?.into_iter().collect();

    let parsed = text
        .iter()
        .filter(|v| v.and_then(parse_numeric_string).is_some())
        .count();

    if !text.is_empty() && parsed as f64 / text.len() as f64 >= NUMERIC_COERCION_RATIO {
        let dropped = text.iter().flatten().count() - parsed;
        if dropped > 0 {
            warn!(
                "Column '{}' coerced to numeric; {} unparseable value(s) treated as missing",
                series.name(),
                dropped
            );
        } else {
            debug!("Column '{}' coerced to numeric", series.name());
        }
        return Ok(text
            .iter()
            .map(|v| v.and_then(parse_numeric_string).into())
            .collect());
    }

    Ok(text
        .into_iter()
        .map(|v| v.map(|s| CellValue::Text(s.to_string())).unwrap_or_default())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cell;

    #[test]
    fn test_load_basic_csv() {
        let csv = b"Equipment Name,Type,Flowrate\nPump-1,Pump,120.5\nValve-1,Valve,60\n";
        let table = load_csv_bytes(csv).unwrap();

        assert_eq!(table.columns, vec!["Equipment Name", "Type", "Flowrate"]);
        assert_eq!(table.height(), 2);
        assert_eq!(cell(&table.rows[0], "Flowrate"), &CellValue::Number(120.5));
        assert_eq!(cell(&table.rows[1], "Type"), &CellValue::from("Valve"));
    }

    #[test]
    fn test_trims_column_names() {
        let csv = b" Pressure , Temperature \n1,2\n";
        let table = load_csv_bytes(csv).unwrap();
        assert_eq!(table.columns, vec!["Pressure", "Temperature"]);
    }

    #[test]
    fn test_nulls_become_missing() {
        let csv = b"a,b\n1,x\n,y\n3,\n";
        let table = load_csv_bytes(csv).unwrap();
        assert!(cell(&table.rows[1], "a").is_missing());
        assert!(cell(&table.rows[2], "b").is_missing());
    }

    #[test]
    fn test_coerces_formatted_numbers() {
        let csv = b"reading\n\"1,200\"\n\"1,350.5\"\noffline\n900\n";
        let table = load_csv_bytes(csv).unwrap();
        let values: Vec<&CellValue> = table.column_values("reading").collect();
        assert_eq!(values[0], &CellValue::Number(1200.0));
        assert_eq!(values[1], &CellValue::Number(1350.5));
        assert!(values[2].is_missing());
        assert_eq!(values[3], &CellValue::Number(900.0));
    }

    #[test]
    fn test_text_after_sampled_rows_is_coerced() {
        let mut csv = String::from("name,temp\n");
        for i in 0..150 {
            csv.push_str(&format!("p{},{}\n", i, 10 + i % 5));
        }
        csv.push_str("bad,offline\n");

        let table = load_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.height(), 151);
        assert_eq!(cell(&table.rows[0], "temp"), &CellValue::Number(10.0));
        assert_eq!(cell(&table.rows[149], "temp"), &CellValue::Number(14.0));
        assert!(cell(&table.rows[150], "temp").is_missing());
    }

    #[test]
    fn test_latin1_upload_is_decoded() {
        let csv = b"Station,Temp \xb0C\nGen\xe8ve,21.5\n";
        let table = load_csv_bytes(csv).unwrap();
        assert_eq!(table.columns, vec!["Station", "Temp \u{b0}C"]);
        assert_eq!(cell(&table.rows[0], "Station"), &CellValue::from("Gen\u{e8}ve"));
        assert_eq!(cell(&table.rows[0], "Temp \u{b0}C"), &CellValue::Number(21.5));
    }

    #[test]
    fn test_utf8_bom_is_dropped() {
        let csv = b"\xEF\xBB\xBFPressure,Temperature\n1,2\n";
        let table = load_csv_bytes(csv).unwrap();
        assert_eq!(table.columns, vec!["Pressure", "Temperature"]);
        assert_eq!(cell(&table.rows[0], "Pressure"), &CellValue::Number(1.0));
    }

    #[test]
    fn test_colliding_trimmed_names_are_suffixed() {
        let csv = b" a,a,a.1\n1,2,3\n";
        let table = load_csv_bytes(csv).unwrap();
        assert_eq!(table.columns, vec!["a", "a.1", "a.1.1"]);
        assert_eq!(cell(&table.rows[0], "a"), &CellValue::Number(1.0));
        assert_eq!(cell(&table.rows[0], "a.1"), &CellValue::Number(2.0));
        assert_eq!(cell(&table.rows[0], "a.1.1"), &CellValue::Number(3.0));
    }

    #[test]
    fn test_mostly_text_column_stays_text() {
        let csv = b"status\nok\nfault\n12\nok\n";
        let table = load_csv_bytes(csv).unwrap();
        assert_eq!(cell(&table.rows[2], "status"), &CellValue::from("12"));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(load_csv_bytes(b""), Err(AnalysisError::EmptyDataset)));
        assert!(matches!(load_csv_bytes(b"  \n "), Err(AnalysisError::EmptyDataset)));
    }

    #[test]
    fn test_header_only_rejected() {
        let err = load_csv_bytes(b"a,b\n").unwrap_err();
        assert!(err.is_validation_error(), "{err}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
