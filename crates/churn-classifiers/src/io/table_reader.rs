//! CSV / TSV reader producing a `Table` with per-column type inference.
use std::path::Path;

use csv::StringRecord;

use crate::data_handling::{Cell, Column, Scalar, Table};
use crate::error::{ChurnError, Result};

/// Configuration for reading delimited tabular files.
#[derive(Debug, Clone)]
pub struct TableReaderConfig {
    /// Field delimiter. When `None` it is chosen from the file extension
    /// (`.tsv` / `.tab` use tabs, everything else commas).
    pub delimiter: Option<u8>,
    /// Cell values (after trimming) that are read as missing.
    pub missing_markers: Vec<String>,
}

impl Default for TableReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            missing_markers: vec![
                String::new(),
                "NA".to_string(),
                "NaN".to_string(),
                "null".to_string(),
            ],
        }
    }
}

/// Read a delimited file into a `Table` using the default configuration.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    read_table_with_config(path, &TableReaderConfig::default())
}

/// Read a delimited file into a `Table`.
///
/// Column headers are kept exactly as written; reconciling them with a
/// schema is the normalizer's job. A column becomes numeric when every
/// non-missing cell parses as a number, otherwise all of its cells stay text.
pub fn read_table_with_config<P: AsRef<Path>>(path: P, config: &TableReaderConfig) -> Result<Table> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| delimiter_for(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        push_record(&record, &mut raw, config, row_idx)?;
    }

    let columns = headers
        .iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();

    let table = Table::from_columns(columns)?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        table.nrows(),
        table.ncols(),
        path.display()
    );
    Ok(table)
}

fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

fn push_record(
    record: &StringRecord,
    raw: &mut [Vec<Option<String>>],
    config: &TableReaderConfig,
    row_idx: usize,
) -> Result<()> {
    if record.len() != raw.len() {
        return Err(ChurnError::InvalidTable(format!(
            "row {} has {} fields, expected {}",
            row_idx + 1,
            record.len(),
            raw.len()
        )));
    }
    for (cells, value) in raw.iter_mut().zip(record.iter()) {
        let trimmed = value.trim();
        if config.missing_markers.iter().any(|m| m == trimmed) {
            cells.push(None);
        } else {
            cells.push(Some(trimmed.to_string()));
        }
    }
    Ok(())
}

fn infer_column(name: &str, cells: Vec<Option<String>>) -> Column {
    let all_numeric = cells
        .iter()
        .flatten()
        .all(|value| value.parse::<f64>().is_ok());

    let values: Vec<Cell> = if all_numeric {
        cells
            .into_iter()
            .map(|cell| cell.and_then(|v| v.parse::<f64>().ok()).map(Scalar::Number))
            .collect()
    } else {
        cells.into_iter().map(|cell| cell.map(Scalar::Text)).collect()
    };
    Column::new(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn infers_numeric_and_text_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("churn.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Tenure Months,Total Charges,Contract").unwrap();
        writeln!(file, "1,29.85,Month-to-month").unwrap();
        writeln!(file, "34, ,One year").unwrap();
        writeln!(file, "2,108.15,Two year").unwrap();
        drop(file);

        let table = read_table(&path).unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(
            table.column_names(),
            vec!["Tenure Months", "Total Charges", "Contract"]
        );
        assert!(table.column("Tenure Months").unwrap().is_numeric());

        let charges = table.column("Total Charges").unwrap();
        assert_eq!(charges.values[0], Some(Scalar::Number(29.85)));
        assert_eq!(charges.values[1], None);

        let contract = table.column("Contract").unwrap();
        assert_eq!(contract.values[1], Some(Scalar::Text("One year".to_string())));
    }

    #[test]
    fn tsv_extension_switches_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("churn.tsv");
        std::fs::write(&path, "tenure\tContract\n5\tOne year\n").unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.column_names(), vec!["tenure", "Contract"]);
        assert_eq!(table.row(0)[0], Some(Scalar::Number(5.0)));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_table("/nonexistent/churn.csv").is_err());
    }
}
