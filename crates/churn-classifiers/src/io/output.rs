use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::data_handling::Table;
use crate::error::{ChurnError, Result};
use crate::inference::PredictionResult;

/// Serialize `value` as pretty JSON and replace `path` atomically.
///
/// The document is written to a sibling temporary file which is then renamed
/// over the destination, so readers never observe a partial write.
pub fn write_json_atomic<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Write `table` followed by `prediction`, `probability` and `risk_level`
/// columns as CSV.
pub fn write_scored_table<W: Write>(
    writer: W,
    table: &Table,
    results: &[PredictionResult],
) -> Result<()> {
    if results.len() != table.nrows() {
        return Err(ChurnError::InvalidTable(format!(
            "{} predictions for {} rows",
            results.len(),
            table.nrows()
        )));
    }

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = table.column_names();
    header.extend(["prediction", "probability", "risk_level"].map(String::from));
    wtr.write_record(&header)?;

    for (idx, result) in results.iter().enumerate() {
        let mut record: Vec<String> = table
            .row(idx)
            .into_iter()
            .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default())
            .collect();
        record.push(result.prediction.to_string());
        record.push(format!("{:.4}", result.probability));
        record.push(result.risk_level.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
