//! `churn score`: batch predictions for every row of a CSV/TSV file.
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use churn_classifiers::inference::InferenceService;
use churn_classifiers::io::{read_table, write_scored_table};

use crate::util::{output_writer, validate_tsv_or_csv_file};

/// Score `data_path` and write the input rows plus prediction columns to
/// `output` (stdout when `None`). Returns the number of scored rows.
pub fn run_scoring(
    model_path: &Path,
    schema_path: &Path,
    data_path: &str,
    output: Option<&PathBuf>,
) -> Result<usize> {
    validate_tsv_or_csv_file(data_path)?;

    let service = InferenceService::load(model_path, schema_path);
    let table = read_table(data_path)
        .with_context(|| format!("Failed to read input table: {}", data_path))?;
    let results = service.score_table(&table)?;

    let mut writer = output_writer(output)?;
    write_scored_table(&mut writer, &table, &results)?;
    writer.flush()?;
    Ok(results.len())
}
