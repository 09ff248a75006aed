//! Classification evaluation command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fair_eval::{CsvImporter, EvalSession, RecordSchema};

use super::EvalOptions;

/// Column overrides from the command line.
pub struct Columns {
    pub label: Option<String>,
    pub group: Option<String>,
    pub probability: Option<String>,
    pub id: Option<String>,
    pub positive_label: Option<String>,
}

pub fn run(input: PathBuf, columns: Columns, options: &EvalOptions) -> Result<()> {
    let config = options.to_config()?;
    log::info!("Importing records from: {}", input.display());

    // Build schema
    let mut schema = RecordSchema::builder();
    if let Some(col) = columns.label {
        schema = schema.label_column(col);
    }
    if let Some(col) = columns.group {
        schema = schema.group_column(col);
    }
    if let Some(col) = columns.probability {
        schema = schema.probability_column(col);
    }
    if let Some(col) = columns.id {
        schema = schema.id_column(col);
    }
    if let Some(value) = columns.positive_label {
        schema = schema.positive_label(value);
    }

    let table = CsvImporter::new(schema.build())
        .import(&input)
        .with_context(|| format!("Failed to import CSV from {}", input.display()))?;
    println!("Imported {} records", table.len());

    let session = EvalSession::new(config);
    let records = session.score(&table).context("Failed to score records")?;
    let report = session
        .evaluate_records(&records)
        .context("Evaluation failed")?;

    if options.out_dir.is_some() {
        let path = session.write_predictions(&records)?;
        println!("Predictions: {}", path.display());
    }

    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("fairness");
    options.finish(&session, &report, name)
}
