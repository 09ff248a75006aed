//! Input table import.
//!
//! Classification runs read a CSV with one row per record. At minimum the
//! importer expects columns for:
//! - The true label
//! - The protected-group tag
//! - Either a predicted probability or the feature columns a scoring
//!   adapter needs
//!
//! Every required column is checked before any row is parsed, so a missing
//! column surfaces as [`Error::MissingColumn`] before metric computation.
//!
//! Verification runs read a JSON array of [`FaceSample`] rows via
//! [`load_face_samples`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use fair_eval::import::{CsvImporter, RecordSchema};
//!
//! let schema = RecordSchema::builder()
//!     .label_column("approved")
//!     .group_column("gender")
//!     .probability_column("score")
//!     .build();
//!
//! let table = CsvImporter::new(schema).import("predictions.csv")?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pairs::FaceSample;

/// One parsed input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Row identifier; the 1-based data row number when no id column exists.
    pub id: String,
    /// Whether the label column matched the positive label (numerically
    /// when both parse as numbers).
    pub label: bool,
    /// Raw protected-attribute value.
    pub group: String,
    /// Predicted probability, when the table carries one.
    pub probability: Option<f64>,
    /// Augmentation tag, when the table carries one.
    pub augmentation: Option<String>,
    /// Feature values in `RecordTable::feature_columns` order, opaque here.
    pub features: Vec<String>,
}

/// Parsed input table, ready for scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    /// Names of the feature columns passed to a scoring adapter.
    pub feature_columns: Vec<String>,
    /// Rows in file order.
    pub rows: Vec<TableRow>,
}

impl RecordTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Probabilities for every row, or `None` if any row lacks one.
    #[must_use]
    pub fn probabilities(&self) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| r.probability).collect()
    }
}

/// Column mapping for CSV import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSchema {
    /// Column name for the row identifier.
    pub id_column: Option<String>,
    /// Column name for the true label.
    pub label_column: Option<String>,
    /// Column name for the protected-group tag.
    pub group_column: Option<String>,
    /// Column name for the predicted probability.
    pub probability_column: Option<String>,
    /// Column name for the augmentation tag.
    pub augmentation_column: Option<String>,
    /// Feature columns handed to a scoring adapter.
    pub feature_columns: Vec<String>,
    /// Label value treated as the positive class.
    pub positive_label: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            id_column: None,
            label_column: None,
            group_column: None,
            probability_column: None,
            augmentation_column: None,
            feature_columns: Vec::new(),
            positive_label: "1".to_string(),
        }
    }
}

impl RecordSchema {
    /// Create a schema builder.
    #[must_use]
    pub fn builder() -> RecordSchemaBuilder {
        RecordSchemaBuilder::default()
    }

    /// Create a schema that auto-detects columns from common names.
    #[must_use]
    pub fn auto_detect() -> Self {
        Self::default()
    }

    /// Resolve a column: the configured name must exist; otherwise try aliases.
    fn resolve(
        headers: &[&str],
        configured: Option<&str>,
        aliases: &[&str],
    ) -> Result<Option<usize>> {
        if let Some(name) = configured {
            return find_header_index(headers, name)
                .map(Some)
                .ok_or_else(|| missing(name));
        }
        Ok(aliases.iter().find_map(|alias| find_header_index(headers, alias)))
    }
}

fn missing(column: &str) -> Error {
    Error::MissingColumn {
        column: column.to_string(),
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug, Default)]
pub struct RecordSchemaBuilder {
    schema: RecordSchema,
}

impl RecordSchemaBuilder {
    /// Set the id column name.
    #[must_use]
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.schema.id_column = Some(name.into());
        self
    }

    /// Set the label column name.
    #[must_use]
    pub fn label_column(mut self, name: impl Into<String>) -> Self {
        self.schema.label_column = Some(name.into());
        self
    }

    /// Set the group column name.
    #[must_use]
    pub fn group_column(mut self, name: impl Into<String>) -> Self {
        self.schema.group_column = Some(name.into());
        self
    }

    /// Set the probability column name.
    #[must_use]
    pub fn probability_column(mut self, name: impl Into<String>) -> Self {
        self.schema.probability_column = Some(name.into());
        self
    }

    /// Set the augmentation column name.
    #[must_use]
    pub fn augmentation_column(mut self, name: impl Into<String>) -> Self {
        self.schema.augmentation_column = Some(name.into());
        self
    }

    /// Set the feature columns.
    #[must_use]
    pub fn feature_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.feature_columns = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the positive label value.
    #[must_use]
    pub fn positive_label(mut self, value: impl Into<String>) -> Self {
        self.schema.positive_label = value.into();
        self
    }

    /// Build the schema.
    #[must_use]
    pub fn build(self) -> RecordSchema {
        self.schema
    }
}

/// Resolved column positions.
struct Columns {
    id: Option<usize>,
    label: usize,
    group: usize,
    probability: Option<usize>,
    augmentation: Option<usize>,
    features: Vec<usize>,
}

/// CSV importer for labelled, grouped records.
pub struct CsvImporter {
    schema: RecordSchema,
}

impl CsvImporter {
    /// Create a new importer with the given schema.
    #[must_use]
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    /// Create an importer that auto-detects columns.
    #[must_use]
    pub fn auto_detect() -> Self {
        Self::new(RecordSchema::auto_detect())
    }

    /// Import records from a CSV file.
    pub fn import(&self, path: impl AsRef<Path>) -> Result<RecordTable> {
        let reader = csv::Reader::from_path(path.as_ref())?;
        self.read(reader)
    }

    /// Import records from any CSV source.
    pub fn read<R: std::io::Read>(&self, mut reader: csv::Reader<R>) -> Result<RecordTable> {
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let columns = self.resolve_columns(&header_refs)?;

        let mut rows = Vec::new();
        for (line_num, record) in reader.records().enumerate() {
            let line = line_num + 2; // +2 for 1-based and header
            let record = record.map_err(|e| Error::CsvImport {
                line,
                reason: e.to_string(),
            })?;
            let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

            let probability = match columns.probability {
                Some(idx) => Some(parse_probability(cell(idx), line)?),
                None => None,
            };

            let label = parse_label(cell(columns.label), &self.schema.positive_label, line)?;

            rows.push(TableRow {
                id: columns
                    .id
                    .map_or_else(|| (line_num + 1).to_string(), |idx| cell(idx).to_string()),
                label,
                group: cell(columns.group).to_string(),
                probability,
                augmentation: columns.augmentation.map(|idx| cell(idx).to_string()),
                features: columns.features.iter().map(|&idx| cell(idx).to_string()).collect(),
            });
        }

        log::info!("Imported {} rows", rows.len());
        Ok(RecordTable {
            feature_columns: self.schema.feature_columns.clone(),
            rows,
        })
    }

    fn resolve_columns(&self, headers: &[&str]) -> Result<Columns> {
        let s = &self.schema;

        let label = RecordSchema::resolve(
            headers,
            s.label_column.as_deref(),
            &["label", "target", "y_true", "outcome"],
        )?
        .ok_or_else(|| missing("label"))?;

        let group = RecordSchema::resolve(
            headers,
            s.group_column.as_deref(),
            &["group", "sensitive_attribute", "protected_group", "demographic"],
        )?
        .ok_or_else(|| missing("group"))?;

        let id = RecordSchema::resolve(headers, s.id_column.as_deref(), &["id", "record_id"])?;

        let augmentation = RecordSchema::resolve(
            headers,
            s.augmentation_column.as_deref(),
            &["augmentation", "aug"],
        )?;

        let features = s
            .feature_columns
            .iter()
            .map(|name| find_header_index(headers, name).ok_or_else(|| missing(name)))
            .collect::<Result<Vec<_>>>()?;

        let probability = RecordSchema::resolve(
            headers,
            s.probability_column.as_deref(),
            &["probability", "prob", "y_prob", "score"],
        )?;
        if probability.is_none() && features.is_empty() {
            return Err(missing("probability"));
        }

        Ok(Columns {
            id,
            label,
            group,
            probability,
            augmentation,
            features,
        })
    }
}

fn parse_probability(raw: &str, line: usize) -> Result<f64> {
    raw.parse::<f64>().map_err(|e| Error::CsvImport {
        line,
        reason: format!("invalid probability {raw:?}: {e}"),
    })
}

/// Match a label cell against the positive label.
///
/// Numeric cells compare by value, so `1.0` matches a positive label of `1`.
fn parse_label(raw: &str, positive: &str, line: usize) -> Result<bool> {
    if raw.is_empty() {
        return Err(Error::CsvImport {
            line,
            reason: "empty label".to_string(),
        });
    }
    match (raw.parse::<f64>(), positive.trim().parse::<f64>()) {
        (Ok(value), Ok(target)) => Ok(value == target),
        _ => Ok(raw == positive),
    }
}

/// Find a header index by name (case-insensitive).
fn find_header_index(headers: &[&str], name: &str) -> Option<usize> {
    let name_lower = name.to_lowercase();
    headers.iter().position(|h| h.trim().to_lowercase() == name_lower)
}

/// Load embedded face samples from a JSON array.
pub fn load_face_samples(path: impl AsRef<Path>) -> Result<Vec<FaceSample>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let samples: Vec<FaceSample> = serde_json::from_str(&content)?;
    log::info!("Loaded {} face samples", samples.len());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(schema: RecordSchema, data: &str) -> Result<RecordTable> {
        CsvImporter::new(schema).read(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn test_schema_builder() {
        let schema = RecordSchema::builder()
            .label_column("approved")
            .group_column("gender")
            .feature_columns(["income", "age"])
            .positive_label("yes")
            .build();

        assert_eq!(schema.label_column, Some("approved".to_string()));
        assert_eq!(schema.group_column, Some("gender".to_string()));
        assert_eq!(schema.feature_columns, vec!["income", "age"]);
        assert_eq!(schema.positive_label, "yes");
    }

    #[test]
    fn test_find_header_index() {
        let headers = ["Label", "Group", "Probability"];
        assert_eq!(find_header_index(&headers, "label"), Some(0));
        assert_eq!(find_header_index(&headers, "PROBABILITY"), Some(2));
        assert_eq!(find_header_index(&headers, "unknown"), None);
    }

    #[test]
    fn test_auto_detect_import() {
        let data = "id,label,group,probability\nr1,1,A,0.9\nr2,0,B,0.2\n";
        let table = read(RecordSchema::auto_detect(), data).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].id, "r1");
        assert!(table.rows[0].label);
        assert!(!table.rows[1].label);
        assert_eq!(table.rows[1].group, "B");
        assert_eq!(table.probabilities(), Some(vec![0.9, 0.2]));
    }

    #[test]
    fn test_positive_label_mapping() {
        let data = "outcome,gender,score\napproved,f,0.7\ndenied,m,0.4\n";
        let schema = RecordSchema::builder()
            .group_column("gender")
            .positive_label("approved")
            .build();
        let table = read(schema, data).unwrap();
        assert!(table.rows[0].label);
        assert!(!table.rows[1].label);
        assert_eq!(table.rows[0].id, "1");
    }

    #[test]
    fn test_missing_label_column() {
        let data = "group,probability\nA,0.5\n";
        let err = read(RecordSchema::auto_detect(), data).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column } if column == "label"));
    }

    #[test]
    fn test_missing_configured_column() {
        let data = "label,group,probability\n1,A,0.5\n";
        let schema = RecordSchema::builder().group_column("race").build();
        let err = read(schema, data).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column } if column == "race"));
    }

    #[test]
    fn test_missing_feature_column() {
        let data = "label,group,income\n1,A,100\n";
        let schema = RecordSchema::builder()
            .feature_columns(["income", "age"])
            .build();
        let err = read(schema, data).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column } if column == "age"));
    }

    #[test]
    fn test_no_probability_and_no_features() {
        let data = "label,group\n1,A\n";
        let err = read(RecordSchema::auto_detect(), data).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column } if column == "probability"));
    }

    #[test]
    fn test_features_without_probability() {
        let data = "label,group,income,age\n1,A,100,30\n0,B,50,41\n";
        let schema = RecordSchema::builder()
            .feature_columns(["age", "income"])
            .build();
        let table = read(schema, data).unwrap();
        assert_eq!(table.probabilities(), None);
        assert_eq!(table.rows[1].features, vec!["41", "50"]);
        assert_eq!(table.feature_columns, vec!["age", "income"]);
    }

    #[test]
    fn test_bad_probability_reports_line() {
        let data = "label,group,probability\n1,A,0.5\n0,B,high\n";
        let err = read(RecordSchema::auto_detect(), data).unwrap_err();
        assert!(matches!(err, Error::CsvImport { line: 3, .. }));
    }

    #[test]
    fn test_load_face_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "a.jpg", "identity": "p1", "group": "A", "embedding": [1.0, 0.0]},
                {"id": "a_blur.jpg", "identity": "p1", "group": "A", "augmentation": "blur", "embedding": [0.9, 0.1]}
            ]"#,
        )
        .unwrap();
        let samples = load_face_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].augmentation, "original");
        assert_eq!(samples[1].augmentation, "blur");
    }

    #[test]
    fn test_float_formatted_labels() {
        let data = "label,group,probability\n1.0,A,0.9\n0.0,A,0.1\n1.0,B,0.8\n";
        let table = read(RecordSchema::auto_detect(), data).unwrap();
        let positives = table.rows.iter().filter(|r| r.label).count();
        assert_eq!(positives, 2);
        assert!(!table.rows[1].label);
    }

    #[test]
    fn test_empty_label_reports_line() {
        let data = "label,group,probability\n1,A,0.9\n,B,0.4\n";
        let err = read(RecordSchema::auto_detect(), data).unwrap_err();
        assert!(matches!(err, Error::CsvImport { line: 3, .. }));
    }

    #[test]
    fn test_parse_label() {
        assert!(parse_label("1", "1", 2).unwrap());
        assert!(parse_label("1.00", "1", 2).unwrap());
        assert!(!parse_label("0", "1", 2).unwrap());
        assert!(parse_label("yes", "yes", 2).unwrap());
        assert!(!parse_label("Yes", "yes", 2).unwrap());
        assert!(!parse_label("approved", "1", 2).unwrap());
    }
}
