//! Error types for fairness evaluation.

use thiserror::Error;

/// Result type alias for fair-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a fairness evaluation.
///
/// Statistical edge cases (zero-denominator rates, AUC on a single class)
/// are not errors; they resolve to `0.0` and `None` respectively.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Decision threshold outside `[0, 1]`.
    #[error("Invalid threshold: {value} (expected 0.0-1.0)")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },

    /// A partition is empty or a sample carries an unmapped group tag.
    #[error("Invalid partition: {reason}")]
    InvalidPartition {
        /// What was wrong with the partition.
        reason: String,
    },

    /// Disparity was requested in strict mode with fewer than two groups.
    #[error("Disparity needs at least 2 groups, found {found}")]
    InsufficientGroups {
        /// Number of groups present.
        found: usize,
    },

    /// A required column is absent from the input table.
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },

    /// A predicted probability is outside `[0, 1]` or not a number.
    #[error("Invalid probability at row {index}: {value} (expected 0.0-1.0)")]
    InvalidProbability {
        /// Zero-based row index.
        index: usize,
        /// The rejected value.
        value: f64,
    },

    /// The scoring adapter returned a vector not aligned with the table.
    #[error("Score vector length mismatch: expected {expected}, got {actual}")]
    ScoreLength {
        /// Number of rows in the table.
        expected: usize,
        /// Number of scores returned.
        actual: usize,
    },

    /// Two embeddings have different lengths.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the first embedding.
        expected: usize,
        /// Length of the second embedding.
        actual: usize,
    },

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error reported by an external scoring or embedding adapter.
    #[error("Adapter error ({adapter}): {message}")]
    Adapter {
        /// Adapter identifier.
        adapter: String,
        /// Error message from the adapter.
        message: String,
    },

    /// Error importing CSV data.
    #[error("CSV import error at line {line}: {reason}")]
    CsvImport {
        /// Line number where the error occurred.
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A fairness metric crossed its policy threshold.
    #[error("Fairness check failed: {metric} = {value:.3} (threshold: {threshold})")]
    FairnessCheckFailed {
        /// Name of the flagged metric.
        metric: String,
        /// Observed value.
        value: f64,
        /// Policy threshold.
        threshold: f64,
    },

    /// Error writing report files.
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Reject thresholds outside `[0, 1]` (NaN included).
pub(crate) fn check_threshold(value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_threshold_bounds() {
        assert!(check_threshold(0.0).is_ok());
        assert!(check_threshold(1.0).is_ok());
        assert!(check_threshold(0.5).is_ok());
        assert!(matches!(
            check_threshold(1.01),
            Err(Error::InvalidThreshold { .. })
        ));
        assert!(check_threshold(-0.1).is_err());
        assert!(check_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::MissingColumn {
            column: "label".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required column: label");

        let err = Error::FairnessCheckFailed {
            metric: "disparate_impact".to_string(),
            value: 0.4,
            threshold: 0.8,
        };
        assert!(err.to_string().contains("0.400"));
    }
}
