//! Lightweight evaluation helpers for model testing.
//!
//! These helpers provide simple APIs for common use cases:
//! - Evaluate in-memory predictions without building a table
//! - Fail a CI test when a report carries a fairness flag
//!
//! # Example
//!
//! ```rust,ignore
//! use fair_eval::eval::helpers::{assert_fair, evaluate_predictions};
//! use fair_eval::EvalConfig;
//!
//! let report = evaluate_predictions(&labels, &probabilities, &groups, &EvalConfig::default())?;
//! assert_fair(&report)?;
//! ```

use crate::error::{Error, Result};
use crate::eval::report::EvaluationReport;
use crate::eval::session::{EvalConfig, EvalSession};
use crate::records::SampleRecord;

/// Evaluate parallel slices of labels, probabilities and group tags.
///
/// # Errors
///
/// Returns an error if:
/// - The slices differ in length
/// - A probability is outside `[0, 1]`
/// - A group tag is empty, or the configuration is invalid
pub fn evaluate_predictions(
    labels: &[bool],
    probabilities: &[f64],
    groups: &[&str],
    config: &EvalConfig,
) -> Result<EvaluationReport> {
    for len in [probabilities.len(), groups.len()] {
        if len != labels.len() {
            return Err(Error::ScoreLength {
                expected: labels.len(),
                actual: len,
            });
        }
    }

    let records = labels
        .iter()
        .zip(probabilities)
        .zip(groups)
        .enumerate()
        .map(|(index, ((&label, &probability), &group))| {
            if !(0.0..=1.0).contains(&probability) {
                return Err(Error::InvalidProbability {
                    index,
                    value: probability,
                });
            }
            Ok(SampleRecord {
                id: index.to_string(),
                label,
                group: group.to_string(),
                probability,
                predicted: probability >= config.threshold,
                augmentation: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    EvalSession::new(config.clone()).evaluate_records(&records)
}

/// Fail with the first raised flag.
///
/// Flags are in policy-table order, so the reported metric is stable.
///
/// # Example
///
/// ```rust,ignore
/// let report = session.evaluate_table(&table)?;
/// assert_fair(&report)?;
/// ```
pub fn assert_fair(report: &EvaluationReport) -> Result<()> {
    match report.flags.first() {
        Some(flag) => Err(Error::FairnessCheckFailed {
            metric: flag.metric.key().to_string(),
            value: flag.value,
            threshold: flag.threshold,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EvalConfig {
        EvalConfig::builder().no_bootstrap().build().unwrap()
    }

    #[test]
    fn test_evaluate_predictions() {
        let report = evaluate_predictions(
            &[true, false, true, false],
            &[0.9, 0.2, 0.8, 0.1],
            &["A", "A", "B", "B"],
            &config(),
        )
        .unwrap();
        assert_eq!(report.group_metrics.len(), 2);
        assert!((report.overall.accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_predictions_length_mismatch() {
        let err = evaluate_predictions(&[true, false], &[0.9], &["A", "B"], &config()).unwrap_err();
        assert!(matches!(err, Error::ScoreLength { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_group_named_overall_rejected() {
        let err = evaluate_predictions(
            &[true, false],
            &[0.9, 0.2],
            &["overall", "A"],
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPartition { .. }));
    }

    #[test]
    fn test_assert_fair_pass() {
        let report = evaluate_predictions(
            &[true, false, true, false],
            &[0.9, 0.2, 0.8, 0.1],
            &["A", "A", "B", "B"],
            &config(),
        )
        .unwrap();
        assert!(assert_fair(&report).is_ok());
    }

    #[test]
    fn test_assert_fair_fail() {
        let report = evaluate_predictions(
            &[true, true, true, true],
            &[0.9, 0.8, 0.9, 0.1],
            &["A", "A", "B", "B"],
            &config(),
        )
        .unwrap();
        match assert_fair(&report) {
            Err(Error::FairnessCheckFailed { metric, value, .. }) => {
                assert_eq!(metric, "disparate_impact");
                assert!((value - 0.5).abs() < 1e-12);
            }
            other => panic!("expected FairnessCheckFailed, got {other:?}"),
        }
    }
}
