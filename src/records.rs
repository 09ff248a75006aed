//! Scored classification records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, check_threshold};
use crate::import::RecordTable;
use crate::metrics::Scored;

/// One record after scoring. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Row identifier from the input table.
    pub id: String,
    /// True outcome.
    pub label: bool,
    /// Protected group after mapping.
    pub group: String,
    /// Predicted probability of the positive class.
    pub probability: f64,
    /// Prediction at the threshold the record was built with.
    pub predicted: bool,
    /// Augmentation tag, when the table carries one.
    pub augmentation: Option<String>,
}

impl Scored for SampleRecord {
    fn label(&self) -> bool {
        self.label
    }

    fn score(&self) -> f64 {
        self.probability
    }
}

/// Join a table with its probability vector.
///
/// `probabilities` must be aligned with `table.rows` by position. Each raw
/// group value is passed through `group_map` when one is given; a value the
/// map does not cover is an unmapped group and fails the run.
pub fn score_table(
    table: &RecordTable,
    probabilities: &[f64],
    theta: f64,
    group_map: Option<&BTreeMap<String, String>>,
) -> Result<Vec<SampleRecord>> {
    check_threshold(theta)?;
    if probabilities.len() != table.len() {
        return Err(Error::ScoreLength {
            expected: table.len(),
            actual: probabilities.len(),
        });
    }

    table
        .rows
        .iter()
        .zip(probabilities)
        .enumerate()
        .map(|(index, (row, &probability))| {
            if !(0.0..=1.0).contains(&probability) {
                return Err(Error::InvalidProbability {
                    index,
                    value: probability,
                });
            }

            let group = match group_map {
                Some(map) => map.get(&row.group).cloned().ok_or_else(|| Error::InvalidPartition {
                    reason: format!("unmapped group {:?} at row {index}", row.group),
                })?,
                None => row.group.clone(),
            };
            if group.is_empty() {
                return Err(Error::InvalidPartition {
                    reason: format!("empty group tag at row {index}"),
                });
            }

            Ok(SampleRecord {
                id: row.id.clone(),
                label: row.label,
                group,
                probability,
                predicted: probability >= theta,
                augmentation: row.augmentation.clone(),
            })
        })
        .collect()
}
