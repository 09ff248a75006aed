//! Per-partition confusion metrics.
//!
//! This module turns `(label, score, partition key)` observations and a
//! decision threshold into [`PerGroupMetrics`] for each partition plus one
//! `"overall"` partition:
//!
//! - **Classification**: label = true outcome, score = predicted probability
//! - **Verification**: label = genuine pair, score = similarity
//!
//! A score counts as a positive prediction iff `score >= threshold`.
//!
//! ## Zero-denominator policy
//!
//! | Quantity | Undefined when | Reported as |
//! |----------|----------------|-------------|
//! | TPR, FNR, recall | no actual positives | 0.0 |
//! | FPR, TNR | no actual negatives | 0.0 |
//! | precision | no predicted positives | 0.0 |
//! | F1 | precision + recall = 0 | 0.0 |
//! | AUC | only one class present | `None` |

pub mod disparity;
pub mod verification;

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, check_threshold};
use crate::stats::bootstrap::stream_id;
use crate::stats::{Bootstrap, roc_auc, safe_ratio};

pub use disparity::DisparityMetrics;
pub use verification::{MatchRates, match_rates};

/// Key of the partition that contains every observation.
pub const OVERALL: &str = "overall";

/// An observation that can be thresholded into a binary prediction.
pub trait Scored {
    /// Ground truth (outcome for records, genuine for pairs).
    fn label(&self) -> bool;

    /// Score compared against the decision threshold.
    fn score(&self) -> f64;

    /// Prediction at threshold `theta` (inclusive boundary).
    fn predicted_at(&self, theta: f64) -> bool {
        self.score() >= theta
    }
}

/// Confusion-matrix counts for one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Predicted positive, actually positive.
    #[serde(rename = "tp")]
    pub true_positives: u64,
    /// Predicted positive, actually negative.
    #[serde(rename = "fp")]
    pub false_positives: u64,
    /// Predicted negative, actually negative.
    #[serde(rename = "tn")]
    pub true_negatives: u64,
    /// Predicted negative, actually positive.
    #[serde(rename = "fn")]
    pub false_negatives: u64,
}

impl ConfusionCounts {
    /// Tally observations at threshold `theta`.
    pub fn tally<'a, T, I>(items: I, theta: f64) -> Self
    where
        T: Scored + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut counts = Self::default();
        for item in items {
            counts.record(item.label(), item.predicted_at(theta));
        }
        counts
    }

    /// Add one observation.
    pub fn record(&mut self, actual: bool, predicted: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    /// Total observations.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// Actual positives (TP + FN).
    #[must_use]
    pub fn positives(&self) -> u64 {
        self.true_positives + self.false_negatives
    }

    /// Actual negatives (FP + TN).
    #[must_use]
    pub fn negatives(&self) -> u64 {
        self.false_positives + self.true_negatives
    }

    /// Share of observations predicted positive.
    #[must_use]
    pub fn approval_rate(&self) -> f64 {
        safe_ratio(self.true_positives + self.false_positives, self.total())
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        safe_ratio(self.true_positives + self.true_negatives, self.total())
    }

    #[must_use]
    pub fn tpr(&self) -> f64 {
        safe_ratio(self.true_positives, self.positives())
    }

    #[must_use]
    pub fn fpr(&self) -> f64 {
        safe_ratio(self.false_positives, self.negatives())
    }

    #[must_use]
    pub fn tnr(&self) -> f64 {
        safe_ratio(self.true_negatives, self.negatives())
    }

    #[must_use]
    pub fn fnr(&self) -> f64 {
        safe_ratio(self.false_negatives, self.positives())
    }

    #[must_use]
    pub fn precision(&self) -> f64 {
        safe_ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Harmonic mean of precision and recall.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.tpr();
        if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 }
    }
}

impl Add for ConfusionCounts {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.true_positives += rhs.true_positives;
        self.false_positives += rhs.false_positives;
        self.true_negatives += rhs.true_negatives;
        self.false_negatives += rhs.false_negatives;
    }
}

/// Two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower percentile bound.
    pub lower: f64,
    /// Upper percentile bound.
    pub upper: f64,
}

/// Metric set for one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerGroupMetrics {
    /// Number of observations in the partition.
    pub count: usize,
    /// Share predicted positive (match rate in verification mode).
    pub approval_rate: f64,
    /// Bootstrap interval for `approval_rate`; `None` when bootstrap is off.
    pub approval_rate_ci: Option<ConfidenceInterval>,
    /// Share of correct predictions.
    pub accuracy: f64,
    /// True positive rate.
    pub tpr: f64,
    /// False positive rate (FMR in verification mode).
    pub fpr: f64,
    /// True negative rate.
    pub tnr: f64,
    /// False negative rate (FNMR in verification mode).
    pub fnr: f64,
    /// Share of predicted positives that are actual positives.
    pub precision: f64,
    /// Same value as `tpr`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1_score: f64,
    /// Rank-based ROC-AUC; `None` on a single-class partition.
    pub auc: Option<f64>,
    /// Raw counts behind the rates.
    pub confusion: ConfusionCounts,
}

impl PerGroupMetrics {
    /// Compute the metric set for one non-empty partition.
    ///
    /// `stream` separates this partition's bootstrap draws from others.
    pub fn compute<T: Scored>(
        items: &[&T],
        theta: f64,
        bootstrap: Option<&Bootstrap>,
        stream: u64,
    ) -> Result<Self> {
        check_threshold(theta)?;
        if items.is_empty() {
            return Err(Error::InvalidPartition {
                reason: "partition has zero samples".to_string(),
            });
        }

        let confusion = ConfusionCounts::tally(items.iter().copied(), theta);

        let labels: Vec<bool> = items.iter().map(|i| i.label()).collect();
        let scores: Vec<f64> = items.iter().map(|i| i.score()).collect();
        let auc = roc_auc(&labels, &scores);

        let approval_rate_ci = bootstrap.and_then(|boot| {
            let predicted: Vec<f64> = items
                .iter()
                .map(|i| if i.predicted_at(theta) { 1.0 } else { 0.0 })
                .collect();
            boot.mean_interval(&predicted, stream)
                .map(|(lower, upper)| ConfidenceInterval { lower, upper })
        });

        Ok(Self {
            count: items.len(),
            approval_rate: confusion.approval_rate(),
            approval_rate_ci,
            accuracy: confusion.accuracy(),
            tpr: confusion.tpr(),
            fpr: confusion.fpr(),
            tnr: confusion.tnr(),
            fnr: confusion.fnr(),
            precision: confusion.precision(),
            recall: confusion.tpr(),
            f1_score: confusion.f1(),
            auc,
            confusion,
        })
    }
}

/// Metrics for every partition plus the overall partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionedMetrics {
    /// Metrics over every observation.
    pub overall: PerGroupMetrics,
    /// Metrics keyed by partition name.
    pub groups: BTreeMap<String, PerGroupMetrics>,
}

/// Partition `items` by group `key` and compute metrics for each partition.
///
/// Fails with [`Error::InvalidThreshold`] for `theta` outside `[0, 1]`, and
/// with [`Error::InvalidPartition`] when `items` is empty or an item has an
/// empty or reserved (`"overall"`) partition key.
pub fn compute_partitioned<T, K>(
    items: &[T],
    key: K,
    theta: f64,
    bootstrap: Option<&Bootstrap>,
) -> Result<PartitionedMetrics>
where
    T: Scored,
    K: Fn(&T) -> &str,
{
    compute_partitioned_by(items, "group", key, theta, bootstrap)
}

/// Like [`compute_partitioned`], with `partition` naming the key in errors.
pub fn compute_partitioned_by<T, K>(
    items: &[T],
    partition: &str,
    key: K,
    theta: f64,
    bootstrap: Option<&Bootstrap>,
) -> Result<PartitionedMetrics>
where
    T: Scored,
    K: Fn(&T) -> &str,
{
    check_threshold(theta)?;
    if items.is_empty() {
        return Err(Error::InvalidPartition {
            reason: "no samples to evaluate".to_string(),
        });
    }

    let mut partitions: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        let k = key(item);
        if k.is_empty() {
            return Err(Error::InvalidPartition {
                reason: format!("sample {index} has no {partition} tag"),
            });
        }
        if k == OVERALL {
            return Err(Error::InvalidPartition {
                reason: format!("sample {index}: {partition} name {OVERALL:?} is reserved"),
            });
        }
        partitions.entry(k).or_default().push(item);
    }

    let mut groups = BTreeMap::new();
    for (name, members) in &partitions {
        log::debug!("Partition {partition}={name}: {} samples", members.len());
        let metrics = PerGroupMetrics::compute(members, theta, bootstrap, stream_id(name))?;
        groups.insert((*name).to_string(), metrics);
    }

    let everything: Vec<&T> = items.iter().collect();
    let overall = PerGroupMetrics::compute(&everything, theta, bootstrap, stream_id(OVERALL))?;

    Ok(PartitionedMetrics { overall, groups })
}
