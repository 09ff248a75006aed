//! Verification-mode metrics over scored pairs.
//!
//! Pairs are ordinary [`Scored`] observations (label = genuine, score =
//! similarity), so FMR and FNMR are the FPR and FNR of the same confusion
//! counts used for classification:
//!
//! - **FMR** = impostor pairs predicted as a match / impostor pairs
//! - **FNMR** = genuine pairs predicted as a non-match / genuine pairs
//!
//! Both follow the zero-denominator policy. With genuine-only pairs the FMR
//! is reported as `0.0`, which is not a measured false-match rate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, check_threshold};
use crate::metrics::{
    ConfusionCounts, OVERALL, PartitionedMetrics, Scored, compute_partitioned,
    compute_partitioned_by,
};
use crate::pairs::Pair;
use crate::stats::Bootstrap;

impl Scored for Pair {
    fn label(&self) -> bool {
        self.genuine
    }

    fn score(&self) -> f64 {
        self.similarity
    }
}

/// Match-error rates for a set of pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRates {
    /// False match rate over impostor pairs.
    pub fmr: f64,
    /// False non-match rate over genuine pairs.
    pub fnmr: f64,
    /// Share of pairs decided correctly.
    pub accuracy: f64,
    /// Number of same-identity pairs.
    pub genuine_pairs: u64,
    /// Number of different-identity pairs.
    pub impostor_pairs: u64,
}

impl MatchRates {
    /// Read match rates off confusion counts.
    #[must_use]
    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        Self {
            fmr: counts.fpr(),
            fnmr: counts.fnr(),
            accuracy: counts.accuracy(),
            genuine_pairs: counts.positives(),
            impostor_pairs: counts.negatives(),
        }
    }
}

/// FMR/FNMR at threshold `theta`. An empty pair set gives all zeros.
pub fn match_rates(pairs: &[Pair], theta: f64) -> Result<MatchRates> {
    check_threshold(theta)?;
    Ok(MatchRates::from_counts(&ConfusionCounts::tally(pairs, theta)))
}

/// Metrics for a verification run.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationMetrics {
    /// Overall plus per-group metrics (pairs keyed by group tag).
    pub by_group: PartitionedMetrics,
    /// Per-augmentation metrics (pairs keyed by augmentation tag).
    pub by_augmentation: BTreeMap<String, crate::metrics::PerGroupMetrics>,
    /// Match rates keyed by `"overall"` and by group.
    pub match_rates: BTreeMap<String, MatchRates>,
}

impl VerificationMetrics {
    /// Compute group and augmentation partitions over `pairs`.
    pub fn compute(pairs: &[Pair], theta: f64, bootstrap: Option<&Bootstrap>) -> Result<Self> {
        let by_group = compute_partitioned(pairs, |p| p.group.as_str(), theta, bootstrap)?;
        let by_augmentation = compute_partitioned_by(
            pairs,
            "augmentation",
            |p| p.augmentation.as_str(),
            theta,
            bootstrap,
        )?
        .groups;

        let mut match_rates = BTreeMap::new();
        match_rates.insert(
            OVERALL.to_string(),
            MatchRates::from_counts(&by_group.overall.confusion),
        );
        for (group, metrics) in &by_group.groups {
            match_rates.insert(group.clone(), MatchRates::from_counts(&metrics.confusion));
        }

        Ok(Self {
            by_group,
            by_augmentation,
            match_rates,
        })
    }

    /// Whether the run had any impostor pairs at all.
    #[must_use]
    pub fn has_impostors(&self) -> bool {
        self.by_group.overall.confusion.negatives() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn pair(group: &str, aug: &str, genuine: bool, similarity: f64) -> Pair {
        Pair {
            left_id: "l".to_string(),
            right_id: "r".to_string(),
            genuine,
            group: group.to_string(),
            augmentation: aug.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_empty_pairs_zero_rates() {
        let rates = match_rates(&[], 0.5).unwrap();
        assert_eq!(rates.fmr, 0.0);
        assert_eq!(rates.fnmr, 0.0);
        assert_eq!(rates.genuine_pairs, 0);
    }

    #[test]
    fn test_all_genuine_below_threshold() {
        let pairs = vec![pair("A", "blur", true, 0.2), pair("A", "noise", true, 0.4)];
        let rates = match_rates(&pairs, 0.5).unwrap();
        assert_eq!(rates.fnmr, 1.0);
        assert_eq!(rates.fmr, 0.0);
    }

    #[test]
    fn test_fmr_over_impostors() {
        let pairs = vec![
            pair("A", "original", false, 0.9),
            pair("A", "original", false, 0.1),
            pair("A", "original", false, 0.2),
            pair("A", "original", false, 0.6),
            pair("A", "original", true, 0.8),
        ];
        let rates = match_rates(&pairs, 0.5).unwrap();
        assert!((rates.fmr - 0.5).abs() < 1e-12);
        assert_eq!(rates.fnmr, 0.0);
        assert_eq!(rates.impostor_pairs, 4);
    }

    #[test]
    fn test_match_rates_rejects_bad_threshold() {
        assert!(matches!(
            match_rates(&[], -0.2),
            Err(Error::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_verification_partitions() {
        let pairs = vec![
            pair("A", "blur", true, 0.9),
            pair("A", "noise", true, 0.3),
            pair("B", "blur", true, 0.2),
            pair("B", "noise", true, 0.8),
            pair("B", "noise", true, 0.7),
        ];
        let m = VerificationMetrics::compute(&pairs, 0.5, None).unwrap();
        assert_eq!(m.by_group.groups.len(), 2);
        assert_eq!(m.by_augmentation["noise"].count, 3);
        assert_eq!(m.by_augmentation["blur"].count, 2);
        assert!((m.match_rates["A"].fnmr - 0.5).abs() < 1e-12);
        assert!((m.match_rates["B"].fnmr - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.match_rates[OVERALL].fmr, 0.0);
        assert!(!m.has_impostors());
    }

    #[test]
    fn test_empty_augmentation_tag_named_in_error() {
        let pairs = vec![pair("A", "blur", true, 0.9), pair("A", "", true, 0.4)];
        let err = VerificationMetrics::compute(&pairs, 0.5, None).unwrap_err();
        assert!(
            matches!(err, Error::InvalidPartition { ref reason } if reason.contains("augmentation"))
        );
    }

    #[test]
    fn test_group_named_overall_rejected() {
        let pairs = vec![pair("A", "blur", true, 0.9), pair(OVERALL, "blur", true, 0.4)];
        let err = VerificationMetrics::compute(&pairs, 0.5, None).unwrap_err();
        assert!(matches!(err, Error::InvalidPartition { .. }));
    }
}
