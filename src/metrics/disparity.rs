//! Cross-group disparity metrics.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | demographic_parity_difference | max(approval_rate) - min(approval_rate) |
//! | demographic_parity_ratio | min(approval_rate) / max(approval_rate), 0.0 if max is 0 |
//! | equal_opportunity_difference | max(TPR) - min(TPR) |
//! | equalized_odds_difference | larger of the TPR gap and the FPR gap |
//! | disparate_impact | same value as demographic_parity_ratio |
//!
//! Disparity is undefined for a single group. [`DisparityMetrics::compute`]
//! returns `None` in that case, which means "not computed", not "no gap".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::PerGroupMetrics;

/// Disparity statistics across all groups of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisparityMetrics {
    /// Max minus min approval rate.
    pub demographic_parity_difference: f64,
    /// Min over max approval rate (0.0 when max is 0).
    pub demographic_parity_ratio: f64,
    /// Max minus min TPR.
    pub equal_opportunity_difference: f64,
    /// Larger of the TPR gap and the FPR gap.
    pub equalized_odds_difference: f64,
    /// Same value as `demographic_parity_ratio`.
    pub disparate_impact: f64,
}

impl DisparityMetrics {
    /// Compute disparity, or `None` with fewer than two groups.
    #[must_use]
    pub fn compute(groups: &BTreeMap<String, PerGroupMetrics>) -> Option<Self> {
        if groups.len() < 2 {
            log::debug!("Skipping disparity: {} group(s)", groups.len());
            return None;
        }

        let (min_rate, max_rate) = spread(groups.values().map(|g| g.approval_rate));
        let (min_tpr, max_tpr) = spread(groups.values().map(|g| g.tpr));
        let (min_fpr, max_fpr) = spread(groups.values().map(|g| g.fpr));

        let ratio = if max_rate > 0.0 { min_rate / max_rate } else { 0.0 };
        let tpr_gap = max_tpr - min_tpr;
        let fpr_gap = max_fpr - min_fpr;

        Some(Self {
            demographic_parity_difference: max_rate - min_rate,
            demographic_parity_ratio: ratio,
            equal_opportunity_difference: tpr_gap,
            equalized_odds_difference: tpr_gap.max(fpr_gap),
            disparate_impact: ratio,
        })
    }

    /// Like [`compute`](Self::compute) but fails with
    /// [`Error::InsufficientGroups`] instead of returning `None`.
    pub fn try_compute(groups: &BTreeMap<String, PerGroupMetrics>) -> Result<Self> {
        Self::compute(groups).ok_or(Error::InsufficientGroups { found: groups.len() })
    }
}

fn spread(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Serializes `Option<DisparityMetrics>` as a flat object, `{}` for `None`.
pub(crate) mod flat_map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::DisparityMetrics;

    #[derive(Default, Serialize, Deserialize)]
    struct Partial {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        demographic_parity_difference: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        demographic_parity_ratio: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equal_opportunity_difference: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equalized_odds_difference: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        disparate_impact: Option<f64>,
    }

    pub fn serialize<S>(value: &Option<DisparityMetrics>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => d.serialize(serializer),
            None => Partial::default().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DisparityMetrics>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let p = Partial::deserialize(deserializer)?;
        match (
            p.demographic_parity_difference,
            p.demographic_parity_ratio,
            p.equal_opportunity_difference,
            p.equalized_odds_difference,
            p.disparate_impact,
        ) {
            (None, None, None, None, None) => Ok(None),
            (Some(dpd), Some(dpr), Some(eod), Some(eqodds), Some(di)) => Ok(Some(DisparityMetrics {
                demographic_parity_difference: dpd,
                demographic_parity_ratio: dpr,
                equal_opportunity_difference: eod,
                equalized_odds_difference: eqodds,
                disparate_impact: di,
            })),
            _ => Err(serde::de::Error::custom("incomplete disparity metrics")),
        }
    }
}
