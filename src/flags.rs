//! Threshold rules over disparity metrics.
//!
//! | Metric | Flagged when | Default |
//! |--------|--------------|---------|
//! | disparate_impact | below | 0.8 (four-fifths rule) |
//! | demographic_parity_difference | above | 0.10 |
//! | equal_opportunity_difference | above | 0.10 |
//! | equalized_odds_difference | above | 0.10 |
//!
//! Flags are always emitted in the table order above.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::DisparityMetrics;

/// Policy thresholds for each disparity rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    /// Minimum acceptable disparate impact ratio.
    pub disparate_impact_min: f64,
    /// Maximum acceptable approval-rate gap.
    pub demographic_parity_max: f64,
    /// Maximum acceptable TPR gap.
    pub equal_opportunity_max: f64,
    /// Maximum acceptable max(TPR gap, FPR gap).
    pub equalized_odds_max: f64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            disparate_impact_min: 0.8,
            demographic_parity_max: 0.10,
            equal_opportunity_max: 0.10,
            equalized_odds_max: 0.10,
        }
    }
}

impl FlagThresholds {
    /// Reject thresholds that would silently disable a rule.
    pub fn validate(&self) -> Result<()> {
        for metric in FlagMetric::ALL {
            let value = metric.threshold(self);
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{metric} threshold {value} outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// Metric a flag was raised on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagMetric {
    DisparateImpact,
    DemographicParityDifference,
    EqualOpportunityDifference,
    EqualizedOddsDifference,
}

impl FlagMetric {
    /// All rules in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::DisparateImpact,
        Self::DemographicParityDifference,
        Self::EqualOpportunityDifference,
        Self::EqualizedOddsDifference,
    ];

    /// Metric name as it appears in the disparity map.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::DisparateImpact => "disparate_impact",
            Self::DemographicParityDifference => "demographic_parity_difference",
            Self::EqualOpportunityDifference => "equal_opportunity_difference",
            Self::EqualizedOddsDifference => "equalized_odds_difference",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::DisparateImpact => "Disparate impact ratio",
            Self::DemographicParityDifference => "Demographic parity difference",
            Self::EqualOpportunityDifference => "Equal opportunity difference",
            Self::EqualizedOddsDifference => "Equalized odds difference",
        }
    }

    fn observed(&self, d: &DisparityMetrics) -> f64 {
        match self {
            Self::DisparateImpact => d.disparate_impact,
            Self::DemographicParityDifference => d.demographic_parity_difference,
            Self::EqualOpportunityDifference => d.equal_opportunity_difference,
            Self::EqualizedOddsDifference => d.equalized_odds_difference,
        }
    }

    fn threshold(&self, t: &FlagThresholds) -> f64 {
        match self {
            Self::DisparateImpact => t.disparate_impact_min,
            Self::DemographicParityDifference => t.demographic_parity_max,
            Self::EqualOpportunityDifference => t.equal_opportunity_max,
            Self::EqualizedOddsDifference => t.equalized_odds_max,
        }
    }

    /// Disparate impact is a floor; the gaps are ceilings.
    fn violated(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::DisparateImpact => value < threshold,
            _ => value > threshold,
        }
    }
}

impl fmt::Display for FlagMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A triggered policy rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// Rule that fired.
    pub metric: FlagMetric,
    /// Observed disparity value.
    pub value: f64,
    /// Configured threshold it crossed.
    pub threshold: f64,
    /// Human-readable summary, e.g. `Disparate impact ratio = 0.400 < 0.8`.
    pub message: String,
}

/// Apply the policy table to computed disparity.
///
/// No disparity (fewer than two groups) yields no flags.
#[must_use]
pub fn evaluate_flags(
    disparity: Option<&DisparityMetrics>,
    thresholds: &FlagThresholds,
) -> Vec<Flag> {
    let Some(d) = disparity else {
        return Vec::new();
    };

    FlagMetric::ALL
        .iter()
        .filter_map(|metric| {
            let value = metric.observed(d);
            let threshold = metric.threshold(thresholds);
            if !metric.violated(value, threshold) {
                return None;
            }
            let op = if *metric == FlagMetric::DisparateImpact { '<' } else { '>' };
            let message = format!("{} = {value:.3} {op} {threshold}", metric.label());
            log::debug!("Flag raised: {message}");
            Some(Flag {
                metric: *metric,
                value,
                threshold,
                message,
            })
        })
        .collect()
}
