//! Remediation guidance for raised flags.
//!
//! A fixed lookup from flag category to recommendation text. Each category
//! contributes its lines once, in flag order, followed by one general line.

use crate::flags::{Flag, FlagMetric};

/// Emitted when no flag was raised.
pub const NO_ISSUES: &str = "No significant fairness issues detected. Continue monitoring.";

const GENERAL: &str = "GENERAL: implement monitoring, document choices, and consider \
                       human-in-the-loop review for ambiguous cases";

fn advice_for(metric: FlagMetric) -> &'static [&'static str] {
    match metric {
        FlagMetric::DisparateImpact => &[
            "DISPARATE IMPACT: consider reweighting examples, threshold adjustment, or \
             fairness-aware retraining",
            "Check for proxy features (ZIP code, etc.) and consider removing or transforming them",
        ],
        FlagMetric::DemographicParityDifference => &[
            "DEMOGRAPHIC PARITY GAP: compare approval rates against base rates per group and \
             review threshold calibration",
        ],
        FlagMetric::EqualOpportunityDifference => &[
            "EQUAL OPPORTUNITY GAP: consider per-group threshold calibration and collecting more \
             data for underperforming groups",
        ],
        FlagMetric::EqualizedOddsDifference => &[
            "EQUALIZED ODDS GAP: inspect false-positive rates per group and consider \
             post-processing to equalize error rates",
        ],
    }
}

/// Recommendations for a set of flags.
#[must_use]
pub fn recommendations(flags: &[Flag]) -> Vec<String> {
    if flags.is_empty() {
        return vec![NO_ISSUES.to_string()];
    }

    let mut seen: Vec<FlagMetric> = Vec::with_capacity(flags.len());
    let mut out = Vec::new();
    for flag in flags {
        if seen.contains(&flag.metric) {
            continue;
        }
        seen.push(flag.metric);
        out.extend(advice_for(flag.metric).iter().map(|s| (*s).to_string()));
    }
    out.push(GENERAL.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(metric: FlagMetric) -> Flag {
        Flag {
            metric,
            value: 0.0,
            threshold: 0.0,
            message: String::new(),
        }
    }

    #[test]
    fn test_no_flags() {
        assert_eq!(recommendations(&[]), vec![NO_ISSUES.to_string()]);
    }

    #[test]
    fn test_disparate_impact_advice() {
        let recs = recommendations(&[flag(FlagMetric::DisparateImpact)]);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("reweighting"));
        assert!(recs[1].contains("proxy features"));
        assert!(recs[2].starts_with("GENERAL"));
    }

    #[test]
    fn test_equal_opportunity_advice() {
        let recs = recommendations(&[flag(FlagMetric::EqualOpportunityDifference)]);
        assert!(recs[0].contains("per-group threshold calibration"));
        assert!(recs[0].contains("collecting more data"));
    }

    #[test]
    fn test_duplicate_categories_once() {
        let recs = recommendations(&[
            flag(FlagMetric::DisparateImpact),
            flag(FlagMetric::DisparateImpact),
        ]);
        assert_eq!(recs.len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let flags = [
            flag(FlagMetric::DisparateImpact),
            flag(FlagMetric::EqualizedOddsDifference),
        ];
        assert_eq!(recommendations(&flags), recommendations(&flags));
    }
}
