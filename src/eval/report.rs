//! Evaluation report and its assembly.
//!
//! [`EvaluationReport`] is the only artefact an evaluation run returns. It is
//! built once by [`ReportAssembler`] and serializes to a JSON document with a
//! group-keyed metrics map, an optional augmentation-keyed map, a flat
//! disparity map and flat flag and recommendation lists.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::advice::recommendations;
use crate::error::Result;
use crate::flags::{Flag, FlagThresholds, evaluate_flags};
use crate::metrics::verification::VerificationMetrics;
use crate::metrics::{DisparityMetrics, MatchRates, PartitionedMetrics, PerGroupMetrics};

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Assessment {
    Pass,
    Fail,
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// Which pipeline produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    Classification,
    Verification,
}

/// Run parameters recorded alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Decision threshold the metrics were computed at.
    pub threshold_used: f64,
    /// Number of group partitions.
    pub total_groups: usize,
    /// Classification or verification.
    pub mode: EvalMode,
    /// Records in classification mode, pairs in verification mode.
    pub total_samples: usize,
    /// Pairing strategy name, verification mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing: Option<String>,
}

/// Result of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// When this report was assembled.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Metrics over every record or pair.
    pub overall: PerGroupMetrics,

    /// Metrics keyed by group.
    pub group_metrics: BTreeMap<String, PerGroupMetrics>,

    /// Metrics keyed by augmentation tag (verification mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmentation_metrics: Option<BTreeMap<String, PerGroupMetrics>>,

    /// `{}` when fewer than two groups were present.
    #[serde(with = "crate::metrics::disparity::flat_map")]
    pub disparity: Option<DisparityMetrics>,

    /// Triggered rules in policy-table order.
    pub flags: Vec<Flag>,

    /// Advice derived from the flags.
    pub recommendations: Vec<String>,

    /// FAIL iff any flag was raised.
    pub assessment: Assessment,

    /// Run parameters.
    pub metadata: ReportMetadata,

    /// FMR/FNMR keyed by `"overall"` and by group (verification mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_rates: Option<BTreeMap<String, MatchRates>>,

    /// Known limitations of this particular run.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl EvaluationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.assessment == Assessment::Pass
    }

    /// Load a report previously written as JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Turns computed metrics into an [`EvaluationReport`].
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler {
    threshold: f64,
    flag_thresholds: FlagThresholds,
}

impl ReportAssembler {
    #[must_use]
    pub fn new(threshold: f64, flag_thresholds: FlagThresholds) -> Self {
        Self {
            threshold,
            flag_thresholds,
        }
    }

    /// Assemble a classification-mode report.
    #[must_use]
    pub fn classification(&self, metrics: PartitionedMetrics) -> EvaluationReport {
        let total_samples = metrics.overall.count;
        let mut warnings = Vec::new();
        if metrics.groups.len() < 2 {
            warnings.push(single_group_warning(metrics.groups.len()));
        }

        self.assemble(
            metrics,
            None,
            None,
            ReportMetadataParts {
                mode: EvalMode::Classification,
                total_samples,
                pairing: None,
            },
            warnings,
        )
    }

    /// Assemble a verification-mode report.
    ///
    /// A run without impostor pairs carries a warning that its FMR is not a
    /// measured false-match rate.
    #[must_use]
    pub fn verification(&self, metrics: VerificationMetrics, pairing: &str) -> EvaluationReport {
        let total_samples = metrics.by_group.overall.count;
        let mut warnings = Vec::new();
        if !metrics.has_impostors() {
            log::warn!("No impostor pairs; FMR is reported as 0.0");
            warnings.push(
                "No impostor pairs were evaluated: FMR is reported as 0.0, which is not a \
                 measured false-match rate"
                    .to_string(),
            );
        }
        if metrics.by_group.groups.len() < 2 {
            warnings.push(single_group_warning(metrics.by_group.groups.len()));
        }

        self.assemble(
            metrics.by_group,
            Some(metrics.by_augmentation),
            Some(metrics.match_rates),
            ReportMetadataParts {
                mode: EvalMode::Verification,
                total_samples,
                pairing: Some(pairing.to_string()),
            },
            warnings,
        )
    }

    fn assemble(
        &self,
        metrics: PartitionedMetrics,
        augmentation_metrics: Option<BTreeMap<String, PerGroupMetrics>>,
        match_rates: Option<BTreeMap<String, MatchRates>>,
        parts: ReportMetadataParts,
        warnings: Vec<String>,
    ) -> EvaluationReport {
        let disparity = DisparityMetrics::compute(&metrics.groups);
        let flags = evaluate_flags(disparity.as_ref(), &self.flag_thresholds);
        let recommendations = recommendations(&flags);
        let assessment = if flags.is_empty() {
            Assessment::Pass
        } else {
            Assessment::Fail
        };
        log::info!(
            "Assessment {assessment}: {} flag(s) over {} group(s)",
            flags.len(),
            metrics.groups.len()
        );

        EvaluationReport {
            timestamp: chrono::Utc::now(),
            metadata: ReportMetadata {
                threshold_used: self.threshold,
                total_groups: metrics.groups.len(),
                mode: parts.mode,
                total_samples: parts.total_samples,
                pairing: parts.pairing,
            },
            overall: metrics.overall,
            group_metrics: metrics.groups,
            augmentation_metrics,
            disparity,
            flags,
            recommendations,
            assessment,
            match_rates,
            warnings,
        }
    }
}

struct ReportMetadataParts {
    mode: EvalMode,
    total_samples: usize,
    pairing: Option<String>,
}

fn single_group_warning(found: usize) -> String {
    format!("Only {found} group present: disparity metrics were not computed")
}

/// Write one CSV row per group (plus `overall`) to `path`.
pub fn write_groups_csv(report: &EvaluationReport, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "group",
        "count",
        "approval_rate",
        "approval_ci_lower",
        "approval_ci_upper",
        "accuracy",
        "tpr",
        "fpr",
        "tnr",
        "fnr",
        "precision",
        "recall",
        "f1_score",
        "auc",
    ])?;

    let rows = report
        .group_metrics
        .iter()
        .map(|(name, m)| (name.as_str(), m))
        .chain(std::iter::once((crate::metrics::OVERALL, &report.overall)));

    for (name, m) in rows {
        wtr.write_record([
            name,
            &m.count.to_string(),
            &format!("{:.6}", m.approval_rate),
            &m.approval_rate_ci.map_or(String::new(), |ci| format!("{:.6}", ci.lower)),
            &m.approval_rate_ci.map_or(String::new(), |ci| format!("{:.6}", ci.upper)),
            &format!("{:.6}", m.accuracy),
            &format!("{:.6}", m.tpr),
            &format!("{:.6}", m.fpr),
            &format!("{:.6}", m.tnr),
            &format!("{:.6}", m.fnr),
            &format!("{:.6}", m.precision),
            &format!("{:.6}", m.recall),
            &format!("{:.6}", m.f1_score),
            &m.auc.map_or(String::new(), |a| format!("{a:.6}")),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the recommendations as a plain-text list.
pub fn write_recommendations(report: &EvaluationReport, path: &Path) -> Result<()> {
    let mut text = String::from("FAIRNESS RECOMMENDATIONS\n");
    text.push_str(&format!("Assessment: {}\n\n", report.assessment));
    for (i, rec) in report.recommendations.iter().enumerate() {
        text.push_str(&format!("{}. {rec}\n", i + 1));
    }
    std::fs::write(path, text)?;
    Ok(())
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagMetric;
    use crate::metrics::compute_partitioned;
    use crate::metrics::tests::{Obs, obs};

    fn skewed() -> Vec<Obs> {
        let mut items = Vec::new();
        for i in 0..10 {
            items.push(obs("A", i % 2 == 0, if i < 5 { 0.9 } else { 0.1 }));
        }
        for i in 0..10 {
            items.push(obs("B", i % 2 == 0, if i < 2 { 0.9 } else { 0.1 }));
        }
        items
    }

    fn assembler() -> ReportAssembler {
        ReportAssembler::new(0.5, FlagThresholds::default())
    }

    #[test]
    fn test_fail_iff_flags() {
        let m = compute_partitioned(&skewed(), |o| o.group.as_str(), 0.5, None).unwrap();
        let report = assembler().classification(m);
        assert_eq!(report.assessment, Assessment::Fail);
        assert!(!report.flags.is_empty());
        assert_eq!(report.flags[0].metric, FlagMetric::DisparateImpact);
        assert_eq!(report.metadata.total_groups, 2);
        assert_eq!(report.metadata.total_samples, 20);
        assert!(report.augmentation_metrics.is_none());
    }

    #[test]
    fn test_single_group_passes_with_warning() {
        let items = vec![obs("A", true, 0.9), obs("A", false, 0.1)];
        let m = compute_partitioned(&items, |o| o.group.as_str(), 0.5, None).unwrap();
        let report = assembler().classification(m);
        assert!(report.disparity.is_none());
        assert!(report.flags.is_empty());
        assert!(report.passed());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.recommendations, vec![crate::advice::NO_ISSUES.to_string()]);
    }

    #[test]
    fn test_json_roundtrip() {
        let m = compute_partitioned(&skewed(), |o| o.group.as_str(), 0.5, None).unwrap();
        let report = assembler().classification(m);
        let json = report.to_json().unwrap();
        let back: EvaluationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_json_roundtrip_exact_rates() {
        // Prime-sized groups give rates like 4/11 that need all 17 digits.
        let names = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
        let sizes = [7_u32, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 53];
        let mut items = Vec::new();
        for (name, size) in names.iter().zip(sizes) {
            for i in 0..size {
                let score = f64::from((i * 7 + size) % 19) / 18.0;
                items.push(obs(name, i % 3 != 1, score));
            }
        }
        let boot = crate::stats::Bootstrap::seeded(50, 0.95, 3).unwrap();
        let m = compute_partitioned(&items, |o| o.group.as_str(), 0.43, Some(&boot)).unwrap();
        let report = ReportAssembler::new(0.43, FlagThresholds::default()).classification(m);

        let back: EvaluationReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(back, report);
        let compact: EvaluationReport =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(compact.group_metrics, report.group_metrics);
        assert_eq!(compact.disparity, report.disparity);
    }

    #[test]
    fn test_json_shape() {
        let items = vec![obs("A", true, 0.9), obs("A", false, 0.1)];
        let m = compute_partitioned(&items, |o| o.group.as_str(), 0.5, None).unwrap();
        let report = assembler().classification(m);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["assessment"], "PASS");
        assert_eq!(value["disparity"], serde_json::json!({}));
        assert!(value["group_metrics"]["A"].is_object());
        assert_eq!(value["metadata"]["mode"], "classification");
        assert!(value.get("augmentation_metrics").is_none());
    }

    #[test]
    fn test_write_artefacts() {
        let dir = tempfile::tempdir().unwrap();
        let m = compute_partitioned(&skewed(), |o| o.group.as_str(), 0.5, None).unwrap();
        let report = assembler().classification(m);

        let csv_path = dir.path().join("groups.csv");
        write_groups_csv(&report, &csv_path).unwrap();
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text.lines().count(), 4);
        assert!(csv_text.lines().nth(3).unwrap().starts_with("overall,20,"));

        let txt_path = dir.path().join("recs.txt");
        write_recommendations(&report, &txt_path).unwrap();
        let txt = std::fs::read_to_string(&txt_path).unwrap();
        assert!(txt.contains("Assessment: FAIL"));
        assert!(txt.contains("1. DISPARATE IMPACT"));
    }
}
