//! Evaluation session with callback-based model adapters.
//!
//! This module provides [`EvalSession`], the main entry point for fairness
//! evaluation. External crates provide scoring or embedding callbacks, and
//! the session handles validation, pairing, metrics, flags and report output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, check_threshold};
use crate::eval::report::{
    EvaluationReport, ReportAssembler, write_groups_csv, write_recommendations,
};
use crate::flags::FlagThresholds;
use crate::import::RecordTable;
use crate::metrics::compute_partitioned;
use crate::metrics::verification::VerificationMetrics;
use crate::pairs::{FaceSample, Pair, PairGenerator, PairingStrategy};
use crate::records::{SampleRecord, score_table};
use crate::stats::{Bootstrap, ResampleSource, SeededSampler};

/// Scoring callback type.
///
/// Takes the imported table, returns one probability per row in row order.
pub type ScoreFn = Box<dyn Fn(&RecordTable) -> Result<Vec<f64>> + Send + Sync>;

/// Embedding callback type.
///
/// Takes a face sample (its `id` locates the image), returns its embedding.
pub type EmbedFn = Box<dyn Fn(&FaceSample) -> Result<Vec<f64>> + Send + Sync>;

/// Bootstrap settings for approval-rate intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Whether intervals are computed at all.
    pub enabled: bool,
    /// Resamples per interval.
    pub samples: usize,
    /// Confidence level in (0, 1).
    pub confidence: f64,
    /// Fixed seed; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            samples: 200,
            confidence: 0.95,
            seed: None,
        }
    }
}

/// Configuration for an evaluation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Decision threshold on probability or similarity.
    pub threshold: f64,

    /// Confidence interval settings.
    pub bootstrap: BootstrapConfig,

    /// Policy thresholds for disparity flags.
    pub flag_thresholds: FlagThresholds,

    /// Pairing strategy for verification runs.
    pub pairing: PairingStrategy,

    /// Raw protected-attribute value to group name.
    pub group_map: Option<BTreeMap<String, String>>,

    /// Directory for report output (JSON, CSV, text).
    pub report_dir: Option<PathBuf>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            bootstrap: BootstrapConfig::default(),
            flag_thresholds: FlagThresholds::default(),
            pairing: PairingStrategy::default(),
            group_map: None,
            report_dir: None,
        }
    }
}

impl EvalConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }

    /// Load a JSON parameters file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.threshold)?;
        self.flag_thresholds.validate()?;
        if self.bootstrap.enabled {
            if self.bootstrap.samples == 0 {
                return Err(Error::InvalidConfig(
                    "bootstrap sample count must be positive".to_string(),
                ));
            }
            let c = self.bootstrap.confidence;
            if !(c > 0.0 && c < 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "bootstrap confidence {c} outside (0, 1)"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`EvalConfig`].
#[derive(Debug, Default)]
pub struct EvalConfigBuilder {
    config: EvalConfig,
}

impl EvalConfigBuilder {
    /// Set the decision threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the bootstrap resample count.
    #[must_use]
    pub fn bootstrap_samples(mut self, samples: usize) -> Self {
        self.config.bootstrap.samples = samples;
        self
    }

    /// Set the bootstrap confidence level.
    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.config.bootstrap.confidence = confidence;
        self
    }

    /// Fix the bootstrap seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.bootstrap.seed = Some(seed);
        self
    }

    /// Turn approval-rate intervals off.
    #[must_use]
    pub fn no_bootstrap(mut self) -> Self {
        self.config.bootstrap.enabled = false;
        self
    }

    #[must_use]
    pub fn flag_thresholds(mut self, thresholds: FlagThresholds) -> Self {
        self.config.flag_thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn pairing(mut self, strategy: PairingStrategy) -> Self {
        self.config.pairing = strategy;
        self
    }

    /// Map raw group values to group names.
    #[must_use]
    pub fn group_map<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.group_map = Some(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the report output directory.
    #[must_use]
    pub fn report_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_dir = Some(path.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<EvalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Evaluation session for fairness analysis.
///
/// # Example
///
/// ```rust,ignore
/// use fair_eval::{CsvImporter, EvalConfig, EvalSession};
///
/// let config = EvalConfig::builder().threshold(0.5).seed(7).build()?;
/// let mut session = EvalSession::new(config);
/// session.set_scorer(Box::new(|table| my_model.predict(table)));
///
/// let table = CsvImporter::auto_detect().import("loans.csv")?;
/// let report = session.evaluate_table(&table)?;
/// println!("{}", report.assessment);
/// ```
pub struct EvalSession {
    config: EvalConfig,
    scorer: Option<ScoreFn>,
    embedder: Option<EmbedFn>,
    resample_source: Option<Arc<dyn ResampleSource>>,
}

impl EvalSession {
    /// Create a new evaluation session.
    #[must_use]
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            scorer: None,
            embedder: None,
            resample_source: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Register the classification scoring adapter.
    pub fn set_scorer(&mut self, scorer: ScoreFn) -> &mut Self {
        self.scorer = Some(scorer);
        self
    }

    /// Register the verification embedding adapter.
    pub fn set_embedder(&mut self, embedder: EmbedFn) -> &mut Self {
        self.embedder = Some(embedder);
        self
    }

    /// Replace the seeded sampler used for bootstrap resampling.
    pub fn set_resample_source(&mut self, source: Arc<dyn ResampleSource>) -> &mut Self {
        self.resample_source = Some(source);
        self
    }

    fn bootstrap(&self) -> Result<Option<Bootstrap>> {
        let cfg = &self.config.bootstrap;
        if !cfg.enabled {
            return Ok(None);
        }
        let source = match &self.resample_source {
            Some(source) => Arc::clone(source),
            None => {
                let sampler = cfg.seed.map_or_else(SeededSampler::from_entropy, SeededSampler::new);
                log::debug!("Bootstrap seed {}", sampler.seed());
                Arc::new(sampler) as Arc<dyn ResampleSource>
            }
        };
        Bootstrap::new(cfg.samples, cfg.confidence, source).map(Some)
    }

    fn assembler(&self) -> ReportAssembler {
        ReportAssembler::new(self.config.threshold, self.config.flag_thresholds)
    }

    /// Score a table and turn it into records.
    ///
    /// Uses the registered scorer, or the table's probability column when no
    /// scorer is registered.
    pub fn score(&self, table: &RecordTable) -> Result<Vec<SampleRecord>> {
        self.config.validate()?;
        if table.is_empty() {
            return Err(Error::InvalidPartition {
                reason: "input table has no rows".to_string(),
            });
        }

        let probabilities = match &self.scorer {
            Some(scorer) => scorer(table)?,
            None => table.probabilities().ok_or_else(|| Error::MissingColumn {
                column: "probability".to_string(),
            })?,
        };

        score_table(
            table,
            &probabilities,
            self.config.threshold,
            self.config.group_map.as_ref(),
        )
    }

    /// Run a classification evaluation over an imported table.
    pub fn evaluate_table(&self, table: &RecordTable) -> Result<EvaluationReport> {
        let records = self.score(table)?;
        self.evaluate_records(&records)
    }

    /// Run a classification evaluation over already scored records.
    pub fn evaluate_records(&self, records: &[SampleRecord]) -> Result<EvaluationReport> {
        self.config.validate()?;
        log::info!("Evaluating {} records at threshold {}", records.len(), self.config.threshold);

        let bootstrap = self.bootstrap()?;
        let metrics = compute_partitioned(
            records,
            |r| r.group.as_str(),
            self.config.threshold,
            bootstrap.as_ref(),
        )?;
        Ok(self.assembler().classification(metrics))
    }

    /// Fill in embeddings with the registered embedder.
    pub fn embed(&self, samples: &mut [FaceSample]) -> Result<()> {
        let embedder = self.embedder.as_ref().ok_or_else(|| Error::Adapter {
            adapter: "embedder".to_string(),
            message: "no embedding adapter registered".to_string(),
        })?;
        for sample in samples.iter_mut() {
            sample.embedding = embedder(&*sample)?;
        }
        Ok(())
    }

    /// Pair, score and evaluate embedded face samples.
    pub fn evaluate_samples(&self, samples: &[FaceSample]) -> Result<EvaluationReport> {
        self.config.validate()?;
        let pairs = PairGenerator::new(self.config.pairing).cosine_pairs(samples)?;
        self.evaluate_pairs(&pairs)
    }

    /// Run a verification evaluation over scored pairs.
    pub fn evaluate_pairs(&self, pairs: &[Pair]) -> Result<EvaluationReport> {
        self.config.validate()?;
        log::info!("Evaluating {} pairs at threshold {}", pairs.len(), self.config.threshold);

        let bootstrap = self.bootstrap()?;
        let metrics =
            VerificationMetrics::compute(pairs, self.config.threshold, bootstrap.as_ref())?;
        Ok(self.assembler().verification(metrics, self.config.pairing.name()))
    }

    fn report_dir(&self) -> Result<&Path> {
        self.config
            .report_dir
            .as_deref()
            .ok_or_else(|| Error::Report("no report directory configured".to_string()))
    }

    /// Write a report to the configured report directory.
    ///
    /// Produces `<name>.json`, `<name>_groups.csv` and
    /// `<name>_recommendations.txt`. Returns the JSON path.
    pub fn write_report(&self, report: &EvaluationReport, name: &str) -> Result<PathBuf> {
        let dir = self.report_dir()?;
        std::fs::create_dir_all(dir)?;

        let json_path = dir.join(format!("{name}.json"));
        std::fs::write(&json_path, report.to_json()?)?;

        write_groups_csv(report, &dir.join(format!("{name}_groups.csv")))?;
        write_recommendations(report, &dir.join(format!("{name}_recommendations.txt")))?;

        log::info!("Wrote report to {}", json_path.display());
        Ok(json_path)
    }

    /// Write per-record predictions to `predictions.csv`.
    pub fn write_predictions(&self, records: &[SampleRecord]) -> Result<PathBuf> {
        let dir = self.report_dir()?;
        std::fs::create_dir_all(dir)?;

        let path = dir.join("predictions.csv");
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["id", "group", "prediction", "probability"])?;
        for r in records {
            wtr.write_record([
                r.id.as_str(),
                r.group.as_str(),
                if r.predicted { "1" } else { "0" },
                &format!("{:.6}", r.probability),
            ])?;
        }
        wtr.flush()?;
        Ok(path)
    }
}
