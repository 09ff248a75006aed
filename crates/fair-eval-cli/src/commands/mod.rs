//! Subcommands and the options they share.

pub mod classify;
pub mod summary;
pub mod verify;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use fair_eval::{EvalConfig, EvalSession, EvaluationReport};

/// Run options shared by `classify` and `verify`.
#[derive(Args, Debug)]
pub struct EvalOptions {
    /// JSON parameters file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Decision threshold (0.0-1.0)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Bootstrap resamples per interval
    #[arg(long)]
    pub bootstrap: Option<usize>,

    /// Bootstrap confidence level
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Bootstrap seed for reproducible intervals
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip approval-rate confidence intervals
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Minimum disparate impact ratio
    #[arg(long)]
    pub di_min: Option<f64>,

    /// Maximum demographic parity difference
    #[arg(long)]
    pub dp_max: Option<f64>,

    /// Maximum equal opportunity difference
    #[arg(long)]
    pub eo_max: Option<f64>,

    /// Maximum equalized odds difference
    #[arg(long)]
    pub eodds_max: Option<f64>,

    /// Output report JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for the full report bundle (JSON, CSV, recommendations)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Exit non-zero when the assessment is FAIL
    #[arg(long)]
    pub fail_on_flags: bool,
}

impl EvalOptions {
    /// Build the run configuration: file (or defaults), then flag overrides.
    pub fn to_config(&self) -> Result<EvalConfig> {
        let mut config = match &self.config {
            Some(path) => EvalConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => EvalConfig::default(),
        };

        if let Some(t) = self.threshold {
            config.threshold = t;
        }
        if let Some(n) = self.bootstrap {
            config.bootstrap.samples = n;
        }
        if let Some(c) = self.confidence {
            config.bootstrap.confidence = c;
        }
        if let Some(seed) = self.seed {
            config.bootstrap.seed = Some(seed);
        }
        if self.no_bootstrap {
            config.bootstrap.enabled = false;
        }

        let flags = &mut config.flag_thresholds;
        if let Some(v) = self.di_min {
            flags.disparate_impact_min = v;
        }
        if let Some(v) = self.dp_max {
            flags.demographic_parity_max = v;
        }
        if let Some(v) = self.eo_max {
            flags.equal_opportunity_max = v;
        }
        if let Some(v) = self.eodds_max {
            flags.equalized_odds_max = v;
        }

        if let Some(dir) = &self.out_dir {
            config.report_dir = Some(dir.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Print, save and check a finished report.
    pub fn finish(
        &self,
        session: &EvalSession,
        report: &EvaluationReport,
        name: &str,
    ) -> Result<()> {
        print_report(report);

        if let Some(path) = &self.output {
            std::fs::write(path, report.to_json()?)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Saved to: {}", path.display());
        }

        if self.out_dir.is_some() {
            let path = session.write_report(report, name)?;
            println!("Report bundle: {}", path.display());
        }

        if self.fail_on_flags && !report.passed() {
            bail!("Assessment FAIL: {} fairness flag(s) raised", report.flags.len());
        }
        Ok(())
    }
}

/// Pairing strategy as named on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Original vs. augmented images, genuine pairs only
    Augmentation,
    /// Same-identity pairs plus capped impostor pairs
    Identity,
}

/// Print a report as plain-text tables.
pub fn print_report(report: &EvaluationReport) {
    println!(
        "Mode: {:?}, threshold: {}, samples: {}",
        report.metadata.mode, report.metadata.threshold_used, report.metadata.total_samples
    );
    println!();

    println!("{:<20} {:>8} {:>10} {:>16} {:>8} {:>8} {:>8} {:>8}",
        "Group", "Count", "Approval", "95% CI", "TPR", "FPR", "F1", "AUC");
    println!("{:-<92}", "");
    let rows = report
        .group_metrics
        .iter()
        .map(|(name, m)| (name.as_str(), m))
        .chain(std::iter::once(("overall", &report.overall)));
    for (name, m) in rows {
        let ci = m
            .approval_rate_ci
            .map_or("-".to_string(), |ci| format!("[{:.3}, {:.3}]", ci.lower, ci.upper));
        let auc = m.auc.map_or("-".to_string(), |a| format!("{:.3}", a));
        println!("{:<20} {:>8} {:>10.3} {:>16} {:>8.3} {:>8.3} {:>8.3} {:>8}",
            name, m.count, m.approval_rate, ci, m.tpr, m.fpr, m.f1_score, auc);
    }

    if let Some(augs) = &report.augmentation_metrics {
        println!();
        println!(
            "{:<20} {:>8} {:>10} {:>8} {:>8}",
            "Augmentation", "Pairs", "Match", "FMR", "FNMR"
        );
        println!("{:-<58}", "");
        for (name, m) in augs {
            println!("{:<20} {:>8} {:>10.3} {:>8.3} {:>8.3}",
                name, m.count, m.approval_rate, m.fpr, m.fnr);
        }
    }

    if let Some(rates) = &report.match_rates {
        println!();
        println!(
            "{:<20} {:>8} {:>8} {:>10} {:>10}",
            "Match rates", "FMR", "FNMR", "Genuine", "Impostor"
        );
        println!("{:-<60}", "");
        for (name, r) in rates {
            println!("{:<20} {:>8.4} {:>8.4} {:>10} {:>10}",
                name, r.fmr, r.fnmr, r.genuine_pairs, r.impostor_pairs);
        }
    }

    println!();
    match &report.disparity {
        Some(d) => {
            println!("Disparity:");
            println!("  Demographic parity difference: {:.4}", d.demographic_parity_difference);
            println!("  Demographic parity ratio:      {:.4}", d.demographic_parity_ratio);
            println!("  Equal opportunity difference:  {:.4}", d.equal_opportunity_difference);
            println!("  Equalized odds difference:     {:.4}", d.equalized_odds_difference);
            println!("  Disparate impact:              {:.4}", d.disparate_impact);
        }
        None => println!("Disparity: not computed"),
    }

    if !report.flags.is_empty() {
        println!();
        println!("Flags:");
        for flag in &report.flags {
            println!("  - {}", flag.message);
        }
    }

    for warning in &report.warnings {
        println!("Warning: {warning}");
    }

    println!();
    println!("Recommendations:");
    for (i, rec) in report.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }

    println!();
    println!("Assessment: {}", report.assessment);
}
