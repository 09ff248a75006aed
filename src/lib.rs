//! # fair-eval
//!
//! Group fairness evaluation for binary classifiers and face-verification
//! models.
//!
//! This library provides an **API-first design** where external crates provide
//! scoring or embedding callbacks, and this library handles per-group metrics,
//! disparity, policy flags, remediation advice and report generation.
//!
//! Two modes share one statistical core:
//!
//! - **Classification**: records with a true label, a group tag and a
//!   predicted probability.
//! - **Verification**: face embeddings paired by identity, scored by
//!   similarity; FMR and FNMR are the FPR and FNR of those pairs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fair_eval::{CsvImporter, EvalConfig, EvalSession};
//!
//! let config = EvalConfig::builder()
//!     .threshold(0.5)
//!     .seed(42)
//!     .report_dir("./reports")
//!     .build()?;
//!
//! let mut session = EvalSession::new(config);
//! session.set_scorer(Box::new(|table| {
//!     // Your model inference here
//!     Ok(probabilities)
//! }));
//!
//! let table = CsvImporter::auto_detect().import("applicants.csv")?;
//! let report = session.evaluate_table(&table)?;
//! session.write_report(&report, "fairness")?;
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`stats`]: Statistical utilities, ROC-AUC and the bootstrap
//! - [`metrics`]: Per-group confusion metrics, disparity and match rates
//! - [`flags`]: Policy thresholds over disparity
//! - [`advice`]: Remediation recommendations per flag
//! - [`pairs`]: Verification pair generation and similarity
//! - [`records`]: Scored classification records
//! - [`import`]: CSV and JSON input
//! - [`eval`]: Evaluation session and report generation

pub mod advice;
pub mod error;
pub mod eval;
pub mod flags;
pub mod import;
pub mod metrics;
pub mod pairs;
pub mod records;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use eval::{
    Assessment, EvalConfig, EvalSession, EvaluationReport,
    helpers::{assert_fair, evaluate_predictions},
};
pub use flags::{Flag, FlagMetric, FlagThresholds};
pub use import::{CsvImporter, RecordSchema, RecordTable};
pub use metrics::{ConfusionCounts, DisparityMetrics, MatchRates, PerGroupMetrics};
pub use pairs::{FaceSample, Pair, PairGenerator, PairingStrategy};
pub use records::SampleRecord;
pub use stats::{Bootstrap, SeededSampler, Summary};
