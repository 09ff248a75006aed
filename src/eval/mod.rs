//! Evaluation session and report generation.
//!
//! This module provides the core evaluation infrastructure:
//!
//! - [`session::EvalSession`]: Main evaluation session with model adapters
//! - [`session::EvalConfig`]: Configuration for evaluation
//! - [`report`]: The evaluation report and its assembly
//! - [`helpers`]: Shortcuts for tests and CI checks

pub mod helpers;
pub mod report;
pub mod session;

pub use helpers::{assert_fair, evaluate_predictions};
pub use report::{Assessment, EvalMode, EvaluationReport, ReportAssembler, ReportMetadata};
pub use session::{BootstrapConfig, EmbedFn, EvalConfig, EvalConfigBuilder, EvalSession, ScoreFn};
