//! Report summary command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fair_eval::EvaluationReport;
use fair_eval::stats::Summary;

pub fn run(input: PathBuf) -> Result<()> {
    let report = EvaluationReport::from_json_file(&input)
        .with_context(|| format!("Failed to read report from {}", input.display()))?;

    println!("Report generated: {}", report.timestamp.to_rfc3339());
    super::print_report(&report);

    // Spread of per-group rates
    println!();
    println!("Across {} groups:", report.group_metrics.len());
    let groups = &report.group_metrics;
    let series: [(&str, Vec<f64>); 3] = [
        ("Approval rate", groups.values().map(|g| g.approval_rate).collect()),
        ("TPR", groups.values().map(|g| g.tpr).collect()),
        ("FPR", groups.values().map(|g| g.fpr).collect()),
    ];
    for (label, values) in &series {
        if let Some(summary) = Summary::compute(values) {
            println!(
                "  {}: mean {:.3}, median {:.3}, min {:.3}, max {:.3}, std_dev {:.3}",
                label, summary.mean, summary.median, summary.min, summary.max, summary.std_dev
            );
        }
    }
    Ok(())
}
