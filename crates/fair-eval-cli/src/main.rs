//! fair-eval CLI - Group fairness evaluation tool

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{EvalOptions, StrategyArg};

/// Group fairness evaluation for classifiers and face-verification models.
#[derive(Parser)]
#[command(name = "fair-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate classifier predictions from a CSV file
    Classify {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// True label column name
        #[arg(long)]
        label_col: Option<String>,

        /// Protected group column name
        #[arg(long)]
        group_col: Option<String>,

        /// Predicted probability column name
        #[arg(long)]
        prob_col: Option<String>,

        /// Record id column name
        #[arg(long)]
        id_col: Option<String>,

        /// Label value treated as the positive class
        #[arg(long)]
        positive_label: Option<String>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate a face-verification model from embedded samples (JSON)
    Verify {
        /// Input JSON file with an array of embedded samples
        #[arg(short, long)]
        input: PathBuf,

        /// Pairing strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Global cap on impostor pairs (identity strategy)
        #[arg(long)]
        impostor_cap: Option<usize>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Show a saved evaluation report
    Summary {
        /// Report JSON file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Classify {
            input,
            label_col,
            group_col,
            prob_col,
            id_col,
            positive_label,
            options,
        } => commands::classify::run(
            input,
            commands::classify::Columns {
                label: label_col,
                group: group_col,
                probability: prob_col,
                id: id_col,
                positive_label,
            },
            &options,
        ),
        Commands::Verify {
            input,
            strategy,
            impostor_cap,
            options,
        } => commands::verify::run(input, strategy, impostor_cap, &options),
        Commands::Summary { input } => commands::summary::run(input),
    }
}
