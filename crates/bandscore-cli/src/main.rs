//! bandscore CLI - the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bandscore",
    version,
    about = "Band scoring, feedback and study plans for essays and speaking responses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single piece of work
    Evaluate(EvaluateArgs),

    /// Evaluate every sample in a sample set file or directory
    Batch {
        /// Path to .toml sample set or directory
        #[arg(long)]
        samples: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output formats: json, html, all (comma-separated)
        #[arg(long, default_value = "json")]
        format: String,

        /// Max concurrent evaluations (defaults to the configured parallelism)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Use only the local rule-based scorer
        #[arg(long)]
        offline: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two batch reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Band change below which a sample counts as unchanged
        #[arg(long, default_value = "0.25")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate sample set TOML files
    Validate {
        /// Path to sample set file or directory
        #[arg(long)]
        samples: PathBuf,
    },

    /// Create starter config and example sample set
    Init,
}

#[derive(Args)]
pub struct EvaluateArgs {
    /// Read the work from a file
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    pub file: Option<PathBuf>,

    /// Pass the work inline
    #[arg(long)]
    pub text: Option<String>,

    /// Work type: essay, speaking (other labels are scored as general work)
    #[arg(long, default_value = "essay")]
    pub work_type: String,

    /// Task type: task1, task2, general
    #[arg(long, default_value = "task2")]
    pub task_type: String,

    /// Declared word count, used instead of counting
    #[arg(long)]
    pub word_count: Option<u32>,

    /// Output format: text, json, html
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Write the output to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Use only the local rule-based scorer
    #[arg(long)]
    pub offline: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bandscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::execute(args).await,
        Commands::Batch {
            samples,
            output,
            format,
            parallelism,
            offline,
            config,
        } => commands::batch::execute(samples, output, format, parallelism, offline, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { samples } => commands::validate::execute(samples),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
