// -----------------------------------------------------------------------------
// mdstore-bench - synthetic event workloads for a metadata store
// -----------------------------------------------------------------------------

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;

use mdstore_bench::config::Config;
use mdstore_bench::population::Population;
use mdstore_bench::runner::run_workload;
use mdstore_bench::tsv_export::TsvExporter;
use mdstore_bench::validation::{display_config_summary, output_capacity_warning};
use mdstore_bench::{FillEvents, InMemoryStore};

// -----------------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------------
#[derive(Parser)]
#[command(name = "mdstore-bench", version, about = "Benchmark a metadata store's event write path")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fill-events workload from a config file
    ///
    /// Examples:
    ///   mdstore-bench run --config fill_output.yaml
    ///   mdstore-bench run --config fill_input.yaml --results-tsv /tmp/fill
    Run {
        #[arg(long)]
        config: PathBuf,

        /// Export results to <PATH>-results.tsv
        #[arg(long, value_name = "PATH")]
        results_tsv: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Parse and validate a config file, then print what would run
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

// -----------------------------------------------------------------------------
// main
// -----------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::new(format!("mdstore_bench={}", level));
    fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run { config, results_tsv, quiet } => run_cmd(&config, results_tsv, quiet).await,
        Commands::Validate { config } => validate_cmd(&config),
    }
}

async fn run_cmd(config_path: &Path, results_tsv: Option<PathBuf>, quiet: bool) -> Result<()> {
    let cfg = Config::from_file(config_path)?;
    if let Some(warning) = output_capacity_warning(&cfg) {
        tracing::warn!("{}", warning);
    }

    info!(
        "Seeding in-memory store with {} artifacts and {} executions",
        cfg.population.artifacts, cfg.population.executions
    );
    let store = InMemoryStore::with_population(cfg.population.artifacts, cfg.population.executions);
    let population = Population::discover(&store).await?;
    let mut workload = FillEvents::from_config(&cfg, population);

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(cfg.num_operations);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>7}/{len:7} ops ({per_sec}, {eta})")
                .context("progress bar template")?,
        );
        pb
    };

    let summary = run_workload(&mut workload, &store, Some(&pb)).await?;
    summary.print();

    if let Some(base) = results_tsv {
        let path = TsvExporter::new(base).export(std::slice::from_ref(&summary))?;
        println!("TSV results exported to: {}", path.display());
    }
    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let cfg = Config::parse_file(config_path)?;
    display_config_summary(&cfg, &config_path.display().to_string())
}
