//! nstore-eval - YCSB sweep driver
//!
//! Runs the selected evaluation phases in a fixed order: performance sweep,
//! storage sweep, performance chart export, storage chart export.

use anyhow::{Context, Result};
use clap::Parser;
use nstore_eval::prelude::*;
use nstore_eval::bench::utils::format_duration;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "nstore-eval")]
#[command(about = "Run YCSB experiments against the N-Store engines")]
#[command(version)]
struct Cli {
    /// Program the emulated PM latency before each latency block
    #[arg(short = 'x', long)]
    enable_sdv: bool,

    /// Average over multiple trials
    #[arg(short = 't', long)]
    enable_trials: bool,

    /// Run the YCSB throughput sweep
    #[arg(short = 'y', long)]
    ycsb_perf_eval: bool,

    /// Run the YCSB storage footprint sweep
    #[arg(short = 's', long)]
    ycsb_storage_eval: bool,

    /// Export throughput chart data
    #[arg(short = 'p', long)]
    ycsb_perf_plot: bool,

    /// Export storage chart data
    #[arg(short = 'q', long)]
    ycsb_storage_plot: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(long)]
    quiet: bool,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> EvalOptions {
        EvalOptions {
            enable_sdv: self.enable_sdv,
            enable_trials: self.enable_trials,
        }
    }

    fn any_phase(&self) -> bool {
        self.ycsb_perf_eval || self.ycsb_storage_eval || self.ycsb_perf_plot || self.ycsb_storage_plot
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("nstore_eval={0},nstore_eval_bench={0},nstore_eval_common={0}", level).into()
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_configuration(path: Option<&PathBuf>) -> Result<EvalConfig> {
    let source = match path {
        Some(path) => ConfigSource::File(path.clone()),
        None => ConfigSource::Environment,
    };
    load_config(source).context("Failed to load configuration")
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.write_config {
        EvalConfig::default()
            .to_file(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Default configuration written to {}", path.display());
        return Ok(());
    }

    if !cli.any_phase() {
        warn!("No phase selected; pass one of -y, -s, -p, -q");
        return Ok(());
    }

    let config = load_configuration(cli.config.as_ref())?;
    let options = cli.options();

    if cli.ycsb_perf_eval {
        let report = ycsb_perf_eval(&config, options).context("YCSB performance evaluation failed")?;
        print!("{}", report.table_text());
    }

    if cli.ycsb_storage_eval {
        let report = ycsb_storage_eval(&config).context("YCSB storage evaluation failed")?;
        for row in &report.rows {
            println!("{} {} {}", row.engine, row.workload, row.line());
        }
    }

    if cli.ycsb_perf_plot {
        let files = ycsb_perf_plot(&config).context("YCSB performance chart export failed")?;
        info!("Wrote {} performance chart files", files.len());
    }

    if cli.ycsb_storage_plot {
        let files = ycsb_storage_plot(&config).context("YCSB storage chart export failed")?;
        info!("Wrote {} storage chart files", files.len());
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let start_time = Instant::now();
    match run(&cli) {
        Ok(()) => info!("Completed in {}", format_duration(start_time.elapsed())),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
