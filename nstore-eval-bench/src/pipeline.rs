//! Evaluation phases
//!
//! Each phase is a blocking, sequential function over an [`EvalConfig`]:
//!
//! - `ycsb_perf_eval`: sweep, parse the log, aggregate, persist, tabulate
//! - `ycsb_storage_eval`: sweep with a storage probe after every run
//! - `ycsb_perf_plot` / `ycsb_storage_plot`: export chart data from the store

use crate::analysis::{aggregate, AggregateRow};
use crate::chart_data::{performance_charts, storage_charts, write_chart, ChartData};
use crate::invoker::{RunInvoker, SweepLog};
use crate::latency::LatencyController;
use crate::parser::{
    latency_marker, parse_log_file, position_marker, separator, storage_position_marker,
};
use crate::report::{build_tables, render_tables, WorkloadTable};
use crate::storage::StorageProbe;
use crate::store::{ResultKind, ResultStore, StorageRow};
use crate::sweep::ConfigSpace;
use crate::utils::format_duration;
use nstore_eval_common::{EvalConfig, Result, WorkloadCategory};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Command-line switches that shape a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    /// Program the emulated PM latency before each latency block
    pub enable_sdv: bool,
    /// Use `extended_trials` instead of `trials`
    pub enable_trials: bool,
}

#[derive(Debug, Clone)]
pub struct PerfEvalReport {
    pub runs: usize,
    pub failed_runs: usize,
    pub samples: usize,
    pub rows: Vec<AggregateRow>,
    pub tables: Vec<WorkloadTable>,
    pub leaf_files: usize,
    pub elapsed: Duration,
}

impl PerfEvalReport {
    pub fn table_text(&self) -> String {
        render_tables(&self.tables)
    }
}

#[derive(Debug, Clone)]
pub struct StorageEvalReport {
    pub runs: usize,
    pub failed_runs: usize,
    pub rows: Vec<StorageRow>,
    pub elapsed: Duration,
}

/// Run the performance sweep and reduce its log into the result store
pub fn ycsb_perf_eval(config: &EvalConfig, options: EvalOptions) -> Result<PerfEvalReport> {
    let start = Instant::now();
    let trials = config.sweep.trial_count(options.enable_trials);
    let space = ConfigSpace::new(&config.sweep, trials);
    info!(
        "Performance sweep: {} runs, {} trial(s), log {}",
        space.len(),
        trials,
        config.logs.performance_log.display()
    );

    let mut log = SweepLog::create(&config.logs.performance_log, "performance")?;
    let invoker = RunInvoker::new(&config.benchmark, &config.storage.scratch_dir);
    let latency_control = LatencyController::new(&config.latency_control);
    let sdv = options.enable_sdv || config.latency_control.enabled;

    let mut current_latency = None;
    let mut current_position = None;
    let mut runs = 0;
    let mut failed_runs = 0;

    for point in space.points() {
        if current_latency != Some(point.latency) {
            current_latency = Some(point.latency);
            current_position = None;
            log.marker(&latency_marker(point.latency))?;
            if sdv {
                latency_control.apply(point.latency, &mut log)?;
            }
        }

        let position = (point.trial, point.rw_mix.to_bits(), point.skew_factor.to_bits());
        if current_position != Some(position) {
            current_position = Some(position);
            log.write_line(separator())?;
            log.marker(&position_marker(point.trial, point.rw_mix, point.skew_factor))?;
        }

        let outcome = invoker.run(&mut log, point.rw_mix, point.skew_factor, point.engine)?;
        runs += 1;
        if !outcome.succeeded() {
            failed_runs += 1;
        }
    }
    drop(log);

    let parsed = parse_log_file(&config.logs.performance_log)?;
    let rows = aggregate(&parsed.samples)?;

    let mut store = ResultStore::new(&config.results.performance_dir, ResultKind::Performance);
    store.reset()?;
    let leaf_files = store.write_performance(&rows)?;

    let tables = build_tables(&rows, parsed.block_len());
    let elapsed = start.elapsed();

    if failed_runs > 0 {
        warn!("{} of {} benchmark runs exited with failure", failed_runs, runs);
    }
    info!(
        "Performance sweep done in {}: {} samples, {} conditions, {} result files",
        format_duration(elapsed),
        parsed.sample_count(),
        rows.len(),
        leaf_files
    );

    Ok(PerfEvalReport {
        runs,
        failed_runs,
        samples: parsed.sample_count(),
        rows,
        tables,
        leaf_files,
        elapsed,
    })
}

/// Run the storage-footprint sweep, writing one row per run
pub fn ycsb_storage_eval(config: &EvalConfig) -> Result<StorageEvalReport> {
    let start = Instant::now();
    let space = ConfigSpace::new(&config.sweep, 1);

    let mut store = ResultStore::new(&config.results.storage_dir, ResultKind::Storage);
    store.reset()?;

    let mut log = SweepLog::create(&config.logs.storage_log, "storage")?;
    let invoker = RunInvoker::new(&config.benchmark, &config.storage.scratch_dir);
    let probe = StorageProbe::new(&config.storage);

    let mut current_position = None;
    let mut runs = 0;
    let mut failed_runs = 0;
    let mut rows = Vec::new();

    for point in space.storage_points() {
        let position = (point.rw_mix.to_bits(), point.skew_factor.to_bits());
        if current_position != Some(position) {
            current_position = Some(position);
            log.write_line(separator())?;
            log.marker(&storage_position_marker(point.rw_mix, point.skew_factor))?;
        }

        let outcome = invoker.run(&mut log, point.rw_mix, point.skew_factor, point.engine)?;
        runs += 1;
        if !outcome.succeeded() {
            failed_runs += 1;
        }

        let usage = probe.probe(&mut log)?;
        let row = StorageRow {
            engine: point.engine,
            workload: WorkloadCategory::classify(point.rw_mix)?,
            skew_factor: point.skew_factor,
            fs_bytes: usage.fs_bytes,
            pm_bytes: usage.pm_bytes,
        };
        store.append_storage(&row)?;
        info!("{} {}: {}", row.engine, row.workload, row.line());
        rows.push(row);
    }

    let elapsed = start.elapsed();
    if failed_runs > 0 {
        warn!("{} of {} benchmark runs exited with failure", failed_runs, runs);
    }
    info!("Storage sweep done in {}: {} rows", format_duration(elapsed), rows.len());

    Ok(StorageEvalReport {
        runs,
        failed_runs,
        rows,
        elapsed,
    })
}

fn export_charts(config: &EvalConfig, charts: Vec<ChartData>) -> Result<Vec<PathBuf>> {
    charts
        .iter()
        .map(|chart| write_chart(&config.results.chart_dir, chart))
        .collect()
}

pub fn ycsb_perf_plot(config: &EvalConfig) -> Result<Vec<PathBuf>> {
    let charts = performance_charts(&config.results.performance_dir, &config.sweep)?;
    export_charts(config, charts)
}

pub fn ycsb_storage_plot(config: &EvalConfig) -> Result<Vec<PathBuf>> {
    let charts = storage_charts(&config.results.storage_dir, &config.sweep)?;
    export_charts(config, charts)
}
