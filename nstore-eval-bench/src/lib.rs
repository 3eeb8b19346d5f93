//! N-Store evaluation pipeline
//!
//! Drives the external storage-engine benchmark across a sweep of latency,
//! trial, read/write mix, skew and engine settings, then reduces the run log
//! into a file-based result store:
//! - Configuration space enumeration and run invocation
//! - Sweep log parsing and per-condition aggregation
//! - Result store writing and console tables
//! - Storage footprint probes and chart-data export

pub mod analysis;
pub mod chart_data;
pub mod invoker;
pub mod latency;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod store;
pub mod sweep;
pub mod utils;

pub use analysis::{aggregate, AggregateRow, AggregateStat, SampleSet};
pub use invoker::{clear_scratch, RunInvoker, RunOutcome, SweepLog};
pub use parser::{parse_log, parse_log_file, LogLine, ParsedLog, ParserState};
pub use pipeline::{
    ycsb_perf_eval, ycsb_perf_plot, ycsb_storage_eval, ycsb_storage_plot, EvalOptions,
    PerfEvalReport, StorageEvalReport,
};
pub use store::{ResultKind, ResultStore, StorageRow};
pub use sweep::{ConfigPoint, ConfigSpace, StoragePoint};
