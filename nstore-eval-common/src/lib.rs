pub mod types;
pub mod error;
pub mod config;

pub use types::*;
pub use error::{EvalError, Result};
pub use config::{
    load_config, BenchmarkConfig, ConfigSource, EvalConfig, LatencyControlConfig, LogConfig,
    ResultsConfig, StorageConfig, SweepConfig,
};
