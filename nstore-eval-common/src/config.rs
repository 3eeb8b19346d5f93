//! Configuration for YCSB evaluation sweeps

use crate::error::{EvalError, Result};
use crate::types::{EngineVariant, WorkloadCategory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// External benchmark executable and its fixed workload size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub executable: PathBuf,
    /// Number of keys loaded before the transaction phase (`-k`)
    pub keys: u64,
    /// Number of transactions per run (`-x`)
    pub txns: u64,
    /// Also send the benchmark's stderr into the sweep log
    pub capture_stderr: bool,
    /// Stop the phase on the first non-zero benchmark exit
    pub abort_on_failure: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("./src/nstore"),
            keys: 2000,
            txns: 5000,
            capture_stderr: true,
            abort_on_failure: false,
        }
    }
}

/// Dimensions of the configuration space
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Emulated persistent-memory latencies in nanoseconds
    pub latencies: Vec<u32>,
    /// Trials per point when multi-trial averaging is off
    pub trials: u32,
    /// Trials per point with `--enable-trials`
    pub extended_trials: u32,
    /// Write fractions; each must map to a workload category
    pub rw_mixes: Vec<f64>,
    pub skew_factors: Vec<f64>,
    pub engines: Vec<EngineVariant>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            latencies: vec![200, 800],
            trials: 1,
            extended_trials: 3,
            rw_mixes: vec![0.0, 0.5],
            skew_factors: vec![0.1, 1.0],
            engines: EngineVariant::ALL.to_vec(),
        }
    }
}

impl SweepConfig {
    pub fn trial_count(&self, enable_trials: bool) -> u32 {
        if enable_trials {
            self.extended_trials
        } else {
            self.trials
        }
    }

    /// Workload categories covered by the configured mixes, in mix order
    pub fn workloads(&self) -> Vec<WorkloadCategory> {
        let mut workloads = Vec::new();
        for mix in &self.rw_mixes {
            if let Some(category) = WorkloadCategory::from_rw_mix(*mix) {
                if !workloads.contains(&category) {
                    workloads.push(category);
                }
            }
        }
        workloads
    }
}

/// Hardware latency emulation script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyControlConfig {
    pub enabled: bool,
    /// Launcher, usually `sudo`
    pub program: PathBuf,
    pub script: PathBuf,
    /// Directory the script must be run from
    pub working_dir: PathBuf,
}

impl Default for LatencyControlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: PathBuf::from("sudo"),
            script: PathBuf::from("/data/devel/sdv-tools/sdv-release/ivt_pm_sdv.sh"),
            working_dir: PathBuf::from("/data/devel/sdv-tools/sdv-release"),
        }
    }
}

/// Scratch storage shared by every benchmark run, plus the usage probes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Wiped before every run
    pub scratch_dir: PathBuf,
    pub pmem_check: PathBuf,
    /// Persistent-memory pool file inside the scratch dir
    pub pm_file: String,
    /// Files counted towards filesystem usage
    pub fs_pattern: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("/mnt/pmfs/n-store/"),
            pmem_check: PathBuf::from("./src/pmem_check"),
            pm_file: "zfile".to_string(),
            fs_pattern: "*.nvm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    pub performance_dir: PathBuf,
    pub storage_dir: PathBuf,
    /// Where chart data exports are written
    pub chart_dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            performance_dir: PathBuf::from("../results/ycsb/performance/"),
            storage_dir: PathBuf::from("../results/ycsb/storage/"),
            chart_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub performance_log: PathBuf,
    pub storage_log: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            performance_log: PathBuf::from("ycsb_perf.log"),
            storage_log: PathBuf::from("ycsb_storage.log"),
        }
    }
}

/// Complete evaluation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub benchmark: BenchmarkConfig,
    pub sweep: SweepConfig,
    pub latency_control: LatencyControlConfig,
    pub storage: StorageConfig,
    pub results: ResultsConfig,
    pub logs: LogConfig,
}

impl EvalConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EvalError::Serialization(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override selected fields from `NSTORE_EVAL_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(exe) = std::env::var("NSTORE_EVAL_BENCHMARK") {
            self.benchmark.executable = PathBuf::from(exe);
        }
        if let Ok(dir) = std::env::var("NSTORE_EVAL_SCRATCH_DIR") {
            self.storage.scratch_dir = PathBuf::from(dir);
        }
        if let Ok(keys) = std::env::var("NSTORE_EVAL_KEYS") {
            self.benchmark.keys = keys.parse().map_err(|_| EvalError::InvalidNumber(keys))?;
        }
        if let Ok(txns) = std::env::var("NSTORE_EVAL_TXNS") {
            self.benchmark.txns = txns.parse().map_err(|_| EvalError::InvalidNumber(txns))?;
        }
        if let Ok(root) = std::env::var("NSTORE_EVAL_RESULTS_DIR") {
            let root = PathBuf::from(root);
            self.results.performance_dir = root.join("performance");
            self.results.storage_dir = root.join("storage");
        }
        Ok(())
    }

    /// Reject configurations the sweep cannot attribute results for
    pub fn validate(&self) -> Result<()> {
        let sweep = &self.sweep;
        if sweep.latencies.is_empty() {
            return Err(EvalError::Config("no latencies configured".into()));
        }
        if sweep.rw_mixes.is_empty() || sweep.skew_factors.is_empty() {
            return Err(EvalError::Config("rw_mixes and skew_factors must not be empty".into()));
        }
        if sweep.engines.is_empty() {
            return Err(EvalError::Config("no engines configured".into()));
        }
        if sweep.trials == 0 || sweep.extended_trials == 0 {
            return Err(EvalError::Config("trial counts must be at least 1".into()));
        }
        for mix in &sweep.rw_mixes {
            WorkloadCategory::classify(*mix)?;
        }
        for skew in &sweep.skew_factors {
            if !skew.is_finite() || *skew < 0.0 {
                return Err(EvalError::Config(format!("invalid skew factor {}", skew)));
            }
        }
        // values are logged at marker precision; two that print alike share a key
        ensure_distinct("rw_mixes", sweep.rw_mixes.iter().map(|m| format!("{:.1}", m)))?;
        ensure_distinct("skew_factors", sweep.skew_factors.iter().map(|s| format!("{:.2}", s)))?;
        Ok(())
    }
}

fn ensure_distinct(name: &str, texts: impl Iterator<Item = String>) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for text in texts {
        if !seen.insert(text.clone()) {
            return Err(EvalError::Config(format!(
                "{} has more than one value logged as {}",
                name, text
            )));
        }
    }
    Ok(())
}

/// Configuration source for loading evaluation settings
pub enum ConfigSource {
    File(PathBuf),
    Default,
    Environment,
}

/// Load and validate configuration from the given source
pub fn load_config(source: ConfigSource) -> Result<EvalConfig> {
    let config = match source {
        ConfigSource::File(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            EvalConfig::from_file(&path)?
        }
        ConfigSource::Default => EvalConfig::default(),
        ConfigSource::Environment => {
            let mut config = EvalConfig::default();
            config.apply_env_overrides()?;
            config
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.benchmark.keys, 2000);
        assert_eq!(config.benchmark.txns, 5000);
        assert_eq!(config.sweep.latencies, vec![200, 800]);
        assert_eq!(config.sweep.engines.len(), 6);
        assert!(!config.latency_control.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_trial_count() {
        let sweep = SweepConfig::default();
        assert_eq!(sweep.trial_count(false), 1);
        assert_eq!(sweep.trial_count(true), 3);
    }

    #[test]
    fn test_workloads_follow_mix_order() {
        let sweep = SweepConfig {
            rw_mixes: vec![0.5, 0.0, 0.5, 0.1],
            ..SweepConfig::default()
        };
        assert_eq!(
            sweep.workloads(),
            vec![
                WorkloadCategory::WriteHeavy,
                WorkloadCategory::ReadOnly,
                WorkloadCategory::ReadHeavy
            ]
        );
    }

    #[test]
    fn test_validate_rejects_unknown_mix() {
        let mut config = EvalConfig::default();
        config.sweep.rw_mixes.push(0.25);
        assert!(matches!(config.validate(), Err(EvalError::UnclassifiedRwMix(_))));

        let mut config = EvalConfig::default();
        config.sweep.trials = 0;
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_values_sharing_marker_text() {
        let mut config = EvalConfig::default();
        config.sweep.skew_factors = vec![0.001, 0.002];
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));

        config.sweep.skew_factors = vec![0.1, 0.1];
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));

        config.sweep.skew_factors = vec![0.1, 0.5, 1.0];
        config.validate().unwrap();

        config.sweep.rw_mixes = vec![0.0, 0.5, 0.0];
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_config_file_operations() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("eval.toml");

        let mut config = EvalConfig::default();
        config.sweep.latencies = vec![400];
        config.to_file(&config_path).unwrap();

        let loaded = load_config(ConfigSource::File(config_path)).unwrap();
        assert_eq!(loaded.sweep.latencies, vec![400]);
        assert_eq!(loaded.sweep.engines, config.sweep.engines);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: EvalConfig = toml::from_str(
            r#"
            [sweep]
            engines = ["wal", "opt_wal"]

            [storage]
            scratch_dir = "/tmp/scratch"
            "#,
        )
        .unwrap();
        assert_eq!(config.sweep.engines, vec![EngineVariant::Wal, EngineVariant::OptWal]);
        assert_eq!(config.sweep.latencies, vec![200, 800]);
        assert_eq!(config.storage.scratch_dir, PathBuf::from("/tmp/scratch"));
        assert_eq!(config.storage.pm_file, "zfile");
    }
}
