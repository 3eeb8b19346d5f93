//! Benchmark invocation and the shared sweep log
//!
//! Every run clears the scratch directory, then executes the benchmark with
//! its stdout (and optionally stderr) attached to the sweep log. Runs are
//! strictly sequential because they all share the scratch directory.

use nstore_eval_common::{BenchmarkConfig, EngineVariant, EvalError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info, warn};

/// Append-only log shared by the driver and every child process
pub struct SweepLog {
    path: PathBuf,
    file: File,
}

impl SweepLog {
    /// Truncate `path` and start a new log with a header line for `phase`
    pub fn create(path: &Path, phase: &str) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?;
        let file = OpenOptions::new().append(true).open(path)?;
        let mut log = Self {
            path: path.to_path_buf(),
            file,
        };
        log.write_line(&format!(
            "# nstore-eval {} sweep started {}",
            phase,
            chrono::Utc::now().to_rfc3339()
        ))?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    /// Write a marker line and echo it to the console log
    pub fn marker(&mut self, line: &str) -> Result<()> {
        info!("{}", line);
        self.write_line(line)
    }

    /// Handle for a child process to write into the log
    pub fn stdio(&self) -> Result<Stdio> {
        Ok(Stdio::from(self.file.try_clone()?))
    }
}

/// Remove every non-directory entry directly inside `dir`, creating it if
/// missing. Returns the number of entries removed.
pub fn clear_scratch(dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        fs::remove_file(entry.path())?;
        removed += 1;
    }
    debug!("Cleared {} entries from {}", removed, dir.display());
    Ok(removed)
}

/// Outcome of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: ExitStatus,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.success()
    }
}

/// Runs the external benchmark for one sweep point
pub struct RunInvoker<'a> {
    benchmark: &'a BenchmarkConfig,
    scratch_dir: &'a Path,
}

impl<'a> RunInvoker<'a> {
    pub fn new(benchmark: &'a BenchmarkConfig, scratch_dir: &'a Path) -> Self {
        Self {
            benchmark,
            scratch_dir,
        }
    }

    /// Command-line arguments for one run
    pub fn benchmark_args(&self, rw_mix: f64, skew_factor: f64, engine: EngineVariant) -> Vec<String> {
        vec![
            "-k".to_string(),
            self.benchmark.keys.to_string(),
            "-x".to_string(),
            self.benchmark.txns.to_string(),
            "-p".to_string(),
            format!("{:?}", rw_mix),
            "-q".to_string(),
            format!("{:?}", skew_factor),
            engine.flag().to_string(),
        ]
    }

    /// Clear scratch storage and run the benchmark to completion.
    ///
    /// A non-zero exit is reported and returned in the outcome; it only
    /// becomes an error when `abort_on_failure` is set.
    pub fn run(
        &self,
        log: &mut SweepLog,
        rw_mix: f64,
        skew_factor: f64,
        engine: EngineVariant,
    ) -> Result<RunOutcome> {
        clear_scratch(self.scratch_dir)?;

        let args = self.benchmark_args(rw_mix, skew_factor, engine);
        debug!("Running {} {}", self.benchmark.executable.display(), args.join(" "));

        let stderr = if self.benchmark.capture_stderr {
            log.stdio()?
        } else {
            Stdio::inherit()
        };
        let status = Command::new(&self.benchmark.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(log.stdio()?)
            .stderr(stderr)
            .status()
            .map_err(|source| EvalError::Spawn {
                program: self.benchmark.executable.clone(),
                source,
            })?;

        if !status.success() {
            warn!(
                "Benchmark run failed ({}): engine {} rw_mix {} skew {}",
                status, engine, rw_mix, skew_factor
            );
            if self.benchmark.abort_on_failure {
                return Err(EvalError::ProcessFailed {
                    program: self.benchmark.executable.clone(),
                    status: status.to_string(),
                });
            }
        }

        Ok(RunOutcome { status })
    }
}
