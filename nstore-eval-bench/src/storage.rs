//! Storage footprint probes
//!
//! After each storage-sweep run the scratch directory is inspected twice:
//! the filesystem figure sums the sizes of the engine's data files, and the
//! persistent-memory figure comes from the pool checker's `Active` line.
//! Missing data in either case counts as zero.

use crate::invoker::SweepLog;
use crate::utils::format_bytes;
use nstore_eval_common::{EvalError, Result, StorageConfig};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Bytes used by one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageUsage {
    pub fs_bytes: u64,
    pub pm_bytes: u64,
}

/// Extract the byte count from pool checker output: the second field of the
/// first line mentioning `Active`. No such line, or no second field, is 0.
pub fn parse_active_bytes(output: &str) -> Result<u64> {
    let Some(line) = output.lines().find(|line| line.contains("Active")) else {
        return Ok(0);
    };
    match line.split_whitespace().nth(1) {
        Some(field) => field
            .parse::<u64>()
            .map_err(|_| EvalError::ProbeOutput(line.trim().to_string())),
        None => Ok(0),
    }
}

pub struct StorageProbe<'a> {
    config: &'a StorageConfig,
}

impl<'a> StorageProbe<'a> {
    pub fn new(config: &'a StorageConfig) -> Self {
        Self { config }
    }

    /// Sum of sizes of regular files matching `fs_pattern` anywhere under the
    /// scratch directory
    pub fn filesystem_bytes(&self) -> Result<u64> {
        let root = glob::Pattern::escape(&self.config.scratch_dir.to_string_lossy());
        let pattern = format!("{}/**/{}", root.trim_end_matches('/'), self.config.fs_pattern);

        let paths = glob::glob(&pattern)
            .map_err(|e| EvalError::Config(format!("invalid fs_pattern {}: {}", pattern, e)))?;

        let mut total = 0;
        for entry in paths {
            let path = entry.map_err(std::io::Error::from)?;
            let metadata = fs::metadata(&path)?;
            if metadata.is_file() {
                total += metadata.len();
            }
        }
        Ok(total)
    }

    /// Run the pool checker on the engine's pool file. Its output is copied
    /// into the sweep log before being parsed.
    pub fn pm_bytes(&self, log: &mut SweepLog) -> Result<u64> {
        let pool = self.config.scratch_dir.join(&self.config.pm_file);
        let output = Command::new(&self.config.pmem_check)
            .arg(&pool)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EvalError::Spawn {
                program: self.config.pmem_check.clone(),
                source,
            })?;

        if !output.status.success() {
            warn!("{} exited with {} for {}", self.config.pmem_check.display(), output.status, pool.display());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            log.write_line(line)?;
        }
        parse_active_bytes(&stdout)
    }

    /// Record a listing of the scratch directory, then both usage figures
    pub fn probe(&self, log: &mut SweepLog) -> Result<StorageUsage> {
        write_listing(&self.config.scratch_dir, log)?;

        let fs_bytes = self.filesystem_bytes()?;
        log.write_line(&format!("FS STORAGE :: {}", fs_bytes))?;
        let pm_bytes = self.pm_bytes(log)?;
        log.write_line(&format!("PM STORAGE :: {}", pm_bytes))?;

        info!(
            "FS STORAGE :: {} ({})  PM STORAGE :: {} ({})",
            fs_bytes,
            format_bytes(fs_bytes),
            pm_bytes,
            format_bytes(pm_bytes)
        );
        Ok(StorageUsage { fs_bytes, pm_bytes })
    }
}

fn write_listing(dir: &Path, log: &mut SweepLog) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), metadata.len(), metadata.is_dir()));
    }
    entries.sort();

    debug!("{} entries in {}", entries.len(), dir.display());
    for (name, len, is_dir) in entries {
        let suffix = if is_dir { "/" } else { "" };
        log.write_line(&format!("{:>12} {}{}", len, name, suffix))?;
    }
    Ok(())
}
