//! Hardware latency emulation control
//!
//! Wraps the platform script that programs the emulated persistent-memory
//! latency. Its output goes into the sweep log and is never parsed.

use crate::invoker::SweepLog;
use nstore_eval_common::{EvalError, LatencyControlConfig, Result};
use std::process::{Command, Stdio};
use tracing::{info, warn};

pub struct LatencyController<'a> {
    config: &'a LatencyControlConfig,
}

impl<'a> LatencyController<'a> {
    pub fn new(config: &'a LatencyControlConfig) -> Self {
        Self { config }
    }

    pub fn args(&self, latency: u32) -> Vec<String> {
        vec![
            self.config.script.display().to_string(),
            "--enable".to_string(),
            "--pm-latency".to_string(),
            latency.to_string(),
        ]
    }

    /// Program the emulated latency. A failing script is reported but does
    /// not stop the sweep.
    pub fn apply(&self, latency: u32, log: &mut SweepLog) -> Result<()> {
        info!("Setting emulated PM latency to {}ns", latency);

        let status = Command::new(&self.config.program)
            .args(self.args(latency))
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(log.stdio()?)
            .status()
            .map_err(|source| EvalError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !status.success() {
            warn!("Latency control exited with {} for latency {}", status, latency);
        }
        Ok(())
    }
}
