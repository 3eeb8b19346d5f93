//! Configuration space enumeration
//!
//! The nesting order is latency, trial, read/write mix, skew, engine (outer to
//! inner). The sweep log is written in exactly this order and the log parser
//! attributes throughput lines using the markers it produces, so the order is
//! part of the log contract.

use nstore_eval_common::{EngineVariant, SweepConfig};

/// One point of the performance sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigPoint {
    pub latency: u32,
    pub trial: u32,
    pub rw_mix: f64,
    pub skew_factor: f64,
    pub engine: EngineVariant,
}

/// One point of the storage-footprint sweep; no latency or trial dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoragePoint {
    pub rw_mix: f64,
    pub skew_factor: f64,
    pub engine: EngineVariant,
}

/// Cross product of the configured sweep dimensions
#[derive(Debug, Clone)]
pub struct ConfigSpace<'a> {
    sweep: &'a SweepConfig,
    trials: u32,
}

impl<'a> ConfigSpace<'a> {
    pub fn new(sweep: &'a SweepConfig, trials: u32) -> Self {
        Self { sweep, trials }
    }

    pub fn len(&self) -> usize {
        self.sweep.latencies.len()
            * self.trials as usize
            * self.sweep.rw_mixes.len()
            * self.sweep.skew_factors.len()
            * self.sweep.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points in sweep order
    pub fn points(&self) -> impl Iterator<Item = ConfigPoint> + 'a {
        let sweep = self.sweep;
        let trials = self.trials;
        sweep.latencies.iter().flat_map(move |&latency| {
            (0..trials).flat_map(move |trial| {
                sweep.rw_mixes.iter().flat_map(move |&rw_mix| {
                    sweep.skew_factors.iter().flat_map(move |&skew_factor| {
                        sweep.engines.iter().map(move |&engine| ConfigPoint {
                            latency,
                            trial,
                            rw_mix,
                            skew_factor,
                            engine,
                        })
                    })
                })
            })
        })
    }

    /// Storage sweep points: read/write mix, skew, engine
    pub fn storage_points(&self) -> impl Iterator<Item = StoragePoint> + 'a {
        let sweep = self.sweep;
        sweep.rw_mixes.iter().flat_map(move |&rw_mix| {
            sweep.skew_factors.iter().flat_map(move |&skew_factor| {
                sweep.engines.iter().map(move |&engine| StoragePoint {
                    rw_mix,
                    skew_factor,
                    engine,
                })
            })
        })
    }
}
