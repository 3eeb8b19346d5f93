//! Aggregation of throughput samples into per-condition statistics

use crate::utils::{calculate_mean, calculate_std_dev, format_rounded};
use nstore_eval_common::{MeasurementKey, Result, WorkloadCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const MEAN_PLACES: i32 = 2;
const RELATIVE_STDDEV_PLACES: i32 = 3;

/// Throughput samples for one condition, in the order they were parsed.
///
/// Never empty: a set is created from its first sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    values: Vec<f64>,
}

impl SampleSet {
    pub fn new(first: f64) -> Self {
        Self { values: vec![first] }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Summary statistics for one sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub mean: f64,
    /// Population standard deviation over the mean; `None` when the mean is zero
    pub relative_stddev: Option<f64>,
}

impl AggregateStat {
    pub fn from_samples(samples: &SampleSet) -> Self {
        let mean = calculate_mean(samples.values()).unwrap_or(0.0);
        let relative_stddev = if mean != 0.0 && mean.is_finite() {
            Some(calculate_std_dev(samples.values()) / mean)
        } else {
            None
        };
        Self { mean, relative_stddev }
    }

    /// Mean as written to the result store and the console
    pub fn mean_text(&self) -> String {
        format_rounded(self.mean, MEAN_PLACES)
    }

    pub fn relative_stddev_text(&self) -> String {
        match self.relative_stddev {
            Some(rsd) => format_rounded(rsd, RELATIVE_STDDEV_PLACES),
            None => "n/a".to_string(),
        }
    }
}

/// Aggregated result for one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: MeasurementKey,
    pub workload: WorkloadCategory,
    pub stat: AggregateStat,
    pub samples: usize,
}

/// Compute statistics for every condition, in key order.
///
/// Fails if a condition's read/write mix has no workload category.
pub fn aggregate(samples: &BTreeMap<MeasurementKey, SampleSet>) -> Result<Vec<AggregateRow>> {
    samples
        .iter()
        .map(|(key, set)| {
            let workload = key.workload()?;
            let stat = AggregateStat::from_samples(set);
            if stat.relative_stddev.is_none() {
                warn!(
                    "Zero mean throughput for {} {} latency {} skew {}; relative stddev undefined",
                    key.engine, workload, key.latency, key.skew
                );
            }
            Ok(AggregateRow {
                key: key.clone(),
                workload,
                stat,
                samples: set.len(),
            })
        })
        .collect()
}
