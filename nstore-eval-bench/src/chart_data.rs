//! Chart-ready exports of the result store
//!
//! The plot phases read `performance.csv` / `storage.csv` leaves back the
//! same way the bar-chart layer does, and write one JSON document per chart:
//! a dataset per engine, one bar per skew factor. Rendering happens
//! elsewhere.

use nstore_eval_common::{EngineVariant, EvalError, Result, SweepConfig, WorkloadCategory};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BYTES_PER_KB: f64 = 1024.0;

/// One engine's bars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub engine: EngineVariant,
    pub values: Vec<f64>,
    /// Second segment stacked on top of `values` (persistent memory usage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacked: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub name: String,
    pub workload: WorkloadCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<u32>,
    pub x_label: String,
    pub y_label: String,
    pub x_ticks: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

/// Read a headerless result file into rows of numbers
pub fn load_data_file(path: &Path) -> Result<Vec<Vec<f64>>> {
    let result_error = |message: String| EvalError::ResultFile {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| result_error(e.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| result_error(e.to_string()))?;
        let row = record
            .iter()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|_| result_error(format!("invalid number {:?}", field)))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn column(rows: &[Vec<f64>], index: usize, path: &Path) -> Result<Vec<f64>> {
    rows.iter()
        .map(|row| {
            row.get(index).copied().ok_or_else(|| EvalError::ResultFile {
                path: path.to_path_buf(),
                message: format!("row has no column {}", index),
            })
        })
        .collect()
}

/// Tick labels for the skew axis
pub fn skew_ticks(skew_factors: &[f64]) -> Vec<String> {
    if skew_factors.len() == 2 {
        vec!["Low".to_string(), "High".to_string()]
    } else {
        skew_factors.iter().map(|s| format!("{:.2}", s)).collect()
    }
}

/// Throughput charts: one per workload category and latency
pub fn performance_charts(results_dir: &Path, sweep: &SweepConfig) -> Result<Vec<ChartData>> {
    let mut charts = Vec::new();
    for workload in sweep.workloads() {
        for &latency in &sweep.latencies {
            let mut series = Vec::with_capacity(sweep.engines.len());
            for &engine in &sweep.engines {
                let path = results_dir
                    .join(engine.name())
                    .join(workload.as_str())
                    .join(latency.to_string())
                    .join("performance.csv");
                let rows = load_data_file(&path)?;
                series.push(ChartSeries {
                    label: engine.chart_label().to_string(),
                    engine,
                    values: column(&rows, 1, &path)?,
                    stacked: None,
                });
            }
            charts.push(ChartData {
                name: format!("ycsb-perf-{}-{}", workload, latency),
                workload,
                latency: Some(latency),
                x_label: "Skew".to_string(),
                y_label: "Throughput".to_string(),
                x_ticks: skew_ticks(&sweep.skew_factors),
                series,
            });
        }
    }
    Ok(charts)
}

/// Storage charts: one per workload category, sizes in KB
pub fn storage_charts(results_dir: &Path, sweep: &SweepConfig) -> Result<Vec<ChartData>> {
    let mut charts = Vec::new();
    for workload in sweep.workloads() {
        let mut series = Vec::with_capacity(sweep.engines.len());
        for &engine in &sweep.engines {
            let path = results_dir
                .join(engine.name())
                .join(workload.as_str())
                .join("storage.csv");
            let rows = load_data_file(&path)?;
            let to_kb = |values: Vec<f64>| -> Vec<f64> {
                values.into_iter().map(|v| v / BYTES_PER_KB).collect()
            };
            series.push(ChartSeries {
                label: engine.chart_label().to_string(),
                engine,
                values: to_kb(column(&rows, 1, &path)?),
                stacked: Some(to_kb(column(&rows, 2, &path)?)),
            });
        }
        charts.push(ChartData {
            name: format!("ycsb-storage-{}", workload),
            workload,
            latency: None,
            x_label: "Skew".to_string(),
            y_label: "Storage (KB)".to_string(),
            x_ticks: skew_ticks(&sweep.skew_factors),
            series,
        });
    }
    Ok(charts)
}

pub fn write_chart(dir: &Path, chart: &ChartData) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(chart.file_name());
    let json = serde_json::to_string_pretty(chart)
        .map_err(|e| EvalError::Serialization(e.to_string()))?;
    fs::write(&path, json)?;
    info!("Chart data written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sweep(engines: Vec<EngineVariant>) -> SweepConfig {
        SweepConfig {
            latencies: vec![200],
            rw_mixes: vec![0.0],
            engines,
            ..SweepConfig::default()
        }
    }

    fn write(path: PathBuf, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_data_file_trims_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("performance.csv");
        fs::write(&path, "0.10 , 1000.0\n1.00 , 2500.5\n").unwrap();

        let rows = load_data_file(&path).unwrap();
        assert_eq!(rows, vec![vec![0.1, 1000.0], vec![1.0, 2500.5]]);
    }

    #[test]
    fn test_load_data_file_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_data_file(&dir.path().join("missing.csv")),
            Err(EvalError::ResultFile { .. })
        ));

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "0.10 , fast\n").unwrap();
        assert!(matches!(load_data_file(&bad), Err(EvalError::ResultFile { .. })));
    }

    #[test]
    fn test_skew_ticks() {
        assert_eq!(skew_ticks(&[0.1, 1.0]), vec!["Low", "High"]);
        assert_eq!(skew_ticks(&[0.1, 0.5, 1.0]), vec!["0.10", "0.50", "1.00"]);
    }

    #[test]
    fn test_performance_charts() {
        let dir = tempdir().unwrap();
        write(dir.path().join("wal/read-only/200/performance.csv"), "0.10 , 1000.0\n1.00 , 900.0\n");
        write(dir.path().join("opt_sp/read-only/200/performance.csv"), "0.10 , 1500.0\n1.00 , 1400.0\n");

        let charts =
            performance_charts(dir.path(), &sweep(vec![EngineVariant::Wal, EngineVariant::OptSp])).unwrap();
        assert_eq!(charts.len(), 1);
        let chart = &charts[0];
        assert_eq!(chart.file_name(), "ycsb-perf-read-only-200.json");
        assert_eq!(chart.x_ticks, vec!["Low", "High"]);
        assert_eq!(chart.series[0].label, "WAL-2X");
        assert_eq!(chart.series[0].values, vec![1000.0, 900.0]);
        assert_eq!(chart.series[1].label, "PM-SP-2X");
    }

    #[test]
    fn test_missing_leaf_is_fatal() {
        let dir = tempdir().unwrap();
        write(dir.path().join("wal/read-only/200/performance.csv"), "0.10 , 1000.0\n");
        let result = performance_charts(dir.path(), &sweep(vec![EngineVariant::Wal, EngineVariant::Sp]));
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_charts_in_kb_and_written() {
        let dir = tempdir().unwrap();
        write(dir.path().join("lsm/read-only/storage.csv"), "0.1 , 2048 , 0\n1.0 , 4096 , 1024\n");

        let charts = storage_charts(dir.path(), &sweep(vec![EngineVariant::Lsm])).unwrap();
        let chart = &charts[0];
        assert_eq!(chart.series[0].values, vec![2.0, 4.0]);
        assert_eq!(chart.series[0].stacked, Some(vec![0.0, 1.0]));

        let out = dir.path().join("charts");
        let path = write_chart(&out, chart).unwrap();
        assert_eq!(path, out.join("ycsb-storage-read-only.json"));
        let back: ChartData = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(&back, chart);
    }
}
