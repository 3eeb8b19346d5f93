//! File-based result store
//!
//! Layout: `<root>/<engine>/<workload>/[<latency>/]<kind>.csv`, one
//! `skew , value[ , value]` row per line. The plotting layer reads these
//! files directly.
//!
//! Rows staged during one pipeline execution are kept in memory and each
//! touched leaf file is rewritten in full (temp file + rename) whenever it
//! changes, so a leaf never mixes rows from different executions and never
//! holds a half-written row. `reset` removes the whole tree for leaves this
//! execution does not touch.

use crate::analysis::AggregateRow;
use nstore_eval_common::{EngineVariant, Result, WorkloadCategory};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Performance,
    Storage,
}

impl ResultKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ResultKind::Performance => "performance.csv",
            ResultKind::Storage => "storage.csv",
        }
    }
}

/// Storage-footprint row for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageRow {
    pub engine: EngineVariant,
    pub workload: WorkloadCategory,
    pub skew_factor: f64,
    pub fs_bytes: u64,
    pub pm_bytes: u64,
}

impl StorageRow {
    pub fn line(&self) -> String {
        format!("{:?} , {} , {}", self.skew_factor, self.fs_bytes, self.pm_bytes)
    }
}

/// Performance row text: skew as logged, mean rounded for display
pub fn performance_line(row: &AggregateRow) -> String {
    format!("{} , {}", row.key.skew.text(), row.stat.mean_text())
}

pub struct ResultStore {
    root: PathBuf,
    kind: ResultKind,
    staged: BTreeMap<PathBuf, Vec<String>>,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>, kind: ResultKind) -> Self {
        Self {
            root: root.into(),
            kind,
            staged: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete the whole result tree for this kind. Idempotent.
    pub fn reset(&mut self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
            info!("Removed result tree {}", self.root.display());
        }
        self.staged.clear();
        Ok(())
    }

    pub fn leaf_dir(
        &self,
        engine: EngineVariant,
        workload: WorkloadCategory,
        latency: Option<u32>,
    ) -> PathBuf {
        let dir = self.root.join(engine.name()).join(workload.as_str());
        match latency {
            Some(latency) => dir.join(latency.to_string()),
            None => dir,
        }
    }

    pub fn leaf_file(
        &self,
        engine: EngineVariant,
        workload: WorkloadCategory,
        latency: Option<u32>,
    ) -> PathBuf {
        self.leaf_dir(engine, workload, latency).join(self.kind.file_name())
    }

    /// Stage all aggregated rows and rebuild each affected leaf once.
    /// Returns the number of leaf files written.
    pub fn write_performance(&mut self, rows: &[AggregateRow]) -> Result<usize> {
        let mut touched = Vec::new();
        for row in rows {
            let file = self.leaf_file(row.key.engine, row.workload, Some(row.key.latency));
            self.staged.entry(file.clone()).or_default().push(performance_line(row));
            if !touched.contains(&file) {
                touched.push(file);
            }
        }
        for file in &touched {
            self.flush_leaf(file)?;
        }
        Ok(touched.len())
    }

    /// Append one storage row, rebuilding its leaf file immediately
    pub fn append_storage(&mut self, row: &StorageRow) -> Result<PathBuf> {
        let file = self.leaf_file(row.engine, row.workload, None);
        self.staged.entry(file.clone()).or_default().push(row.line());
        self.flush_leaf(&file)?;
        Ok(file)
    }

    fn flush_leaf(&self, file: &Path) -> Result<()> {
        let lines = self.staged.get(file).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp = file.with_extension("csv.tmp");
        {
            let mut out = fs::File::create(&tmp)?;
            for line in lines {
                writeln!(out, "{}", line)?;
            }
            out.sync_all()?;
        }
        fs::rename(&tmp, file)?;
        debug!("Wrote {} rows to {}", lines.len(), file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AggregateStat;
    use nstore_eval_common::{MeasurementKey, SweepValue};
    use tempfile::tempdir;

    fn row(rw_mix: &str, skew: &str, latency: u32, engine: EngineVariant, mean: f64) -> AggregateRow {
        let key = MeasurementKey {
            rw_mix: SweepValue::parse(rw_mix).unwrap(),
            skew: SweepValue::parse(skew).unwrap(),
            latency,
            engine,
        };
        AggregateRow {
            workload: key.workload().unwrap(),
            key,
            stat: AggregateStat { mean, relative_stddev: Some(0.012) },
            samples: 1,
        }
    }

    #[test]
    fn test_performance_row_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = ResultStore::new(dir.path(), ResultKind::Performance);
        store
            .write_performance(&[row("0.5", "1.0", 800, EngineVariant::Lsm, 12345.6)])
            .unwrap();

        let path = dir.path().join("lsm/write-heavy/800/performance.csv");
        assert_eq!(fs::read_to_string(path).unwrap(), "1.0 , 12345.6\n");
    }

    #[test]
    fn test_rows_grouped_per_leaf_in_order() {
        let dir = tempdir().unwrap();
        let mut store = ResultStore::new(dir.path(), ResultKind::Performance);
        let written = store
            .write_performance(&[
                row("0.0", "0.10", 200, EngineVariant::Wal, 10.0),
                row("0.0", "0.10", 200, EngineVariant::Sp, 20.0),
                row("0.0", "1.00", 200, EngineVariant::Wal, 30.0),
            ])
            .unwrap();
        assert_eq!(written, 2);

        let wal = fs::read_to_string(dir.path().join("wal/read-only/200/performance.csv")).unwrap();
        assert_eq!(wal, "0.10 , 10.0\n1.00 , 30.0\n");
        assert!(!dir.path().join("wal/read-only/200/performance.csv.tmp").exists());
    }

    #[test]
    fn test_reset_twice_then_write_once() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("performance");
        let rows = [row("0.0", "0.10", 200, EngineVariant::Wal, 10.0)];

        // stale rows from an earlier execution
        let mut earlier = ResultStore::new(&root, ResultKind::Performance);
        earlier.write_performance(&rows).unwrap();
        earlier.write_performance(&rows).unwrap();
        fs::create_dir_all(root.join("sp/read-only/800")).unwrap();
        fs::write(root.join("sp/read-only/800/performance.csv"), "stale\n").unwrap();

        let mut store = ResultStore::new(&root, ResultKind::Performance);
        store.reset().unwrap();
        store.reset().unwrap();
        store.write_performance(&rows).unwrap();

        let wal = fs::read_to_string(root.join("wal/read-only/200/performance.csv")).unwrap();
        assert_eq!(wal, "0.10 , 10.0\n");
        assert!(!root.join("sp").exists());
    }

    #[test]
    fn test_new_execution_replaces_touched_leaf() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("wal/read-only/200/performance.csv");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "0.10 , 1.0\n").unwrap();

        let mut store = ResultStore::new(dir.path(), ResultKind::Performance);
        store
            .write_performance(&[row("0.0", "0.10", 200, EngineVariant::Wal, 5.0)])
            .unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "0.10 , 5.0\n");
    }

    #[test]
    fn test_storage_rows_accumulate() {
        let dir = tempdir().unwrap();
        let mut store = ResultStore::new(dir.path(), ResultKind::Storage);
        let first = StorageRow {
            engine: EngineVariant::OptWal,
            workload: WorkloadCategory::ReadOnly,
            skew_factor: 0.1,
            fs_bytes: 4096,
            pm_bytes: 0,
        };
        let path = store.append_storage(&first).unwrap();
        store
            .append_storage(&StorageRow { skew_factor: 1.0, pm_bytes: 8192, ..first })
            .unwrap();

        assert_eq!(path, dir.path().join("opt_wal/read-only/storage.csv"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "0.1 , 4096 , 0\n1.0 , 4096 , 8192\n"
        );
    }
}
