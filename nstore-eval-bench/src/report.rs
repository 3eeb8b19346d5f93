//! Console tables for aggregated performance results
//!
//! Rows of one workload category are cut into blocks of
//! `#latencies * #engines` cells and the blocks are laid side by side, so each
//! output line holds the same latency/engine position across every skew
//! factor. Cells are `mean<TAB>relative_stddev<TAB>`, right-aligned to ten
//! characters.

use crate::analysis::AggregateRow;
use nstore_eval_common::WorkloadCategory;

const CELL_WIDTH: usize = 10;

/// Text table for one workload category
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadTable {
    pub workload: WorkloadCategory,
    pub lines: Vec<String>,
}

pub fn format_cell(row: &AggregateRow) -> String {
    format!(
        "{:>width$}\t{:>width$}\t",
        row.stat.mean_text(),
        row.stat.relative_stddev_text(),
        width = CELL_WIDTH
    )
}

/// Lay out `cells` in columns of `block_len`, one output line per position
/// within a block. Lines stop at the shortest block.
pub fn transpose_blocks(cells: &[String], block_len: usize) -> Vec<String> {
    let blocks: Vec<&[String]> = cells.chunks(block_len.max(1)).collect();
    let height = blocks.iter().map(|b| b.len()).min().unwrap_or(0);

    (0..height)
        .map(|i| {
            blocks
                .iter()
                .map(|block| block[i].as_str())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect()
}

/// Build one table per workload category that has rows, in category order.
/// `rows` must already be in key order.
pub fn build_tables(rows: &[AggregateRow], block_len: usize) -> Vec<WorkloadTable> {
    WorkloadCategory::ALL
        .iter()
        .filter_map(|&workload| {
            let cells: Vec<String> = rows
                .iter()
                .filter(|row| row.workload == workload)
                .map(format_cell)
                .collect();
            if cells.is_empty() {
                return None;
            }
            Some(WorkloadTable {
                workload,
                lines: transpose_blocks(&cells, block_len),
            })
        })
        .collect()
}

pub fn render_tables(tables: &[WorkloadTable]) -> String {
    let mut report = String::new();
    for table in tables {
        report.push_str(&format!("{}\n", "-".repeat(40)));
        report.push_str(&format!("{}\n", table.workload));
        report.push_str(&format!("{}\n", "-".repeat(40)));
        for line in &table.lines {
            report.push_str(line);
            report.push('\n');
        }
        report.push('\n');
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AggregateStat;
    use nstore_eval_common::{EngineVariant, MeasurementKey, SweepValue};

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
            stat: AggregateStat { mean, relative_stddev: Some(0.0) },
            samples: 1,
        }
    }

    #[test]
    fn test_cell_alignment() {
        let cell = format_cell(&row("0.0", "0.10", 200, EngineVariant::Wal, 1000.0));
        assert_eq!(cell, "    1000.0\t       0.0\t");

        let mut zero = row("0.0", "0.10", 200, EngineVariant::Wal, 0.0);
        zero.stat.relative_stddev = None;
        assert!(format_cell(&zero).ends_with("       n/a\t"));
    }

    #[test]
    fn test_transpose_blocks() {
        let cells: Vec<String> = ["a", "b", "c", "d", "e", "f"].iter().map(|s| s.to_string()).collect();
        assert_eq!(transpose_blocks(&cells, 2), vec!["a\tc\te", "b\td\tf"]);
        assert_eq!(transpose_blocks(&cells, 6), vec!["a", "b", "c", "d", "e", "f"]);
        // trailing partial block truncates to its length
        assert_eq!(transpose_blocks(&cells[..5], 2), vec!["a\tc\te"]);
        assert_eq!(transpose_blocks(&cells, 0).len(), 1);
        assert!(transpose_blocks(&[], 4).is_empty());
    }

    #[test]
    fn test_tables_per_workload() {
        // key order: rw_mix, skew, latency, engine
        let rows = vec![
            row("0.0", "0.10", 200, EngineVariant::Wal, 1.0),
            row("0.0", "0.10", 200, EngineVariant::Sp, 2.0),
            row("0.0", "1.00", 200, EngineVariant::Wal, 3.0),
            row("0.0", "1.00", 200, EngineVariant::Sp, 4.0),
            row("0.5", "0.10", 200, EngineVariant::Wal, 5.0),
            row("0.5", "0.10", 200, EngineVariant::Sp, 6.0),
        ];
        let tables = build_tables(&rows, 2);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].workload, WorkloadCategory::ReadOnly);
        assert_eq!(tables[0].lines.len(), 2);
        assert!(tables[0].lines[0].starts_with("       1.0\t"));
        assert!(tables[0].lines[0].contains("       3.0\t"));
        assert_eq!(tables[1].workload, WorkloadCategory::WriteHeavy);
        assert_eq!(tables[1].lines.len(), 2);

        let text = render_tables(&tables);
        assert!(text.contains("read-only\n"));
        assert!(!text.contains("read-heavy"));
        assert!(text.contains("write-heavy\n"));
    }
}
