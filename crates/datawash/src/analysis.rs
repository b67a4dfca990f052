//! Missing-value analysis.
//!
//! The report is always computed from scratch against the table it is
//! given; it is never patched after a mutation.

use crate::table::WorkingTable;
use crate::types::{ColumnMissing, MissingValueReport};
use std::collections::BTreeSet;

/// Computes per-column null statistics for a working table.
pub struct MissingValueAnalyzer;

impl MissingValueAnalyzer {
    /// Build the missing-value report of `table`, tagged with `generation`.
    ///
    /// Columns without missing values are left out.
    pub fn analyze(table: &WorkingTable, generation: u64) -> MissingValueReport {
        let row_count = table.height();
        let columns = table
            .schema()
            .iter()
            .filter_map(|col| {
                let missing_count = table.series(&col.name).ok()?.null_count();
                if missing_count == 0 {
                    return None;
                }
                Some(ColumnMissing {
                    name: col.name.clone(),
                    kind: col.kind,
                    missing_count,
                    missing_percentage: (missing_count as f64 / row_count as f64) * 100.0,
                })
            })
            .collect();

        MissingValueReport {
            generation,
            row_count,
            columns,
        }
    }

    /// Report entries whose column has not been processed yet.
    pub fn remaining(
        report: &MissingValueReport,
        processed: &BTreeSet<String>,
    ) -> MissingValueReport {
        MissingValueReport {
            generation: report.generation,
            row_count: report.row_count,
            columns: report
                .columns
                .iter()
                .filter(|c| !processed.contains(&c.name))
                .cloned()
                .collect(),
        }
    }
}
