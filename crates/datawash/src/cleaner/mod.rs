//! Direct cleaning operations on the committed table.
//!
//! This module provides functionality for:
//! - Removing duplicate rows
//! - Detecting and treating outliers with the IQR fence
//! - One-hot encoding categorical columns
//! - Dropping low-variance numeric columns
//!
//! These operations bypass staging: they act on the committed table at once.

mod encoding;
mod outliers;
mod variance;

pub use encoding::{EncodedColumn, EncodingSummary, OneHotEncoder};
pub use outliers::{
    IQR_MULTIPLIER, IqrFence, OutlierHandler, OutlierReport, OutlierTreatmentSummary,
};
pub use variance::VarianceSelector;

use crate::error::Result;
use crate::table::WorkingTable;
use polars::prelude::*;
use tracing::{debug, info};

/// Data cleaner for row-level cleaning operations.
pub struct DataCleaner;

impl DataCleaner {
    /// Collapse rows that are identical across all columns, keeping the first
    /// occurrence in original order. Returns the number of rows removed.
    pub fn remove_duplicates(table: &mut WorkingTable) -> Result<usize> {
        let before = table.height();
        let deduped = table
            .frame()
            .unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = before - deduped.height();
        table.set_frame(deduped);

        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            info!("Removed {} duplicate rows ({:.1}%)", removed, pct);
        } else {
            debug!("No duplicate rows found");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_duplicates_keeps_first_in_order() {
        let mut table = WorkingTable::from_frame(
            df![
                "id" => [3i64, 1, 3, 2, 1],
                "name" => ["c", "a", "c", "b", "a"],
            ]
            .unwrap(),
        );

        let removed = DataCleaner::remove_duplicates(&mut table).unwrap();

        assert_eq!(removed, 2);
        let ids: Vec<Option<i64>> = table
            .series("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_remove_duplicates_is_idempotent() {
        let mut table = WorkingTable::from_frame(
            df![
                "a" => [Some(1i64), Some(1), None, None],
                "b" => [Some("x"), Some("x"), None, None],
            ]
            .unwrap(),
        );

        assert_eq!(DataCleaner::remove_duplicates(&mut table).unwrap(), 2);
        let once = table.frame().clone();
        assert_eq!(DataCleaner::remove_duplicates(&mut table).unwrap(), 0);
        assert!(table.frame().equals_missing(&once));
    }
}
