//! Variance-threshold feature selection.

use crate::error::{Result, WashError};
use crate::table::WorkingTable;
use crate::types::ColumnKind;
use crate::utils::{observed_values, population_variance};
use tracing::{debug, info};

/// Drops numeric columns that barely vary.
pub struct VarianceSelector;

impl VarianceSelector {
    /// Drop every numeric column whose population variance is at or below
    /// `threshold`. Entirely-null numeric columns are dropped as well.
    ///
    /// Returns the names of the dropped columns in table order.
    pub fn select(table: &mut WorkingTable, threshold: f64) -> Result<Vec<String>> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(WashError::InvalidConfig(format!(
                "variance threshold must be a finite number >= 0, got {}",
                threshold
            )));
        }

        let mut removed = Vec::new();
        for name in table.columns_of_kind(ColumnKind::Numeric) {
            let observed = observed_values(table.series(&name)?)?;
            match population_variance(&observed) {
                Some(variance) if variance > threshold => {}
                variance => {
                    debug!("Dropping '{}' (variance {:?})", name, variance);
                    removed.push(name);
                }
            }
        }

        if !removed.is_empty() {
            table.drop_columns(&removed)?;
        }

        info!(
            "Variance threshold {} removed {} columns",
            threshold,
            removed.len()
        );
        Ok(removed)
    }
}
