//! Outlier handling module.
//!
//! Detects outliers in numeric columns with the IQR fence and treats them by
//! removing, capping or replacing them with the column mean.

use crate::error::{Result, WashError};
use crate::table::WorkingTable;
use crate::types::OutlierTreatment;
use crate::utils::{linear_quantile, mean, numeric_values, observed_values};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Multiplier applied to the IQR to place the fences.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Quartiles and fences of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFence {
    /// Compute the fence from observed values. `None` if there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = linear_quantile(&sorted, 0.25)?;
        let q3 = linear_quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        })
    }

    /// Strictly outside the fence.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Outliers found in one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub column: String,
    pub fence: IqrFence,
    pub outlier_count: usize,
    /// Row positions (0-based) of the outliers.
    pub positions: Vec<usize>,
}

/// Outcome of treating the outliers of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierTreatmentSummary {
    pub report: OutlierReport,
    pub treatment: OutlierTreatment,
    pub rows_removed: usize,
    pub values_replaced: usize,
}

/// Handles outlier detection and treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Detect IQR outliers in a numeric column. Nulls are never outliers.
    pub fn detect(table: &WorkingTable, column: &str) -> Result<OutlierReport> {
        if !table.kind(column)?.is_numeric() {
            return Err(WashError::NotNumeric(column.to_string()));
        }

        let series = table.series(column)?;
        let observed = observed_values(series)?;
        let fence = IqrFence::from_values(&observed)
            .ok_or_else(|| WashError::NoValidValues(column.to_string()))?;

        let positions: Vec<usize> = numeric_values(series)?
            .into_iter()
            .enumerate()
            .filter_map(|(idx, v)| match v {
                Some(val) if fence.is_outlier(val) => Some(idx),
                _ => None,
            })
            .collect();

        debug!(
            "'{}': Q1={} Q3={} bounds=[{}, {}], {} outliers",
            column,
            fence.q1,
            fence.q3,
            fence.lower,
            fence.upper,
            positions.len()
        );

        Ok(OutlierReport {
            column: column.to_string(),
            fence,
            outlier_count: positions.len(),
            positions,
        })
    }

    /// Detect and treat outliers of `column` in place.
    ///
    /// The fence is computed once from the data before treatment.
    pub fn treat(
        table: &mut WorkingTable,
        column: &str,
        treatment: OutlierTreatment,
    ) -> Result<OutlierTreatmentSummary> {
        let report = Self::detect(table, column)?;
        let fence = report.fence;
        let values = numeric_values(table.series(column)?)?;

        let (rows_removed, values_replaced) = match treatment {
            OutlierTreatment::Remove => {
                let mask_values: Vec<bool> = values
                    .iter()
                    .map(|v| match v {
                        Some(val) => !fence.is_outlier(*val),
                        None => true, // Keep null values
                    })
                    .collect();
                let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
                let before = table.height();
                table.filter_rows(&mask)?;
                (before - table.height(), 0)
            }
            OutlierTreatment::Cap => {
                let capped: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| v.map(|val| val.clamp(fence.lower, fence.upper)))
                    .collect();
                table.replace_column(column, Series::new(column.into(), capped))?;
                (0, report.outlier_count)
            }
            OutlierTreatment::ReplaceWithMean => {
                // Mean over the current column, outliers included
                let observed = observed_values(table.series(column)?)?;
                let column_mean =
                    mean(&observed).ok_or_else(|| WashError::NoValidValues(column.to_string()))?;
                let replaced: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| {
                        v.map(|val| {
                            if fence.is_outlier(val) {
                                column_mean
                            } else {
                                val
                            }
                        })
                    })
                    .collect();
                table.replace_column(column, Series::new(column.into(), replaced))?;
                (0, report.outlier_count)
            }
        };

        info!(
            "Treated {} outliers in '{}' ({:?})",
            report.outlier_count, column, treatment
        );

        Ok(OutlierTreatmentSummary {
            report,
            treatment,
            rows_removed,
            values_replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WorkingTable {
        WorkingTable::from_frame(
            df![
                "value" => [1i64, 2, 2, 3, 3, 3, 4, 4, 100],
                "label" => ["a", "b", "c", "d", "e", "f", "g", "h", "i"],
            ]
            .unwrap(),
        )
    }

    #[test]
    fn test_detect_flags_extreme_value() {
        let report = OutlierHandler::detect(&table(), "value").unwrap();

        assert_eq!(report.fence.q1, 2.0);
        assert_eq!(report.fence.q3, 4.0);
        assert_eq!(report.fence.iqr, 2.0);
        assert_eq!(report.fence.lower, -1.0);
        assert_eq!(report.fence.upper, 7.0);
        assert_eq!(report.outlier_count, 1);
        assert_eq!(report.positions, vec![8]);
    }

    #[test]
    fn test_cap_clamps_to_upper_fence() {
        let mut table = table();
        let summary = OutlierHandler::treat(&mut table, "value", OutlierTreatment::Cap).unwrap();

        assert_eq!(summary.values_replaced, 1);
        let values = numeric_values(table.series("value").unwrap()).unwrap();
        assert_eq!(values[8], Some(7.0));
        assert_eq!(values[0], Some(1.0));
        assert_eq!(table.height(), 9);
    }

    #[test]
    fn test_remove_drops_outlier_rows_and_keeps_nulls() {
        let mut table = WorkingTable::from_frame(
            df![
                "value" => [
                    Some(1.0),
                    Some(2.0),
                    Some(2.0),
                    Some(3.0),
                    None,
                    Some(3.0),
                    Some(4.0),
                    Some(4.0),
                    Some(100.0),
                ],
            ]
            .unwrap(),
        );
        let summary = OutlierHandler::treat(&mut table, "value", OutlierTreatment::Remove).unwrap();

        assert_eq!(summary.rows_removed, 1);
        assert_eq!(table.height(), 8);
        assert_eq!(table.series("value").unwrap().null_count(), 1);
    }

    #[test]
    fn test_replace_with_mean_includes_outliers() {
        let mut table = table();
        OutlierHandler::treat(&mut table, "value", OutlierTreatment::ReplaceWithMean).unwrap();

        let values = numeric_values(table.series("value").unwrap()).unwrap();
        let expected = 122.0 / 9.0;
        assert!((values[8].unwrap() - expected).abs() < 1e-9);
        assert_eq!(values[7], Some(4.0));
    }

    #[test]
    fn test_detect_rejects_non_numeric() {
        let err = OutlierHandler::detect(&table(), "label").unwrap_err();
        assert_eq!(err.error_code(), "NOT_NUMERIC");

        let err = OutlierHandler::detect(&table(), "missing").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_all_null_column_has_no_fence() {
        let table = WorkingTable::from_frame(df!["value" => [Option::<f64>::None, None]].unwrap());
        let err = OutlierHandler::detect(&table, "value").unwrap_err();
        assert!(matches!(err, WashError::NoValidValues(_)));
    }
}
