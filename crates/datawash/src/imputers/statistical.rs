//! Statistical imputation methods.
//!
//! Provides mean, median, mode and constant-category imputation. Every
//! method reads one column and returns the filled copy; it never touches a
//! table. `None` means the statistic is undefined because the column has no
//! observed values.

use crate::error::Result;
use crate::types::ColumnKind;
use crate::utils::{
    fill_boolean_nulls, fill_nulls_from_position, fill_numeric_nulls, fill_string_nulls,
    mode_position,
};
use polars::prelude::*;

/// Placeholder category used by the "Unknown" strategy.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A filled copy of a column and the value that was written into its gaps.
#[derive(Debug, Clone)]
pub struct FilledColumn {
    pub series: Series,
    pub fill_value: String,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a numeric column with the mean of its observed values.
    pub fn mean(series: &Series) -> Result<Option<FilledColumn>> {
        match series.mean() {
            Some(mean_val) if !mean_val.is_nan() => Ok(Some(FilledColumn {
                series: fill_numeric_nulls(series, mean_val)?,
                fill_value: format!("{:.2}", mean_val),
            })),
            _ => Ok(None),
        }
    }

    /// Fill a numeric column with the median of its observed values.
    pub fn median(series: &Series) -> Result<Option<FilledColumn>> {
        match series.median() {
            Some(median_val) if !median_val.is_nan() => Ok(Some(FilledColumn {
                series: fill_numeric_nulls(series, median_val)?,
                fill_value: format!("{:.2}", median_val),
            })),
            _ => Ok(None),
        }
    }

    /// Fill a column with its most frequent observed value.
    ///
    /// Ties go to the value seen first in row order. The column keeps its dtype.
    pub fn mode(series: &Series, kind: ColumnKind) -> Result<Option<FilledColumn>> {
        let Some(idx) = mode_position(series)? else {
            return Ok(None);
        };

        let filled = match kind {
            // Copied straight from the mode row so wide integers stay exact
            ColumnKind::Numeric => FilledColumn {
                series: fill_nulls_from_position(series, idx)?,
                fill_value: series.get(idx)?.to_string(),
            },
            ColumnKind::Boolean => {
                let Some(mode_val) = series.bool()?.get(idx) else {
                    return Ok(None);
                };
                FilledColumn {
                    series: fill_boolean_nulls(series, mode_val)?,
                    fill_value: mode_val.to_string(),
                }
            }
            ColumnKind::Categorical => {
                let str_series = series.cast(&DataType::String)?;
                let Some(mode_val) = str_series.str()?.get(idx).map(str::to_string) else {
                    return Ok(None);
                };
                FilledColumn {
                    series: fill_string_nulls(series, &mode_val)?,
                    fill_value: mode_val,
                }
            }
        };

        Ok(Some(filled))
    }

    /// Fill a non-numeric column with the "Unknown" category.
    ///
    /// Boolean columns become text columns.
    pub fn unknown_category(series: &Series) -> Result<FilledColumn> {
        Ok(FilledColumn {
            series: fill_string_nulls(series, UNKNOWN_CATEGORY)?,
            fill_value: UNKNOWN_CATEGORY.to_string(),
        })
    }
}
