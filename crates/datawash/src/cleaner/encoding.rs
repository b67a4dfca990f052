//! One-hot encoding of categorical columns.

use crate::error::{Result, WashError};
use crate::table::WorkingTable;
use crate::types::ColumnKind;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Indicator columns produced for one source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedColumn {
    pub source: String,
    /// The category without an indicator (first in sorted order).
    pub dropped_category: Option<String>,
    pub indicators: Vec<String>,
}

/// Summary of a one-hot encoding pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncodingSummary {
    pub encoded: Vec<EncodedColumn>,
}

impl EncodingSummary {
    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    pub fn indicator_count(&self) -> usize {
        self.encoded.iter().map(|e| e.indicators.len()).sum()
    }
}

/// Replaces categorical columns with drop-first indicator columns.
pub struct OneHotEncoder;

impl OneHotEncoder {
    /// Encode `columns`, or every categorical column when `None`.
    ///
    /// Indicators are named `<column>_<category>`, hold 0.0/1.0 (null where
    /// the source is null) and are appended after the remaining columns.
    pub fn encode(table: &mut WorkingTable, columns: Option<&[String]>) -> Result<EncodingSummary> {
        let targets = match columns {
            Some(names) => {
                for name in names {
                    if table.kind(name)? != ColumnKind::Categorical {
                        return Err(WashError::NotCategorical(name.clone()));
                    }
                }
                names.to_vec()
            }
            None => table.columns_of_kind(ColumnKind::Categorical),
        };

        if targets.is_empty() {
            debug!("No categorical columns to encode");
            return Ok(EncodingSummary::default());
        }

        let mut taken: BTreeSet<String> = table
            .column_names()
            .into_iter()
            .filter(|name| !targets.contains(name))
            .collect();
        let mut indicators = Vec::new();
        let mut summary = EncodingSummary::default();

        for name in &targets {
            let str_series = table.series(name)?.cast(&DataType::String)?;
            let values: Vec<Option<&str>> = str_series.str()?.into_iter().collect();

            let categories: BTreeSet<&str> = values.iter().flatten().copied().collect();
            let mut categories = categories.into_iter();
            let dropped_category = categories.next().map(str::to_string);

            let mut encoded = EncodedColumn {
                source: name.clone(),
                dropped_category,
                indicators: Vec::new(),
            };

            for category in categories {
                let indicator_name = format!("{}_{}", name, category);
                if !taken.insert(indicator_name.clone()) {
                    return Err(WashError::DuplicateColumn(indicator_name));
                }
                let indicator: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| v.map(|v| if v == category { 1.0 } else { 0.0 }))
                    .collect();
                indicators.push(Series::new(indicator_name.as_str().into(), indicator));
                encoded.indicators.push(indicator_name);
            }

            debug!(
                "Encoded '{}' into {} indicator columns",
                name,
                encoded.indicators.len()
            );
            summary.encoded.push(encoded);
        }

        table.drop_columns(&targets)?;
        table.append_columns(indicators)?;

        info!(
            "One-hot encoded {} columns into {} indicators",
            summary.encoded.len(),
            summary.indicator_count()
        );
        Ok(summary)
    }
}
