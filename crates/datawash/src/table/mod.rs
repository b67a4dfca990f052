//! Working table and its session store.
//!
//! A [`WorkingTable`] wraps a polars `DataFrame` together with the
//! [`ColumnKind`] of every column. The [`TableStore`] owns the committed
//! table of a session and counts every replacement in a generation number,
//! so reports and selections can tell when they were built against an older
//! table.

mod export;
mod ingest;

pub use export::{export_to_path, to_csv_bytes, write_csv};
pub use ingest::{read_csv_bytes, read_csv_path};

use crate::error::{Result, WashError};
use crate::types::ColumnKind;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Name and kind of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
}

/// An in-memory dataset with a semantic kind attached to every column.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    frame: DataFrame,
    schema: Vec<ColumnSchema>,
}

impl WorkingTable {
    /// Wrap a DataFrame, deriving the kind of each column from its dtype.
    pub fn from_frame(frame: DataFrame) -> Self {
        let schema = Self::derive_schema(&frame);
        Self { frame, schema }
    }

    fn derive_schema(frame: &DataFrame) -> Vec<ColumnSchema> {
        frame
            .get_columns()
            .iter()
            .map(|col| ColumnSchema {
                name: col.name().to_string(),
                kind: ColumnKind::from_dtype(col.dtype()),
            })
            .collect()
    }

    fn refresh_schema(&mut self) {
        self.schema = Self::derive_schema(&self.frame);
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.iter().any(|c| c.name == name)
    }

    /// Kind of a column, or `ColumnNotFound`.
    pub fn kind(&self, name: &str) -> Result<ColumnKind> {
        self.schema
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
            .ok_or_else(|| WashError::ColumnNotFound(name.to_string()))
    }

    /// Names of all columns of the given kind, in table order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.schema
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Materialized Series of a column.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| WashError::ColumnNotFound(name.to_string()))
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> DataFrame {
        self.frame.head(Some(n))
    }

    /// Replace a column in place, keeping its position. The kind is re-derived.
    pub fn replace_column(&mut self, name: &str, series: Series) -> Result<()> {
        if !self.has_column(name) {
            return Err(WashError::ColumnNotFound(name.to_string()));
        }
        self.frame.replace(name, series)?;
        self.refresh_schema();
        Ok(())
    }

    /// Keep only the rows where `mask` is true.
    pub fn filter_rows(&mut self, mask: &BooleanChunked) -> Result<()> {
        self.frame = self.frame.filter(mask)?;
        Ok(())
    }

    /// Drop the named columns.
    pub fn drop_columns(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            if !self.has_column(name) {
                return Err(WashError::ColumnNotFound(name.clone()));
            }
        }
        let cols: Vec<PlSmallStr> = names.iter().map(|s| s.as_str().into()).collect();
        self.frame = self.frame.drop_many(cols);
        self.refresh_schema();
        Ok(())
    }

    /// Append new columns after the existing ones.
    pub fn append_columns(&mut self, columns: Vec<Series>) -> Result<()> {
        for series in columns {
            self.frame.with_column(series)?;
        }
        self.refresh_schema();
        Ok(())
    }

    /// Swap in a whole new frame (same logical table, e.g. after deduplication).
    pub(crate) fn set_frame(&mut self, frame: DataFrame) {
        self.frame = frame;
        self.refresh_schema();
    }
}

/// Owner of the committed working table of one session.
#[derive(Debug, Default)]
pub struct TableStore {
    table: Option<WorkingTable>,
    generation: u64,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Number of replacements since the store was created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The committed table, or `NoDataLoaded`.
    pub fn current(&self) -> Result<&WorkingTable> {
        self.table.as_ref().ok_or(WashError::NoDataLoaded)
    }

    /// Replace the committed table wholesale.
    pub fn replace(&mut self, table: WorkingTable) -> u64 {
        self.table = Some(table);
        self.generation += 1;
        self.generation
    }

    /// Apply `f` to a copy of the table and commit the copy only if `f` succeeds.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut WorkingTable) -> Result<R>) -> Result<R> {
        let mut working = self.current()?.clone();
        let result = f(&mut working)?;
        self.replace(working);
        Ok(result)
    }
}
