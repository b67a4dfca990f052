//! CSV export of the working table.

use super::WorkingTable;
use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Serialize the table as CSV (header row first) into any writer.
pub fn write_csv<W: Write>(table: &WorkingTable, writer: &mut W) -> Result<()> {
    let mut frame = table.frame().clone();
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut frame)
        .context("Writing CSV export")
}

/// Serialize the table as CSV bytes.
pub fn to_csv_bytes(table: &WorkingTable) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(buffer)
}

/// Write the table to a CSV file, creating parent directories as needed.
pub fn export_to_path(table: &WorkingTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    write_csv(table, &mut file)?;
    info!(
        "Exported {} rows x {} columns to {}",
        table.height(),
        table.width(),
        path.display()
    );
    Ok(())
}
