//! CSV ingestion.
//!
//! Parses uploaded bytes into a [`WorkingTable`] with Polars, inferring
//! column dtypes from a sample of rows. Any parse failure is reported as
//! [`WashError::Ingestion`] so the session can refuse the upload without
//! touching its current table.

use super::WorkingTable;
use crate::config::CsvOptions;
use crate::error::{Result, WashError};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

fn read_options(opts: &CsvOptions) -> CsvReadOptions {
    let null_values = if opts.null_markers.is_empty() {
        None
    } else {
        Some(NullValues::AllColumns(
            opts.null_markers.iter().map(|m| m.as_str().into()).collect(),
        ))
    };

    CsvReadOptions::default()
        .with_has_header(opts.has_header)
        .with_infer_schema_length(opts.infer_schema_length)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(opts.separator as u8)
                .with_null_values(null_values),
        )
}

/// Parse CSV bytes into a working table.
pub fn read_csv_bytes(bytes: Vec<u8>, opts: &CsvOptions) -> Result<WorkingTable> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(WashError::Ingestion("the upload is empty".to_string()));
    }

    let size = bytes.len();
    let frame = read_options(opts)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| WashError::Ingestion(e.to_string()))?;

    if frame.width() == 0 {
        return Err(WashError::Ingestion("no columns found".to_string()));
    }

    let table = WorkingTable::from_frame(frame);
    debug!(
        "Parsed {} bytes into {} rows x {} columns",
        size,
        table.height(),
        table.width()
    );
    Ok(table)
}

/// Read a CSV file from disk into a working table.
pub fn read_csv_path(path: impl AsRef<Path>, opts: &CsvOptions) -> Result<WorkingTable> {
    let path = path.as_ref();
    info!("Loading dataset from: {}", path.display());
    let bytes = std::fs::read(path)?;
    read_csv_bytes(bytes, opts)
}
