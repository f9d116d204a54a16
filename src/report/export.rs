//! # Spreadsheet Export
//!
//! $$
//! R\ \to\ \texttt{date},\ P_1..P_N,\ R_1..R_N
//! $$
//!
//! Writes the return table to CSV through polars. The file can be read back by
//! [`crate::market::CsvSource`].

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use polars::prelude::*;
use tracing::info;
use tracing::warn;

use crate::market::ReturnTable;

/// Default export file name.
pub const EXPORT_FILE: &str = "data_download.csv";

/// Build the export frame: `date`, every price column, then every `R<TICKER>` column.
pub(crate) fn to_frame(table: &ReturnTable) -> PolarsResult<DataFrame> {
  let dates: Vec<String> = table
    .dates()
    .iter()
    .map(|d| d.format("%Y-%m-%d").to_string())
    .collect();

  let mut columns = vec![Series::new("date".into(), dates)];
  for column in table.columns() {
    if let Some(values) = table.column(&column) {
      columns.push(Series::new(column.to_string().into(), values));
    }
  }
  DataFrame::new(columns)
}

/// Write `table` to `path` as CSV. An empty table writes nothing and returns `None`.
pub fn export_table(table: &ReturnTable, path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
  let path = path.as_ref();
  if table.is_empty() {
    warn!("return table is empty; nothing exported");
    return Ok(None);
  }

  let mut df = to_frame(table).context("building export frame")?;
  let mut file =
    File::create(path).with_context(|| format!("creating export file {}", path.display()))?;
  CsvWriter::new(&mut file)
    .include_header(true)
    .finish(&mut df)
    .with_context(|| format!("writing export file {}", path.display()))?;

  info!(rows = df.height(), path = %path.display(), "return table exported");
  Ok(Some(path.to_path_buf()))
}
