//! # CSV Price Source
//!
//! $$
//! \text{file}\ \to\ P\in\mathbb R^{T\times N}
//! $$
//!
//! Offline price source reading a `date,<TICKER>,...` file such as the one written by
//! [`crate::report::export_table`].

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::warn;

use super::MarketError;
use super::PriceSource;
use super::PriceTable;
use super::Processed;
use super::Skipped;
use super::Ticker;

const DATE_COLUMN: &str = "date";

/// Reads adjusted closes from a CSV file with a `date` column (`YYYY-MM-DD`).
#[derive(Clone, Debug)]
pub struct CsvSource {
  path: PathBuf,
}

impl CsvSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  fn read_frame(&self) -> Result<DataFrame> {
    CsvReadOptions::default()
      .with_has_header(true)
      .try_into_reader_with_file_path(Some(self.path.clone()))
      .and_then(|reader| reader.finish())
      .with_context(|| format!("reading price file {}", self.path.display()))
  }
}

impl PriceSource for CsvSource {
  fn fetch(
    &self,
    tickers: &[Ticker],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Processed<PriceTable>> {
    if start >= end {
      return Err(MarketError::InvalidRange { start, end }.into());
    }

    let df = self.read_frame()?;
    let raw_dates = df
      .column(DATE_COLUMN)
      .context("price file has no 'date' column")?
      .cast(&DataType::String)?;
    let mut dates = Vec::with_capacity(df.height());
    let mut rows = Vec::with_capacity(df.height());
    for (i, value) in raw_dates.str()?.into_iter().enumerate() {
      let Some(value) = value else { continue };
      let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}' on row {}", i + 1))?;
      if date >= start && date < end {
        dates.push(date);
        rows.push(i);
      }
    }

    let mut skipped = Vec::new();
    let mut columns = Vec::new();
    for ticker in tickers {
      let Ok(series) = df.column(ticker) else {
        warn!(ticker = %ticker, "ticker not found in price file");
        skipped.push(Skipped::missing(ticker));
        continue;
      };
      let values = series.cast(&DataType::Float64)?;
      let values: Vec<f64> = values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
      columns.push((
        ticker.clone(),
        rows.iter().map(|&i| values[i]).collect::<Vec<f64>>(),
      ));
    }

    if columns.is_empty() {
      return Err(MarketError::NoData(tickers.to_vec()).into());
    }

    let table = PriceTable::from_columns(dates, columns)?.drop_empty_rows();
    if table.is_empty() {
      return Err(MarketError::NoData(tickers.to_vec()).into());
    }

    Ok(Processed::new(table, skipped))
  }
}
