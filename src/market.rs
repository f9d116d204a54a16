//! # Market Data
//!
//! $$
//! P:\ \{t_1<\dots<t_T\}\times\{\text{tickers}\}\to\mathbb R_{>0}\cup\{\text{NaN}\}
//! $$
//!
//! Price tables, the log-return table and the sources that produce prices.

use std::fmt::Display;

use chrono::NaiveDate;
use thiserror::Error;

pub mod csv_source;
pub mod returns;
pub mod table;
#[cfg(feature = "yahoo")]
pub mod yahoo;

pub use csv_source::CsvSource;
pub use returns::AssetSeries;
pub use returns::ReturnTable;
pub use returns::build_returns;
pub use returns::log_returns;
pub use table::PriceTable;
#[cfg(feature = "yahoo")]
pub use yahoo::YahooSource;

/// Uppercase ticker symbol.
pub type Ticker = String;

/// Errors raised while building or fetching price data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarketError {
  #[error("dates must be strictly increasing: row {row} ({date}) does not follow its predecessor")]
  UnorderedDates { row: usize, date: NaiveDate },
  #[error("price matrix is {rows}x{cols} but {dates} dates and {tickers} tickers were given")]
  ShapeMismatch {
    rows: usize,
    cols: usize,
    dates: usize,
    tickers: usize,
  },
  #[error("ticker '{0}' appears more than once")]
  DuplicateTicker(Ticker),
  #[error("no price data returned for {0:?}")]
  NoData(Vec<Ticker>),
  #[error("invalid date range: start {start} is not before end {end}")]
  InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Why an identifier was left out of a computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
  /// The ticker has no column in the supplied table.
  MissingTicker,
  /// The source answered but returned no usable quotes.
  NoQuotes,
  /// The source failed for this ticker.
  FetchFailed(String),
}

impl Display for SkipReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SkipReason::MissingTicker => write!(f, "ticker not found in price table"),
      SkipReason::NoQuotes => write!(f, "no quotes available"),
      SkipReason::FetchFailed(cause) => write!(f, "download failed: {cause}"),
    }
  }
}

/// Identifier skipped during processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skipped {
  pub id: String,
  pub reason: SkipReason,
}

impl Skipped {
  pub fn missing(id: &str) -> Self {
    Self {
      id: id.to_string(),
      reason: SkipReason::MissingTicker,
    }
  }
}

/// Result of a soft-failing operation: the processed value plus what was skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Processed<T> {
  pub value: T,
  pub skipped: Vec<Skipped>,
}

impl<T> Processed<T> {
  pub fn new(value: T, skipped: Vec<Skipped>) -> Self {
    Self { value, skipped }
  }

  /// `true` when nothing was skipped.
  pub fn is_complete(&self) -> bool {
    self.skipped.is_empty()
  }

  pub fn skipped_ids(&self) -> Vec<&str> {
    self.skipped.iter().map(|s| s.id.as_str()).collect()
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Processed<U> {
    Processed {
      value: f(self.value),
      skipped: self.skipped,
    }
  }
}

/// Typed address of a numeric column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
  Price(Ticker),
  Return(Ticker),
}

impl Column {
  pub fn ticker(&self) -> &str {
    match self {
      Column::Price(t) | Column::Return(t) => t,
    }
  }
}

impl Display for Column {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Column::Price(t) => write!(f, "{t}"),
      Column::Return(t) => write!(f, "R{t}"),
    }
  }
}

/// A provider of adjusted closing prices.
///
/// Implementations treat partially missing tickers as a partial success (reported in
/// [`Processed::skipped`]) and an empty answer as an error.
pub trait PriceSource {
  /// Fetch prices for `tickers` over `[start, end)`.
  fn fetch(
    &self,
    tickers: &[Ticker],
    start: NaiveDate,
    end: NaiveDate,
  ) -> anyhow::Result<Processed<PriceTable>>;
}

/// Uppercase, trim and de-duplicate a comma separated ticker list.
pub fn parse_tickers(input: &str) -> Vec<Ticker> {
  let mut out: Vec<Ticker> = Vec::new();
  for t in input.split(',') {
    let t = t.trim().to_uppercase();
    if !t.is_empty() && !out.contains(&t) {
      out.push(t);
    }
  }
  out
}
