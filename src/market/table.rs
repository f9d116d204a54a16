//! # Price Table
//!
//! $$
//! P\in\mathbb R^{T\times N},\quad P_{t,i}=\text{adjusted close of ticker } i \text{ on day } t
//! $$
//!
//! Date-indexed matrix of adjusted closing prices.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

use super::MarketError;
use super::Ticker;

/// Adjusted closing prices, rows ordered by date and one column per ticker.
///
/// Missing observations are stored as `NaN`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
  dates: Vec<NaiveDate>,
  tickers: Vec<Ticker>,
  prices: Array2<f64>,
}

impl PriceTable {
  /// Build a table from a `dates x tickers` price matrix.
  pub fn new(
    dates: Vec<NaiveDate>,
    tickers: Vec<Ticker>,
    prices: Array2<f64>,
  ) -> Result<Self, MarketError> {
    if prices.nrows() != dates.len() || prices.ncols() != tickers.len() {
      return Err(MarketError::ShapeMismatch {
        rows: prices.nrows(),
        cols: prices.ncols(),
        dates: dates.len(),
        tickers: tickers.len(),
      });
    }

    for (row, pair) in dates.windows(2).enumerate() {
      if pair[1] <= pair[0] {
        return Err(MarketError::UnorderedDates {
          row: row + 1,
          date: pair[1],
        });
      }
    }

    for (i, t) in tickers.iter().enumerate() {
      if tickers[..i].contains(t) {
        return Err(MarketError::DuplicateTicker(t.clone()));
      }
    }

    Ok(Self {
      dates,
      tickers,
      prices,
    })
  }

  /// Build a table from per-ticker price columns.
  pub fn from_columns(
    dates: Vec<NaiveDate>,
    columns: Vec<(Ticker, Vec<f64>)>,
  ) -> Result<Self, MarketError> {
    let n_rows = dates.len();
    let n_cols = columns.len();
    let mut prices = Array2::from_elem((n_rows, n_cols), f64::NAN);
    let mut tickers = Vec::with_capacity(n_cols);

    for (j, (ticker, values)) in columns.into_iter().enumerate() {
      if values.len() != n_rows {
        return Err(MarketError::ShapeMismatch {
          rows: values.len(),
          cols: n_cols,
          dates: n_rows,
          tickers: n_cols,
        });
      }
      for (i, v) in values.into_iter().enumerate() {
        prices[[i, j]] = v;
      }
      tickers.push(ticker);
    }

    Self::new(dates, tickers, prices)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[Ticker] {
    &self.tickers
  }

  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  pub fn n_rows(&self) -> usize {
    self.dates.len()
  }

  /// `true` when the table has no rows or no columns.
  pub fn is_empty(&self) -> bool {
    self.dates.is_empty() || self.tickers.is_empty()
  }

  pub fn position(&self, ticker: &str) -> Option<usize> {
    self.tickers.iter().position(|t| t == ticker)
  }

  pub fn contains(&self, ticker: &str) -> bool {
    self.position(ticker).is_some()
  }

  /// Price column of `ticker`, if present.
  pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
    self.position(ticker).map(|j| self.prices.column(j))
  }

  /// Drop rows where every price is missing.
  pub fn drop_empty_rows(self) -> Self {
    let keep: Vec<usize> = (0..self.n_rows())
      .filter(|&i| self.prices.row(i).iter().any(|v| !v.is_nan()))
      .collect();
    if keep.len() == self.n_rows() {
      return self;
    }

    let dates = keep.iter().map(|&i| self.dates[i]).collect();
    let prices = self.prices.select(Axis(0), &keep);
    Self {
      dates,
      tickers: self.tickers,
      prices,
    }
  }
}
