//! # Log Returns
//!
//! $$
//! r_t=\ln\frac{P_t}{P_{t-1}}
//! $$
//!
//! Builds the return table: every requested ticker gets an explicit `{price, ret}` pair and
//! rows with any missing value are removed.

use chrono::NaiveDate;
use ndarray::ArrayView1;
use tracing::warn;

use super::Column;
use super::MarketError;
use super::PriceTable;
use super::Processed;
use super::Skipped;
use super::Ticker;

/// Aligned price and log-return series of one asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetSeries {
  pub price: Vec<f64>,
  pub ret: Vec<f64>,
}

/// Prices and log returns on the rows where every selected series is observed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReturnTable {
  dates: Vec<NaiveDate>,
  tickers: Vec<Ticker>,
  series: Vec<AssetSeries>,
}

impl ReturnTable {
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn tickers(&self) -> &[Ticker] {
    &self.tickers
  }

  pub fn len(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty() || self.tickers.is_empty()
  }

  pub fn asset(&self, ticker: &str) -> Option<&AssetSeries> {
    self
      .tickers
      .iter()
      .position(|t| t == ticker)
      .map(|i| &self.series[i])
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &AssetSeries)> {
    self.tickers.iter().zip(self.series.iter())
  }

  /// Values of a typed column.
  pub fn column(&self, column: &Column) -> Option<&[f64]> {
    match column {
      Column::Price(t) => self.asset(t).map(|a| a.price.as_slice()),
      Column::Return(t) => self.asset(t).map(|a| a.ret.as_slice()),
    }
  }

  /// All price columns followed by all return columns.
  pub fn columns(&self) -> Vec<Column> {
    self
      .tickers
      .iter()
      .map(|t| Column::Price(t.clone()))
      .chain(self.tickers.iter().map(|t| Column::Return(t.clone())))
      .collect()
  }

  /// Return columns in ticker order.
  pub fn return_columns(&self) -> Vec<Column> {
    self
      .tickers
      .iter()
      .map(|t| Column::Return(t.clone()))
      .collect()
  }

  /// Surviving prices as a standalone price table.
  pub fn to_price_table(&self) -> Result<PriceTable, MarketError> {
    PriceTable::from_columns(
      self.dates.clone(),
      self
        .iter()
        .map(|(t, s)| (t.clone(), s.price.clone()))
        .collect(),
    )
  }
}

/// Log returns of a price series, aligned with the input.
///
/// The first element and every element whose price pair is missing or non-positive is `NaN`.
pub fn log_returns(prices: ArrayView1<'_, f64>) -> Vec<f64> {
  let mut out = Vec::with_capacity(prices.len());
  for i in 0..prices.len() {
    if i == 0 {
      out.push(f64::NAN);
      continue;
    }
    let (prev, cur) = (prices[i - 1], prices[i]);
    if prev > 0.0 && cur > 0.0 {
      out.push((cur / prev).ln());
    } else {
      out.push(f64::NAN);
    }
  }
  out
}

/// Add a log-return series for every requested ticker and keep only complete rows.
///
/// Tickers missing from `prices` are skipped with a warning. One asset's gap removes the row
/// for every asset.
pub fn build_returns(prices: &PriceTable, tickers: &[Ticker]) -> Processed<ReturnTable> {
  if prices.is_empty() {
    warn!("price table is empty; no returns computed");
    return Processed::default();
  }

  let mut skipped = Vec::new();
  let mut selected: Vec<Ticker> = Vec::new();
  let mut raw: Vec<AssetSeries> = Vec::new();

  for ticker in tickers {
    if selected.contains(ticker) {
      continue;
    }
    let Some(column) = prices.column(ticker) else {
      warn!(ticker = %ticker, "ticker not found in price table");
      skipped.push(Skipped::missing(ticker));
      continue;
    };
    raw.push(AssetSeries {
      price: column.to_vec(),
      ret: log_returns(column),
    });
    selected.push(ticker.clone());
  }

  if selected.is_empty() {
    return Processed::new(ReturnTable::default(), skipped);
  }

  let keep: Vec<usize> = (0..prices.n_rows())
    .filter(|&i| {
      raw
        .iter()
        .all(|s| s.price[i].is_finite() && s.ret[i].is_finite())
    })
    .collect();

  let dates = keep.iter().map(|&i| prices.dates()[i]).collect();
  let series = raw
    .into_iter()
    .map(|s| AssetSeries {
      price: keep.iter().map(|&i| s.price[i]).collect(),
      ret: keep.iter().map(|&i| s.ret[i]).collect(),
    })
    .collect();

  Processed::new(
    ReturnTable {
      dates,
      tickers: selected,
      series,
    },
    skipped,
  )
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::market::SkipReason;

  fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
  }

  fn table(a: Vec<f64>, b: Vec<f64>) -> PriceTable {
    let dates = (1..=a.len() as u32).map(d).collect();
    PriceTable::from_columns(dates, vec![("A".into(), a), ("B".into(), b)]).unwrap()
  }

  #[test]
  fn three_day_scenario_keeps_rows_with_returns() {
    let prices = table(vec![100.0, 102.0, 101.0], vec![50.0, 49.0, 50.0]);
    let out = build_returns(&prices, &["A".into(), "B".into()]);
    let rt = out.value;

    assert!(out.skipped.is_empty());
    assert_eq!(rt.dates(), &[d(2), d(3)]);
    let a = rt.asset("A").unwrap();
    let b = rt.asset("B").unwrap();
    assert_abs_diff_eq!(a.ret[1], (101.0f64 / 102.0).ln(), epsilon = 1e-15);
    assert_abs_diff_eq!(b.ret[1], (50.0f64 / 49.0).ln(), epsilon = 1e-15);
    assert_eq!(a.price, vec![102.0, 101.0]);

    let surviving = rt.to_price_table().unwrap();
    assert_eq!(surviving.dates(), rt.dates());
    assert_eq!(surviving.column("B").unwrap().to_vec(), vec![49.0, 50.0]);
  }

  #[test]
  fn leading_gap_leaves_single_row() {
    let prices = table(vec![100.0, 102.0, 101.0], vec![f64::NAN, 49.0, 50.0]);
    let rt = build_returns(&prices, &["A".into(), "B".into()]).value;

    assert_eq!(rt.len(), 1);
    assert_eq!(rt.dates(), &[d(3)]);
    assert_abs_diff_eq!(
      rt.column(&Column::Return("A".into())).unwrap()[0],
      (101.0f64 / 102.0).ln(),
      epsilon = 1e-15
    );
    assert_abs_diff_eq!(
      rt.column(&Column::Return("B".into())).unwrap()[0],
      (50.0f64 / 49.0).ln(),
      epsilon = 1e-15
    );
  }

  #[test]
  fn output_never_contains_nan() {
    let prices = table(
      vec![10.0, f64::NAN, 11.0, 12.0, 0.0, 13.0, 14.0],
      vec![5.0, 5.1, f64::NAN, 5.3, 5.2, 5.4, 5.5],
    );
    let rt = build_returns(&prices, &["A".into(), "B".into()]).value;

    for (_, s) in rt.iter() {
      assert!(s.price.iter().chain(s.ret.iter()).all(|v| v.is_finite()));
    }
    assert_eq!(rt.dates(), &[d(7)]);
  }

  #[test]
  #[traced_test]
  fn missing_ticker_is_reported_and_others_unaffected() {
    let prices = table(vec![100.0, 102.0, 101.0], vec![50.0, 49.0, 50.0]);
    let full = build_returns(&prices, &["A".into()]).value;
    let out = build_returns(&prices, &["A".into(), "ZZZ".into()]);

    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].id, "ZZZ");
    assert_eq!(out.skipped[0].reason, SkipReason::MissingTicker);
    assert_eq!(out.value, full);
    assert!(logs_contain("ticker not found in price table"));
  }

  #[test]
  fn empty_table_yields_empty_result() {
    let out = build_returns(&PriceTable::default(), &["A".into()]);
    assert!(out.value.is_empty());
  }

  #[test]
  fn duplicate_request_is_processed_once() {
    let prices = table(vec![1.0, 2.0], vec![3.0, 4.0]);
    let rt = build_returns(&prices, &["A".into(), "A".into()]).value;
    assert_eq!(rt.tickers(), &["A".to_string()]);
    assert_eq!(
      rt.columns(),
      vec![Column::Price("A".into()), Column::Return("A".into())]
    );
  }
}
