//! # Descriptive Statistics
//!
//! $$
//! Q(p)=x_{(\lfloor h\rfloor)}+(h-\lfloor h\rfloor)\,(x_{(\lfloor h\rfloor+1)}-x_{(\lfloor h\rfloor)}),\quad h=p\,(n-1)
//! $$
//!
//! Per-column summary with linearly interpolated quantiles, rounded to two decimals.

use statrs::statistics::Statistics;

use super::round_to;
use crate::market::Column;
use crate::market::PriceTable;
use crate::market::ReturnTable;

/// A table whose numeric columns can be summarized.
pub trait NumericTable {
  /// Columns in presentation order with their values (`NaN` marks a missing value).
  fn numeric_columns(&self) -> Vec<(Column, Vec<f64>)>;
}

impl NumericTable for PriceTable {
  fn numeric_columns(&self) -> Vec<(Column, Vec<f64>)> {
    self
      .tickers()
      .iter()
      .enumerate()
      .map(|(j, t)| (Column::Price(t.clone()), self.prices().column(j).to_vec()))
      .collect()
  }
}

impl NumericTable for ReturnTable {
  fn numeric_columns(&self) -> Vec<(Column, Vec<f64>)> {
    self
      .columns()
      .into_iter()
      .filter_map(|c| {
        let values = self.column(&c)?.to_vec();
        Some((c, values))
      })
      .collect()
  }
}

/// Summary statistics of one column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSummary {
  pub count: usize,
  pub mean: f64,
  pub std: f64,
  pub min: f64,
  pub p25: f64,
  pub p50: f64,
  pub p75: f64,
  pub max: f64,
}

impl ColumnSummary {
  /// Summarize `values`, ignoring `NaN`. Every statistic is rounded to two decimals.
  pub fn from_values(values: &[f64]) -> Self {
    let mut xs: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    xs.sort_by(f64::total_cmp);

    let count = xs.len();
    if count == 0 {
      return Self {
        count,
        mean: f64::NAN,
        std: f64::NAN,
        min: f64::NAN,
        p25: f64::NAN,
        p50: f64::NAN,
        p75: f64::NAN,
        max: f64::NAN,
      };
    }

    let std = if count < 2 { f64::NAN } else { xs.iter().std_dev() };
    Self {
      count,
      mean: round_to(xs.iter().mean(), 2),
      std: round_to(std, 2),
      min: round_to(xs[0], 2),
      p25: round_to(quantile_sorted(&xs, 0.25), 2),
      p50: round_to(quantile_sorted(&xs, 0.50), 2),
      p75: round_to(quantile_sorted(&xs, 0.75), 2),
      max: round_to(xs[count - 1], 2),
    }
  }

  /// Values in `count, mean, std, min, 25%, 50%, 75%, max` order.
  pub fn as_row(&self) -> [f64; 8] {
    [
      self.count as f64,
      self.mean,
      self.std,
      self.min,
      self.p25,
      self.p50,
      self.p75,
      self.max,
    ]
  }
}

/// Header labels matching [`ColumnSummary::as_row`].
pub const SUMMARY_HEADERS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Ordered column summaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsTable {
  rows: Vec<(Column, ColumnSummary)>,
}

impl StatsTable {
  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn get(&self, column: &Column) -> Option<&ColumnSummary> {
    self.rows.iter().find(|(c, _)| c == column).map(|(_, s)| s)
  }

  pub fn iter(&self) -> impl Iterator<Item = &(Column, ColumnSummary)> {
    self.rows.iter()
  }
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
pub(crate) fn quantile_sorted(xs: &[f64], p: f64) -> f64 {
  let h = p * (xs.len() - 1) as f64;
  let lo = h.floor() as usize;
  let hi = (lo + 1).min(xs.len() - 1);
  xs[lo] + (h - lo as f64) * (xs[hi] - xs[lo])
}

/// Summarize every numeric column of `table`.
pub fn describe(table: &impl NumericTable) -> StatsTable {
  StatsTable {
    rows: table
      .numeric_columns()
      .into_iter()
      .map(|(c, values)| (c, ColumnSummary::from_values(&values)))
      .collect(),
  }
}
