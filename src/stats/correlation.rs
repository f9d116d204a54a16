//! # Correlation
//!
//! $$
//! \rho_{xy}=\frac{\sum_t(x_t-\bar x)(y_t-\bar y)}{\sqrt{\sum_t(x_t-\bar x)^2\sum_t(y_t-\bar y)^2}}
//! $$
//!
//! Pearson correlation over selected columns after listwise deletion.

use ndarray::Array2;
use tracing::warn;

use super::pearson;
use crate::market::Column;
use crate::market::ReturnTable;

/// Symmetric correlation matrix labelled by column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelationMatrix {
  labels: Vec<Column>,
  values: Array2<f64>,
}

impl CorrelationMatrix {
  pub fn labels(&self) -> &[Column] {
    &self.labels
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn get(&self, a: &Column, b: &Column) -> Option<f64> {
    let i = self.labels.iter().position(|c| c == a)?;
    let j = self.labels.iter().position(|c| c == b)?;
    Some(self.values[[i, j]])
  }

  /// Row-major copy, convenient for charting.
  pub fn to_rows(&self) -> Vec<Vec<f64>> {
    self.values.rows().into_iter().map(|r| r.to_vec()).collect()
  }
}

/// Pearson correlation of `columns` on the rows where all of them are observed.
///
/// Unknown columns are skipped with a warning. The diagonal is exactly `1.0`; a pair involving a
/// constant column is `NaN`.
pub fn correlate(table: &ReturnTable, columns: &[Column]) -> CorrelationMatrix {
  let mut labels: Vec<Column> = Vec::new();
  let mut series: Vec<&[f64]> = Vec::new();
  for c in columns {
    if labels.contains(c) {
      continue;
    }
    match table.column(c) {
      Some(values) => {
        labels.push(c.clone());
        series.push(values);
      }
      None => warn!(column = %c, "column not found; excluded from correlation"),
    }
  }

  if labels.is_empty() {
    warn!("no columns to correlate");
    return CorrelationMatrix::default();
  }

  let rows: Vec<usize> = (0..table.len())
    .filter(|&t| series.iter().all(|s| !s[t].is_nan()))
    .collect();
  if rows.is_empty() {
    warn!("no complete rows to correlate");
    return CorrelationMatrix::default();
  }

  let aligned: Vec<Vec<f64>> = series
    .iter()
    .map(|s| rows.iter().map(|&t| s[t]).collect())
    .collect();

  let n = labels.len();
  let mut values = Array2::from_elem((n, n), 1.0);
  for i in 0..n {
    for j in (i + 1)..n {
      let r = pearson(&aligned[i], &aligned[j]);
      values[[i, j]] = r;
      values[[j, i]] = r;
    }
  }

  CorrelationMatrix { labels, values }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;
  use tracing_test::traced_test;

  use super::*;
  use crate::market::PriceTable;
  use crate::market::build_returns;

  fn returns() -> ReturnTable {
    let dates = (1..=6)
      .map(|d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap())
      .collect();
    let prices = PriceTable::from_columns(
      dates,
      vec![
        ("A".into(), vec![10.0, 11.0, 10.5, 11.5, 12.0, 11.8]),
        ("B".into(), vec![20.0, 22.0, 21.0, 23.0, 24.0, 23.6]),
        ("C".into(), vec![5.0, 4.8, 5.1, 4.9, 4.7, 5.2]),
      ],
    )
    .unwrap();
    build_returns(&prices, &["A".into(), "B".into(), "C".into()]).value
  }

  #[test]
  fn matrix_is_symmetric_with_unit_diagonal() {
    let rt = returns();
    let corr = correlate(&rt, &rt.return_columns());

    assert_eq!(corr.len(), 3);
    for i in 0..3 {
      assert_eq!(corr.values()[[i, i]], 1.0);
      for j in 0..3 {
        assert_eq!(corr.values()[[i, j]], corr.values()[[j, i]]);
        assert!((-1.0..=1.0).contains(&corr.values()[[i, j]]));
      }
    }
    // B is A scaled by two, so their returns coincide.
    let ab = corr
      .get(&Column::Return("A".into()), &Column::Return("B".into()))
      .unwrap();
    assert_abs_diff_eq!(ab, 1.0, epsilon = 1e-9);
  }

  #[test]
  fn single_column_is_exactly_one() {
    let corr = correlate(&returns(), &[Column::Return("C".into())]);
    assert_eq!(corr.to_rows(), vec![vec![1.0]]);
  }

  #[test]
  #[traced_test]
  fn unknown_columns_are_skipped() {
    let rt = returns();
    let corr = correlate(
      &rt,
      &[Column::Return("ZZZ".into()), Column::Price("A".into())],
    );
    assert_eq!(corr.labels(), &[Column::Price("A".into())]);
    assert!(logs_contain("column not found"));

    assert!(correlate(&rt, &[]).is_empty());
    assert!(correlate(&ReturnTable::default(), &[Column::Return("A".into())]).is_empty());
  }
}
