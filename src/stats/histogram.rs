//! # Return Histogram
//!
//! $$
//! c_k=\#\{t:\ e_k\le r_t<e_{k+1}\},\qquad e_k=r_{\min}+k\,\frac{r_{\max}-r_{\min}}{B}
//! $$
//!
//! Equal-width binning of one asset's log returns. The last bin is closed on the right.

use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;
use tracing::warn;

use super::StatsError;
use crate::market::ReturnTable;

/// Bin edges (`bins + 1` of them) and per-bin counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Histogram {
  pub edges: Vec<f64>,
  pub counts: Vec<usize>,
}

impl Histogram {
  pub fn is_empty(&self) -> bool {
    self.counts.is_empty()
  }

  /// Bin midpoints.
  pub fn centers(&self) -> Vec<f64> {
    self.edges.windows(2).map(|e| 0.5 * (e[0] + e[1])).collect()
  }

  pub fn total(&self) -> usize {
    self.counts.iter().sum()
  }

  /// Bin `values` into `bins` equal-width buckets over their range.
  ///
  /// A constant sample is spread over `[c - 0.5, c + 0.5]`.
  pub fn from_values(values: &[f64], bins: usize) -> Result<Self, StatsError> {
    if bins == 0 {
      return Err(StatsError::InvalidBins(bins));
    }
    let view = ArrayView1::from(values);
    let (mut lo, mut hi) = (*view.min_skipnan(), *view.max_skipnan());
    if lo.is_nan() || hi.is_nan() {
      return Ok(Self::default());
    }
    if lo == hi {
      lo -= 0.5;
      hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|k| lo + k as f64 * width).collect();
    let mut counts = vec![0usize; bins];
    for &v in values.iter().filter(|v| !v.is_nan()) {
      let k = (((v - lo) / width).floor() as usize).min(bins - 1);
      counts[k] += 1;
    }

    Ok(Self { edges, counts })
  }
}

/// Histogram of `ticker`'s log returns.
pub fn histogram(table: &ReturnTable, ticker: &str, bins: usize) -> Result<Histogram, StatsError> {
  if bins == 0 {
    return Err(StatsError::InvalidBins(bins));
  }
  let Some(asset) = table.asset(ticker) else {
    warn!(ticker, "ticker not found; no histogram");
    return Ok(Histogram::default());
  };
  Histogram::from_values(&asset.ret, bins)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn counts_cover_every_value() {
    let values = [0.0, 0.1, 0.2, 0.3, 0.4, 1.0];
    let h = Histogram::from_values(&values, 4).unwrap();

    assert_eq!(h.edges.len(), 5);
    assert_abs_diff_eq!(h.edges[0], 0.0);
    assert_abs_diff_eq!(h.edges[4], 1.0, epsilon = 1e-12);
    assert_eq!(h.counts, vec![3, 2, 0, 1]);
    assert_eq!(h.total(), values.len());
  }

  #[test]
  fn constant_sample_gets_unit_range() {
    let h = Histogram::from_values(&[2.0, 2.0, 2.0], 2).unwrap();
    assert_eq!(h.edges, vec![1.5, 2.0, 2.5]);
    assert_eq!(h.counts, vec![0, 3]);
    assert_eq!(h.centers(), vec![1.75, 2.25]);
  }

  #[test]
  fn zero_bins_and_missing_ticker() {
    assert_eq!(
      histogram(&ReturnTable::default(), "A", 0),
      Err(StatsError::InvalidBins(0))
    );
    assert!(histogram(&ReturnTable::default(), "A", 10)
      .unwrap()
      .is_empty());
    assert!(Histogram::from_values(&[], 3).unwrap().is_empty());
  }
}
