//! # Stats
//!
//! $$
//! \bar x=\frac1n\sum_i x_i,\qquad s=\sqrt{\frac{1}{n-1}\sum_i(x_i-\bar x)^2}
//! $$
//!
//! Descriptive statistics, correlation, rolling volatility and histograms over price and
//! return tables.

use thiserror::Error;

pub mod correlation;
pub mod describe;
pub mod histogram;
pub mod rolling;

pub use correlation::CorrelationMatrix;
pub use correlation::correlate;
pub use describe::ColumnSummary;
pub use describe::NumericTable;
pub use describe::StatsTable;
pub use describe::describe;
pub use histogram::Histogram;
pub use histogram::histogram;
pub use rolling::rolling_std;

/// Invalid parameters passed to a statistics query.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
  #[error("rolling window must be at least 1 (got {0})")]
  InvalidWindow(usize),
  #[error("histogram needs at least 1 bin (got {0})")]
  InvalidBins(usize),
}

/// Arithmetic mean; `NaN` for an empty slice.
pub(crate) fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    f64::NAN
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

/// Sample standard deviation with `n - 1` in the denominator; `NaN` below two points.
pub(crate) fn sample_std(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    return f64::NAN;
  }
  let m = sample_mean(xs);
  let ss = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
  (ss / (xs.len() - 1) as f64).sqrt()
}

/// Pearson correlation of two equally long series.
///
/// Zero variance on either side yields `NaN`.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len().min(y.len());
  if n < 2 {
    return f64::NAN;
  }

  let mx = sample_mean(&x[..n]);
  let my = sample_mean(&y[..n]);

  let mut cov = 0.0;
  let mut sx = 0.0;
  let mut sy = 0.0;
  for i in 0..n {
    let dx = x[i] - mx;
    let dy = y[i] - my;
    cov += dx * dy;
    sx += dx * dx;
    sy += dy * dy;
  }

  let denom = (sx * sy).sqrt();
  if denom == 0.0 {
    f64::NAN
  } else {
    (cov / denom).clamp(-1.0, 1.0)
  }
}

/// Round half away from zero to `decimals` places. Non-finite values pass through.
pub fn round_to(x: f64, decimals: i32) -> f64 {
  if !x.is_finite() {
    return x;
  }
  let scale = 10f64.powi(decimals);
  (x * scale).round() / scale
}
