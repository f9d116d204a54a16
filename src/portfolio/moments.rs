//! # Moment Estimation
//!
//! $$
//! \mu_i=252\,\bar r_i,\qquad
//! \Sigma_{ij}=\frac{1}{n_{ij}-1}\sum_{t\in T_{ij}}(r_{i,t}-\bar r_i^{(ij)})(r_{j,t}-\bar r_j^{(ij)})
//! $$
//!
//! Annualized mean log returns and per-period covariance, computed straight from prices.

use nalgebra::DMatrix;
use tracing::debug;
use tracing::warn;

use super::types::CovarianceEstimator;
use super::types::Moments;
use crate::TRADING_DAYS_PER_YEAR;
use crate::market::PriceTable;
use crate::market::Processed;
use crate::market::Skipped;
use crate::market::Ticker;
use crate::market::log_returns;
use crate::stats::sample_mean;

/// Configuration for [`estimate_moments_with`].
#[derive(Clone, Copy, Debug)]
pub struct MomentConfig {
  /// Periods per year used to annualize `mu`.
  pub frequency: f64,
  /// Covariance estimator for `sigma`.
  pub estimator: CovarianceEstimator,
}

impl Default for MomentConfig {
  fn default() -> Self {
    Self {
      frequency: TRADING_DAYS_PER_YEAR,
      estimator: CovarianceEstimator::Sample,
    }
  }
}

/// Estimate moments with the default configuration.
pub fn estimate_moments(prices: &PriceTable, tickers: &[Ticker]) -> Processed<Moments> {
  estimate_moments_with(prices, tickers, &MomentConfig::default())
}

/// Estimate `mu` and `sigma` for `tickers` from `prices`.
///
/// Returns are recomputed here from prices, so a gap in one ticker does not shorten another's
/// history. Each covariance entry then uses its own pairwise window, which can leave `sigma`
/// indefinite. Pass [`ReturnTable::to_price_table`](crate::market::ReturnTable::to_price_table)
/// for a covariance over shared dates. Missing tickers are skipped with a warning.
pub fn estimate_moments_with(
  prices: &PriceTable,
  tickers: &[Ticker],
  cfg: &MomentConfig,
) -> Processed<Moments> {
  if prices.is_empty() {
    warn!("price table is empty; no moments estimated");
    return Processed::default();
  }

  let mut skipped = Vec::new();
  let mut selected: Vec<Ticker> = Vec::new();
  let mut returns: Vec<Vec<f64>> = Vec::new();
  for ticker in tickers {
    if selected.contains(ticker) {
      continue;
    }
    let Some(column) = prices.column(ticker) else {
      warn!(ticker = %ticker, "ticker not found in price table");
      skipped.push(Skipped::missing(ticker));
      continue;
    };
    returns.push(log_returns(column));
    selected.push(ticker.clone());
  }

  if selected.is_empty() {
    warn!("no requested ticker found; no moments estimated");
    return Processed::new(Moments::default(), skipped);
  }

  let mu: Vec<f64> = returns
    .iter()
    .map(|r| {
      let available: Vec<f64> = r.iter().copied().filter(|v| v.is_finite()).collect();
      cfg.frequency * sample_mean(&available)
    })
    .collect();
  let observations = returns
    .iter()
    .map(|r| r.iter().filter(|v| v.is_finite()).count())
    .min()
    .unwrap_or(0);

  let sigma = match cfg.estimator {
    CovarianceEstimator::Sample => pairwise_covariance(&returns),
    CovarianceEstimator::LedoitWolf => ledoit_wolf(&complete_rows(&returns)),
  };
  debug!(
    tickers = selected.len(),
    observations,
    estimator = %cfg.estimator,
    "moments estimated"
  );

  Processed::new(Moments::new(selected, mu, sigma, observations), skipped)
}

/// Sample covariance (`ddof = 1`) over pairwise-complete observations.
///
/// Fewer than two shared observations give `NaN`.
pub(crate) fn pairwise_covariance(returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let n = returns.len();
  let mut cov = vec![vec![f64::NAN; n]; n];
  for i in 0..n {
    for j in i..n {
      let (x, y): (Vec<f64>, Vec<f64>) = returns[i]
        .iter()
        .zip(returns[j].iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
      let c = if x.len() < 2 {
        f64::NAN
      } else {
        let (mx, my) = (sample_mean(&x), sample_mean(&y));
        let s = x
          .iter()
          .zip(y.iter())
          .map(|(a, b)| (a - mx) * (b - my))
          .sum::<f64>();
        s / (x.len() - 1) as f64
      };
      cov[i][j] = c;
      cov[j][i] = c;
    }
  }
  cov
}

/// Rows (as per-asset columns) where every asset has a return.
fn complete_rows(returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let len = returns.iter().map(Vec::len).min().unwrap_or(0);
  let keep: Vec<usize> = (0..len)
    .filter(|&t| returns.iter().all(|r| r[t].is_finite()))
    .collect();
  returns
    .iter()
    .map(|r| keep.iter().map(|&t| r[t]).collect())
    .collect()
}

/// Ledoit-Wolf shrinkage of the sample covariance toward `m I`, `m = tr(S)/p`.
///
/// `returns` holds one equally long, gap-free series per asset. The result is rescaled by
/// `n / (n - 1)` so that zero shrinkage reproduces the sample covariance.
pub fn ledoit_wolf(returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let p = returns.len();
  let n = returns.first().map(Vec::len).unwrap_or(0);
  if p == 0 {
    return Vec::new();
  }
  if n < 2 {
    return vec![vec![f64::NAN; p]; p];
  }

  let mut x = DMatrix::from_fn(n, p, |t, i| returns[i][t]);
  for mut col in x.column_iter_mut() {
    let m = col.mean();
    col.add_scalar_mut(-m);
  }

  let s = x.transpose() * &x / n as f64;
  let mu = s.trace() / p as f64;
  let target = DMatrix::<f64>::identity(p, p) * mu;
  let d2 = (&s - &target).norm_squared();

  let mut b2 = 0.0f64;
  for row in x.row_iter() {
    let outer = row.transpose() * row;
    b2 += (outer - &s).norm_squared();
  }
  b2 /= (n * n) as f64;

  let shrinkage = if d2 > 0.0 { b2.min(d2) / d2 } else { 0.0 };
  debug!(shrinkage, "ledoit-wolf shrinkage intensity");

  let scale = n as f64 / (n - 1) as f64;
  let shrunk = (s * (1.0 - shrinkage) + target * shrinkage) * scale;
  (0..p)
    .map(|i| (0..p).map(|j| shrunk[(i, j)]).collect())
    .collect()
}
