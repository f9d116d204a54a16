//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Shared enums and result containers for portfolio optimization.

use std::fmt::Display;

use clap::ValueEnum;
use impl_new_derive::ImplNew;

use crate::market::Ticker;

/// Covariance estimator used for `sigma`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CovarianceEstimator {
  /// Pairwise-complete sample covariance.
  #[default]
  Sample,
  /// Ledoit-Wolf shrinkage toward a scaled identity.
  #[value(alias = "lw")]
  LedoitWolf,
}

impl Display for CovarianceEstimator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Sample => write!(f, "sample"),
      Self::LedoitWolf => write!(f, "ledoit-wolf"),
    }
  }
}

/// Annualized expected returns and per-period covariance of a ticker set.
#[derive(Clone, Debug, Default, PartialEq, ImplNew)]
pub struct Moments {
  pub tickers: Vec<Ticker>,
  /// `252 * mean(log return)` per ticker.
  pub mu: Vec<f64>,
  /// Per-period log-return covariance, same order as `tickers`.
  pub sigma: Vec<Vec<f64>>,
  /// Fewest return observations available for any ticker.
  pub observations: usize,
}

impl Moments {
  pub fn len(&self) -> usize {
    self.tickers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tickers.is_empty()
  }
}

/// Ordered ticker to weight mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightVector(Vec<(Ticker, f64)>);

impl WeightVector {
  pub fn new(tickers: &[Ticker], weights: &[f64]) -> Self {
    Self(
      tickers
        .iter()
        .cloned()
        .zip(weights.iter().copied())
        .collect(),
    )
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, ticker: &str) -> Option<f64> {
    self.0.iter().find(|(t, _)| t == ticker).map(|(_, w)| *w)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Ticker, f64)> {
    self.0.iter().map(|(t, w)| (t, *w))
  }

  pub fn values(&self) -> Vec<f64> {
    self.0.iter().map(|(_, w)| *w).collect()
  }

  pub fn sum(&self) -> f64 {
    self.0.iter().map(|(_, w)| w).sum()
  }
}

/// Output of a portfolio optimization run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioResult {
  /// Cleaned portfolio weights.
  pub weights: WeightVector,
  /// Expected annual return `w'mu`.
  pub expected_return: f64,
  /// Annual volatility `sqrt(252 w'Sigma w)`.
  pub volatility: f64,
  /// Sharpe ratio computed as `(expected_return - risk_free) / volatility`.
  pub sharpe: f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn estimator_names_parse_strictly() {
    let parse = |s: &str| <CovarianceEstimator as ValueEnum>::from_str(s, true);
    assert_eq!(parse("Ledoit-Wolf"), Ok(CovarianceEstimator::LedoitWolf));
    assert_eq!(parse("lw"), Ok(CovarianceEstimator::LedoitWolf));
    assert_eq!(parse("sample"), Ok(CovarianceEstimator::Sample));
    assert!(parse("ledoit_wolf").is_err());
    assert_eq!(CovarianceEstimator::LedoitWolf.to_string(), "ledoit-wolf");
  }

  #[test]
  fn weight_vector_lookup() {
    let w = WeightVector::new(&["A".into(), "B".into()], &[0.25, 0.75]);
    assert_eq!(w.get("B"), Some(0.75));
    assert_eq!(w.get("C"), None);
    assert_eq!(w.sum(), 1.0);
    assert_eq!(w.values(), vec![0.25, 0.75]);
  }
}
