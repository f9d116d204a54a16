//! # Portfolio Engine
//!
//! $$
//! \mathbf{w}^\* = \operatorname{Optimize}(\hat\mu, \hat\Sigma)
//! $$
//!
//! High-level entry point chaining moment estimation and optimization.

use tracing::error;
use tracing::info;

use super::PortfolioError;
use super::moments::MomentConfig;
use super::moments::estimate_moments_with;
use super::optimizer::OptimizerConfig;
use super::optimizer::optimize;
use super::types::Moments;
use super::types::PortfolioResult;
use super::types::WeightVector;
use crate::market::PriceTable;
use crate::market::Processed;
use crate::market::Ticker;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Copy, Debug)]
pub struct PortfolioEngineConfig {
  pub moments: MomentConfig,
  pub optimizer: OptimizerConfig,
  /// Fewest per-asset return observations accepted by [`PortfolioEngine::optimize`].
  pub min_observations: usize,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      moments: MomentConfig::default(),
      optimizer: OptimizerConfig::default(),
      min_observations: 2,
    }
  }
}

/// Single entry point for estimating moments and allocating weights.
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// Estimate `mu` and `sigma` for `tickers`.
  pub fn estimate(&self, prices: &PriceTable, tickers: &[Ticker]) -> Processed<Moments> {
    estimate_moments_with(prices, tickers, &self.config.moments)
  }

  /// Optimize and evaluate the tangency portfolio.
  pub fn optimize(&self, moments: &Moments) -> Result<PortfolioResult, PortfolioError> {
    if moments.is_empty() {
      return Err(PortfolioError::EmptyInput);
    }
    if moments.observations < self.config.min_observations {
      return Err(PortfolioError::InsufficientObservations {
        required: self.config.min_observations,
        got: moments.observations,
      });
    }
    optimize(moments, &self.config.optimizer)
  }

  /// Cleaned weights under the same checks as [`Self::optimize`], empty when it fails.
  pub fn weights(&self, moments: &Moments) -> WeightVector {
    match self.optimize(moments) {
      Ok(result) => result.weights,
      Err(err) => {
        error!(%err, "portfolio optimization failed");
        WeightVector::default()
      }
    }
  }

  /// Prices to optimal portfolio in one call.
  pub fn run(
    &self,
    prices: &PriceTable,
    tickers: &[Ticker],
  ) -> Result<Processed<PortfolioResult>, PortfolioError> {
    let Processed { value, skipped } = self.estimate(prices, tickers);
    let result = self.optimize(&value)?;
    info!(
      assets = result.weights.len(),
      sharpe = result.sharpe,
      "portfolio optimized"
    );
    Ok(Processed::new(result, skipped))
  }
}
