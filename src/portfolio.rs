//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Moment estimation and long-only maximum-Sharpe allocation.

use thiserror::Error;

pub mod engine;
pub mod moments;
pub mod optimizer;
pub mod types;

pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use moments::MomentConfig;
pub use moments::estimate_moments;
pub use moments::estimate_moments_with;
pub use moments::ledoit_wolf;
pub use optimizer::OptimizerConfig;
pub use optimizer::calculate_weight;
pub use optimizer::clean_weights;
pub use optimizer::max_sharpe;
pub use optimizer::optimize;
pub use optimizer::portfolio_performance;
pub use types::CovarianceEstimator;
pub use types::Moments;
pub use types::PortfolioResult;
pub use types::WeightVector;

/// Failures of moment estimation or optimization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortfolioError {
  #[error("expected returns and covariance are empty")]
  EmptyInput,
  #[error("invalid covariance matrix: {0}")]
  InvalidCovariance(String),
  #[error("covariance matrix is not positive semi-definite (min eigenvalue {min_eigenvalue:e})")]
  NotPositiveSemiDefinite { min_eigenvalue: f64 },
  #[error("no asset has an expected return above the risk-free rate {risk_free}")]
  NoPositiveExcessReturn { risk_free: f64 },
  #[error("need at least {required} return observations per asset, got {got}")]
  InsufficientObservations { required: usize, got: usize },
  #[error("solver failed: {0}")]
  Solver(String),
}
