//! # Maximum-Sharpe Optimizer
//!
//! $$
//! \min_{y\ge 0}\ y^\top\Sigma y\quad\text{s.t.}\quad(\mu-r_f\mathbf 1)^\top y=1,\qquad
//! \mathbf w^\*=\frac{y^\*}{\mathbf 1^\top y^\*}
//! $$
//!
//! Long-only tangency portfolio solved as a convex QP with Clarabel, followed by weight cleaning.

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettingsBuilder;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use nalgebra::DMatrix;
use tracing::debug;
use tracing::error;

use super::PortfolioError;
use super::types::Moments;
use super::types::PortfolioResult;
use super::types::WeightVector;
use crate::TRADING_DAYS_PER_YEAR;

/// Optimizer settings.
#[derive(Clone, Copy, Debug)]
pub struct OptimizerConfig {
  /// Risk-free rate in the same (annual) units as `mu`.
  pub risk_free: f64,
  /// Weights below `weight_cutoff * max(w)` are set to zero.
  pub weight_cutoff: f64,
  /// Relative tolerance on negative eigenvalues of `sigma`.
  pub psd_tolerance: f64,
  /// Relative tolerance on `|sigma_ij - sigma_ji|`.
  pub symmetry_tolerance: f64,
  pub max_iter: u32,
  pub tol_gap_abs: f64,
  pub tol_gap_rel: f64,
  /// Print the solver's own progress table.
  pub verbose: bool,
}

impl Default for OptimizerConfig {
  fn default() -> Self {
    Self {
      risk_free: 0.0,
      weight_cutoff: 1e-4,
      psd_tolerance: 1e-10,
      symmetry_tolerance: 1e-12,
      max_iter: 200,
      tol_gap_abs: 1e-8,
      tol_gap_rel: 1e-8,
      verbose: false,
    }
  }
}

fn validate(mu: &[f64], sigma: &[Vec<f64>], cfg: &OptimizerConfig) -> Result<(), PortfolioError> {
  let n = mu.len();
  if n == 0 || sigma.is_empty() {
    return Err(PortfolioError::EmptyInput);
  }
  if sigma.len() != n || sigma.iter().any(|row| row.len() != n) {
    return Err(PortfolioError::InvalidCovariance(format!(
      "expected {n}x{n} for {n} expected returns"
    )));
  }
  if mu.iter().any(|v| !v.is_finite()) {
    return Err(PortfolioError::InvalidCovariance(
      "expected returns contain non-finite values".into(),
    ));
  }
  if sigma.iter().flatten().any(|v| !v.is_finite()) {
    return Err(PortfolioError::InvalidCovariance(
      "covariance contains non-finite values".into(),
    ));
  }

  let scale = sigma
    .iter()
    .flatten()
    .fold(1.0f64, |acc, v| acc.max(v.abs()));
  for i in 0..n {
    for j in (i + 1)..n {
      if (sigma[i][j] - sigma[j][i]).abs() > cfg.symmetry_tolerance * scale {
        return Err(PortfolioError::InvalidCovariance(format!(
          "not symmetric at ({i}, {j})"
        )));
      }
    }
  }

  let min_eigenvalue = DMatrix::from_fn(n, n, |i, j| sigma[i][j])
    .symmetric_eigen()
    .eigenvalues
    .iter()
    .fold(f64::INFINITY, |acc, v| acc.min(*v));
  if min_eigenvalue < -cfg.psd_tolerance * scale {
    return Err(PortfolioError::NotPositiveSemiDefinite { min_eigenvalue });
  }

  Ok(())
}

/// Upper triangle of `sigma` in compressed sparse column form.
fn upper_triangle(sigma: &[Vec<f64>]) -> CscMatrix<f64> {
  let n = sigma.len();
  let mut colptr = Vec::with_capacity(n + 1);
  let mut rowval = Vec::new();
  let mut nzval = Vec::new();
  colptr.push(0);
  for j in 0..n {
    for (i, row) in sigma.iter().enumerate().take(j + 1) {
      rowval.push(i);
      nzval.push(row[j]);
    }
    colptr.push(rowval.len());
  }
  CscMatrix::new(n, n, colptr, rowval, nzval)
}

/// Constraint matrix `[(mu - rf)'; -I]`.
fn constraints(excess: &[f64]) -> CscMatrix<f64> {
  let n = excess.len();
  let mut colptr = Vec::with_capacity(n + 1);
  let mut rowval = Vec::with_capacity(2 * n);
  let mut nzval = Vec::with_capacity(2 * n);
  colptr.push(0);
  for (j, e) in excess.iter().enumerate() {
    rowval.push(0);
    nzval.push(*e);
    rowval.push(j + 1);
    nzval.push(-1.0);
    colptr.push(rowval.len());
  }
  CscMatrix::new(n + 1, n, colptr, rowval, nzval)
}

/// Raw long-only maximum-Sharpe weights (before cleaning), summing to one.
pub fn max_sharpe(
  mu: &[f64],
  sigma: &[Vec<f64>],
  cfg: &OptimizerConfig,
) -> Result<Vec<f64>, PortfolioError> {
  validate(mu, sigma, cfg)?;
  let excess: Vec<f64> = mu.iter().map(|m| m - cfg.risk_free).collect();
  if excess.iter().all(|e| *e <= 0.0) {
    return Err(PortfolioError::NoPositiveExcessReturn {
      risk_free: cfg.risk_free,
    });
  }

  let n = mu.len();
  if n == 1 {
    return Ok(vec![1.0]);
  }

  let p = upper_triangle(sigma);
  let q = vec![0.0; n];
  let a = constraints(&excess);
  let mut b = vec![0.0; n + 1];
  b[0] = 1.0;
  let cones = [
    SupportedConeT::ZeroConeT(1),
    SupportedConeT::NonnegativeConeT(n),
  ];

  let settings = DefaultSettingsBuilder::default()
    .verbose(cfg.verbose)
    .max_iter(cfg.max_iter)
    .tol_gap_abs(cfg.tol_gap_abs)
    .tol_gap_rel(cfg.tol_gap_rel)
    .build()
    .map_err(|e| PortfolioError::Solver(e.to_string()))?;

  let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
  solver.solve();

  let status = solver.solution.status;
  debug!(?status, iterations = solver.info.iterations, "clarabel finished");
  if !matches!(status, SolverStatus::Solved | SolverStatus::AlmostSolved) {
    return Err(PortfolioError::Solver(format!("{status:?}")));
  }

  let y: Vec<f64> = solver.solution.x.iter().map(|v| v.max(0.0)).collect();
  let total: f64 = y.iter().sum();
  if !(total.is_finite() && total > 0.0) {
    return Err(PortfolioError::Solver(format!(
      "degenerate solution (sum {total})"
    )));
  }
  Ok(y.iter().map(|v| v / total).collect())
}

/// Clip negatives, zero weights below `cutoff * max(w)` and renormalize to one.
pub fn clean_weights(weights: &[f64], cutoff: f64) -> Vec<f64> {
  let clipped: Vec<f64> = weights.iter().map(|w| w.max(0.0)).collect();
  let max = clipped.iter().fold(0.0f64, |acc, w| acc.max(*w));
  if max <= 0.0 {
    return clipped;
  }
  let kept: Vec<f64> = clipped
    .iter()
    .map(|&w| if w < cutoff * max { 0.0 } else { w })
    .collect();
  let total: f64 = kept.iter().sum();
  kept.iter().map(|w| w / total).collect()
}

/// Expected annual return, annual volatility and Sharpe ratio of `weights`.
///
/// `sigma` is per-period and annualized here with 252 trading days.
pub fn portfolio_performance(
  weights: &[f64],
  mu: &[f64],
  sigma: &[Vec<f64>],
  risk_free: f64,
) -> (f64, f64, f64) {
  let ret = weights.iter().zip(mu).map(|(w, m)| w * m).sum::<f64>();
  let mut var = 0.0f64;
  for (i, wi) in weights.iter().enumerate() {
    for (j, wj) in weights.iter().enumerate() {
      var += wi * sigma[i][j] * wj;
    }
  }
  let vol = (TRADING_DAYS_PER_YEAR * var.max(0.0)).sqrt();
  let sharpe = if vol > 0.0 {
    (ret - risk_free) / vol
  } else {
    f64::NAN
  };
  (ret, vol, sharpe)
}

/// Solve, clean and evaluate the tangency portfolio of `moments`.
pub fn optimize(
  moments: &Moments,
  cfg: &OptimizerConfig,
) -> Result<PortfolioResult, PortfolioError> {
  let raw = max_sharpe(&moments.mu, &moments.sigma, cfg)?;
  let weights = clean_weights(&raw, cfg.weight_cutoff);
  let (expected_return, volatility, sharpe) =
    portfolio_performance(&weights, &moments.mu, &moments.sigma, cfg.risk_free);

  Ok(PortfolioResult {
    weights: WeightVector::new(&moments.tickers, &weights),
    expected_return,
    volatility,
    sharpe,
  })
}

/// Cleaned weights, or an empty vector (with the cause logged) when optimization fails.
pub fn calculate_weight(moments: &Moments, cfg: &OptimizerConfig) -> WeightVector {
  match optimize(moments, cfg) {
    Ok(result) => result.weights,
    Err(err) => {
      error!(%err, "portfolio optimization failed");
      WeightVector::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;

  fn moments(mu: Vec<f64>, sigma: Vec<Vec<f64>>) -> Moments {
    let tickers = (0..mu.len()).map(|i| format!("T{i}")).collect();
    Moments::new(tickers, mu, sigma, 100)
  }

  #[test]
  fn diagonal_case_matches_tangency_formula() {
    let w = max_sharpe(
      &[0.10, 0.05],
      &[vec![0.04, 0.0], vec![0.0, 0.01]],
      &OptimizerConfig::default(),
    )
    .unwrap();
    assert_abs_diff_eq!(w[0], 1.0 / 3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(w[1], 2.0 / 3.0, epsilon = 1e-6);
  }

  #[test]
  fn asset_without_excess_return_gets_nothing() {
    let cfg = OptimizerConfig {
      risk_free: 0.05,
      ..OptimizerConfig::default()
    };
    let m = moments(vec![0.10, 0.05], vec![vec![0.04, 0.0], vec![0.0, 0.01]]);
    let result = optimize(&m, &cfg).unwrap();

    assert_abs_diff_eq!(result.weights.get("T0").unwrap(), 1.0, epsilon = 1e-9);
    assert_eq!(result.weights.get("T1"), Some(0.0));
  }

  #[test]
  fn weights_are_a_valid_allocation() {
    let sigma = vec![
      vec![0.00040, 0.00012, 0.00005],
      vec![0.00012, 0.00025, 0.00004],
      vec![0.00005, 0.00004, 0.00010],
    ];
    let m = moments(vec![0.12, 0.08, 0.03], sigma);
    let result = optimize(&m, &OptimizerConfig::default()).unwrap();

    assert_abs_diff_eq!(result.weights.sum(), 1.0, epsilon = 1e-9);
    assert!(result.weights.iter().all(|(_, w)| (0.0..=1.0).contains(&w)));
    assert!(result.volatility > 0.0);
    assert_abs_diff_eq!(
      result.sharpe,
      result.expected_return / result.volatility,
      epsilon = 1e-12
    );
  }

  #[test]
  fn optimization_is_deterministic() {
    let sigma = vec![vec![0.0004, 0.0001], vec![0.0001, 0.0002]];
    let m = moments(vec![0.15, 0.07], sigma);
    let cfg = OptimizerConfig::default();
    assert_eq!(optimize(&m, &cfg), optimize(&m, &cfg));
  }

  #[test]
  fn single_asset_takes_everything() {
    let m = moments(vec![0.05], vec![vec![0.0002]]);
    let result = optimize(&m, &OptimizerConfig::default()).unwrap();
    assert_eq!(result.weights.values(), vec![1.0]);
  }

  #[test]
  fn infeasible_and_invalid_inputs_are_typed_errors() {
    let cfg = OptimizerConfig::default();
    assert_eq!(max_sharpe(&[], &[], &cfg), Err(PortfolioError::EmptyInput));
    assert_eq!(
      max_sharpe(&[-0.1, 0.0], &[vec![0.01, 0.0], vec![0.0, 0.01]], &cfg),
      Err(PortfolioError::NoPositiveExcessReturn { risk_free: 0.0 })
    );
    assert!(matches!(
      max_sharpe(&[0.1, 0.1], &[vec![0.01, 0.02], vec![0.0, 0.01]], &cfg),
      Err(PortfolioError::InvalidCovariance(_))
    ));
    assert!(matches!(
      max_sharpe(&[0.1, 0.1], &[vec![0.01, 0.05], vec![0.05, 0.01]], &cfg),
      Err(PortfolioError::NotPositiveSemiDefinite { .. })
    ));
    assert!(matches!(
      max_sharpe(&[0.1, f64::NAN], &[vec![0.01, 0.0], vec![0.0, 0.01]], &cfg),
      Err(PortfolioError::InvalidCovariance(_))
    ));
  }

  #[test]
  #[traced_test]
  fn calculate_weight_degrades_to_empty() {
    let m = moments(vec![-0.02], vec![vec![0.0001]]);
    let w = calculate_weight(&m, &OptimizerConfig::default());
    assert!(w.is_empty());
    assert!(logs_contain("portfolio optimization failed"));
  }

  #[test]
  fn cleaning_drops_dust_and_renormalizes() {
    let w = clean_weights(&[0.6, 0.39999, 0.00001, -1e-12], 1e-4);
    assert_eq!(w[2], 0.0);
    assert_eq!(w[3], 0.0);
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
    assert_abs_diff_eq!(w[0], 0.6 / 0.99999, epsilon = 1e-12);
  }
}
