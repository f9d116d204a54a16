//! # Rolling Volatility
//!
//! $$
//! \sigma_t^{(w)}=\sqrt{\frac{1}{w-1}\sum_{k=t-w+1}^{t}(r_k-\bar r_t)^2}
//! $$
//!
//! Trailing-window sample standard deviation of one asset's log returns.

use chrono::NaiveDate;
use tracing::warn;

use super::StatsError;
use super::sample_std;
use crate::market::ReturnTable;

/// Rolling sample std of `ticker`'s returns over `window` rows.
///
/// The first `window - 1` points are `None`, as is every point when `window == 1`.
pub fn rolling_std(
  table: &ReturnTable,
  ticker: &str,
  window: usize,
) -> Result<Vec<(NaiveDate, Option<f64>)>, StatsError> {
  if window == 0 {
    return Err(StatsError::InvalidWindow(window));
  }
  let Some(asset) = table.asset(ticker) else {
    warn!(ticker, "ticker not found; no rolling volatility");
    return Ok(Vec::new());
  };

  let out = table
    .dates()
    .iter()
    .enumerate()
    .map(|(t, &date)| {
      if t + 1 < window || window < 2 {
        return (date, None);
      }
      (date, Some(sample_std(&asset.ret[t + 1 - window..=t])))
    })
    .collect();

  Ok(out)
}
