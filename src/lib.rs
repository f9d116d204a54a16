//! # equity-lens
//!
//! $$
//! r_t=\ln\frac{P_t}{P_{t-1}},\qquad
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta}\frac{\mathbf{w}^\top\mu-r_f}{\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Log-return analytics and maximum-Sharpe allocation for a small basket of equities.
//!
//! - [`market`]: price tables, the log-return builder and price sources.
//! - [`stats`]: descriptive summaries, correlation, rolling volatility and histograms.
//! - [`portfolio`]: moment estimation and the long-only tangency optimizer.
//! - [`visualization`] and [`report`]: chart handles, HTML report, CSV export, terminal tables.
//! - [`cli`]: the interactive shell driven by the `equity-lens` binary.

pub mod cli;
pub mod market;
pub mod portfolio;
pub mod report;
pub mod stats;
pub mod visualization;

pub use market::Column;
pub use market::PriceTable;
pub use market::Processed;
pub use market::ReturnTable;
pub use market::Ticker;
pub use portfolio::Moments;
pub use portfolio::PortfolioResult;
pub use portfolio::WeightVector;

/// Trading days per year used to annualize per-period statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
