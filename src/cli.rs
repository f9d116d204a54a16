//! # Command Line
//!
//! $$
//! \text{args}\ \to\ (\text{tickers},[t_0,t_1))\ \to\ \text{menu loop}
//! $$
//!
//! Argument parsing, logging setup and the interactive shell.

use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::market::CsvSource;
use crate::market::PriceSource;
use crate::portfolio::CovarianceEstimator;
use crate::portfolio::MomentConfig;
use crate::portfolio::OptimizerConfig;
use crate::portfolio::PortfolioEngineConfig;
use crate::report::ReportConfig;

pub mod shell;

pub use shell::Shell;

/// Where prices come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
  /// Yahoo Finance adjusted closes.
  Yahoo,
  /// A local `date,<TICKER>,...` CSV file.
  Csv,
}

/// Interactive equity analysis: returns, statistics, charts and maximum-Sharpe weights.
#[derive(Clone, Debug, Parser)]
#[command(name = "equity-lens", version, about, long_about = None)]
pub struct Args {
  /// Comma separated tickers (prompted for when omitted)
  #[arg(short, long)]
  pub tickers: Option<String>,

  /// First date, YYYY-MM-DD (prompted for when omitted)
  #[arg(short, long)]
  pub start: Option<NaiveDate>,

  /// End date (exclusive), YYYY-MM-DD (prompted for when omitted)
  #[arg(short, long)]
  pub end: Option<NaiveDate>,

  /// Annual risk-free rate used by the optimizer
  #[arg(long, default_value_t = 0.0)]
  pub risk_free: f64,

  /// Relative cutoff below which weights are zeroed
  #[arg(long, default_value_t = 1e-4)]
  pub weight_cutoff: f64,

  /// Rolling volatility window for the report, in trading days
  #[arg(long, default_value_t = 30)]
  pub window: usize,

  /// Histogram bins for the report
  #[arg(long, default_value_t = 30)]
  pub bins: usize,

  /// Covariance estimator for the optimizer
  #[arg(long, value_enum, default_value_t = CovarianceEstimator::Sample)]
  pub shrinkage: CovarianceEstimator,

  /// Price source
  #[arg(long, value_enum, default_value_t = SourceKind::Yahoo)]
  pub source: SourceKind,

  /// Price file for `--source csv`
  #[arg(short, long)]
  pub input: Option<PathBuf>,

  /// Directory for charts, reports and exports
  #[arg(short, long, default_value = ".")]
  pub output_dir: PathBuf,

  /// Log filter when RUST_LOG is unset (e.g. warn, info, equity_lens=debug)
  #[arg(long, default_value = "warn")]
  pub log_level: String,
}

impl Default for Args {
  fn default() -> Self {
    Self {
      tickers: None,
      start: None,
      end: None,
      risk_free: 0.0,
      weight_cutoff: 1e-4,
      window: 30,
      bins: 30,
      shrinkage: CovarianceEstimator::Sample,
      source: SourceKind::Yahoo,
      input: None,
      output_dir: PathBuf::from("."),
      log_level: "warn".to_string(),
    }
  }
}

impl Args {
  pub fn engine_config(&self) -> PortfolioEngineConfig {
    PortfolioEngineConfig {
      moments: MomentConfig {
        estimator: self.shrinkage,
        ..MomentConfig::default()
      },
      optimizer: OptimizerConfig {
        risk_free: self.risk_free,
        weight_cutoff: self.weight_cutoff,
        ..OptimizerConfig::default()
      },
      ..PortfolioEngineConfig::default()
    }
  }

  pub fn report_config(&self) -> ReportConfig {
    ReportConfig {
      window: self.window,
      bins: self.bins,
      ..ReportConfig::default()
    }
  }

  /// The configured price source.
  pub fn price_source(&self) -> Result<Box<dyn PriceSource>> {
    match self.source {
      SourceKind::Csv => match &self.input {
        Some(path) => Ok(Box::new(CsvSource::new(path))),
        None => bail!("--source csv requires --input <FILE>"),
      },
      #[cfg(feature = "yahoo")]
      SourceKind::Yahoo => Ok(Box::new(crate::market::YahooSource::new(true))),
      #[cfg(not(feature = "yahoo"))]
      SourceKind::Yahoo => bail!("built without the `yahoo` feature; use --source csv"),
    }
  }
}

/// Install the global `fmt` subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> Result<()> {
  let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!(e))
}

/// Pipeline step named in user-facing failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
  Download,
  Returns,
  Statistics,
  Charts,
  Moments,
  Optimization,
  Report,
}

impl Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Stage::Download => "downloading prices",
      Stage::Returns => "computing returns",
      Stage::Statistics => "computing statistics",
      Stage::Charts => "generating the chart",
      Stage::Moments => "estimating moments",
      Stage::Optimization => "optimizing weights",
      Stage::Report => "writing the report",
    };
    f.write_str(name)
  }
}
