//! # Yahoo Finance Source
//!
//! $$
//! (\text{tickers},[t_0,t_1))\ \mapsto\ \{\text{adjclose}_{t,i}\}
//! $$
//!
//! Downloads adjusted closing prices. The connector is async; a private current-thread runtime
//! drives it so callers stay synchronous.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use time::OffsetDateTime;
use tracing::info;
use tracing::warn;
use yahoo_finance_api as yahoo;

use super::MarketError;
use super::PriceSource;
use super::PriceTable;
use super::Processed;
use super::SkipReason;
use super::Skipped;
use super::Ticker;

/// Per-request timeout applied to the whole download of one ticker.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Adjusted-close downloader backed by the Yahoo Finance chart API.
#[derive(Clone, Debug, Default)]
pub struct YahooSource {
  /// Show a progress bar on stderr while downloading.
  pub progress: bool,
}

impl YahooSource {
  pub fn new(progress: bool) -> Self {
    Self { progress }
  }
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
  let seconds = date
    .and_hms_opt(0, 0, 0)
    .context("midnight is always valid")?
    .and_utc()
    .timestamp();
  Ok(OffsetDateTime::from_unix_timestamp(seconds)?)
}

fn to_date(timestamp: i64) -> Option<NaiveDate> {
  DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

impl PriceSource for YahooSource {
  fn fetch(
    &self,
    tickers: &[Ticker],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Processed<PriceTable>> {
    if tickers.is_empty() {
      return Err(MarketError::NoData(Vec::new()).into());
    }
    if start >= end {
      return Err(MarketError::InvalidRange { start, end }.into());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context("starting download runtime")?;
    let provider = yahoo::YahooConnector::new().context("creating Yahoo Finance connector")?;
    let (from, to) = (to_offset(start)?, to_offset(end)?);

    let bar = if self.progress {
      let bar = ProgressBar::new(tickers.len() as u64);
      bar.set_style(ProgressStyle::with_template(
        "{spinner} [{bar:30}] {pos}/{len} {msg}",
      )?);
      bar
    } else {
      ProgressBar::hidden()
    };

    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    let mut fetched: Vec<Ticker> = Vec::new();
    let mut skipped = Vec::new();

    for ticker in tickers {
      bar.set_message(ticker.clone());
      let response = runtime.block_on(async {
        tokio::time::timeout(
          REQUEST_TIMEOUT,
          provider.get_quote_history(ticker, from, to),
        )
        .await
      });

      let quotes = match response {
        Ok(Ok(resp)) => resp.quotes().map_err(|e| e.to_string()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", REQUEST_TIMEOUT.as_secs())),
      };
      bar.inc(1);

      let quotes = match quotes {
        Ok(q) if !q.is_empty() => q,
        Ok(_) => {
          warn!(ticker = %ticker, "no quotes returned");
          skipped.push(Skipped {
            id: ticker.clone(),
            reason: SkipReason::NoQuotes,
          });
          continue;
        }
        Err(cause) => {
          warn!(ticker = %ticker, %cause, "download failed");
          skipped.push(Skipped {
            id: ticker.clone(),
            reason: SkipReason::FetchFailed(cause),
          });
          continue;
        }
      };

      let col = fetched.len();
      for quote in quotes {
        let Some(date) = to_date(quote.timestamp as i64) else {
          continue;
        };
        let row = by_date
          .entry(date)
          .or_insert_with(|| vec![f64::NAN; tickers.len()]);
        row[col] = quote.adjclose;
      }
      fetched.push(ticker.clone());
    }
    bar.finish_and_clear();

    if fetched.is_empty() {
      return Err(MarketError::NoData(tickers.to_vec()).into());
    }

    let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
    let columns = fetched
      .iter()
      .enumerate()
      .map(|(j, t)| (t.clone(), by_date.values().map(|row| row[j]).collect()))
      .collect();
    let table = PriceTable::from_columns(dates, columns)?.drop_empty_rows();
    info!(rows = table.n_rows(), tickers = fetched.len(), "prices downloaded");

    Ok(Processed::new(table, skipped))
  }
}
