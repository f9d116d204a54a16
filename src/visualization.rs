//! # Visualization
//!
//! $$
//! (P,\ R,\ \rho,\ \sigma^{(w)})\ \mapsto\ \text{charts}
//! $$
//!
//! Chart builders. Each returns its own [`Plot`]; nothing is drawn until [`save_chart`] or the
//! report embeds it.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use plotly::Bar;
use plotly::BoxPlot;
use plotly::HeatMap;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Annotation;
use plotly::layout::Axis;

use crate::market::PriceTable;
use crate::market::ReturnTable;
use crate::stats::CorrelationMatrix;
use crate::stats::Histogram;

fn date_labels(dates: &[NaiveDate]) -> Vec<String> {
  dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

fn layout(title: &str, x: &str, y: &str) -> Layout {
  Layout::new()
    .title(Title::from(title))
    .x_axis(Axis::new().title(Title::from(x)))
    .y_axis(Axis::new().title(Title::from(y)))
}

/// One line per ticker of adjusted closing prices.
pub fn price_lines(prices: &PriceTable) -> Plot {
  let x = date_labels(prices.dates());
  let mut plot = Plot::new();
  for (j, ticker) in prices.tickers().iter().enumerate() {
    let y: Vec<Option<f64>> = prices
      .prices()
      .column(j)
      .iter()
      .map(|v| v.is_finite().then_some(*v))
      .collect();
    plot.add_trace(
      Scatter::new(x.clone(), y)
        .mode(Mode::Lines)
        .name(ticker.as_str()),
    );
  }
  plot.set_layout(layout("Closing prices", "Date", "Price"));
  plot
}

/// Box plot of each ticker's log returns.
pub fn return_box_plot(returns: &ReturnTable) -> Plot {
  let mut plot = Plot::new();
  for (ticker, series) in returns.iter() {
    plot.add_trace(BoxPlot::<f64, f64>::new(series.ret.clone()).name(&format!("R{ticker}")));
  }
  plot.set_layout(layout("Log return distribution", "Asset", "Log return"));
  plot
}

/// Correlation heatmap with the coefficient printed in every cell.
pub fn correlation_heatmap(corr: &CorrelationMatrix) -> Plot {
  let labels: Vec<String> = corr.labels().iter().map(|c| c.to_string()).collect();
  let z = corr.to_rows();

  let mut annotations = Vec::with_capacity(labels.len() * labels.len());
  for (i, row) in z.iter().enumerate() {
    for (j, v) in row.iter().enumerate() {
      annotations.push(
        Annotation::new()
          .x(j as f64)
          .y(i as f64)
          .text(format!("{v:.2}"))
          .show_arrow(false),
      );
    }
  }

  let mut plot = Plot::new();
  plot.add_trace(HeatMap::new(labels.clone(), labels, z));
  plot.set_layout(
    Layout::new()
      .title(Title::from("Correlation matrix"))
      .annotations(annotations),
  );
  plot
}

/// Rolling volatility of one ticker; undefined leading points are left as gaps.
pub fn rolling_volatility_chart(
  ticker: &str,
  window: usize,
  series: &[(NaiveDate, Option<f64>)],
) -> Plot {
  let x: Vec<String> = series
    .iter()
    .map(|(d, _)| d.format("%Y-%m-%d").to_string())
    .collect();
  let y: Vec<Option<f64>> = series.iter().map(|(_, v)| *v).collect();

  let mut plot = Plot::new();
  plot.add_trace(
    Scatter::new(x, y)
      .mode(Mode::Lines)
      .name(&format!("{ticker} {window}d")),
  );
  plot.set_layout(layout(
    &format!("{ticker} rolling volatility ({window} days)"),
    "Date",
    "Std of log returns",
  ));
  plot
}

/// Bar chart of a return histogram.
pub fn returns_histogram_chart(ticker: &str, hist: &Histogram) -> Plot {
  let mut plot = Plot::new();
  plot.add_trace(Bar::new(hist.centers(), hist.counts.clone()).name(&format!("R{ticker}")));
  plot.set_layout(layout(
    &format!("{ticker} log return histogram ({} bins)", hist.counts.len()),
    "Log return",
    "Frequency",
  ));
  plot
}

/// Write `plot` as a standalone HTML file, creating parent directories as needed.
pub fn save_chart(plot: &Plot, path: impl AsRef<Path>) -> Result<PathBuf> {
  let path = path.as_ref();
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .with_context(|| format!("creating chart directory {}", parent.display()))?;
  }
  plot.write_html(path);
  if !path.exists() {
    anyhow::bail!("chart was not written to {}", path.display());
  }
  Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::market::build_returns;
  use crate::stats::correlate;
  use crate::stats::histogram;
  use crate::stats::rolling_std;

  fn fixture() -> (PriceTable, ReturnTable) {
    let dates = (1..=6)
      .map(|d| NaiveDate::from_ymd_opt(2024, 9, d).unwrap())
      .collect();
    let prices = PriceTable::from_columns(
      dates,
      vec![
        ("MSFT".into(), vec![400.0, 404.0, 401.0, 407.0, 410.0, 409.0]),
        ("NVDA".into(), vec![110.0, 108.0, f64::NAN, 112.0, 115.0, 113.0]),
      ],
    )
    .unwrap();
    let returns = build_returns(&prices, &["MSFT".into(), "NVDA".into()]).value;
    (prices, returns)
  }

  #[test]
  fn charts_are_independent_handles() {
    let (prices, returns) = fixture();
    let lines = price_lines(&prices).to_json();
    let boxes = return_box_plot(&returns).to_json();

    assert!(lines.contains("MSFT") && lines.contains("NVDA"));
    assert!(lines.contains("Closing prices"));
    assert!(boxes.contains("RMSFT"));
    assert!(!boxes.contains("Closing prices"));
  }

  #[test]
  fn heatmap_annotates_every_cell() {
    let (_, returns) = fixture();
    let corr = correlate(&returns, &returns.return_columns());
    let json = correlation_heatmap(&corr).to_json();
    assert!(json.contains("heatmap"));
    assert_eq!(json.matches("\"showarrow\":false").count(), 4);
  }

  #[test]
  fn save_chart_writes_html() {
    let (_, returns) = fixture();
    let dir = tempfile::tempdir().unwrap();
    let vol = rolling_std(&returns, "MSFT", 2).unwrap();
    let hist = histogram(&returns, "MSFT", 3).unwrap();

    let a = save_chart(
      &rolling_volatility_chart("MSFT", 2, &vol),
      dir.path().join("charts/vol.html"),
    )
    .unwrap();
    let b = save_chart(
      &returns_histogram_chart("MSFT", &hist),
      dir.path().join("hist.html"),
    )
    .unwrap();

    assert!(fs::read_to_string(a).unwrap().contains("rolling volatility"));
    assert!(fs::read_to_string(b).unwrap().contains("histogram"));
  }
}
