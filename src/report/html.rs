//! # HTML Report
//!
//! $$
//! \text{report}=\text{stats}\ \|\ \text{charts}\ \|\ \mathbf w^\*\ \|\ \rho\ \|\ \sigma^{(w)}\ \|\ \text{histograms}
//! $$
//!
//! Self-contained HTML document with embedded interactive charts.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use plotly::Plot;
use tracing::info;
use tracing::warn;

use super::tables::fmt_value;
use crate::market::ReturnTable;
use crate::portfolio::WeightVector;
use crate::stats::correlate;
use crate::stats::describe;
use crate::stats::describe::SUMMARY_HEADERS;
use crate::stats::histogram;
use crate::stats::rolling_std;
use crate::visualization::correlation_heatmap;
use crate::visualization::price_lines;
use crate::visualization::return_box_plot;
use crate::visualization::returns_histogram_chart;
use crate::visualization::rolling_volatility_chart;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// Report layout settings.
#[derive(Clone, Debug)]
pub struct ReportConfig {
  pub title: String,
  /// Rolling volatility window in trading days.
  pub window: usize,
  /// Histogram bins per ticker.
  pub bins: usize,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      title: "Investment Analysis Report".to_string(),
      window: 30,
      bins: 30,
    }
  }
}

/// Default report file name.
pub const REPORT_FILE: &str = "informe.html";

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      _ => out.push(c),
    }
  }
  out
}

/// Incremental HTML document builder.
#[derive(Clone, Debug, Default)]
pub struct ReportBuilder {
  title: String,
  body: String,
  charts: usize,
}

impl ReportBuilder {
  pub fn new(title: &str) -> Self {
    Self {
      title: title.to_string(),
      ..Self::default()
    }
  }

  pub fn heading(mut self, level: u8, text: &str) -> Self {
    let level = level.clamp(1, 6);
    let _ = writeln!(self.body, "<h{level}>{}</h{level}>", escape(text));
    self
  }

  pub fn paragraph(mut self, text: &str) -> Self {
    let _ = writeln!(self.body, "<p>{}</p>", escape(text));
    self
  }

  pub fn table(mut self, headers: &[String], rows: &[Vec<String>]) -> Self {
    self.body.push_str("<table>\n<thead><tr>");
    for h in headers {
      let _ = write!(self.body, "<th>{}</th>", escape(h));
    }
    self.body.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
      self.body.push_str("<tr>");
      for cell in row {
        let _ = write!(self.body, "<td>{}</td>", escape(cell));
      }
      self.body.push_str("</tr>\n");
    }
    self.body.push_str("</tbody>\n</table>\n");
    self
  }

  /// Embed `plot` under a caption.
  pub fn chart(mut self, caption: &str, plot: &Plot) -> Self {
    self.charts += 1;
    let id = format!("chart-{}", self.charts);
    let _ = writeln!(
      self.body,
      "<figure><figcaption>{}</figcaption>\n{}</figure>",
      escape(caption),
      plot.to_inline_html(Some(id.as_str()))
    );
    self
  }

  pub fn chart_count(&self) -> usize {
    self.charts
  }

  pub fn build(&self) -> String {
    format!(
      "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
       <script src=\"{PLOTLY_CDN}\"></script>\n\
       <style>body{{font-family:sans-serif;max-width:1100px;margin:auto}}\
       table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:4px 8px;text-align:right}}</style>\n\
       </head>\n<body>\n{body}</body>\n</html>\n",
      title = escape(&self.title),
      body = self.body,
    )
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)
        .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    fs::write(path, self.build())
      .with_context(|| format!("writing report {}", path.display()))?;
    Ok(path.to_path_buf())
  }
}

/// Assemble the full analysis report for `returns` and `weights` and write it to `path`.
///
/// A section that cannot be computed is replaced by an explanatory paragraph.
pub fn generate_report(
  returns: &ReturnTable,
  weights: &WeightVector,
  cfg: &ReportConfig,
  path: impl AsRef<Path>,
) -> Result<Option<PathBuf>> {
  if returns.is_empty() {
    warn!("return table is empty; report not generated");
    return Ok(None);
  }

  let mut report = ReportBuilder::new(&cfg.title)
    .heading(1, &cfg.title)
    .paragraph(
      "This report covers the optimal portfolio weights, descriptive statistics of the assets \
       and charts of their performance and risk.",
    );

  report = report.heading(2, "Descriptive statistics");
  let stats = describe(returns);
  if stats.is_empty() {
    report = report.paragraph("No descriptive statistics available.");
  } else {
    let headers: Vec<String> = std::iter::once("Column".to_string())
      .chain(SUMMARY_HEADERS.iter().map(|h| h.to_string()))
      .collect();
    let rows: Vec<Vec<String>> = stats
      .iter()
      .map(|(c, s)| {
        std::iter::once(c.to_string())
          .chain(std::iter::once(s.count.to_string()))
          .chain(s.as_row()[1..].iter().map(|v| fmt_value(*v)))
          .collect()
      })
      .collect();
    report = report.table(&headers, &rows);
  }

  report = report.heading(2, "Performance charts");
  match returns.to_price_table() {
    Ok(prices) => report = report.chart("Price series", &price_lines(&prices)),
    Err(err) => report = report.paragraph(&format!("Price series unavailable: {err}")),
  }
  report = report.chart("Log return box plot", &return_box_plot(returns));

  report = report.heading(2, "Optimal portfolio weights");
  if weights.is_empty() {
    report = report.paragraph("No optimal weights were found for the portfolio.");
  } else {
    for (ticker, w) in weights.iter() {
      report = report.paragraph(&format!("{ticker}: {:.2}%", w * 100.0));
    }
  }

  report = report
    .heading(2, "Additional analysis")
    .heading(3, "Return correlation");
  let corr = correlate(returns, &returns.return_columns());
  if corr.is_empty() {
    report = report.paragraph("No return columns available for a correlation matrix.");
  } else {
    let mut headers = vec![String::new()];
    headers.extend(corr.labels().iter().map(|c| c.to_string()));
    let rows: Vec<Vec<String>> = corr
      .labels()
      .iter()
      .zip(corr.to_rows())
      .map(|(label, row)| {
        std::iter::once(label.to_string())
          .chain(row.into_iter().map(fmt_value))
          .collect()
      })
      .collect();
    report = report
      .table(&headers, &rows)
      .chart("Correlation heatmap", &correlation_heatmap(&corr));
  }

  report = report.heading(3, &format!("Rolling volatility ({} days)", cfg.window));
  for ticker in returns.tickers() {
    match rolling_std(returns, ticker, cfg.window) {
      Ok(series) => {
        report = report.chart(
          &format!("Rolling volatility for {ticker}"),
          &rolling_volatility_chart(ticker, cfg.window, &series),
        )
      }
      Err(err) => {
        report = report.paragraph(&format!("Rolling volatility for {ticker} unavailable: {err}"))
      }
    }
  }

  report = report.heading(3, "Return histograms");
  for ticker in returns.tickers() {
    match histogram(returns, ticker, cfg.bins) {
      Ok(hist) => {
        report = report.chart(
          &format!("Return histogram for {ticker}"),
          &returns_histogram_chart(ticker, &hist),
        )
      }
      Err(err) => {
        report = report.paragraph(&format!("Return histogram for {ticker} unavailable: {err}"))
      }
    }
  }

  let written = report.save(path)?;
  info!(path = %written.display(), charts = report.chart_count(), "report written");
  Ok(Some(written))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::market::PriceTable;
  use crate::market::build_returns;

  fn returns() -> ReturnTable {
    let dates = (1..=10)
      .map(|d| NaiveDate::from_ymd_opt(2024, 10, d).unwrap())
      .collect();
    let prices = PriceTable::from_columns(
      dates,
      vec![
        (
          "MSFT".into(),
          vec![410.0, 412.0, 409.0, 415.0, 418.0, 416.0, 420.0, 419.0, 423.0, 425.0],
        ),
        (
          "TSLA".into(),
          vec![240.0, 245.0, 238.0, 250.0, 247.0, 252.0, 255.0, 249.0, 258.0, 260.0],
        ),
      ],
    )
    .unwrap();
    build_returns(&prices, &["MSFT".into(), "TSLA".into()]).value
  }

  #[test]
  fn builder_escapes_text_and_counts_charts() {
    let html = ReportBuilder::new("A <b> test")
      .heading(2, "R&D")
      .paragraph("1 < 2")
      .chart("empty", &Plot::new())
      .build();
    assert!(html.contains("<title>A &lt;b&gt; test</title>"));
    assert!(html.contains("<h2>R&amp;D</h2>"));
    assert!(html.contains("<p>1 &lt; 2</p>"));
    assert!(html.contains("chart-1"));
  }

  #[test]
  fn full_report_contains_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let weights = WeightVector::new(&["MSFT".into(), "TSLA".into()], &[0.6, 0.4]);
    let cfg = ReportConfig {
      window: 3,
      bins: 5,
      ..ReportConfig::default()
    };
    let path = generate_report(&returns(), &weights, &cfg, dir.path().join(REPORT_FILE))
      .unwrap()
      .unwrap();
    let html = fs::read_to_string(path).unwrap();

    for needle in [
      "Descriptive statistics",
      "RMSFT",
      "MSFT: 60.00%",
      "TSLA: 40.00%",
      "Correlation heatmap",
      "Rolling volatility for TSLA",
      "Return histogram for MSFT",
    ] {
      assert!(html.contains(needle), "missing {needle}");
    }
    // price, box, heatmap, two rolling charts and two histograms
    assert_eq!(html.matches("<figure>").count(), 7);
  }

  #[test]
  fn invalid_window_is_reported_inline() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ReportConfig {
      window: 0,
      ..ReportConfig::default()
    };
    let path = generate_report(
      &returns(),
      &WeightVector::default(),
      &cfg,
      dir.path().join("r.html"),
    )
    .unwrap()
    .unwrap();
    let html = fs::read_to_string(path).unwrap();
    assert!(html.contains("No optimal weights were found"));
    assert!(html.contains("rolling window must be at least 1"));
  }

  #[test]
  fn empty_returns_produce_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none.html");
    let out = generate_report(
      &ReturnTable::default(),
      &WeightVector::default(),
      &ReportConfig::default(),
      &path,
    )
    .unwrap();
    assert!(out.is_none());
    assert!(!path.exists());
  }
}
