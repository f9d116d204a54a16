//! # Interactive Shell
//!
//! $$
//! \text{prompt}\ \to\ P\ \to\ R\ \to\ \{\text{stats},\ \text{charts},\ \mathbf w^\*,\ \text{report}\}
//! $$
//!
//! Prompt-driven session over one downloaded price table.

use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use colored::Colorize;
use plotly::Plot;
use tracing::info;

use super::Args;
use super::Stage;
use crate::market::PriceSource;
use crate::market::PriceTable;
use crate::market::ReturnTable;
use crate::market::Ticker;
use crate::market::build_returns;
use crate::market::parse_tickers;
use crate::portfolio::PortfolioEngine;
use crate::report::EXPORT_FILE;
use crate::report::REPORT_FILE;
use crate::report::ReportConfig;
use crate::report::correlation_table;
use crate::report::export_table;
use crate::report::generate_report;
use crate::report::stats_table;
use crate::report::weights_table;
use crate::stats::correlate;
use crate::stats::describe;
use crate::stats::histogram;
use crate::stats::rolling_std;
use crate::visualization::correlation_heatmap;
use crate::visualization::price_lines;
use crate::visualization::return_box_plot;
use crate::visualization::returns_histogram_chart;
use crate::visualization::rolling_volatility_chart;
use crate::visualization::save_chart;

const MAIN_MENU: &str = "\
Choose an option:
  1. Descriptive statistics
  2. Charts
  3. Optimal portfolio weights
  4. Report
  5. Exit";

const CHART_MENU: &str = "\
Charts:
  1. Closing prices
  2. Log return box plot
  3. Correlation heatmap
  4. Rolling volatility
  5. Return histogram
  6. Back";

const REPORT_MENU: &str = "\
Report:
  1. HTML report
  2. CSV export
  3. Back";

/// Data loaded for the session.
#[derive(Clone, Debug, Default)]
struct Session {
  tickers: Vec<Ticker>,
  prices: PriceTable,
  /// Prices on the rows kept in `returns`; moments are estimated from these.
  aligned: PriceTable,
  returns: ReturnTable,
}

/// Menu loop reading from `R` and writing to `W`.
pub struct Shell<R, W> {
  input: R,
  out: W,
  source: Box<dyn PriceSource>,
  engine: PortfolioEngine,
  report: ReportConfig,
  output_dir: PathBuf,
  preset_tickers: Option<String>,
  preset_start: Option<NaiveDate>,
  preset_end: Option<NaiveDate>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
  pub fn new(args: &Args, source: Box<dyn PriceSource>, input: R, out: W) -> Self {
    Self {
      input,
      out,
      source,
      engine: PortfolioEngine::new(args.engine_config()),
      report: args.report_config(),
      output_dir: args.output_dir.clone(),
      preset_tickers: args.tickers.clone(),
      preset_start: args.start,
      preset_end: args.end,
    }
  }

  /// Consume the shell, returning the writer.
  pub fn into_output(self) -> W {
    self.out
  }

  /// Run a whole session: prompts, download, then the menu until exit or end of input.
  pub fn run(&mut self) -> Result<()> {
    writeln!(
      self.out,
      "{}",
      "Welcome to equity-lens, the investment analysis tool.".bold().green()
    )?;

    let tickers = self.tickers()?;
    let (start, end) = self.dates()?;

    writeln!(self.out, "Downloading prices for {}...", tickers.join(", "))?;
    let fetched = match self.source.fetch(&tickers, start, end) {
      Ok(fetched) => fetched,
      Err(err) => return self.fail(Stage::Download, &err),
    };
    for skip in &fetched.skipped {
      writeln!(
        self.out,
        "{}",
        format!("Skipping {}: {}", skip.id, skip.reason).yellow()
      )?;
    }

    let prices = fetched.value;
    let built = build_returns(&prices, &tickers);
    if built.value.is_empty() {
      let err = anyhow::anyhow!("no date has a price for every ticker");
      return self.fail(Stage::Returns, &err);
    }
    info!(
      rows = built.value.len(),
      tickers = built.value.tickers().len(),
      "session data ready"
    );
    writeln!(
      self.out,
      "{}",
      format!("Loaded {} trading days of returns.", built.value.len()).green()
    )?;

    let aligned = match built.value.to_price_table() {
      Ok(aligned) => aligned,
      Err(err) => return self.fail(Stage::Returns, &anyhow::Error::new(err)),
    };
    let session = Session {
      tickers: built.value.tickers().to_vec(),
      prices,
      aligned,
      returns: built.value,
    };
    self.menu(&session)
  }

  fn fail(&mut self, stage: Stage, err: &anyhow::Error) -> Result<()> {
    writeln!(self.out, "{}", format!("Error during {stage}: {err:#}").red())?;
    Ok(())
  }

  fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
    write!(self.out, "{prompt}")?;
    self.out.flush()?;
    let mut line = String::new();
    if self.input.read_line(&mut line)? == 0 {
      writeln!(self.out)?;
      return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
  }

  fn require_line(&mut self, prompt: &str) -> Result<String> {
    match self.read_line(prompt)? {
      Some(line) => Ok(line),
      None => bail!("input closed before the session was configured"),
    }
  }

  fn tickers(&mut self) -> Result<Vec<Ticker>> {
    if let Some(preset) = self.preset_tickers.take() {
      let tickers = parse_tickers(&preset);
      if !tickers.is_empty() {
        return Ok(tickers);
      }
    }
    loop {
      let line = self.require_line("Enter tickers separated by commas (e.g. MSFT,TSLA): ")?;
      let tickers = parse_tickers(&line);
      if !tickers.is_empty() {
        return Ok(tickers);
      }
      writeln!(self.out, "{}", "Enter at least one ticker.".red())?;
    }
  }

  fn date(&mut self, label: &str) -> Result<NaiveDate> {
    loop {
      let line = self.require_line(&format!("Enter the {label} date (YYYY-MM-DD): "))?;
      match NaiveDate::parse_from_str(&line, "%Y-%m-%d") {
        Ok(date) => return Ok(date),
        Err(_) => writeln!(
          self.out,
          "{}",
          format!("Invalid date '{line}'. Use the YYYY-MM-DD format.").red()
        )?,
      }
    }
  }

  fn dates(&mut self) -> Result<(NaiveDate, NaiveDate)> {
    let start = match self.preset_start {
      Some(date) => date,
      None => self.date("start")?,
    };
    if let Some(end) = self.preset_end {
      return Ok((start, end));
    }
    loop {
      let end = self.date("end")?;
      if end > start {
        return Ok((start, end));
      }
      writeln!(
        self.out,
        "{}",
        format!("The end date must be after {start}.").red()
      )?;
    }
  }

  /// Positive integer prompt; an empty answer takes `default`, end of input gives `None`.
  fn positive(&mut self, prompt: &str, default: usize) -> Result<Option<usize>> {
    loop {
      let Some(line) = self.read_line(&format!("{prompt} [{default}]: "))? else {
        return Ok(None);
      };
      if line.is_empty() {
        return Ok(Some(default));
      }
      match line.parse::<usize>() {
        Ok(n) if n > 0 => return Ok(Some(n)),
        _ => writeln!(
          self.out,
          "{}",
          format!("'{line}' is not a positive whole number.").red()
        )?,
      }
    }
  }

  fn ticker_choice(&mut self, session: &Session) -> Result<Option<Ticker>> {
    let prompt = format!("Ticker ({}): ", session.tickers.join(", "));
    loop {
      let Some(line) = self.read_line(&prompt)? else {
        return Ok(None);
      };
      let ticker = line.to_uppercase();
      if session.tickers.contains(&ticker) {
        return Ok(Some(ticker));
      }
      writeln!(
        self.out,
        "{}",
        format!("'{line}' is not one of the loaded tickers.").red()
      )?;
    }
  }

  fn menu(&mut self, session: &Session) -> Result<()> {
    loop {
      writeln!(self.out, "\n{MAIN_MENU}")?;
      let Some(choice) = self.read_line("> ")? else {
        return Ok(());
      };
      match choice.as_str() {
        "1" => self.statistics(session)?,
        "2" => self.charts(session)?,
        "3" => self.weights(session)?,
        "4" => self.reports(session)?,
        "5" => {
          writeln!(self.out, "{}", "Goodbye.".green())?;
          return Ok(());
        }
        other => writeln!(self.out, "{}", format!("Unknown option '{other}'.").red())?,
      }
    }
  }

  fn statistics(&mut self, session: &Session) -> Result<()> {
    let stats = describe(&session.returns);
    if stats.is_empty() {
      let err = anyhow::anyhow!("no numeric columns to summarize");
      return self.fail(Stage::Statistics, &err);
    }
    writeln!(self.out, "{}", stats_table(&stats))?;
    let corr = correlate(&session.returns, &session.returns.return_columns());
    if corr.len() > 1 {
      writeln!(self.out, "Return correlation")?;
      writeln!(self.out, "{}", correlation_table(&corr))?;
    }
    Ok(())
  }

  fn weights(&mut self, session: &Session) -> Result<()> {
    match self.engine.run(&session.aligned, &session.tickers) {
      Ok(run) => {
        let result = run.value;
        writeln!(self.out, "{}", weights_table(&result.weights))?;
        writeln!(
          self.out,
          "Expected annual return: {:.1}%",
          result.expected_return * 100.0
        )?;
        writeln!(self.out, "Annual volatility: {:.1}%", result.volatility * 100.0)?;
        writeln!(self.out, "Sharpe Ratio: {:.2}", result.sharpe)?;
        Ok(())
      }
      Err(err) => self.fail(Stage::Optimization, &anyhow::Error::new(err)),
    }
  }

  fn save(&mut self, plot: &Plot, file: &str) -> Result<()> {
    match save_chart(plot, self.output_dir.join(file)) {
      Ok(path) => writeln!(
        self.out,
        "{}",
        format!("Chart saved to {}", path.display()).green()
      )?,
      Err(err) => self.fail(Stage::Charts, &err)?,
    }
    Ok(())
  }

  fn charts(&mut self, session: &Session) -> Result<()> {
    loop {
      writeln!(self.out, "\n{CHART_MENU}")?;
      let Some(choice) = self.read_line("> ")? else {
        return Ok(());
      };
      match choice.as_str() {
        "1" => self.save(&price_lines(&session.prices), "prices.html")?,
        "2" => self.save(&return_box_plot(&session.returns), "returns_box.html")?,
        "3" => {
          let corr = correlate(&session.returns, &session.returns.return_columns());
          self.save(&correlation_heatmap(&corr), "correlation.html")?
        }
        "4" => {
          let Some(ticker) = self.ticker_choice(session)? else {
            return Ok(());
          };
          let Some(window) = self.positive("Window in trading days", self.report.window)? else {
            return Ok(());
          };
          match rolling_std(&session.returns, &ticker, window) {
            Ok(series) => self.save(
              &rolling_volatility_chart(&ticker, window, &series),
              &format!("rolling_vol_{ticker}.html"),
            )?,
            Err(err) => self.fail(Stage::Charts, &anyhow::Error::new(err))?,
          }
        }
        "5" => {
          let Some(ticker) = self.ticker_choice(session)? else {
            return Ok(());
          };
          let Some(bins) = self.positive("Number of bins", self.report.bins)? else {
            return Ok(());
          };
          match histogram(&session.returns, &ticker, bins) {
            Ok(hist) => self.save(
              &returns_histogram_chart(&ticker, &hist),
              &format!("histogram_{ticker}.html"),
            )?,
            Err(err) => self.fail(Stage::Charts, &anyhow::Error::new(err))?,
          }
        }
        "6" => return Ok(()),
        other => writeln!(self.out, "{}", format!("Unknown option '{other}'.").red())?,
      }
    }
  }

  fn reports(&mut self, session: &Session) -> Result<()> {
    loop {
      writeln!(self.out, "\n{REPORT_MENU}")?;
      let Some(choice) = self.read_line("> ")? else {
        return Ok(());
      };
      match choice.as_str() {
        "1" => {
          let moments = self.engine.estimate(&session.aligned, &session.tickers).value;
          let weights = self.engine.weights(&moments);
          let path = self.output_dir.join(REPORT_FILE);
          match generate_report(&session.returns, &weights, &self.report, path) {
            Ok(Some(path)) => writeln!(
              self.out,
              "{}",
              format!("Report saved to {}", path.display()).green()
            )?,
            Ok(None) => writeln!(self.out, "{}", "Nothing to report.".yellow())?,
            Err(err) => self.fail(Stage::Report, &err)?,
          }
        }
        "2" => match export_table(&session.returns, self.output_dir.join(EXPORT_FILE)) {
          Ok(Some(path)) => writeln!(
            self.out,
            "{}",
            format!("Data exported to {}", path.display()).green()
          )?,
          Ok(None) => writeln!(self.out, "{}", "Nothing to export.".yellow())?,
          Err(err) => self.fail(Stage::Report, &err)?,
        },
        "3" => return Ok(()),
        other => writeln!(self.out, "{}", format!("Unknown option '{other}'.").red())?,
      }
    }
  }
}
