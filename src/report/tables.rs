//! # Terminal Tables
//!
//! $$
//! \text{StatsTable},\ \mathbf w^\*,\ \rho\ \mapsto\ \text{text grid}
//! $$
//!
//! `prettytable` renderings of summaries, weights and correlations.

use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;
use prettytable::format;

use crate::portfolio::WeightVector;
use crate::stats::CorrelationMatrix;
use crate::stats::StatsTable;
use crate::stats::describe::SUMMARY_HEADERS;

pub(crate) fn fmt_value(v: f64) -> String {
  if v.is_nan() {
    "NaN".to_string()
  } else {
    format!("{v:.2}")
  }
}

fn header(cells: impl IntoIterator<Item = String>) -> Row {
  Row::new(cells.into_iter().map(|c| Cell::new(&c).style_spec("bFc")).collect())
}

fn base() -> Table {
  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_BOX_CHARS);
  table
}

/// Descriptive statistics, one row per column.
pub fn stats_table(stats: &StatsTable) -> Table {
  let mut table = base();
  table.set_titles(header(
    std::iter::once("Ticker".to_string()).chain(SUMMARY_HEADERS.iter().map(|h| h.to_string())),
  ));
  for (column, summary) in stats.iter() {
    let mut cells = vec![Cell::new(&column.to_string()).style_spec("b")];
    cells.push(Cell::new(&summary.count.to_string()).style_spec("r"));
    cells.extend(
      summary.as_row()[1..]
        .iter()
        .map(|v| Cell::new(&fmt_value(*v)).style_spec("r")),
    );
    table.add_row(Row::new(cells));
  }
  table
}

/// Optimal weights as percentages.
pub fn weights_table(weights: &WeightVector) -> Table {
  let mut table = base();
  table.set_titles(header(["Ticker".to_string(), "Optimal weight".to_string()]));
  for (ticker, w) in weights.iter() {
    table.add_row(Row::new(vec![
      Cell::new(ticker).style_spec("b"),
      Cell::new(&format!("{:.2}%", w * 100.0)).style_spec("r"),
    ]));
  }
  table
}

/// Square correlation grid.
pub fn correlation_table(corr: &CorrelationMatrix) -> Table {
  let mut table = base();
  let labels: Vec<String> = corr.labels().iter().map(|c| c.to_string()).collect();
  table.set_titles(header(std::iter::once(String::new()).chain(labels.iter().cloned())));
  for (label, row) in labels.iter().zip(corr.to_rows()) {
    let mut cells = vec![Cell::new(label).style_spec("b")];
    cells.extend(row.iter().map(|v| Cell::new(&fmt_value(*v)).style_spec("r")));
    table.add_row(Row::new(cells));
  }
  table
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn weights_render_as_percentages() {
    let w = WeightVector::new(&["MSFT".into(), "TSLA".into()], &[0.625, 0.375]);
    let text = weights_table(&w).to_string();
    assert!(text.contains("62.50%"));
    assert!(text.contains("37.50%"));
    assert!(text.contains("Optimal weight"));
  }

  #[test]
  fn stats_render_one_row_per_column() {
    let dates = (1..=3)
      .map(|d| chrono::NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
      .collect();
    let prices = crate::market::PriceTable::from_columns(
      dates,
      vec![
        ("AAA".into(), vec![1.0, 2.0, 3.0]),
        ("BBB".into(), vec![4.0, f64::NAN, 4.0]),
      ],
    )
    .unwrap();
    let table = stats_table(&crate::stats::describe(&prices));

    assert_eq!(table.len(), 2);
    let text = table.to_string();
    assert!(text.contains("AAA") && text.contains("BBB"));
    assert!(text.contains("75%"));
    assert!(stats_table(&StatsTable::default()).is_empty());
    assert_eq!(fmt_value(f64::NAN), "NaN");
  }
}
