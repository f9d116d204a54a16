//! # Report
//!
//! $$
//! (R,\ \mathbf w^\*)\ \mapsto\ \{\text{HTML report},\ \text{CSV export},\ \text{terminal tables}\}
//! $$
//!
//! Output artifacts of an analysis session.

pub mod export;
pub mod html;
pub mod tables;

pub use export::EXPORT_FILE;
pub use export::export_table;
pub use html::REPORT_FILE;
pub use html::ReportBuilder;
pub use html::ReportConfig;
pub use html::generate_report;
pub use tables::correlation_table;
pub use tables::stats_table;
pub use tables::weights_table;
