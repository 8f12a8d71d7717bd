//! Report rendering: console, markdown, JSON and CSV

pub mod report;

pub use report::{console_report, csv_report, markdown_report};
