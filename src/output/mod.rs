//! Output formatting for command reports

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod rows;
pub mod table;

/// A command result that can be shown in every output format
pub trait Report: Serialize {
    /// Row type for table output
    type Row: Tabled;

    /// One table row per file, operation or object
    fn rows(&self) -> Vec<Self::Row>;

    /// Human-oriented rendering
    fn pretty(&self) -> String;

    /// Format the report according to `format`
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Pretty => self.pretty(),
            OutputFormat::Table => table::format_table(&self.rows()),
            OutputFormat::Json => json::format_json(self)?,
        })
    }
}

/// Format and print a report to stdout
pub fn print<R: Report>(report: &R, format: OutputFormat) -> Result<()> {
    let output = report.format(format)?;
    println!("{}", output);
    Ok(())
}
