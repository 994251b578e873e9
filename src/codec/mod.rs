//! Export and import of customers and follow-ups as tabular files.
//!
//! Two formats are supported:
//!
//! - **Csv**: one flat table, every row tagged `Customer` or `FollowUp`
//!   ([`csv_table`])
//! - **Xlsx**: a workbook with a `Customers` sheet and a `FollowUps` sheet
//!   ([`workbook`])
//!
//! Import is best-effort per row. Each row is parsed on its own into a
//! `Result<Record, RowParseError>`; failures are logged and collected in the
//! [`ImportReport`] and never stop the rows after them. Only a file that
//! cannot be read as a whole fails the import.

pub mod csv_table;
pub mod workbook;

use crate::error::{CodecError, CodecResult, RowParseError};
use crate::models::{Customer, ExportData, FollowUp};
use chrono::{DateTime, NaiveDate, TimeZone};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterchangeFormat {
    #[default]
    Csv,
    Xlsx,
}

impl InterchangeFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> CodecResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .ok_or_else(|| CodecError::UnsupportedFormat(path.display().to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            InterchangeFormat::Csv => "csv",
            InterchangeFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for InterchangeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(InterchangeFormat::Csv),
            "xlsx" | "excel" => Ok(InterchangeFormat::Xlsx),
            other => Err(format!("Unknown format: {}", other)),
        }
    }
}

impl fmt::Display for InterchangeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One reconstructed record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Customer(Customer),
    FollowUp(FollowUp),
}

/// A row that was dropped during import.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// Where the row was, e.g. `line 7` or `Customers row 3`
    pub location: String,
    pub error: RowParseError,
}

/// Result of an import: everything that parsed, plus what was skipped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportReport {
    pub data: ExportData,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn imported_rows(&self) -> usize {
        self.data.customers.len() + self.data.follow_ups.len()
    }

    /// Fold parsed rows into a report, keeping successes in input order.
    pub fn collect<I>(rows: I, imported_at: i64) -> Self
    where
        I: IntoIterator<Item = (String, Result<Record, RowParseError>)>,
    {
        let mut report = ImportReport {
            data: ExportData::new(Vec::new(), Vec::new(), imported_at),
            skipped: Vec::new(),
        };

        for (location, parsed) in rows {
            match parsed {
                Ok(Record::Customer(c)) => report.data.customers.push(c),
                Ok(Record::FollowUp(f)) => report.data.follow_ups.push(f),
                Err(error) => {
                    warn!(%location, "Skipping row: {}", error);
                    report.skipped.push(SkippedRow { location, error });
                }
            }
        }

        report
    }
}

/// Serialize `data` in `format`.
pub fn encode(data: &ExportData, format: InterchangeFormat) -> CodecResult<Vec<u8>> {
    match format {
        InterchangeFormat::Csv => csv_table::encode(data),
        InterchangeFormat::Xlsx => workbook::encode(data),
    }
}

/// Parse `bytes` as `format`.
///
/// `imported_at` stamps the returned bundle and fills timestamps a workbook
/// row left blank.
pub fn decode(bytes: &[u8], format: InterchangeFormat, imported_at: i64) -> CodecResult<ImportReport> {
    match format {
        InterchangeFormat::Csv => csv_table::decode(bytes, imported_at),
        InterchangeFormat::Xlsx => workbook::decode(bytes, imported_at),
    }
}

/// `followup_export_YYYYMMDD_HHMMSS.<ext>` for the given local time.
pub fn export_file_name<Tz: TimeZone>(format: InterchangeFormat, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "followup_export_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RowParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RowParseError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
