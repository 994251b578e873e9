//! Two-sheet Excel workbook: `Customers` and `FollowUps`.
//!
//! Each sheet has a header row followed by one record per row. Amounts and
//! timestamps are numeric cells, flags are boolean cells, dates are text.
//! On import, blank cells fall back to defaults instead of dropping the row,
//! except for the cells a record cannot exist without.

use super::{format_date, parse_date, ImportReport, Record};
use crate::error::{CodecError, CodecResult, RowParseError};
use crate::models::{Customer, ExportData, FollowUp};
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, Worksheet};
use std::io::Cursor;

pub const CUSTOMERS_SHEET: &str = "Customers";
pub const FOLLOW_UPS_SHEET: &str = "FollowUps";

pub const CUSTOMER_COLUMNS: [&str; 11] = [
    "ID",
    "Name",
    "Phone",
    "Amount",
    "PromiseDate",
    "Notes",
    "NameEditable",
    "PhoneEditable",
    "AmountEditable",
    "CreatedAt",
    "UpdatedAt",
];

pub const FOLLOW_UP_COLUMNS: [&str; 5] = ["ID", "CustomerID", "Notes", "Timestamp", "NextPromiseDate"];

/// Build the workbook in memory.
pub fn encode(data: &ExportData) -> CodecResult<Vec<u8>> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(CUSTOMERS_SHEET)?;
    write_header(sheet, &CUSTOMER_COLUMNS)?;
    for (i, customer) in data.customers.iter().enumerate() {
        write_customer(sheet, data_row(i)?, customer)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(FOLLOW_UPS_SHEET)?;
    write_header(sheet, &FOLLOW_UP_COLUMNS)?;
    for (i, follow_up) in data.follow_ups.iter().enumerate() {
        write_follow_up(sheet, data_row(i)?, follow_up)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn data_row(index: usize) -> CodecResult<u32> {
    u32::try_from(index + 1).map_err(|_| CodecError::Write(format!("too many rows: {}", index)))
}

fn write_header(sheet: &mut Worksheet, columns: &[&str]) -> CodecResult<()> {
    for (col, title) in (0u16..).zip(columns) {
        sheet.write_string(0, col, *title)?;
    }
    Ok(())
}

fn write_customer(sheet: &mut Worksheet, row: u32, c: &Customer) -> CodecResult<()> {
    sheet.write_string(row, 0, &c.id)?;
    sheet.write_string(row, 1, &c.name)?;
    sheet.write_string(row, 2, &c.phone_number)?;
    sheet.write_number(row, 3, c.amount)?;
    sheet.write_string(row, 4, format_date(c.promise_date))?;
    sheet.write_string(row, 5, &c.notes)?;
    sheet.write_boolean(row, 6, c.name_editable)?;
    sheet.write_boolean(row, 7, c.phone_editable)?;
    sheet.write_boolean(row, 8, c.amount_editable)?;
    sheet.write_number(row, 9, c.created_at as f64)?;
    sheet.write_number(row, 10, c.updated_at as f64)?;
    Ok(())
}

fn write_follow_up(sheet: &mut Worksheet, row: u32, f: &FollowUp) -> CodecResult<()> {
    sheet.write_string(row, 0, &f.id)?;
    sheet.write_string(row, 1, &f.customer_id)?;
    sheet.write_string(row, 2, &f.notes)?;
    sheet.write_number(row, 3, f.timestamp as f64)?;
    if let Some(date) = f.next_promise_date {
        sheet.write_string(row, 4, format_date(date))?;
    }
    Ok(())
}

/// Read a workbook written by [`encode`].
///
/// A missing sheet contributes no rows. A workbook with neither sheet is not
/// one of ours and is rejected.
pub fn decode(bytes: &[u8], imported_at: i64) -> CodecResult<ImportReport> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let names = workbook.sheet_names();
    let has = |name: &str| names.iter().any(|n| n == name);

    if !has(CUSTOMERS_SHEET) && !has(FOLLOW_UPS_SHEET) {
        return Err(CodecError::UnrecognizedFormat(format!(
            "no {} or {} sheet (found {:?})",
            CUSTOMERS_SHEET, FOLLOW_UPS_SHEET, names
        )));
    }

    let mut rows = Vec::new();
    if has(CUSTOMERS_SHEET) {
        let range = workbook.worksheet_range(CUSTOMERS_SHEET)?;
        rows.extend(sheet_rows(&range, CUSTOMERS_SHEET, |row| {
            customer_from_row(row, imported_at).map(Record::Customer)
        }));
    }
    if has(FOLLOW_UPS_SHEET) {
        let range = workbook.worksheet_range(FOLLOW_UPS_SHEET)?;
        rows.extend(sheet_rows(&range, FOLLOW_UPS_SHEET, |row| {
            follow_up_from_row(row, imported_at).map(Record::FollowUp)
        }));
    }

    Ok(ImportReport::collect(rows, imported_at))
}

/// A data row, addressed by absolute column.
///
/// calamine ranges start at the first used cell, so a sheet whose leading
/// column is entirely blank yields shorter slices.
#[derive(Clone, Copy)]
struct SheetRow<'a> {
    cells: &'a [Data],
    first_col: usize,
}

impl<'a> SheetRow<'a> {
    fn cell(&self, col: usize) -> Option<&'a Data> {
        col.checked_sub(self.first_col)
            .and_then(|i| self.cells.get(i))
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| matches!(c, Data::Empty))
    }
}

fn sheet_rows<F>(
    range: &Range<Data>,
    sheet: &str,
    parse: F,
) -> Vec<(String, Result<Record, RowParseError>)>
where
    F: Fn(SheetRow<'_>) -> Result<Record, RowParseError>,
{
    let (first_row, first_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    range
        .rows()
        .enumerate()
        .map(|(i, cells)| (first_row + i, SheetRow { cells, first_col }))
        // Row 0 is the header.
        .filter(|(abs, row)| *abs > 0 && !row.is_blank())
        .map(|(abs, row)| (format!("{} row {}", sheet, abs + 1), parse(row)))
        .collect()
}

fn customer_from_row(row: SheetRow<'_>, imported_at: i64) -> Result<Customer, RowParseError> {
    let id = text(row.cell(0))
        .filter(|s| !s.trim().is_empty())
        .ok_or(RowParseError::MissingField("customer ID"))?;
    let promise_date = date(row.cell(4), "PromiseDate")?.ok_or(RowParseError::MissingField("PromiseDate"))?;

    Ok(Customer {
        id,
        name: text(row.cell(1)).unwrap_or_default(),
        phone_number: text(row.cell(2)).unwrap_or_default(),
        amount: number(row.cell(3), "Amount")?.unwrap_or(0.0),
        promise_date,
        notes: text(row.cell(5)).unwrap_or_default(),
        name_editable: flag(row.cell(6), "NameEditable")?.unwrap_or(true),
        phone_editable: flag(row.cell(7), "PhoneEditable")?.unwrap_or(true),
        amount_editable: flag(row.cell(8), "AmountEditable")?.unwrap_or(true),
        created_at: millis(row.cell(9), "CreatedAt")?.unwrap_or(imported_at),
        updated_at: millis(row.cell(10), "UpdatedAt")?.unwrap_or(imported_at),
    })
}

fn follow_up_from_row(row: SheetRow<'_>, imported_at: i64) -> Result<FollowUp, RowParseError> {
    let id = text(row.cell(0))
        .filter(|s| !s.trim().is_empty())
        .ok_or(RowParseError::MissingField("follow-up ID"))?;
    // A blank cell is an empty id, as in the CSV table. Empty strings are
    // written as blank cells, so the two cannot be told apart on read.
    let customer_id = match row.cell(1) {
        None => return Err(RowParseError::MissingField("CustomerID")),
        cell => text(cell).unwrap_or_default(),
    };

    Ok(FollowUp {
        id,
        customer_id,
        notes: text(row.cell(2)).unwrap_or_default(),
        timestamp: millis(row.cell(3), "Timestamp")?.unwrap_or(imported_at),
        next_promise_date: date(row.cell(4), "NextPromiseDate")?,
    })
}

/// Cell as text; numbers and booleans are rendered, blanks are `None`.
fn text(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map(|d| format_date(d.date())),
        Data::Empty | Data::Error(_) => None,
    }
}

/// Numeric cell, or text holding a number. Only finite values are accepted.
fn number(cell: Option<&Data>, field: &'static str) -> Result<Option<f64>, RowParseError> {
    let (value, raw) = match cell {
        None | Some(Data::Empty) => return Ok(None),
        Some(Data::Float(f)) => (Some(*f), f.to_string()),
        Some(Data::Int(i)) => (Some(*i as f64), i.to_string()),
        Some(Data::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Data::String(s)) => (s.trim().parse::<f64>().ok(), s.clone()),
        Some(_) => return Err(RowParseError::CellType(field)),
    };

    match value {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(RowParseError::InvalidNumber { field, value: raw }),
    }
}

fn millis(cell: Option<&Data>, field: &'static str) -> Result<Option<i64>, RowParseError> {
    Ok(number(cell, field)?.map(|n| n.round() as i64))
}

fn flag(cell: Option<&Data>, field: &'static str) -> Result<Option<bool>, RowParseError> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Bool(b)) => Ok(Some(*b)),
        Some(Data::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Data::String(s)) if s.trim().eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Data::String(s)) if s.trim().eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(_) => Err(RowParseError::CellType(field)),
    }
}

fn date(cell: Option<&Data>, field: &'static str) -> Result<Option<NaiveDate>, RowParseError> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Data::String(s)) => parse_date(field, s).map(Some),
        Some(Data::DateTimeIso(s)) => parse_date(field, s.get(..10).unwrap_or(s)).map(Some),
        Some(Data::DateTime(dt)) => dt
            .as_datetime()
            .map(|d| Some(d.date()))
            .ok_or(RowParseError::CellType(field)),
        Some(_) => Err(RowParseError::CellType(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExportData {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut customer = Customer::new("Ravi", "9876543210", 4999.75, date, 1_700_000_000_000);
        customer.phone_editable = false;
        let follow_up = FollowUp::new(
            &customer.id,
            "Will pay next week",
            NaiveDate::from_ymd_opt(2026, 10, 26),
            1_700_000_100_000,
        );
        ExportData::new(vec![customer], vec![follow_up], 1_700_000_200_000)
    }

    #[test]
    fn test_workbook_roundtrip_preserves_records() {
        let data = sample();
        let bytes = encode(&data).unwrap();
        let report = decode(&bytes, 5).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.data.customers, data.customers);
        assert_eq!(report.data.follow_ups, data.follow_ups);
    }

    #[test]
    fn test_garbage_is_container_error() {
        let result = decode(b"definitely not a zip archive", 0);
        assert!(matches!(result, Err(CodecError::ContainerRead(_))));
    }

    #[test]
    fn test_foreign_workbook_rejected() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Budget").unwrap();
        sheet.write_string(0, 0, "Item").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        assert!(matches!(
            decode(&bytes, 0),
            Err(CodecError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_blank_cells_take_defaults() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(CUSTOMERS_SHEET).unwrap();
        write_header(sheet, &CUSTOMER_COLUMNS).unwrap();
        sheet.write_string(1, 0, "c-7").unwrap();
        sheet.write_string(1, 4, "2026-12-01").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let report = decode(&bytes, 123).unwrap();
        let c = &report.data.customers[0];
        assert_eq!(c.id, "c-7");
        assert_eq!(c.name, "");
        assert_eq!(c.amount, 0.0);
        assert!(c.name_editable && c.phone_editable && c.amount_editable);
        assert_eq!(c.created_at, 123);
        assert_eq!(c.updated_at, 123);
        assert!(report.data.follow_ups.is_empty());
    }

    #[test]
    fn test_rows_without_required_cells_are_skipped() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(CUSTOMERS_SHEET).unwrap();
        write_header(sheet, &CUSTOMER_COLUMNS).unwrap();
        // no promise date
        sheet.write_string(1, 0, "c-1").unwrap();
        // bad promise date
        sheet.write_string(2, 0, "c-2").unwrap();
        sheet.write_string(2, 4, "soon").unwrap();
        // fine
        sheet.write_string(3, 0, "c-3").unwrap();
        sheet.write_string(3, 4, "2026-01-02").unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name(FOLLOW_UPS_SHEET).unwrap();
        write_header(sheet, &FOLLOW_UP_COLUMNS).unwrap();
        // no follow-up id
        sheet.write_string(1, 1, "c-3").unwrap();
        sheet.write_string(1, 2, "called").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let report = decode(&bytes, 0).unwrap();
        let ids: Vec<_> = report.data.customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c-3"]);
        assert!(report.data.follow_ups.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[0].location, "Customers row 2");
        assert_eq!(
            report.skipped[2].error,
            RowParseError::MissingField("follow-up ID")
        );
    }

    #[test]
    fn test_blank_customer_id_is_kept_as_orphan() {
        let orphan = FollowUp::new("", "number disconnected", None, 1_700_000_300_000);
        let data = ExportData::new(Vec::new(), vec![orphan], 0);

        let report = decode(&encode(&data).unwrap(), 0).unwrap();
        assert!(report.skipped.is_empty(), "{:?}", report.skipped);
        assert_eq!(report.data.follow_ups, data.follow_ups);
    }

    #[test]
    fn test_non_finite_numbers_are_row_errors() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(CUSTOMERS_SHEET).unwrap();
        write_header(sheet, &CUSTOMER_COLUMNS).unwrap();
        sheet.write_string(1, 0, "c-1").unwrap();
        sheet.write_string(1, 3, "NaN").unwrap();
        sheet.write_string(1, 4, "2026-10-19").unwrap();
        sheet.write_string(2, 0, "c-2").unwrap();
        sheet.write_string(2, 3, "inf").unwrap();
        sheet.write_string(2, 4, "2026-10-19").unwrap();
        sheet.write_string(3, 0, "c-3").unwrap();
        sheet.write_string(3, 4, "2026-10-19").unwrap();
        sheet.write_string(3, 9, "-infinity").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let report = decode(&bytes, 0).unwrap();
        assert!(report.data.customers.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert!(report
            .skipped
            .iter()
            .all(|s| matches!(s.error, RowParseError::InvalidNumber { .. })));
    }
}
