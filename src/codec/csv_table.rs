//! Flat CSV table: customers and follow-ups in one sheet, tagged by row type.
//!
//! Columns are fixed; fields that do not apply to a row's type are left empty.
//! Dates are `YYYY-MM-DD`, booleans `true`/`false`, timestamps integer
//! epoch milliseconds.

use super::{format_date, parse_date, ImportReport, Record};
use crate::error::{CodecError, CodecResult, RowParseError};
use crate::models::{Customer, ExportData, FollowUp};

/// Header row, in column order.
pub const HEADER: [&str; 15] = [
    "Type",
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
    "CustomerID",
    "Timestamp",
    "NextPromiseDate",
];

pub const CUSTOMER_TAG: &str = "Customer";
pub const FOLLOW_UP_TAG: &str = "FollowUp";

/// Fields a customer row must have (through `UpdatedAt`).
const CUSTOMER_MIN_FIELDS: usize = 12;

/// Fields a follow-up row must have (through `NextPromiseDate`).
const FOLLOW_UP_MIN_FIELDS: usize = 15;

fn customer_row(c: &Customer) -> [String; 15] {
    [
        CUSTOMER_TAG.to_string(),
        c.id.clone(),
        c.name.clone(),
        c.phone_number.clone(),
        c.amount.to_string(),
        format_date(c.promise_date),
        c.notes.clone(),
        c.name_editable.to_string(),
        c.phone_editable.to_string(),
        c.amount_editable.to_string(),
        c.created_at.to_string(),
        c.updated_at.to_string(),
        String::new(),
        String::new(),
        String::new(),
    ]
}

fn follow_up_row(f: &FollowUp) -> [String; 15] {
    [
        FOLLOW_UP_TAG.to_string(),
        f.id.clone(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        f.notes.clone(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        f.customer_id.clone(),
        f.timestamp.to_string(),
        f.next_promise_date.map(format_date).unwrap_or_default(),
    ]
}

/// Write the header, every customer, then every follow-up.
pub fn encode(data: &ExportData) -> CodecResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for customer in &data.customers {
        writer.write_record(customer_row(customer))?;
    }
    for follow_up in &data.follow_ups {
        writer.write_record(follow_up_row(follow_up))?;
    }

    writer
        .into_inner()
        .map_err(|e| CodecError::Write(e.to_string()))
}

/// Read a table written by [`encode`].
///
/// Empty input yields an empty bundle. Input whose first header column is not
/// `Type` is rejected as a whole; bad rows after a good header are skipped.
pub fn decode(bytes: &[u8], imported_at: i64) -> CodecResult<ImportReport> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ImportReport::collect(Vec::new(), imported_at));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let first_column = reader
        .headers()?
        .get(0)
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .unwrap_or_default();
    if !first_column.eq_ignore_ascii_case(HEADER[0]) {
        return Err(CodecError::UnrecognizedFormat(format!(
            "expected first column {:?}, found {:?}",
            HEADER[0], first_column
        )));
    }

    let rows = reader.records().enumerate().map(|(i, record)| {
        let location = format!("line {}", i + 2);
        let parsed = record
            .map_err(|e| RowParseError::Malformed(e.to_string()))
            .and_then(|r| parse_row(&r.iter().collect::<Vec<_>>()));
        (location, parsed)
    });

    Ok(ImportReport::collect(rows, imported_at))
}

/// Turn one data row into a record.
pub fn parse_row(fields: &[&str]) -> Result<Record, RowParseError> {
    match fields.first().copied().unwrap_or_default() {
        CUSTOMER_TAG => parse_customer(fields).map(Record::Customer),
        FOLLOW_UP_TAG => parse_follow_up(fields).map(Record::FollowUp),
        other => Err(RowParseError::UnknownType(other.to_string())),
    }
}

fn parse_customer(fields: &[&str]) -> Result<Customer, RowParseError> {
    require_fields(fields, CUSTOMER_TAG, CUSTOMER_MIN_FIELDS)?;

    Ok(Customer {
        id: required_id(fields[1], "customer ID")?,
        name: fields[2].to_string(),
        phone_number: fields[3].to_string(),
        amount: parse_number("Amount", fields[4])?,
        promise_date: parse_date("PromiseDate", fields[5])?,
        notes: fields[6].to_string(),
        name_editable: parse_flag(fields[7]),
        phone_editable: parse_flag(fields[8]),
        amount_editable: parse_flag(fields[9]),
        created_at: parse_millis("CreatedAt", fields[10])?,
        updated_at: parse_millis("UpdatedAt", fields[11])?,
    })
}

fn parse_follow_up(fields: &[&str]) -> Result<FollowUp, RowParseError> {
    require_fields(fields, FOLLOW_UP_TAG, FOLLOW_UP_MIN_FIELDS)?;

    let next_promise_date = match fields[14].trim() {
        "" => None,
        value => Some(parse_date("NextPromiseDate", value)?),
    };

    Ok(FollowUp {
        id: required_id(fields[1], "follow-up ID")?,
        customer_id: fields[12].to_string(),
        notes: fields[6].to_string(),
        timestamp: parse_millis("Timestamp", fields[13])?,
        next_promise_date,
    })
}

fn require_fields(fields: &[&str], kind: &'static str, expected: usize) -> Result<(), RowParseError> {
    if fields.len() < expected {
        return Err(RowParseError::FieldCount {
            kind,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn required_id(value: &str, field: &'static str) -> Result<String, RowParseError> {
    if value.trim().is_empty() {
        return Err(RowParseError::MissingField(field));
    }
    Ok(value.to_string())
}

/// A finite decimal; `NaN` and infinities are rejected.
fn parse_number(field: &'static str, value: &str) -> Result<f64, RowParseError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| RowParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn parse_millis(field: &'static str, value: &str) -> Result<i64, RowParseError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| RowParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// `true` in any letter case is true; anything else is false.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn customer_fields() -> Vec<&'static str> {
        vec![
            "Customer",
            "c-1",
            "Meera",
            "+919812345678",
            "1250.5",
            "2026-10-19",
            "said Friday",
            "true",
            "FALSE",
            "yes",
            "1700000000000",
            "1700000005000",
            "",
            "",
            "",
        ]
    }

    #[test]
    fn test_parse_customer_row() {
        let record = parse_row(&customer_fields()).unwrap();
        let Record::Customer(c) = record else {
            panic!("expected a customer");
        };
        assert_eq!(c.id, "c-1");
        assert_eq!(c.amount, 1250.5);
        assert_eq!(c.promise_date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(c.name_editable);
        assert!(!c.phone_editable);
        assert!(!c.amount_editable);
        assert_eq!(c.updated_at, 1_700_000_005_000);
    }

    #[test]
    fn test_customer_row_needs_twelve_fields() {
        let fields = customer_fields();
        assert_eq!(
            parse_row(&fields[..11]),
            Err(RowParseError::FieldCount {
                kind: "Customer",
                expected: 12,
                found: 11
            })
        );
        assert!(parse_row(&customer_fields()[..12]).is_ok());
    }

    #[test]
    fn test_follow_up_row_needs_fifteen_fields() {
        let fields = [
            "FollowUp", "f-1", "", "", "", "", "n", "", "", "", "", "", "c-1", "5",
        ];
        assert!(matches!(
            parse_row(&fields),
            Err(RowParseError::FieldCount { expected: 15, .. })
        ));
    }

    #[test]
    fn test_bad_values_are_row_errors() {
        let mut fields = customer_fields();
        fields[4] = "12,50";
        assert!(matches!(
            parse_row(&fields),
            Err(RowParseError::InvalidNumber { field: "Amount", .. })
        ));

        let mut fields = customer_fields();
        fields[5] = "19/10/2026";
        assert!(matches!(
            parse_row(&fields),
            Err(RowParseError::InvalidDate { .. })
        ));

        let mut fields = customer_fields();
        fields[1] = "  ";
        assert_eq!(
            parse_row(&fields),
            Err(RowParseError::MissingField("customer ID"))
        );
    }

    #[test]
    fn test_non_finite_amount_is_a_row_error() {
        for value in ["NaN", "inf", "-Infinity"] {
            let mut fields = customer_fields();
            fields[4] = value;
            assert_eq!(
                parse_row(&fields),
                Err(RowParseError::InvalidNumber {
                    field: "Amount",
                    value: value.to_string()
                })
            );
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            parse_row(&["Invoice", "x"]),
            Err(RowParseError::UnknownType("Invoice".to_string()))
        );
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode(&ExportData::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.trim_end(),
            "Type,ID,Name,Phone,Amount,PromiseDate,Notes,NameEditable,PhoneEditable,\
             AmountEditable,CreatedAt,UpdatedAt,CustomerID,Timestamp,NextPromiseDate"
        );
    }

    #[test]
    fn test_follow_up_row_leaves_customer_columns_empty() {
        let f = FollowUp {
            id: "f-1".to_string(),
            customer_id: "c-1".to_string(),
            notes: "left voicemail".to_string(),
            timestamp: 42,
            next_promise_date: None,
        };
        let data = ExportData::new(Vec::new(), vec![f], 0);
        let text = String::from_utf8(encode(&data).unwrap()).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert_eq!(line, "FollowUp,f-1,,,,,left voicemail,,,,,,c-1,42,");
    }

    #[test]
    fn test_empty_input_is_empty_bundle() {
        let report = decode(b"", 7).unwrap();
        assert!(report.data.is_empty());
        assert_eq!(report.data.exported_at, 7);
    }

    #[test]
    fn test_foreign_header_rejected() {
        let result = decode(b"name,phone\nA,1\n", 0);
        assert!(matches!(result, Err(CodecError::UnrecognizedFormat(_))));
    }

    #[test]
    fn test_legacy_spaced_header_accepted() {
        let input = "Type,ID,Name,Phone,Amount,Promise Date,Notes,Name Editable,Phone Editable,\
                     Amount Editable,Created At,Updated At,Customer ID,Timestamp,Next Promise Date\n\
                     FollowUp,f-9,,,,,ok,,,,,,c-3,100,2026-11-01\n";
        let report = decode(input.as_bytes(), 0).unwrap();
        assert_eq!(report.data.follow_ups.len(), 1);
        assert_eq!(
            report.data.follow_ups[0].next_promise_date,
            NaiveDate::from_ymd_opt(2026, 11, 1)
        );
    }

    #[test]
    fn test_short_row_skipped_without_aborting() {
        let input = "Type,ID\n\
                     Customer,c-1,Short\n\
                     FollowUp,f-1,,,,,n,,,,,,c-1,5,\n";
        let report = decode(input.as_bytes(), 0).unwrap();
        assert!(report.data.customers.is_empty());
        assert_eq!(report.data.follow_ups.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].location, "line 2");
    }
}
