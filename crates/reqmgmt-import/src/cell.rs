//! # Cell Coercion
//!
//! Converts `calamine` cells into declared field values.
//!
//! Formula cells arrive from `calamine` as their cached result, so a formula
//! producing text is read as text and one producing a number as a number.
//!
//! | cell          | text field                     | decimal field | timestamp field       |
//! |---------------|--------------------------------|---------------|-----------------------|
//! | string        | trimmed                        | parsed        | parsed (see formats)  |
//! | int / float   | `12` or `12.5`                 | exact         | Excel serial date     |
//! | bool          | `true` / `false`               | error         | error                 |
//! | date          | `yyyy-MM-dd HH:mm:ss`          | error         | as is                 |
//! | empty / error | absent                         | absent        | absent                |

use std::str::FromStr;

use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqmgmt_core::{FieldData, FieldKind, TIMESTAMP_FORMAT};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Text layouts accepted for timestamp cells that hold a string.
const TIMESTAMP_TEXT_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only text layouts, read as midnight.
const DATE_TEXT_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Largest serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// A cell that cannot be read as the field's kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("'{0}' is not a decimal number")]
    InvalidDecimal(String),

    #[error("'{0}' is not a date-time")]
    InvalidTimestamp(String),

    #[error("{cell} cell cannot hold a {expected} value")]
    Unsupported {
        cell: &'static str,
        expected: &'static str,
    },
}

/// Read a cell as the given field kind.
pub fn coerce(cell: &Data, kind: FieldKind) -> Result<FieldData, CellError> {
    match kind {
        FieldKind::Text => Ok(FieldData::Text(text(cell))),
        FieldKind::Decimal => decimal(cell).map(FieldData::Decimal),
        FieldKind::Timestamp => timestamp(cell).map(FieldData::Timestamp),
    }
}

/// Whether the cell carries no content.
pub fn is_empty(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Read a cell as text.
pub fn text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(number_text(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(t) => t.format(TIMESTAMP_FORMAT).to_string(),
            None => number_text(dt.as_f64()),
        }),
        Data::DateTimeIso(s) => Some(match parse_timestamp_text(s) {
            Some(t) => t.format(TIMESTAMP_FORMAT).to_string(),
            None => s.clone(),
        }),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Integral values without a decimal part, others in plain notation.
fn number_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Read a cell as a decimal.
pub fn decimal(cell: &Data) -> Result<Option<Decimal>, CellError> {
    match cell {
        Data::Int(i) => Ok(Some(Decimal::from(*i))),
        Data::Float(f) => Decimal::from_f64(*f)
            .map(Some)
            .ok_or_else(|| CellError::InvalidDecimal(f.to_string())),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map(Some)
                .map_err(|_| CellError::InvalidDecimal(trimmed.to_string()))
        }
        Data::Bool(_) => Err(CellError::Unsupported {
            cell: "boolean",
            expected: "decimal",
        }),
        Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
            Err(CellError::Unsupported {
                cell: "date",
                expected: "decimal",
            })
        }
        Data::Error(_) | Data::Empty => Ok(None),
    }
}

/// Read a cell as a local date-time.
pub fn timestamp(cell: &Data) -> Result<Option<NaiveDateTime>, CellError> {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Some)
            .ok_or_else(|| CellError::InvalidTimestamp(dt.as_f64().to_string())),
        Data::DateTimeIso(s) => parse_timestamp_text(s)
            .map(Some)
            .ok_or_else(|| CellError::InvalidTimestamp(s.clone())),
        Data::Float(f) => excel_serial(*f)
            .map(Some)
            .ok_or_else(|| CellError::InvalidTimestamp(f.to_string())),
        Data::Int(i) => excel_serial(*i as f64)
            .map(Some)
            .ok_or_else(|| CellError::InvalidTimestamp(i.to_string())),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_timestamp_text(trimmed)
                .map(Some)
                .ok_or_else(|| CellError::InvalidTimestamp(trimmed.to_string()))
        }
        Data::Bool(_) | Data::DurationIso(_) => Err(CellError::Unsupported {
            cell: "non-date",
            expected: "timestamp",
        }),
        Data::Error(_) | Data::Empty => Ok(None),
    }
}

fn parse_timestamp_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_TEXT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_TEXT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Convert an Excel serial date (1900 date system) to a date-time, rounded
/// to the nearest second.
fn excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Day 0 is 1899-12-30 once Excel's phantom 1900-02-29 is accounted for.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}
