use super::super::domain::undated;
use super::super::source::CellValue;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Largest serial the 1900 date system can express (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;
/// Smallest serial accepted, matching OLE automation dates (0100-01-01).
const MIN_SERIAL: f64 = -657_434.0;

fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Integral numeric cell, or integer text; anything else is 0.
pub(crate) fn number(cell: Option<&CellValue>) -> i32 {
    match cell {
        Some(CellValue::Number(value)) => integral(*value).unwrap_or(0),
        Some(CellValue::Text(text)) => text.trim().parse::<i32>().unwrap_or(0),
        _ => 0,
    }
}

fn integral(value: f64) -> Option<i32> {
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// Date part of a serial number or ISO text; the undated sentinel otherwise.
pub(crate) fn date(cell: Option<&CellValue>) -> NaiveDate {
    let parsed = match cell {
        Some(CellValue::Number(value)) | Some(CellValue::DateSerial(value)) => {
            from_serial(*value)
        }
        Some(CellValue::Text(text)) => parse_date_text(text),
        _ => None,
    };
    parsed.unwrap_or_else(undated)
}

/// Converts a 1900-system serial date, dropping the time of day.
pub(crate) fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    // Truncation toward zero keeps the day for negative serials too: -1.5 is 1899-12-29 12:00.
    serial_epoch().checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }

    trimmed.parse::<f64>().ok().and_then(from_serial)
}

/// Cell text, empty when the cell is absent.
pub(crate) fn text(cell: Option<&CellValue>) -> String {
    cell.map(CellValue::to_text).unwrap_or_default()
}
