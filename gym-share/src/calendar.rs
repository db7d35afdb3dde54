//! Calendar helpers shared by the membership engine and the CSV pipeline.

use chrono::{Datelike, Local, Months, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("Date cannot be empty")]
    Empty,
    #[error(
        "Invalid date format: '{0}'. Supported formats: yyyy-MM-dd, dd/MM/yyyy, MM/dd/yyyy, dd-MM-yyyy, etc."
    )]
    InvalidFormat(String),
}

/// 当前本地日期
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Adds calendar months, keeping the day-of-month when it exists in the
/// target month and clamping to the month's last day otherwise
/// (2025-01-31 + 1 month = 2025-02-28).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Year,
    Month,
    Day,
}

/// One accepted spelling of a date. `padded` layouts need exactly two digits
/// for day and month; the others take one or two.
#[derive(Debug, Clone, Copy)]
struct Layout {
    separator: char,
    order: [Part; 3],
    padded: bool,
}

const fn layout(separator: char, order: [Part; 3], padded: bool) -> Layout {
    Layout { separator, order, padded }
}

use Part::{Day as D, Month as M, Year as Y};

/// Tried in order; the first layout that yields a date wins. "01/02/2025"
/// therefore reads day-first.
const LAYOUTS: [Layout; 11] = [
    layout('-', [Y, M, D], true),  // yyyy-MM-dd
    layout('/', [D, M, Y], true),  // dd/MM/yyyy
    layout('/', [M, D, Y], true),  // MM/dd/yyyy
    layout('-', [D, M, Y], true),  // dd-MM-yyyy
    layout('-', [M, D, Y], true),  // MM-dd-yyyy
    layout('/', [Y, M, D], true),  // yyyy/MM/dd
    layout('.', [D, M, Y], true),  // dd.MM.yyyy
    layout('/', [D, M, Y], false), // d/M/yyyy
    layout('/', [M, D, Y], false), // M/d/yyyy
    layout('-', [D, M, Y], false), // d-M-yyyy
    layout('-', [Y, M, D], false), // yyyy-M-d
];

/// Parses a date as typically found in spreadsheet exports.
pub fn parse_flexible_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DateParseError::Empty);
    }

    LAYOUTS
        .iter()
        .find_map(|layout| parse_with(value, layout))
        .ok_or_else(|| DateParseError::InvalidFormat(value.to_string()))
}

fn parse_with(value: &str, layout: &Layout) -> Option<NaiveDate> {
    let pieces: Vec<&str> = value.split(layout.separator).collect();
    if pieces.len() != 3 {
        return None;
    }

    let (mut year, mut month, mut day) = (None, None, None);
    for (piece, part) in pieces.iter().zip(layout.order) {
        if piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let width_ok = match part {
            Part::Year => piece.len() == 4,
            _ if layout.padded => piece.len() == 2,
            _ => piece.len() <= 2,
        };
        if !width_ok {
            return None;
        }
        let number: u32 = piece.parse().ok()?;
        match part {
            Part::Year => year = Some(number as i32),
            Part::Month => month = Some(number),
            Part::Day => day = Some(number),
        }
    }

    resolve(year?, month?, day?)
}

/// Day 29..=31 past the end of a shorter month resolves to that month's
/// last day; anything outside 1..=31 or a month outside 1..=12 is rejected.
fn resolve(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last_day = add_months(first, 1)?.pred_opt()?.day();
    NaiveDate::from_ymd_opt(year, month, day.min(last_day))
}
