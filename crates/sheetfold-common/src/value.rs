use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::ExcelError;

/* ───────────────────── Excel date-serial utilities ───────────────────
Serial 1  = 1900-01-01
Serial 60 = 1900-02-29  (phantom day kept for Excel compatibility)
Serial 61 = 1900-03-01
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 31).unwrap_or_default()
}

fn phantom_leap_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 3, 1).unwrap_or_default()
}

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - excel_epoch()).num_days();
    let serial_days = if dt.date() >= phantom_leap_cutoff() {
        days + 1
    } else {
        days
    };
    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / 86_400.0
}

/// Parse text as a number using invariant rules: ASCII digits, `.` decimal
/// separator, optional exponent and an optional trailing `%`.
///
/// Non-finite spellings (`inf`, `NaN`) are rejected.
pub fn parse_number_invariant(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let (body, scale) = match t.strip_suffix('%') {
        Some(rest) => (rest.trim_end(), 0.01),
        None => (t, 1.0),
    };
    if !body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'))
    {
        return None;
    }
    let n = body.parse::<f64>().ok()?;
    n.is_finite().then_some(n * scale)
}

/// A cell or interpreter value.
///
/// Equality and hashing are structural (numbers compare by bit pattern when
/// hashed), which is what cache keys built from values rely on.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Array(Vec<Vec<LiteralValue>>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Duration(chrono::Duration),
    Empty,
    Error(ExcelError),
}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::Int(i) => i.hash(state),
            LiteralValue::Number(n) => n.to_bits().hash(state),
            LiteralValue::Text(s) => s.hash(state),
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::Array(a) => a.hash(state),
            LiteralValue::Date(d) => d.hash(state),
            LiteralValue::DateTime(dt) => dt.hash(state),
            LiteralValue::Time(t) => t.hash(state),
            LiteralValue::Duration(d) => d.hash(state),
            LiteralValue::Empty => {}
            LiteralValue::Error(e) => e.kind.hash(state),
        }
    }
}

impl Eq for LiteralValue {}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(i) => write!(f, "{i}"),
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Text(s) => write!(f, "{s}"),
            LiteralValue::Boolean(true) => write!(f, "TRUE"),
            LiteralValue::Boolean(false) => write!(f, "FALSE"),
            LiteralValue::Error(e) => write!(f, "{}", e.kind),
            LiteralValue::Array(a) => write!(f, "{a:?}"),
            LiteralValue::Date(d) => write!(f, "{d}"),
            LiteralValue::DateTime(dt) => write!(f, "{dt}"),
            LiteralValue::Time(t) => write!(f, "{t}"),
            LiteralValue::Duration(d) => write!(f, "{d}"),
            LiteralValue::Empty => Ok(()),
        }
    }
}

impl LiteralValue {
    /// Numeric view of number-like values: integers, floats and the date/time
    /// family (as Excel serials). Text, booleans, blanks and errors give `None`.
    pub fn as_serial_number(&self) -> Option<f64> {
        match self {
            LiteralValue::Date(d) => Some(datetime_to_serial(&d.and_time(NaiveTime::default()))),
            LiteralValue::DateTime(dt) => Some(datetime_to_serial(dt)),
            LiteralValue::Time(t) => Some(t.num_seconds_from_midnight() as f64 / 86_400.0),
            LiteralValue::Duration(d) => Some(d.num_seconds() as f64 / 86_400.0),
            LiteralValue::Int(i) => Some(*i as f64),
            LiteralValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self {
        LiteralValue::Int(i)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::Text(s.to_string())
    }
}
