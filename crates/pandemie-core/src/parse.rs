//! Lenient parsers shared by the API and the batch loader.
//!
//! Inputs come from two places: JSON request bodies and query strings, and
//! CSV extracts produced by an upstream pandas pipeline. The latter writes
//! integer columns containing gaps as floats (`67000000.0`), so integer
//! parsing accepts float notation and truncates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{Error, Result};

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, or an RFC 3339 timestamp. For
/// timestamps the UTC calendar date is kept.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  let s = s.trim();
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Ok(d);
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc).date_naive());
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.date())
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// Parse a 64-bit integer such as a population count.
pub fn parse_integer(s: &str) -> Result<i64> {
  let s = s.trim();
  if let Ok(n) = s.parse::<i64>() {
    return Ok(n);
  }
  let f: f64 = s.parse().map_err(|_| Error::InvalidInteger(s.to_owned()))?;
  integer_from_f64(f).ok_or_else(|| Error::InvalidInteger(s.to_owned()))
}

/// Parse a floating-point measure. Non-finite values are rejected.
pub fn parse_measure(s: &str) -> Result<f64> {
  let s = s.trim();
  match s.parse::<f64>() {
    Ok(f) if f.is_finite() => Ok(f),
    _ => Err(Error::InvalidNumber(s.to_owned())),
  }
}

/// Truncate `f` toward zero if it fits in an `i64`.
pub(crate) fn integer_from_f64(f: f64) -> Option<i64> {
  // i64::MAX is not exactly representable; compare against 2^63.
  const LIMIT: f64 = 9_223_372_036_854_775_808.0;
  if f.is_finite() && f > -LIMIT && f < LIMIT {
    Some(f.trunc() as i64)
  } else {
    None
  }
}
