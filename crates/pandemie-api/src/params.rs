//! Query-string helpers shared by the historical data handlers.

use chrono::NaiveDate;
use pandemie_core::{parse::parse_date, query::PageRequest};

use crate::error::ApiError;

/// The leading digits of `raw` as a count (`"2.5"` reads as 2), or `None`
/// when there are none so the caller falls back to its default.
fn count(raw: Option<&str>) -> Option<u32> {
  let raw = raw?.trim_start();
  let end = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
  raw[..end].parse().ok()
}

pub fn page_request(page: Option<&str>, limit: Option<&str>) -> PageRequest {
  PageRequest::new(count(page), count(limit))
}

/// An equality filter term; an empty value contributes no term.
pub fn term(raw: Option<String>) -> Option<String> { raw.filter(|s| !s.is_empty()) }

/// An optional date bound named `name` in error messages.
pub fn date_bound(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
  match raw.filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => parse_date(s)
      .map(Some)
      .map_err(|e| ApiError::BadRequest(format!("{name}: {e}"))),
  }
}

#[cfg(test)]
mod tests {
  use pandemie_core::query::{DEFAULT_LIMIT, DEFAULT_PAGE};

  use super::*;

  #[test]
  fn bad_counts_fall_back_to_defaults() {
    let req = page_request(Some("abc"), Some("-5"));
    assert_eq!(req.page, DEFAULT_PAGE);
    assert_eq!(req.limit, DEFAULT_LIMIT);

    let req = page_request(Some("3"), Some(" 25 "));
    assert_eq!((req.page, req.limit), (3, 25));
  }

  #[test]
  fn counts_read_leading_digits() {
    let req = page_request(Some("2.5"), Some("10abc"));
    assert_eq!((req.page, req.limit), (2, 10));

    let req = page_request(Some(".5"), Some(""));
    assert_eq!(req.page, DEFAULT_PAGE);
    assert_eq!(req.limit, DEFAULT_LIMIT);
  }

  #[test]
  fn empty_terms_are_dropped() {
    assert_eq!(term(Some(String::new())), None);
    assert_eq!(term(Some("FRA".into())).as_deref(), Some("FRA"));
  }

  #[test]
  fn date_bounds() {
    assert_eq!(date_bound("dateDebut", None).unwrap(), None);
    assert_eq!(date_bound("dateDebut", Some("")).unwrap(), None);
    assert_eq!(
      date_bound("dateFin", Some("2021-01-31")).unwrap(),
      NaiveDate::from_ymd_opt(2021, 1, 31)
    );
    assert!(matches!(
      date_bound("dateFin", Some("31/01/2021")),
      Err(ApiError::BadRequest(_))
    ));
  }
}
