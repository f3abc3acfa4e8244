//! Filtering and offset pagination over historical data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 100;

// ─── Pagination ──────────────────────────────────────────────────────────────

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
  }
}

impl PageRequest {
  /// Zero (or absent) values fall back to the defaults.
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
    Self {
      page:  page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
      limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
    }
  }

  /// Number of rows preceding this page.
  pub fn skip(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

/// The pagination block returned alongside a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
  pub page:  u32,
  pub limit: u32,
  pub total: u64,
  pub pages: u64,
}

/// One page of results plus the total count of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub data:       Vec<T>,
  pub pagination: Pagination,
}

impl<T> Page<T> {
  pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
    Self {
      data,
      pagination: Pagination {
        page: request.page,
        limit: request.limit,
        total,
        pages: total.div_ceil(u64::from(request.limit)),
      },
    }
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Conjunctive filter for [`PandemicStore::list_data`](crate::store::PandemicStore::list_data).
///
/// Each `None` field contributes no predicate term. Date bounds are
/// inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatumQuery {
  pub country:   Option<String>,
  pub iso_code:  Option<String>,
  pub indicator: Option<String>,
  pub source:    Option<String>,
  pub date_from: Option<NaiveDate>,
  pub date_to:   Option<NaiveDate>,
  pub page:      PageRequest,
}
