//! The `PandemicStore` trait and error classification.
//!
//! The trait is implemented by storage backends (e.g. `pandemie-store-sqlite`).
//! Higher layers (`pandemie-api`, `pandemie-loader`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  country::{Country, CountryPatch, NewCountry},
  datum::{HistoricalDatum, HistoricalDatumPatch, NewHistoricalDatum},
  indicator::{Indicator, IndicatorPatch, NewIndicator},
  query::{DatumQuery, Page},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Which integrity rule a failed write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
  /// A unique key (ISO code, indicator name) is already taken.
  Duplicate,
  /// The row is still named by historical data and cannot be deleted.
  Referenced,
}

/// Errors a backend may return. Backends classify integrity violations so
/// callers can tell a conflict from an outage.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn conflict(&self) -> Option<Conflict>;
}

// ─── Upsert outcome ──────────────────────────────────────────────────────────

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
  pub record:  T,
  /// `false` when a row with the same key already existed; that row is
  /// returned untouched.
  pub created: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a pandemic data store backend.
///
/// Every mutation by id is a single conditional statement: an update returns
/// `None` and a delete returns `false` when no row has that id.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PandemicStore: Send + Sync {
  type Error: StoreError;

  // ── Countries ─────────────────────────────────────────────────────────

  /// All countries, in id order.
  fn list_countries(
    &self,
  ) -> impl Future<Output = Result<Vec<Country>, Self::Error>> + Send + '_;

  fn get_country(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + '_;

  /// Exact-match lookup on the unique ISO code.
  fn get_country_by_iso<'a>(
    &'a self,
    iso_code: &'a str,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + 'a;

  /// Insert a country. A taken ISO code is a [`Conflict::Duplicate`].
  fn create_country(
    &self,
    input: NewCountry,
  ) -> impl Future<Output = Result<Country, Self::Error>> + Send + '_;

  /// Insert a country unless one with the same ISO code exists.
  fn upsert_country(
    &self,
    input: NewCountry,
  ) -> impl Future<Output = Result<Upserted<Country>, Self::Error>> + Send + '_;

  fn update_country(
    &self,
    id: i64,
    patch: CountryPatch,
  ) -> impl Future<Output = Result<Option<Country>, Self::Error>> + Send + '_;

  /// Delete a country. Fails with [`Conflict::Referenced`] while historical
  /// data still carry its ISO code.
  fn delete_country(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Indicators ────────────────────────────────────────────────────────

  /// All indicators, in id order.
  fn list_indicators(
    &self,
  ) -> impl Future<Output = Result<Vec<Indicator>, Self::Error>> + Send + '_;

  fn get_indicator(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Indicator>, Self::Error>> + Send + '_;

  /// Exact-match lookup on the unique indicator name.
  fn get_indicator_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Indicator>, Self::Error>> + Send + 'a;

  fn create_indicator(
    &self,
    input: NewIndicator,
  ) -> impl Future<Output = Result<Indicator, Self::Error>> + Send + '_;

  /// Insert an indicator unless one with the same name exists.
  fn upsert_indicator(
    &self,
    input: NewIndicator,
  ) -> impl Future<Output = Result<Upserted<Indicator>, Self::Error>> + Send + '_;

  fn update_indicator(
    &self,
    id: i64,
    patch: IndicatorPatch,
  ) -> impl Future<Output = Result<Option<Indicator>, Self::Error>> + Send + '_;

  /// Delete an indicator. Fails with [`Conflict::Referenced`] while
  /// historical data still name it.
  fn delete_indicator(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Historical data ───────────────────────────────────────────────────

  /// One page of data matching `query`, newest first, with the total count
  /// of matching rows.
  fn list_data<'a>(
    &'a self,
    query: &'a DatumQuery,
  ) -> impl Future<Output = Result<Page<HistoricalDatum>, Self::Error>> + Send + 'a;

  fn get_datum(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<HistoricalDatum>, Self::Error>> + Send + '_;

  fn create_datum(
    &self,
    input: NewHistoricalDatum,
  ) -> impl Future<Output = Result<HistoricalDatum, Self::Error>> + Send + '_;

  fn update_datum(
    &self,
    id: i64,
    patch: HistoricalDatumPatch,
  ) -> impl Future<Output = Result<Option<HistoricalDatum>, Self::Error>> + Send + '_;

  fn delete_datum(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
