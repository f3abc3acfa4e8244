//! Historical data: the fact rows.
//!
//! A datum carries denormalized copies of the country name, ISO code and
//! indicator name as plain text. Nothing ties these columns to the dimension
//! tables when a datum is written; the dimension tables only refuse to drop
//! a row that a datum still names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::wire::big_int;

/// A row of the `donnees_historiques` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDatum {
  pub id:              i64,
  pub date:            NaiveDate,
  pub country:         String,
  pub iso_code:        Option<String>,
  pub indicator:       String,
  pub value:           Option<f64>,
  pub source:          Option<String>,
  /// Population snapshot at the time of the observation.
  #[serde(default, with = "big_int")]
  pub population:      Option<i64>,
  pub unit:            Option<String>,
  pub cases_per_100k:  Option<f64>,
  pub deaths_per_100k: Option<f64>,
  pub incidence_7j:    Option<f64>,
  pub growth_rate:     Option<f64>,
}

/// Input for inserting a datum. Unlike the dimensions, data are never
/// upserted: every insert creates a new row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoricalDatum {
  pub date:            NaiveDate,
  pub country:         String,
  pub iso_code:        Option<String>,
  pub indicator:       String,
  pub value:           Option<f64>,
  pub source:          Option<String>,
  pub population:      Option<i64>,
  pub unit:            Option<String>,
  pub cases_per_100k:  Option<f64>,
  pub deaths_per_100k: Option<f64>,
  pub incidence_7j:    Option<f64>,
  pub growth_rate:     Option<f64>,
}

impl NewHistoricalDatum {
  /// A datum with only the required columns set.
  pub fn new(
    date: NaiveDate,
    country: impl Into<String>,
    indicator: impl Into<String>,
  ) -> Self {
    Self {
      date,
      country: country.into(),
      iso_code: None,
      indicator: indicator.into(),
      value: None,
      source: None,
      population: None,
      unit: None,
      cases_per_100k: None,
      deaths_per_100k: None,
      incidence_7j: None,
      growth_rate: None,
    }
  }
}

/// A partial update. Outer `None` leaves a column unchanged; for nullable
/// columns `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalDatumPatch {
  pub date:            Option<NaiveDate>,
  pub country:         Option<String>,
  pub indicator:       Option<String>,
  pub population:      Option<i64>,
  pub iso_code:        Option<Option<String>>,
  pub value:           Option<Option<f64>>,
  pub source:          Option<Option<String>>,
  pub unit:            Option<Option<String>>,
  pub cases_per_100k:  Option<Option<f64>>,
  pub deaths_per_100k: Option<Option<f64>>,
  pub incidence_7j:    Option<Option<f64>>,
  pub growth_rate:     Option<Option<f64>>,
}
