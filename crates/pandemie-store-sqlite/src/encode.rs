//! Decoding helpers between SQLite rows and domain types.
//!
//! Dates are stored as `YYYY-MM-DD` text. Every other column maps onto a
//! native SQLite type.

use chrono::NaiveDate;
use pandemie_core::{country::Country, datum::HistoricalDatum, indicator::Indicator};
use rusqlite::Row;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

pub const COUNTRY_COLUMNS: &str = "id, name, iso_code, population";

pub fn country_from_row(row: &Row<'_>) -> rusqlite::Result<Country> {
  Ok(Country {
    id:         row.get(0)?,
    name:       row.get(1)?,
    iso_code:   row.get(2)?,
    population: row.get(3)?,
  })
}

pub const INDICATOR_COLUMNS: &str = "id, name, description";

pub fn indicator_from_row(row: &Row<'_>) -> rusqlite::Result<Indicator> {
  Ok(Indicator {
    id:          row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
  })
}

// ─── Historical data ─────────────────────────────────────────────────────────

pub const DATUM_COLUMNS: &str = "id, date, country, iso_code, indicator, value, \
  source, population, unit, cases_per_100k, deaths_per_100k, incidence_7j, growth_rate";

/// A `donnees_historiques` row with the date still in its text form.
pub struct RawDatum {
  pub id:              i64,
  pub date:            String,
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

impl RawDatum {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawDatum {
      id:              row.get(0)?,
      date:            row.get(1)?,
      country:         row.get(2)?,
      iso_code:        row.get(3)?,
      indicator:       row.get(4)?,
      value:           row.get(5)?,
      source:          row.get(6)?,
      population:      row.get(7)?,
      unit:            row.get(8)?,
      cases_per_100k:  row.get(9)?,
      deaths_per_100k: row.get(10)?,
      incidence_7j:    row.get(11)?,
      growth_rate:     row.get(12)?,
    })
  }

  pub fn into_datum(self) -> Result<HistoricalDatum> {
    Ok(HistoricalDatum {
      id:              self.id,
      date:            decode_date(&self.date)?,
      country:         self.country,
      iso_code:        self.iso_code,
      indicator:       self.indicator,
      value:           self.value,
      source:          self.source,
      population:      self.population,
      unit:            self.unit,
      cases_per_100k:  self.cases_per_100k,
      deaths_per_100k: self.deaths_per_100k,
      incidence_7j:    self.incidence_7j,
      growth_rate:     self.growth_rate,
    })
  }
}
