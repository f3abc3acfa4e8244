//! Country: the geographic dimension.

use serde::{Deserialize, Serialize};

use crate::wire::big_int;

/// Length every ISO 3166-1 alpha-3 code must have.
pub const ISO_CODE_LEN: usize = 3;

/// Whether `code` has the shape of an alpha-3 country code.
pub fn is_iso_code(code: &str) -> bool { code.chars().count() == ISO_CODE_LEN }

/// A row of the `pays` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
  pub id:         i64,
  pub name:       String,
  pub iso_code:   String,
  #[serde(default, with = "big_int")]
  pub population: Option<i64>,
}

/// Input for creating (or upserting) a country.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCountry {
  pub name:       String,
  pub iso_code:   String,
  pub population: Option<i64>,
}

/// A partial update. `None` leaves the column unchanged; for the nullable
/// `population`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryPatch {
  pub name:       Option<String>,
  pub iso_code:   Option<String>,
  pub population: Option<Option<i64>>,
}

impl CountryPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.iso_code.is_none() && self.population.is_none()
  }
}
