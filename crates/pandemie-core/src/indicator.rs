//! Indicator: what a historical observation measures (e.g. `cases`).

use serde::{Deserialize, Serialize};

/// A row of the `indicateurs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
}

/// Input for creating (or upserting) an indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIndicator {
  pub name:        String,
  pub description: Option<String>,
}

/// A partial update; `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorPatch {
  pub name:        Option<String>,
  pub description: Option<Option<String>>,
}

impl IndicatorPatch {
  pub fn is_empty(&self) -> bool { self.name.is_none() && self.description.is_none() }
}
