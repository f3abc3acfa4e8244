//! Dynamic SQL fragments: `SET` lists for partial updates and `WHERE`
//! clauses for filtered listing. Values are always bound, never inlined.

use pandemie_core::query::DatumQuery;
use rusqlite::types::Value;

use crate::encode::encode_date;

// ─── Partial updates ─────────────────────────────────────────────────────────

/// Column assignments collected from a patch.
#[derive(Default)]
pub struct Assignments {
  columns: Vec<&'static str>,
  values:  Vec<Value>,
}

impl Assignments {
  pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
    self.columns.push(column);
    self.values.push(value.into());
  }

  pub fn set_if(&mut self, column: &'static str, value: Option<impl Into<Value>>) {
    if let Some(v) = value {
      self.set(column, v);
    }
  }

  /// Build `UPDATE … WHERE id = ? RETURNING …` as one statement, so a
  /// missing row shows up as an empty result rather than a separate check.
  pub fn into_update(
    self,
    table: &str,
    id: i64,
    returning: &str,
  ) -> (String, Vec<Value>) {
    let mut values = self.values;
    let set_list = if self.columns.is_empty() {
      // Nothing to change; still report whether the row exists.
      "id = id".to_owned()
    } else {
      self
        .columns
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ")
    };
    values.push(Value::Integer(id));
    let sql = format!("UPDATE {table} SET {set_list} WHERE id = ? RETURNING {returning}");
    (sql, values)
  }
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// A conjunctive `WHERE` clause with its bound values.
pub struct Filter {
  conds:      Vec<&'static str>,
  pub values: Vec<Value>,
}

impl Filter {
  pub fn from_query(query: &DatumQuery) -> Self {
    let mut filter = Filter { conds: vec![], values: vec![] };
    let eq = [
      ("country = ?", &query.country),
      ("iso_code = ?", &query.iso_code),
      ("indicator = ?", &query.indicator),
      ("source = ?", &query.source),
    ];
    for (cond, value) in eq {
      if let Some(v) = value {
        filter.push(cond, Value::Text(v.clone()));
      }
    }
    if let Some(from) = query.date_from {
      filter.push("date >= ?", Value::Text(encode_date(from)));
    }
    if let Some(to) = query.date_to {
      filter.push("date <= ?", Value::Text(encode_date(to)));
    }
    filter
  }

  fn push(&mut self, cond: &'static str, value: Value) {
    self.conds.push(cond);
    self.values.push(value);
  }

  pub fn where_clause(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }
}
