//! Serde helpers for the JSON wire format.
//!
//! 64-bit integers are written as JSON strings so that clients parsing
//! numbers as IEEE doubles do not lose precision. On input both integers and
//! numeric strings are accepted.

use serde::{Deserialize, Deserializer, Serializer};

use crate::parse::{integer_from_f64, parse_integer};

/// Deserialize a field whose mere presence matters.
///
/// Use with `#[serde(default, deserialize_with = "present")]` on an
/// `Option<Option<T>>`: an absent key yields `None`, an explicit `null`
/// yields `Some(None)`.
pub fn present<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(d).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInteger {
  Int(i64),
  Float(f64),
  Text(String),
}

impl RawInteger {
  fn resolve<E: serde::de::Error>(self) -> Result<i64, E> {
    match self {
      RawInteger::Int(n) => Ok(n),
      RawInteger::Float(f) if f.fract() == 0.0 => integer_from_f64(f)
        .ok_or_else(|| E::custom(format!("integer out of range: {f}"))),
      RawInteger::Float(f) => Err(E::custom(format!("expected an integer, got {f}"))),
      RawInteger::Text(s) => parse_integer(&s).map_err(E::custom),
    }
  }
}

/// `Option<i64>` encoded as an optional JSON string.
pub mod big_int {
  use super::*;

  pub fn serialize<S: Serializer>(v: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
      Some(n) => s.collect_str(n),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Option::<RawInteger>::deserialize(d)?
      .map(RawInteger::resolve)
      .transpose()
  }

  /// Like [`deserialize`], but `null`, `""` and a numeric `0` all read as
  /// `None`. A string `"0"` is a value.
  pub fn deserialize_truthy<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<i64>, D::Error> {
    match Option::<RawInteger>::deserialize(d)? {
      None | Some(RawInteger::Int(0)) => Ok(None),
      Some(RawInteger::Float(f)) if f == 0.0 => Ok(None),
      Some(RawInteger::Text(s)) if s.is_empty() => Ok(None),
      Some(raw) => raw.resolve().map(Some),
    }
  }

  /// Tri-state variant of [`deserialize`]; see [`present`](super::present).
  pub fn deserialize_present<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<Option<i64>>, D::Error> {
    deserialize(d).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use serde::{Deserialize, Serialize};

  use super::*;

  #[derive(Debug, Serialize, Deserialize, PartialEq)]
  struct Pop {
    #[serde(default, with = "big_int")]
    population: Option<i64>,
  }

  #[derive(Debug, Deserialize)]
  struct Patch {
    #[serde(default, deserialize_with = "present")]
    unit: Option<Option<String>>,
  }

  #[test]
  fn big_int_serializes_as_string() {
    let json = serde_json::to_string(&Pop { population: Some(9_007_199_254_740_993) }).unwrap();
    assert_eq!(json, r#"{"population":"9007199254740993"}"#);
    let json = serde_json::to_string(&Pop { population: None }).unwrap();
    assert_eq!(json, r#"{"population":null}"#);
  }

  #[test]
  fn big_int_accepts_number_or_string() {
    let a: Pop = serde_json::from_str(r#"{"population":67000000}"#).unwrap();
    let b: Pop = serde_json::from_str(r#"{"population":"67000000"}"#).unwrap();
    let c: Pop = serde_json::from_str(r#"{}"#).unwrap();
    assert_eq!(a.population, Some(67_000_000));
    assert_eq!(a, b);
    assert_eq!(c.population, None);
  }

  #[test]
  fn big_int_rejects_fractions_and_text() {
    assert!(serde_json::from_str::<Pop>(r#"{"population":1.5}"#).is_err());
    assert!(serde_json::from_str::<Pop>(r#"{"population":"lots"}"#).is_err());
  }

  #[derive(Debug, Deserialize)]
  struct Truthy {
    #[serde(default, deserialize_with = "big_int::deserialize_truthy")]
    population: Option<i64>,
  }

  fn truthy(json: &str) -> Option<i64> {
    serde_json::from_str::<Truthy>(json).unwrap().population
  }

  #[test]
  fn truthy_big_int_reads_falsy_as_none() {
    assert_eq!(truthy("{}"), None);
    assert_eq!(truthy(r#"{"population":null}"#), None);
    assert_eq!(truthy(r#"{"population":""}"#), None);
    assert_eq!(truthy(r#"{"population":0}"#), None);
    assert_eq!(truthy(r#"{"population":0.0}"#), None);
    assert_eq!(truthy(r#"{"population":"0"}"#), Some(0));
    assert_eq!(truthy(r#"{"population":"11500000"}"#), Some(11_500_000));
    assert!(serde_json::from_str::<Truthy>(r#"{"population":"lots"}"#).is_err());
  }

  #[test]
  fn present_distinguishes_null_from_absent() {
    let absent: Patch = serde_json::from_str("{}").unwrap();
    let null: Patch = serde_json::from_str(r#"{"unit":null}"#).unwrap();
    let set: Patch = serde_json::from_str(r#"{"unit":"cases"}"#).unwrap();
    assert_eq!(absent.unit, None);
    assert_eq!(null.unit, Some(None));
    assert_eq!(set.unit, Some(Some("cases".to_owned())));
  }
}
