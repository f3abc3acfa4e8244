//! Error types for `pandemie-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date: {0:?}")]
  InvalidDate(String),

  #[error("invalid integer: {0:?}")]
  InvalidInteger(String),

  #[error("invalid number: {0:?}")]
  InvalidNumber(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
