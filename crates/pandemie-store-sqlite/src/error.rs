//! Error type for `pandemie-store-sqlite`.

use pandemie_core::store::{Conflict, StoreError};
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn conflict(&self) -> Option<Conflict> {
    let Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(failure, _),
    )) = self
    else {
      return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
      return None;
    }
    match failure.extended_code {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
        Some(Conflict::Duplicate)
      }
      // Raised by the referential-protection triggers in the schema.
      ffi::SQLITE_CONSTRAINT_TRIGGER | ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
        Some(Conflict::Referenced)
      }
      _ => None,
    }
  }
}
