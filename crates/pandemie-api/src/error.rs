//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use pandemie_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Body text of every 500 response. The underlying message is only attached
/// in development mode; see [`ApiOptions`](crate::ApiOptions).
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// The detail of an internal error, stashed in the response extensions.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E: StoreError>(e: E) -> Self { ApiError::Store(Box::new(e)) }

  /// Map a failed write: integrity violations become a 409 carrying
  /// `message`, anything else a 500.
  pub fn on_conflict<E: StoreError>(message: &str) -> impl FnOnce(E) -> Self + '_ {
    move |e| match e.conflict() {
      Some(_) => ApiError::Conflict(message.to_owned()),
      None => ApiError::store(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "unhandled store error");
        let mut res = (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": INTERNAL_MESSAGE })),
        )
          .into_response();
        res.extensions_mut().insert(InternalErrorDetail(e.to_string()));
        return res;
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
