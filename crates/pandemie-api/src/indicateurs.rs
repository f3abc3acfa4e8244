//! Handlers for `/indicateurs` (indicator) endpoints.
//!
//! Same shape as [`crate::pays`], keyed by name: `GET /indicateurs/nom/:nom`
//! replaces the ISO code lookup.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::{JsonRejection, PathRejection}},
  http::StatusCode,
  response::IntoResponse,
};
use pandemie_core::{
  indicator::{Indicator, IndicatorPatch, NewIndicator},
  store::PandemicStore,
  wire::present,
};
use serde::Deserialize;

use crate::error::ApiError;

fn not_found() -> ApiError { ApiError::NotFound("indicator not found".to_owned()) }

/// JSON body accepted by `POST /indicateurs` and `PUT /indicateurs/:id`.
#[derive(Debug, Deserialize)]
pub struct IndicatorBody {
  #[serde(alias = "indicator_name")]
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub description: Option<Option<String>>,
}

impl IndicatorBody {
  fn into_new(self) -> Result<NewIndicator, ApiError> {
    let Some(name) = self.name.filter(|s| !s.is_empty()) else {
      return Err(ApiError::BadRequest("indicator name is required".to_owned()));
    };
    Ok(NewIndicator {
      name,
      description: self.description.flatten().filter(|s| !s.is_empty()),
    })
  }

  /// An empty `description` clears it, as on create.
  fn into_patch(self) -> IndicatorPatch {
    IndicatorPatch {
      name:        self.name.filter(|s| !s.is_empty()),
      description: self
        .description
        .map(|d| d.filter(|s| !s.is_empty())),
    }
  }
}

/// `GET /indicateurs`
pub async fn list<S: PandemicStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Indicator>>, ApiError> {
  let indicators = store.list_indicators().await.map_err(ApiError::store)?;
  Ok(Json(indicators))
}

/// `GET /indicateurs/:id`
pub async fn get_one<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Indicator>, ApiError> {
  let Path(id) = path?;
  let indicator = store
    .get_indicator(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(indicator))
}

/// `GET /indicateurs/nom/:nom`
pub async fn get_by_name<S: PandemicStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Indicator>, ApiError> {
  let indicator = store
    .get_indicator_by_name(&name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(indicator))
}

/// `POST /indicateurs` returns 201 + the stored [`Indicator`].
pub async fn create<S: PandemicStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<IndicatorBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let indicator = store
    .create_indicator(body.into_new()?)
    .await
    .map_err(ApiError::on_conflict("indicator already exists"))?;
  tracing::info!(id = indicator.id, name = %indicator.name, "indicator created");
  Ok((StatusCode::CREATED, Json(indicator)))
}

/// `PUT /indicateurs/:id`
pub async fn update<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<IndicatorBody>, JsonRejection>,
) -> Result<Json<Indicator>, ApiError> {
  let Path(id) = path?;
  let Json(body) = body?;
  let indicator = store
    .update_indicator(id, body.into_patch())
    .await
    .map_err(ApiError::on_conflict("indicator name already used"))?
    .ok_or_else(not_found)?;
  Ok(Json(indicator))
}

/// `DELETE /indicateurs/:id`
pub async fn delete_one<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
  let Path(id) = path?;
  let deleted = store.delete_indicator(id).await.map_err(ApiError::on_conflict(
    "cannot delete indicator: it is referenced by historical data",
  ))?;
  if !deleted {
    return Err(not_found());
  }
  tracing::info!(id, "indicator deleted");
  Ok(StatusCode::NO_CONTENT)
}
