//! Handlers for `/pays` (country) endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/pays` | Every country, no pagination |
//! | `GET`    | `/pays/:id` | 404 if not found |
//! | `GET`    | `/pays/iso/:code` | Exact ISO code match |
//! | `POST`   | `/pays` | Body: [`CountryBody`]; returns 201 |
//! | `PUT`    | `/pays/:id` | Partial update; returns 200 |
//! | `DELETE` | `/pays/:id` | 204; 409 while historical data name it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::{JsonRejection, PathRejection}},
  http::StatusCode,
  response::IntoResponse,
};
use pandemie_core::{
  country::{Country, CountryPatch, ISO_CODE_LEN, NewCountry, is_iso_code},
  store::PandemicStore,
  wire::big_int,
};
use serde::Deserialize;

use crate::error::ApiError;

const NOT_FOUND: &str = "country not found";

fn not_found() -> ApiError { ApiError::NotFound(NOT_FOUND.to_owned()) }

// ─── Body ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /pays` and `PUT /pays/:id`.
#[derive(Debug, Deserialize)]
pub struct CountryBody {
  #[serde(alias = "country")]
  pub name:       Option<String>,
  pub iso_code:   Option<String>,
  #[serde(default, deserialize_with = "big_int::deserialize_present")]
  pub population: Option<Option<i64>>,
}

fn check_iso_code(code: &str) -> Result<(), ApiError> {
  if is_iso_code(code) {
    Ok(())
  } else {
    Err(ApiError::BadRequest(format!(
      "ISO code must be exactly {ISO_CODE_LEN} characters"
    )))
  }
}

impl CountryBody {
  fn into_new(self) -> Result<NewCountry, ApiError> {
    let name = self.name.filter(|s| !s.is_empty());
    let iso_code = self.iso_code.filter(|s| !s.is_empty());
    let (Some(name), Some(iso_code)) = (name, iso_code) else {
      return Err(ApiError::BadRequest(
        "country name and ISO code are required".to_owned(),
      ));
    };
    check_iso_code(&iso_code)?;
    Ok(NewCountry { name, iso_code, population: self.population.flatten() })
  }

  /// Empty strings leave `name` and `iso_code` unchanged; an explicit
  /// `null` population clears it.
  fn into_patch(self) -> Result<CountryPatch, ApiError> {
    let iso_code = self.iso_code.filter(|s| !s.is_empty());
    if let Some(code) = &iso_code {
      check_iso_code(code)?;
    }
    Ok(CountryPatch {
      name: self.name.filter(|s| !s.is_empty()),
      iso_code,
      population: self.population,
    })
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /pays`
pub async fn list<S: PandemicStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Country>>, ApiError> {
  let countries = store.list_countries().await.map_err(ApiError::store)?;
  Ok(Json(countries))
}

/// `GET /pays/:id`
pub async fn get_one<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Country>, ApiError> {
  let Path(id) = path?;
  let country = store
    .get_country(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(country))
}

/// `GET /pays/iso/:code`
pub async fn get_by_iso<S: PandemicStore>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
) -> Result<Json<Country>, ApiError> {
  let country = store
    .get_country_by_iso(&code)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(country))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /pays` returns 201 + the stored [`Country`].
pub async fn create<S: PandemicStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<CountryBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let country = store
    .create_country(body.into_new()?)
    .await
    .map_err(ApiError::on_conflict("country or ISO code already exists"))?;
  tracing::info!(id = country.id, iso_code = %country.iso_code, "country created");
  Ok((StatusCode::CREATED, Json(country)))
}

/// `PUT /pays/:id`
pub async fn update<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<CountryBody>, JsonRejection>,
) -> Result<Json<Country>, ApiError> {
  let Path(id) = path?;
  let Json(body) = body?;
  let country = store
    .update_country(id, body.into_patch()?)
    .await
    .map_err(ApiError::on_conflict("ISO code already used by another country"))?
    .ok_or_else(not_found)?;
  Ok(Json(country))
}

/// `DELETE /pays/:id`
pub async fn delete_one<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
  let Path(id) = path?;
  let deleted = store.delete_country(id).await.map_err(ApiError::on_conflict(
    "cannot delete country: it is referenced by historical data",
  ))?;
  if !deleted {
    return Err(not_found());
  }
  tracing::info!(id, "country deleted");
  Ok(StatusCode::NO_CONTENT)
}
