//! Handlers for `/donnees-historiques` (historical data) endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/donnees-historiques` | `?page`, `?limit`; newest first |
//! | `GET`    | `/donnees-historiques/filtre` | `?pays`, `?iso_code`, `?indicator`, `?dateDebut`, `?dateFin`, `?source` |
//! | `GET`    | `/donnees-historiques/pays/:isoCode` | `?indicator`, `?dateDebut`, `?dateFin` |
//! | `GET`    | `/donnees-historiques/:id` | 404 if not found |
//! | `POST`   | `/donnees-historiques` | Body: [`NewDatumBody`]; returns 201 |
//! | `PUT`    | `/donnees-historiques/:id` | Body: [`DatumPatchBody`] |
//! | `DELETE` | `/donnees-historiques/:id` | 204 |
//!
//! Every listing answers with a [`Page`]: `{"data": [...], "pagination":
//! {"page", "limit", "total", "pages"}}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
  http::StatusCode,
  response::IntoResponse,
};
use pandemie_core::{
  datum::{HistoricalDatum, HistoricalDatumPatch, NewHistoricalDatum},
  parse::parse_date,
  query::{DatumQuery, Page},
  store::PandemicStore,
  wire::{big_int, present},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  params::{date_bound, page_request, term},
};

fn not_found() -> ApiError { ApiError::NotFound("historical datum not found".to_owned()) }

fn date_field(raw: &str) -> Result<chrono::NaiveDate, ApiError> {
  parse_date(raw).map_err(|e| ApiError::BadRequest(format!("date: {e}")))
}

async fn run_query<S: PandemicStore>(
  store: &S,
  query: DatumQuery,
) -> Result<Json<Page<HistoricalDatum>>, ApiError> {
  let page = store.list_data(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub page:  Option<String>,
  pub limit: Option<String>,
}

/// `GET /donnees-historiques[?page=..][&limit=..]`
pub async fn list<S: PandemicStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<HistoricalDatum>>, ApiError> {
  let query = DatumQuery {
    page: page_request(params.page.as_deref(), params.limit.as_deref()),
    ..Default::default()
  };
  run_query(store.as_ref(), query).await
}

// ─── Filtered list ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FilterParams {
  /// Country name.
  pub pays:       Option<String>,
  pub iso_code:   Option<String>,
  pub indicator:  Option<String>,
  #[serde(rename = "dateDebut")]
  pub date_debut: Option<String>,
  #[serde(rename = "dateFin")]
  pub date_fin:   Option<String>,
  pub source:     Option<String>,
  pub page:       Option<String>,
  pub limit:      Option<String>,
}

impl FilterParams {
  fn into_query(self) -> Result<DatumQuery, ApiError> {
    Ok(DatumQuery {
      date_from: date_bound("dateDebut", self.date_debut.as_deref())?,
      date_to:   date_bound("dateFin", self.date_fin.as_deref())?,
      page:      page_request(self.page.as_deref(), self.limit.as_deref()),
      country:   term(self.pays),
      iso_code:  term(self.iso_code),
      indicator: term(self.indicator),
      source:    term(self.source),
    })
  }
}

/// `GET /donnees-historiques/filtre?...`: only the supplied parameters
/// contribute predicate terms.
pub async fn filter<S: PandemicStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Page<HistoricalDatum>>, ApiError> {
  run_query(store.as_ref(), params.into_query()?).await
}

// ─── By country ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CountryParams {
  pub indicator:  Option<String>,
  #[serde(rename = "dateDebut")]
  pub date_debut: Option<String>,
  #[serde(rename = "dateFin")]
  pub date_fin:   Option<String>,
  pub page:       Option<String>,
  pub limit:      Option<String>,
}

/// `GET /donnees-historiques/pays/:isoCode?...`
pub async fn by_country<S: PandemicStore>(
  State(store): State<Arc<S>>,
  Path(iso_code): Path<String>,
  Query(params): Query<CountryParams>,
) -> Result<Json<Page<HistoricalDatum>>, ApiError> {
  let query = DatumQuery {
    iso_code:  Some(iso_code),
    indicator: term(params.indicator),
    date_from: date_bound("dateDebut", params.date_debut.as_deref())?,
    date_to:   date_bound("dateFin", params.date_fin.as_deref())?,
    page:      page_request(params.page.as_deref(), params.limit.as_deref()),
    ..Default::default()
  };
  run_query(store.as_ref(), query).await
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /donnees-historiques/:id`
pub async fn get_one<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<Json<HistoricalDatum>, ApiError> {
  let Path(id) = path?;
  let datum = store
    .get_datum(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(datum))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /donnees-historiques`.
#[derive(Debug, Deserialize)]
pub struct NewDatumBody {
  pub date:            Option<String>,
  pub country:         Option<String>,
  pub indicator:       Option<String>,
  pub iso_code:        Option<String>,
  pub value:           Option<f64>,
  pub source:          Option<String>,
  #[serde(default, deserialize_with = "big_int::deserialize_truthy")]
  pub population:      Option<i64>,
  pub unit:            Option<String>,
  pub cases_per_100k:  Option<f64>,
  pub deaths_per_100k: Option<f64>,
  pub incidence_7j:    Option<f64>,
  pub growth_rate:     Option<f64>,
}

impl NewDatumBody {
  /// `date`, `country` and `indicator` must be non-empty. Empty optional
  /// strings are stored as NULL.
  fn into_new(self) -> Result<NewHistoricalDatum, ApiError> {
    let required = (
      self.date.filter(|s| !s.is_empty()),
      self.country.filter(|s| !s.is_empty()),
      self.indicator.filter(|s| !s.is_empty()),
    );
    let (Some(date), Some(country), Some(indicator)) = required else {
      return Err(ApiError::BadRequest(
        "date, country and indicator are required".to_owned(),
      ));
    };
    Ok(NewHistoricalDatum {
      date: date_field(&date)?,
      country,
      indicator,
      iso_code: term(self.iso_code),
      value: self.value,
      source: term(self.source),
      population: self.population,
      unit: term(self.unit),
      cases_per_100k: self.cases_per_100k,
      deaths_per_100k: self.deaths_per_100k,
      incidence_7j: self.incidence_7j,
      growth_rate: self.growth_rate,
    })
  }
}

/// `POST /donnees-historiques` returns 201 + the stored datum.
pub async fn create<S: PandemicStore>(
  State(store): State<Arc<S>>,
  body: Result<Json<NewDatumBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let datum = store
    .create_datum(body.into_new()?)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(datum)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /donnees-historiques/:id`.
///
/// Two update policies coexist, field by field:
///
/// - `date`, `country`, `indicator`, `population` apply only when truthy;
///   `null`, `""` and a numeric `0` are skipped like an absent key. The
///   string `"0"` is truthy.
/// - every other field applies whenever the key is present, so `null`
///   clears the column and `0` is written as-is.
#[derive(Debug, Deserialize)]
pub struct DatumPatchBody {
  pub date:            Option<String>,
  pub country:         Option<String>,
  pub indicator:       Option<String>,
  #[serde(default, deserialize_with = "big_int::deserialize_truthy")]
  pub population:      Option<i64>,
  #[serde(default, deserialize_with = "present")]
  pub iso_code:        Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub value:           Option<Option<f64>>,
  #[serde(default, deserialize_with = "present")]
  pub source:          Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub unit:            Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub cases_per_100k:  Option<Option<f64>>,
  #[serde(default, deserialize_with = "present")]
  pub deaths_per_100k: Option<Option<f64>>,
  #[serde(default, deserialize_with = "present")]
  pub incidence_7j:    Option<Option<f64>>,
  #[serde(default, deserialize_with = "present")]
  pub growth_rate:     Option<Option<f64>>,
}

impl DatumPatchBody {
  fn into_patch(self) -> Result<HistoricalDatumPatch, ApiError> {
    let date = self
      .date
      .filter(|s| !s.is_empty())
      .map(|s| date_field(&s))
      .transpose()?;
    Ok(HistoricalDatumPatch {
      date,
      country: self.country.filter(|s| !s.is_empty()),
      indicator: self.indicator.filter(|s| !s.is_empty()),
      population: self.population,
      iso_code: self.iso_code,
      value: self.value,
      source: self.source,
      unit: self.unit,
      cases_per_100k: self.cases_per_100k,
      deaths_per_100k: self.deaths_per_100k,
      incidence_7j: self.incidence_7j,
      growth_rate: self.growth_rate,
    })
  }
}

/// `PUT /donnees-historiques/:id`
pub async fn update<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
  body: Result<Json<DatumPatchBody>, JsonRejection>,
) -> Result<Json<HistoricalDatum>, ApiError> {
  let Path(id) = path?;
  let Json(body) = body?;
  let datum = store
    .update_datum(id, body.into_patch()?)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(datum))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /donnees-historiques/:id`
pub async fn delete_one<S: PandemicStore>(
  State(store): State<Arc<S>>,
  path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
  let Path(id) = path?;
  if !store.delete_datum(id).await.map_err(ApiError::store)? {
    return Err(not_found());
  }
  Ok(StatusCode::NO_CONTENT)
}
