//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::IntoResponse,
};
use pandemie_core::{
  country::Country,
  datum::HistoricalDatum,
  indicator::Indicator,
  query::Page,
};
use pandemie_store_sqlite::SqliteStore;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

struct Harness {
  store: Arc<SqliteStore>,
}

impl Harness {
  async fn new() -> Self {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Self { store: Arc::new(store) }
  }

  async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(self.store.clone(), ApiOptions::default())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json<T: DeserializeOwned>(
    &self,
    method: &str,
    uri: &str,
    body: Option<Value>,
    expect: StatusCode,
  ) -> T {
    let resp = self.send(method, uri, body).await;
    assert_eq!(resp.status(), expect, "{method} {uri}");
    read_json(resp).await
  }

  async fn seed_datum(&self, date: &str, iso: &str, indicator: &str) -> HistoricalDatum {
    self
      .json(
        "POST",
        "/donnees-historiques",
        Some(json!({
          "date": date,
          "country": "France",
          "iso_code": iso,
          "indicator": indicator,
          "value": 10,
        })),
        StatusCode::CREATED,
      )
      .await
  }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> T {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn france() -> Value { json!({ "name": "France", "iso_code": "FRA", "population": 67750000 }) }

// ── Countries ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get_country() {
  let h = Harness::new().await;

  let created: Country = h
    .json("POST", "/pays", Some(france()), StatusCode::CREATED)
    .await;
  assert_eq!(created.name, "France");
  assert_eq!(created.iso_code, "FRA");
  assert_eq!(created.population, Some(67_750_000));

  let by_id: Country = h
    .json("GET", &format!("/pays/{}", created.id), None, StatusCode::OK)
    .await;
  assert_eq!(by_id, created);

  let by_iso: Country = h.json("GET", "/pays/iso/FRA", None, StatusCode::OK).await;
  assert_eq!(by_iso, created);

  let all: Vec<Country> = h.json("GET", "/pays", None, StatusCode::OK).await;
  assert_eq!(all, vec![created]);
}

#[tokio::test]
async fn population_is_a_json_string() {
  let h = Harness::new().await;
  let body: Value = h
    .json("POST", "/pays", Some(france()), StatusCode::CREATED)
    .await;
  assert_eq!(body["population"], json!("67750000"));
}

#[tokio::test]
async fn missing_country_fields_are_400() {
  let h = Harness::new().await;
  let body: Value = h
    .json(
      "POST",
      "/pays",
      Some(json!({ "iso_code": "FRA" })),
      StatusCode::BAD_REQUEST,
    )
    .await;
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_iso_code_is_409_without_second_row() {
  let h = Harness::new().await;
  h.send("POST", "/pays", Some(france())).await;

  let body: Value = h
    .json(
      "POST",
      "/pays",
      Some(json!({ "name": "Francia", "iso_code": "FRA" })),
      StatusCode::CONFLICT,
    )
    .await;
  assert_eq!(body["error"], "country or ISO code already exists");

  let all: Vec<Country> = h.json("GET", "/pays", None, StatusCode::OK).await;
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn unknown_country_is_404() {
  let h = Harness::new().await;
  for (method, uri, body) in [
    ("GET", "/pays/12", None),
    ("GET", "/pays/iso/ZZZ", None),
    ("PUT", "/pays/12", Some(json!({ "name": "Atlantis" }))),
    ("DELETE", "/pays/12", None),
  ] {
    let body: Value = h.json(method, uri, body, StatusCode::NOT_FOUND).await;
    assert_eq!(body["error"], "country not found");
  }
}

#[tokio::test]
async fn non_numeric_id_is_400() {
  let h = Harness::new().await;
  let resp = h.send("GET", "/pays/abc", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_country_leaves_omitted_fields() {
  let h = Harness::new().await;
  let c: Country = h
    .json("POST", "/pays", Some(france()), StatusCode::CREATED)
    .await;

  let updated: Country = h
    .json(
      "PUT",
      &format!("/pays/{}", c.id),
      Some(json!({ "population": "68000000" })),
      StatusCode::OK,
    )
    .await;
  assert_eq!(updated.name, "France");
  assert_eq!(updated.iso_code, "FRA");
  assert_eq!(updated.population, Some(68_000_000));
}

#[tokio::test]
async fn referenced_country_delete_is_409() {
  let h = Harness::new().await;
  let c: Country = h
    .json("POST", "/pays", Some(france()), StatusCode::CREATED)
    .await;
  h.seed_datum("2021-01-01", "FRA", "cases").await;

  let uri = format!("/pays/{}", c.id);
  let body: Value = h.json("DELETE", &uri, None, StatusCode::CONFLICT).await;
  assert_eq!(
    body["error"],
    "cannot delete country: it is referenced by historical data"
  );

  let still: Country = h.json("GET", &uri, None, StatusCode::OK).await;
  assert_eq!(still, c);
}

#[tokio::test]
async fn delete_country_is_204_with_empty_body() {
  let h = Harness::new().await;
  let c: Country = h
    .json("POST", "/pays", Some(france()), StatusCode::CREATED)
    .await;

  let resp = h.send("DELETE", &format!("/pays/{}", c.id), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  assert!(bytes.is_empty());
}

// ── Indicators ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn indicator_lifecycle() {
  let h = Harness::new().await;

  let created: Indicator = h
    .json(
      "POST",
      "/indicateurs",
      Some(json!({ "indicator_name": "cases", "description": "Number of cases" })),
      StatusCode::CREATED,
    )
    .await;
  assert_eq!(created.name, "cases");

  let by_name: Indicator = h
    .json("GET", "/indicateurs/nom/cases", None, StatusCode::OK)
    .await;
  assert_eq!(by_name, created);

  let body: Value = h
    .json(
      "POST",
      "/indicateurs",
      Some(json!({ "name": "cases" })),
      StatusCode::CONFLICT,
    )
    .await;
  assert_eq!(body["error"], "indicator already exists");

  let uri = format!("/indicateurs/{}", created.id);
  let updated: Indicator = h
    .json("PUT", &uri, Some(json!({ "description": null })), StatusCode::OK)
    .await;
  assert_eq!(updated.name, "cases");
  assert_eq!(updated.description, None);

  let resp = h.send("DELETE", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  let resp = h.send("GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renaming_indicator_onto_existing_is_409() {
  let h = Harness::new().await;
  h.send("POST", "/indicateurs", Some(json!({ "name": "cases" }))).await;
  let deaths: Indicator = h
    .json(
      "POST",
      "/indicateurs",
      Some(json!({ "name": "deaths" })),
      StatusCode::CREATED,
    )
    .await;

  let body: Value = h
    .json(
      "PUT",
      &format!("/indicateurs/{}", deaths.id),
      Some(json!({ "name": "cases" })),
      StatusCode::CONFLICT,
    )
    .await;
  assert_eq!(body["error"], "indicator name already used");
}

#[tokio::test]
async fn referenced_indicator_delete_is_409() {
  let h = Harness::new().await;
  let i: Indicator = h
    .json(
      "POST",
      "/indicateurs",
      Some(json!({ "name": "cases" })),
      StatusCode::CREATED,
    )
    .await;
  h.seed_datum("2021-01-01", "FRA", "cases").await;

  let uri = format!("/indicateurs/{}", i.id);
  h.json::<Value>("DELETE", &uri, None, StatusCode::CONFLICT).await;
  h.json::<Indicator>("GET", &uri, None, StatusCode::OK).await;
}

// ── Historical data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn datum_create_then_get() {
  let h = Harness::new().await;
  let created: HistoricalDatum = h
    .json(
      "POST",
      "/donnees-historiques",
      Some(json!({
        "date": "2021-03-14",
        "country": "France",
        "iso_code": "FRA",
        "indicator": "cases",
        "value": 1234.5,
        "source": "OWID",
        "population": "67750000",
        "unit": "cases",
        "cases_per_100k": 1.8,
      })),
      StatusCode::CREATED,
    )
    .await;
  assert_eq!(created.date.to_string(), "2021-03-14");
  assert_eq!(created.value, Some(1234.5));
  assert_eq!(created.population, Some(67_750_000));
  assert_eq!(created.deaths_per_100k, None);

  let fetched: HistoricalDatum = h
    .json(
      "GET",
      &format!("/donnees-historiques/{}", created.id),
      None,
      StatusCode::OK,
    )
    .await;
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn datum_requires_date_country_indicator() {
  let h = Harness::new().await;
  let body: Value = h
    .json(
      "POST",
      "/donnees-historiques",
      Some(json!({ "date": "2021-01-01", "indicator": "cases" })),
      StatusCode::BAD_REQUEST,
    )
    .await;
  assert_eq!(body["error"], "date, country and indicator are required");
}

#[tokio::test]
async fn list_paginates_and_counts() {
  let h = Harness::new().await;
  for day in 1..=25 {
    h.seed_datum(&format!("2021-01-{day:02}"), "FRA", "cases").await;
  }

  let page: Page<HistoricalDatum> = h
    .json(
      "GET",
      "/donnees-historiques?limit=10&page=2",
      None,
      StatusCode::OK,
    )
    .await;
  assert_eq!(page.pagination.page, 2);
  assert_eq!(page.pagination.limit, 10);
  assert_eq!(page.pagination.total, 25);
  assert_eq!(page.pagination.pages, 3);
  let dates: Vec<String> = page.data.iter().map(|d| d.date.to_string()).collect();
  assert_eq!(dates.first().unwrap(), "2021-01-15");
  assert_eq!(dates.last().unwrap(), "2021-01-06");

  let defaults: Page<HistoricalDatum> = h
    .json("GET", "/donnees-historiques?page=abc", None, StatusCode::OK)
    .await;
  assert_eq!(defaults.pagination.page, 1);
  assert_eq!(defaults.pagination.limit, 100);
  assert_eq!(defaults.data.len(), 25);
}

#[tokio::test]
async fn filter_by_inclusive_date_range() {
  let h = Harness::new().await;
  for date in ["2020-12-31", "2021-01-01", "2021-01-20", "2021-01-31", "2021-02-01"] {
    h.seed_datum(date, "FRA", "cases").await;
  }

  let page: Page<HistoricalDatum> = h
    .json(
      "GET",
      "/donnees-historiques/filtre?dateDebut=2021-01-01&dateFin=2021-01-31",
      None,
      StatusCode::OK,
    )
    .await;
  let dates: Vec<String> = page.data.iter().map(|d| d.date.to_string()).collect();
  assert_eq!(dates, ["2021-01-31", "2021-01-20", "2021-01-01"]);
  assert_eq!(page.pagination.total, 3);
}

#[tokio::test]
async fn filter_terms_are_conjunctive_and_optional() {
  let h = Harness::new().await;
  h.seed_datum("2021-01-01", "FRA", "cases").await;
  h.seed_datum("2021-01-01", "FRA", "deaths").await;
  h.seed_datum("2021-01-01", "DEU", "cases").await;

  let page: Page<HistoricalDatum> = h
    .json(
      "GET",
      "/donnees-historiques/filtre?iso_code=FRA&indicator=cases&source=",
      None,
      StatusCode::OK,
    )
    .await;
  assert_eq!(page.pagination.total, 1);

  let page: Page<HistoricalDatum> = h
    .json(
      "GET",
      "/donnees-historiques/filtre?pays=France",
      None,
      StatusCode::OK,
    )
    .await;
  assert_eq!(page.pagination.total, 3);
}

#[tokio::test]
async fn malformed_filter_date_is_400() {
  let h = Harness::new().await;
  let resp = h
    .send("GET", "/donnees-historiques/filtre?dateDebut=soon", None)
    .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn by_country_requires_matching_iso() {
  let h = Harness::new().await;
  h.seed_datum("2021-01-01", "FRA", "cases").await;
  h.seed_datum("2021-01-02", "FRA", "deaths").await;
  h.seed_datum("2021-01-03", "DEU", "cases").await;

  let page: Page<HistoricalDatum> = h
    .json(
      "GET",
      "/donnees-historiques/pays/FRA?indicator=deaths",
      None,
      StatusCode::OK,
    )
    .await;
  assert_eq!(page.pagination.total, 1);
  assert_eq!(page.data[0].indicator, "deaths");

  let page: Page<HistoricalDatum> = h
    .json(
      "GET",
      "/donnees-historiques/pays/FRA?dateFin=2021-01-01",
      None,
      StatusCode::OK,
    )
    .await;
  assert_eq!(page.pagination.total, 1);
  assert_eq!(page.data[0].date.to_string(), "2021-01-01");
}

#[tokio::test]
async fn datum_partial_update_policy() {
  let h = Harness::new().await;
  let d = h.seed_datum("2021-01-01", "FRA", "cases").await;
  let uri = format!("/donnees-historiques/{}", d.id);

  let updated: HistoricalDatum = h
    .json("PUT", &uri, Some(json!({ "value": 42 })), StatusCode::OK)
    .await;
  assert_eq!(updated, HistoricalDatum { value: Some(42.0), ..d.clone() });

  let updated: HistoricalDatum = h
    .json("PUT", &uri, Some(json!({ "value": 0 })), StatusCode::OK)
    .await;
  assert_eq!(updated.value, Some(0.0));

  // Falsy values for the truthy-policy fields are ignored.
  let updated: HistoricalDatum = h
    .json(
      "PUT",
      &uri,
      Some(json!({ "country": "", "population": 0, "date": null })),
      StatusCode::OK,
    )
    .await;
  assert_eq!(updated, HistoricalDatum { value: Some(0.0), ..d });
}

#[tokio::test]
async fn empty_population_is_skipped_on_update() {
  let h = Harness::new().await;
  let d = h.seed_datum("2021-01-01", "FRA", "cases").await;
  let uri = format!("/donnees-historiques/{}", d.id);

  let unchanged: HistoricalDatum = h
    .json("PUT", &uri, Some(json!({ "population": "" })), StatusCode::OK)
    .await;
  assert_eq!(unchanged, d);

  let zero: HistoricalDatum = h
    .json("PUT", &uri, Some(json!({ "population": "0" })), StatusCode::OK)
    .await;
  assert_eq!(zero.population, Some(0));
}

#[tokio::test]
async fn empty_population_is_null_on_create() {
  let h = Harness::new().await;
  let created: HistoricalDatum = h
    .json(
      "POST",
      "/donnees-historiques",
      Some(json!({
        "date": "2021-01-01",
        "country": "France",
        "iso_code": "FRA",
        "indicator": "cases",
        "population": "",
      })),
      StatusCode::CREATED,
    )
    .await;
  assert_eq!(created.population, None);
}

#[tokio::test]
async fn delete_datum() {
  let h = Harness::new().await;
  let d = h.seed_datum("2021-01-01", "FRA", "cases").await;
  let uri = format!("/donnees-historiques/{}", d.id);

  assert_eq!(h.send("DELETE", &uri, None).await.status(), StatusCode::NO_CONTENT);
  assert_eq!(h.send("DELETE", &uri, None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_400() {
  let h = Harness::new().await;
  let req = Request::builder()
    .method("POST")
    .uri("/pays")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = api_router(h.store.clone(), ApiOptions::default())
    .oneshot(req)
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = read_json(resp).await;
  assert!(body["error"].is_string());
}

// ── Internal errors ──────────────────────────────────────────────────────────

fn internal_error() -> Response {
  let cause = std::io::Error::other("disk on fire");
  ApiError::Store(Box::new(cause)).into_response()
}

#[tokio::test]
async fn internal_error_hides_detail_by_default() {
  let resp = internal_error();
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = read_json(resp).await;
  assert_eq!(body, json!({ "error": INTERNAL_MESSAGE }));
}

#[tokio::test]
async fn internal_error_detail_exposed_on_request() {
  let resp = expose_internal_error(internal_error()).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = read_json(resp).await;
  assert_eq!(body["message"], "disk on fire");
}
