//! [`SqliteStore`], the SQLite implementation of [`PandemicStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};

use pandemie_core::{
  country::{Country, CountryPatch, NewCountry},
  datum::{HistoricalDatum, HistoricalDatumPatch, NewHistoricalDatum},
  indicator::{Indicator, IndicatorPatch, NewIndicator},
  query::{DatumQuery, Page},
  store::{PandemicStore, Upserted},
};

use crate::{
  Result,
  encode::{
    COUNTRY_COLUMNS, DATUM_COLUMNS, INDICATOR_COLUMNS, RawDatum, country_from_row,
    encode_date, indicator_from_row,
  },
  schema::SCHEMA,
  sql::{Assignments, Filter},
};

fn nullable<T: Into<Value>>(v: Option<T>) -> Value { v.map_or(Value::Null, Into::into) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A pandemic data store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flush and close the underlying connection.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Run a `RETURNING` update built from `assignments`.
  async fn update_returning<T, F>(
    &self,
    table: &'static str,
    id: i64,
    assignments: Assignments,
    returning: &'static str,
    map: F,
  ) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    let (sql, values) = assignments.into_update(table, id, returning);
    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, params_from_iter(values), map)
            .optional()?,
        )
      })
      .await?;
    Ok(row)
  }

  /// `DELETE … WHERE id = ?`, reporting whether a row went away.
  async fn delete_by_id(&self, table: &'static str, id: i64) -> Result<bool> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?)
      })
      .await?;
    Ok(affected > 0)
  }
}

// ─── PandemicStore impl ──────────────────────────────────────────────────────

impl PandemicStore for SqliteStore {
  type Error = crate::Error;

  // ── Countries ─────────────────────────────────────────────────────────────

  async fn list_countries(&self) -> Result<Vec<Country>> {
    let countries = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {COUNTRY_COLUMNS} FROM pays ORDER BY id"))?;
        let rows = stmt
          .query_map([], country_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(countries)
  }

  async fn get_country(&self, id: i64) -> Result<Option<Country>> {
    let country = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COUNTRY_COLUMNS} FROM pays WHERE id = ?1"),
              [id],
              country_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(country)
  }

  async fn get_country_by_iso(&self, iso_code: &str) -> Result<Option<Country>> {
    let iso_code = iso_code.to_owned();
    let country = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COUNTRY_COLUMNS} FROM pays WHERE iso_code = ?1"),
              [iso_code],
              country_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(country)
  }

  async fn create_country(&self, input: NewCountry) -> Result<Country> {
    let country = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO pays (name, iso_code, population) VALUES (?1, ?2, ?3)
             RETURNING {COUNTRY_COLUMNS}"
          ),
          rusqlite::params![input.name, input.iso_code, input.population],
          country_from_row,
        )?)
      })
      .await?;
    Ok(country)
  }

  async fn upsert_country(&self, input: NewCountry) -> Result<Upserted<Country>> {
    let upserted = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO pays (name, iso_code, population) VALUES (?1, ?2, ?3)
           ON CONFLICT (iso_code) DO NOTHING",
          rusqlite::params![input.name, input.iso_code, input.population],
        )?;
        let record = conn.query_row(
          &format!("SELECT {COUNTRY_COLUMNS} FROM pays WHERE iso_code = ?1"),
          [&input.iso_code],
          country_from_row,
        )?;
        Ok(Upserted { record, created: inserted == 1 })
      })
      .await?;
    Ok(upserted)
  }

  async fn update_country(&self, id: i64, patch: CountryPatch) -> Result<Option<Country>> {
    let mut set = Assignments::default();
    set.set_if("name", patch.name);
    set.set_if("iso_code", patch.iso_code);
    set.set_if("population", patch.population.map(nullable));
    self
      .update_returning("pays", id, set, COUNTRY_COLUMNS, country_from_row)
      .await
  }

  async fn delete_country(&self, id: i64) -> Result<bool> {
    self.delete_by_id("pays", id).await
  }

  // ── Indicators ────────────────────────────────────────────────────────────

  async fn list_indicators(&self) -> Result<Vec<Indicator>> {
    let indicators = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {INDICATOR_COLUMNS} FROM indicateurs ORDER BY id"))?;
        let rows = stmt
          .query_map([], indicator_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(indicators)
  }

  async fn get_indicator(&self, id: i64) -> Result<Option<Indicator>> {
    let indicator = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {INDICATOR_COLUMNS} FROM indicateurs WHERE id = ?1"),
              [id],
              indicator_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(indicator)
  }

  async fn get_indicator_by_name(&self, name: &str) -> Result<Option<Indicator>> {
    let name = name.to_owned();
    let indicator = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {INDICATOR_COLUMNS} FROM indicateurs WHERE name = ?1"),
              [name],
              indicator_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(indicator)
  }

  async fn create_indicator(&self, input: NewIndicator) -> Result<Indicator> {
    let indicator = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO indicateurs (name, description) VALUES (?1, ?2)
             RETURNING {INDICATOR_COLUMNS}"
          ),
          rusqlite::params![input.name, input.description],
          indicator_from_row,
        )?)
      })
      .await?;
    Ok(indicator)
  }

  async fn upsert_indicator(&self, input: NewIndicator) -> Result<Upserted<Indicator>> {
    let upserted = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO indicateurs (name, description) VALUES (?1, ?2)
           ON CONFLICT (name) DO NOTHING",
          rusqlite::params![input.name, input.description],
        )?;
        let record = conn.query_row(
          &format!("SELECT {INDICATOR_COLUMNS} FROM indicateurs WHERE name = ?1"),
          [&input.name],
          indicator_from_row,
        )?;
        Ok(Upserted { record, created: inserted == 1 })
      })
      .await?;
    Ok(upserted)
  }

  async fn update_indicator(
    &self,
    id: i64,
    patch: IndicatorPatch,
  ) -> Result<Option<Indicator>> {
    let mut set = Assignments::default();
    set.set_if("name", patch.name);
    set.set_if("description", patch.description.map(nullable));
    self
      .update_returning("indicateurs", id, set, INDICATOR_COLUMNS, indicator_from_row)
      .await
  }

  async fn delete_indicator(&self, id: i64) -> Result<bool> {
    self.delete_by_id("indicateurs", id).await
  }

  // ── Historical data ───────────────────────────────────────────────────────

  async fn list_data(&self, query: &DatumQuery) -> Result<Page<HistoricalDatum>> {
    let filter = Filter::from_query(query);
    let request = query.page;
    let limit = i64::from(request.limit);
    let offset = i64::try_from(request.skip()).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawDatum>) = self
      .conn
      .call(move |conn| {
        let where_clause = filter.where_clause();

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM donnees_historiques {where_clause}"),
          params_from_iter(filter.values.iter()),
          |r| r.get(0),
        )?;

        let mut values = filter.values;
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&format!(
          "SELECT {DATUM_COLUMNS} FROM donnees_historiques
           {where_clause}
           ORDER BY date DESC, id DESC
           LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt
          .query_map(params_from_iter(values), RawDatum::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawDatum::into_datum)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(data, request, total as u64))
  }

  async fn get_datum(&self, id: i64) -> Result<Option<HistoricalDatum>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DATUM_COLUMNS} FROM donnees_historiques WHERE id = ?1"),
              [id],
              RawDatum::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawDatum::into_datum).transpose()
  }

  async fn create_datum(&self, input: NewHistoricalDatum) -> Result<HistoricalDatum> {
    let date_str = encode_date(input.date);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO donnees_historiques (
               date, country, iso_code, indicator, value, source, population,
               unit, cases_per_100k, deaths_per_100k, incidence_7j, growth_rate
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             RETURNING {DATUM_COLUMNS}"
          ),
          rusqlite::params![
            date_str,
            input.country,
            input.iso_code,
            input.indicator,
            input.value,
            input.source,
            input.population,
            input.unit,
            input.cases_per_100k,
            input.deaths_per_100k,
            input.incidence_7j,
            input.growth_rate,
          ],
          RawDatum::from_row,
        )?)
      })
      .await?;
    raw.into_datum()
  }

  async fn update_datum(
    &self,
    id: i64,
    patch: HistoricalDatumPatch,
  ) -> Result<Option<HistoricalDatum>> {
    let mut set = Assignments::default();
    set.set_if("date", patch.date.map(encode_date));
    set.set_if("country", patch.country);
    set.set_if("indicator", patch.indicator);
    set.set_if("population", patch.population);
    set.set_if("iso_code", patch.iso_code.map(nullable));
    set.set_if("value", patch.value.map(nullable));
    set.set_if("source", patch.source.map(nullable));
    set.set_if("unit", patch.unit.map(nullable));
    set.set_if("cases_per_100k", patch.cases_per_100k.map(nullable));
    set.set_if("deaths_per_100k", patch.deaths_per_100k.map(nullable));
    set.set_if("incidence_7j", patch.incidence_7j.map(nullable));
    set.set_if("growth_rate", patch.growth_rate.map(nullable));

    let raw = self
      .update_returning(
        "donnees_historiques",
        id,
        set,
        DATUM_COLUMNS,
        RawDatum::from_row,
      )
      .await?;
    raw.map(RawDatum::into_datum).transpose()
  }

  async fn delete_datum(&self, id: i64) -> Result<bool> {
    self.delete_by_id("donnees_historiques", id).await
  }
}
