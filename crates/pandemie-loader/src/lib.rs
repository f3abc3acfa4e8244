//! Batch loader for the processed ETL CSV files.
//!
//! Loads the country and indicator dimensions first, then appends every fact
//! row. Dimension rows are upserted (an existing row is never modified); fact
//! rows are always inserted, so re-running a load duplicates them.
//!
//! Nothing is wrapped in a transaction: the first error aborts the load and
//! whatever was inserted before it stays.

pub mod error;

use std::{
  fs::File,
  io,
  path::{Path, PathBuf},
};

use pandemie_core::{
  country::{NewCountry, is_iso_code},
  datum::NewHistoricalDatum,
  indicator::NewIndicator,
  parse::{parse_date, parse_integer, parse_measure},
  store::PandemicStore,
};
use pandemie_store_sqlite::SqliteStore;
use serde::Deserialize;

pub use error::{Error, Result};

/// Text columns longer than this are reported before insertion.
pub const LONG_TEXT_THRESHOLD: usize = 200;

/// Per-file outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
  /// Rows written to the store.
  pub inserted: u64,
  /// Dimension rows that already existed and were left untouched.
  pub existing: u64,
  /// Records rejected by validation.
  pub skipped:  u64,
}

/// The files of one load, in the order they are read.
#[derive(Debug, Clone)]
pub struct LoadPlan {
  pub countries:  PathBuf,
  pub indicators: PathBuf,
  pub facts:      Vec<PathBuf>,
}

impl LoadPlan {
  /// Resolve every file name against `dir`.
  pub fn in_dir(
    dir: &Path,
    countries: &Path,
    indicators: &Path,
    facts: &[PathBuf],
  ) -> Self {
    Self {
      countries:  dir.join(countries),
      indicators: dir.join(indicators),
      facts:      facts.iter().map(|f| dir.join(f)).collect(),
    }
  }
}

// ─── Records ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CountryRecord {
  country:    Option<String>,
  iso_code:   Option<String>,
  population: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndicatorRecord {
  indicator_name: Option<String>,
  description:    Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FactRecord {
  date:            Option<String>,
  country:         Option<String>,
  value:           Option<String>,
  indicator:       Option<String>,
  source:          Option<String>,
  iso_code:        Option<String>,
  population:      Option<String>,
  unit:            Option<String>,
  cases_per_100k:  Option<String>,
  deaths_per_100k: Option<String>,
  incidence_7j:    Option<String>,
  growth_rate:     Option<String>,
}

fn reader<R: io::Read>(input: R) -> csv::Reader<R> {
  csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(input)
}

fn measure(field: Option<&str>) -> Result<Option<f64>> {
  Ok(field.map(parse_measure).transpose()?)
}

fn integer(field: Option<&str>) -> Result<Option<i64>> {
  Ok(field.map(parse_integer).transpose()?)
}

/// Open a CSV file for one of the `load_*` functions.
pub fn open(path: &Path) -> Result<File> {
  File::open(path).map_err(|source| Error::Io { path: path.to_owned(), source })
}

// ─── Loaders ──────────────────────────────────────────────────────────────────

/// Upsert countries from `country,iso_code,population` records.
pub async fn load_countries<S, R>(store: &S, input: R) -> Result<LoadReport>
where
  S: PandemicStore,
  R: io::Read,
{
  let mut report = LoadReport::default();
  for record in reader(input).deserialize() {
    let record: CountryRecord = record?;
    let name = record.country.unwrap_or_default();
    let iso_code = match record.iso_code {
      Some(code) if is_iso_code(&code) => code,
      code => {
        tracing::warn!(country = %name, iso_code = ?code, "skipping country without a valid ISO code");
        report.skipped += 1;
        continue;
      }
    };
    let population = integer(record.population.as_deref())?;

    let upserted = store
      .upsert_country(NewCountry { name, iso_code, population })
      .await
      .map_err(Error::store)?;
    if upserted.created {
      report.inserted += 1;
    } else {
      report.existing += 1;
    }
  }
  Ok(report)
}

/// Upsert indicators from `indicator_name,description` records.
pub async fn load_indicators<S, R>(store: &S, input: R) -> Result<LoadReport>
where
  S: PandemicStore,
  R: io::Read,
{
  let mut report = LoadReport::default();
  for record in reader(input).deserialize() {
    let record: IndicatorRecord = record?;
    let Some(name) = record.indicator_name else {
      tracing::warn!("skipping indicator without a name");
      report.skipped += 1;
      continue;
    };

    let upserted = store
      .upsert_indicator(NewIndicator { name, description: record.description })
      .await
      .map_err(Error::store)?;
    if upserted.created {
      report.inserted += 1;
    } else {
      report.existing += 1;
    }
  }
  Ok(report)
}

/// Append one datum per valid fact record.
pub async fn load_facts<S, R>(store: &S, input: R) -> Result<LoadReport>
where
  S: PandemicStore,
  R: io::Read,
{
  let mut report = LoadReport::default();
  for (line, record) in reader(input).deserialize().enumerate() {
    let record: FactRecord = record?;
    let Some(datum) = fact_to_datum(record)? else {
      tracing::warn!(record = line + 1, "skipping incomplete fact record");
      report.skipped += 1;
      continue;
    };
    warn_long_text(line + 1, &datum);

    store.create_datum(datum).await.map_err(Error::store)?;
    report.inserted += 1;
  }
  Ok(report)
}

/// `None` when a required column is missing.
fn fact_to_datum(record: FactRecord) -> Result<Option<NewHistoricalDatum>> {
  let (Some(date), Some(country), Some(iso_code), Some(indicator)) =
    (record.date, record.country, record.iso_code, record.indicator)
  else {
    return Ok(None);
  };
  if !is_iso_code(&iso_code) {
    return Ok(None);
  }

  Ok(Some(NewHistoricalDatum {
    date: parse_date(&date)?,
    country,
    iso_code: Some(iso_code),
    indicator,
    value: measure(record.value.as_deref())?,
    source: record.source,
    population: integer(record.population.as_deref())?,
    unit: record.unit,
    cases_per_100k: measure(record.cases_per_100k.as_deref())?,
    deaths_per_100k: measure(record.deaths_per_100k.as_deref())?,
    incidence_7j: measure(record.incidence_7j.as_deref())?,
    growth_rate: measure(record.growth_rate.as_deref())?,
  }))
}

// ─── Whole load ───────────────────────────────────────────────────────────────

/// Load every file of `plan`, stopping at the first error.
pub async fn load_all<S: PandemicStore>(store: &S, plan: &LoadPlan) -> Result<()> {
  let path = &plan.countries;
  let report = load_countries(store, open(path)?).await;
  log_report(path, report)?;

  let path = &plan.indicators;
  let report = load_indicators(store, open(path)?).await;
  log_report(path, report)?;

  for path in &plan.facts {
    let report = load_facts(store, open(path)?).await;
    log_report(path, report)?;
  }
  Ok(())
}

/// [`load_all`], then close `store` whether or not the load succeeded.
/// The load error wins over a close error.
pub async fn run(store: SqliteStore, plan: &LoadPlan) -> Result<()> {
  let loaded = load_all(&store, plan).await;
  let closed = store.close().await.map_err(Error::store);
  loaded?;
  closed
}

fn log_report(path: &Path, report: Result<LoadReport>) -> Result<()> {
  let report = report
    .inspect_err(|e| tracing::error!(file = %path.display(), error = %e, "load failed"))?;
  tracing::info!(
    file = %path.display(),
    inserted = report.inserted,
    existing = report.existing,
    skipped = report.skipped,
    "file loaded"
  );
  Ok(())
}

fn warn_long_text(record: usize, datum: &NewHistoricalDatum) {
  let fields = [
    ("country", Some(datum.country.as_str())),
    ("indicator", Some(datum.indicator.as_str())),
    ("source", datum.source.as_deref()),
    ("unit", datum.unit.as_deref()),
  ];
  for (field, text) in fields {
    let len = text.map_or(0, |t| t.chars().count());
    if len > LONG_TEXT_THRESHOLD {
      tracing::warn!(record, field, len, "unusually long text column");
    }
  }
}
