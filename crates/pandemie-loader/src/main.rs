//! pandemie-loader binary.
//!
//! Loads the processed CSV files into the SQLite store in dependency order:
//! countries, indicators, then each fact file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use pandemie_loader::{LoadPlan, run};
use pandemie_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Load processed pandemic CSV files")]
struct Cli {
  /// SQLite database path; a `sqlite://` prefix is accepted.
  #[arg(long, env = "DATABASE_URL", default_value = "pandemie.db")]
  database_url: String,

  /// Directory holding the processed CSV files.
  #[arg(long, env = "PANDEMIE_DATA_DIR", default_value = "ETL/processed")]
  data_dir: PathBuf,

  /// Country dimension file, relative to the data directory.
  #[arg(long, default_value = "dim_country.csv")]
  countries: PathBuf,

  /// Indicator dimension file, relative to the data directory.
  #[arg(long, default_value = "dim_indicator.csv")]
  indicators: PathBuf,

  /// Fact files, relative to the data directory, loaded in order.
  #[arg(
    long = "facts",
    num_args = 1..,
    default_values = ["fact_covid_history.csv", "fact_mpox_history.csv"]
  )]
  facts: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let db_path = cli
    .database_url
    .strip_prefix("sqlite://")
    .unwrap_or(&cli.database_url);
  let store = SqliteStore::open(db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  let plan = LoadPlan::in_dir(&cli.data_dir, &cli.countries, &cli.indicators, &cli.facts);
  run(store, &plan).await.context("load failed")?;
  tracing::info!("load complete");

  Ok(())
}
