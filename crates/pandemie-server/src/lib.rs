//! HTTP front for the pandemic data API.
//!
//! Wraps [`pandemie_api::api_router`] under `/api`, adds the welcome route at
//! the root, permissive CORS and per-request tracing spans.

use std::{collections::HashMap, path::Path, sync::Arc};

use axum::{Json, Router, routing::get};
use config::{Config, ConfigError, Environment, File};
use pandemie_api::{ApiOptions, api_router};
use pandemie_core::store::PandemicStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const WELCOME_MESSAGE: &str = "Welcome to the pandemic data API";

const SQLITE_SCHEME: &str = "sqlite://";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub database_url: String,
  pub environment:  String,
}

impl ServerConfig {
  /// `true` when 500 responses should carry the underlying error message.
  pub fn is_development(&self) -> bool { self.environment == "development" }

  /// Filesystem path of the SQLite database.
  pub fn store_path(&self) -> &str {
    self
      .database_url
      .strip_prefix(SQLITE_SCHEME)
      .unwrap_or(&self.database_url)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Load configuration from `path` (optional) and the process environment.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
  build_config(path, std::env::vars().collect())
}

/// Layering, lowest first: defaults, TOML file, `PANDEMIE_*` variables, then
/// `PORT`, `DATABASE_URL` and `NODE_ENV`.
pub fn build_config(
  path: &Path,
  vars: HashMap<String, String>,
) -> Result<ServerConfig, ConfigError> {
  let overrides = [
    ("port", "PORT"),
    ("database_url", "DATABASE_URL"),
    ("environment", "NODE_ENV"),
  ];

  let mut builder = Config::builder()
    .set_default("host", "0.0.0.0")?
    .set_default("port", 3000_i64)?
    .set_default("database_url", "pandemie.db")?
    .set_default("environment", "production")?
    .add_source(File::from(path).required(false))
    .add_source(
      Environment::with_prefix("PANDEMIE")
        .try_parsing(true)
        .source(Some(vars.clone())),
    );
  for (key, var) in overrides {
    let value = vars.get(var).filter(|v| !v.is_empty()).cloned();
    builder = builder.set_override_option(key, value)?;
  }

  builder.build()?.try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: PandemicStore + 'static,
{
  let options = ApiOptions {
    expose_internal_errors: config.is_development(),
  };
  Router::new()
    .route("/", get(welcome))
    .nest("/api", api_router(store, options))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

async fn welcome() -> Json<Value> { Json(json!({ "message": WELCOME_MESSAGE })) }
