//! JSON REST API for the pandemic data store.
//!
//! Exposes an axum [`Router`] backed by any
//! [`pandemie_core::store::PandemicStore`]. TLS, CORS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", pandemie_api::api_router(store.clone(), ApiOptions::default()))
//! ```

pub mod donnees;
pub mod error;
pub mod indicateurs;
pub mod pays;

mod params;

use std::sync::Arc;

use axum::{
  Json,
  Router,
  middleware,
  response::{IntoResponse, Response},
  routing::get,
};
use pandemie_core::store::PandemicStore;
use serde_json::json;

pub use error::ApiError;
use error::{INTERNAL_MESSAGE, InternalErrorDetail};

/// Behaviour switches for [`api_router`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiOptions {
  /// Attach the underlying error message to 500 responses. Meant for
  /// development only.
  pub expose_internal_errors: bool,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, options: ApiOptions) -> Router<()>
where
  S: PandemicStore + 'static,
{
  let router = Router::new()
    // Countries
    .route("/pays", get(pays::list::<S>).post(pays::create::<S>))
    .route(
      "/pays/{id}",
      get(pays::get_one::<S>)
        .put(pays::update::<S>)
        .delete(pays::delete_one::<S>),
    )
    .route("/pays/iso/{code}", get(pays::get_by_iso::<S>))
    // Indicators
    .route(
      "/indicateurs",
      get(indicateurs::list::<S>).post(indicateurs::create::<S>),
    )
    .route(
      "/indicateurs/{id}",
      get(indicateurs::get_one::<S>)
        .put(indicateurs::update::<S>)
        .delete(indicateurs::delete_one::<S>),
    )
    .route("/indicateurs/nom/{nom}", get(indicateurs::get_by_name::<S>))
    // Historical data
    .route(
      "/donnees-historiques",
      get(donnees::list::<S>).post(donnees::create::<S>),
    )
    .route("/donnees-historiques/filtre", get(donnees::filter::<S>))
    .route(
      "/donnees-historiques/pays/{iso_code}",
      get(donnees::by_country::<S>),
    )
    .route(
      "/donnees-historiques/{id}",
      get(donnees::get_one::<S>)
        .put(donnees::update::<S>)
        .delete(donnees::delete_one::<S>),
    )
    .with_state(store);

  if options.expose_internal_errors {
    router.layer(middleware::map_response(expose_internal_error))
  } else {
    router
  }
}

/// Rewrite a 500 body to include the message stashed by [`ApiError`].
async fn expose_internal_error(mut res: Response) -> Response {
  match res.extensions_mut().remove::<InternalErrorDetail>() {
    Some(InternalErrorDetail(message)) => (
      res.status(),
      Json(json!({ "error": INTERNAL_MESSAGE, "message": message })),
    )
      .into_response(),
    None => res,
  }
}

#[cfg(test)]
mod tests;
