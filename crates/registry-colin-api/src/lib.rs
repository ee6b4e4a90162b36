//! HTTP adapter over the legacy COLIN database.
//!
//! Exposes an axum [`Router`] backed by any [`ColinStore`]. The adapter is
//! internal to the registry network and carries no authentication.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/v1/businesses/{identifier}` | 404 if unknown |
//! | `GET`  | `/api/v1/businesses/{identifier}/filings/annual_report` | Optional `?year=YYYY` |
//! | `POST` | `/api/v1/businesses/{identifier}/filings/annual_report` | Files an AR |
//! | `POST` | `/api/v1/reset` | Body: `{"events": [...]}`; 204 |

pub mod error;
pub mod extract;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use registry_core::store::ColinStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Runtime configuration, deserialised from `config.toml` and `COLIN_API_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ColinApiConfig {
  pub host:    String,
  pub port:    u16,
  pub db_path: PathBuf,
}

/// Build the COLIN adapter router for `store`.
pub fn router<C>(store: Arc<C>) -> Router
where
  C: ColinStore + 'static,
{
  use handlers::{annual_report, businesses, reset};

  let api = Router::new()
    .route("/businesses/{identifier}", get(businesses::get_one::<C>))
    .route(
      "/businesses/{identifier}/filings/annual_report",
      get(annual_report::get_one::<C>).post(annual_report::post::<C>),
    )
    .route("/reset", post(reset::handler::<C>));

  Router::new()
    .nest("/api/v1", api)
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}
