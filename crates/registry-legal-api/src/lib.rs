//! The legal API: business lookup, filing submission and the internal
//! endpoints used to keep the legacy COLIN database in step.
//!
//! Exposes an axum [`Router`] generic over any [`ColinStore`] and
//! [`LegalStore`]. Every route lives under `/api/v1`.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod payment;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch},
};
use registry_core::store::{ColinStore, LegalStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{Account, AuthConfig};
use payment::PaymentClient;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `LEGAL_API_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct LegalApiConfig {
  pub host:          String,
  pub port:          u16,
  pub colin_db_path: PathBuf,
  pub legal_db_path: PathBuf,
  /// Invoice endpoint of the payment service.
  pub payment_url:   String,
  /// Bearer token of the service account used for invoicing.
  pub payment_token: String,
  #[serde(default)]
  pub accounts:      Vec<Account>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<C, L> {
  pub colin:   Arc<C>,
  pub legal:   Arc<L>,
  pub payment: Arc<PaymentClient>,
  pub auth:    Arc<AuthConfig>,
}

// Derived Clone would require `C: Clone` and `L: Clone`.
impl<C, L> Clone for AppState<C, L> {
  fn clone(&self) -> Self {
    Self {
      colin:   self.colin.clone(),
      legal:   self.legal.clone(),
      payment: self.payment.clone(),
      auth:    self.auth.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the legal API router for `state`.
pub fn router<C, L>(state: AppState<C, L>) -> Router
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  use handlers::{businesses, filings, internal};

  let api = Router::new()
    // Businesses
    .route("/businesses/{identifier}", get(businesses::get_one::<C, L>))
    // Filings
    .route(
      "/businesses/{identifier}/filings",
      get(filings::list::<C, L>)
        .post(filings::post_new::<C, L>)
        .put(filings::put_new::<C, L>),
    )
    .route(
      "/businesses/{identifier}/filings/{filing_id}",
      get(filings::get_one::<C, L>)
        .post(filings::post_existing::<C, L>)
        .put(filings::put_existing::<C, L>),
    )
    // Legacy synchronisation
    .route("/internal/filings", get(internal::pending::<C, L>))
    .route(
      "/internal/filings/colin_id",
      get(internal::max_colin_id::<C, L>),
    )
    .route(
      "/internal/filings/colin_id/{colin_id}",
      get(internal::get_colin_id::<C, L>).post(internal::record_colin_id::<C, L>),
    )
    .route(
      "/internal/filings/{filing_id}",
      patch(internal::set_colin_id::<C, L>),
    );

  Router::new()
    .nest("/api/v1", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
