//! Queue worker that turns filing events into notification emails.
//!
//! Each message names a filing (or, for business numbers, a business), the
//! kind of email and a status option. The [`Worker`] resolves the filing,
//! renders the body, fetches the filing PDF from the legal API and posts the
//! result to the notify service with a service-account token.

pub mod client;
pub mod error;
pub mod message;
pub mod processors;
pub mod templates;
pub mod worker;

use std::path::PathBuf;

use serde::Deserialize;

pub use client::ServiceConfig;
pub use error::{Error, Result};
pub use worker::{Outcome, Worker, run};

/// Runtime configuration, deserialised from `config.toml` and `EMAILER_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailerConfig {
  pub colin_db_path: PathBuf,
  pub legal_db_path: PathBuf,
  #[serde(flatten)]
  pub services:      ServiceConfig,
}

#[cfg(test)]
mod tests;
