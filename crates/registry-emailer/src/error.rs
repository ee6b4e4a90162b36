//! Error types for `registry-emailer`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The queue message has no `email` object.
  #[error("message has no email section: {0}")]
  MissingEmail(String),

  #[error("malformed queue message: {0}")]
  Message(#[from] serde_json::Error),

  #[error("filing {0} not found")]
  FilingNotFound(i64),

  #[error("business {0} not found")]
  BusinessNotFound(String),

  #[error("{0} requires a filing id")]
  MissingFilingId(String),

  #[error("{0} requires an identifier")]
  MissingIdentifier(String),

  #[error("no incorporation application on file for {0}")]
  NoIncorporation(String),

  #[error("failed to read queue: {0}")]
  Io(#[from] std::io::Error),

  #[error("template error: {0}")]
  Template(#[from] minijinja::Error),

  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),

  /// A collaborator answered with a non-success status.
  #[error("{service} returned {status}")]
  Upstream { service: &'static str, status: reqwest::StatusCode },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
