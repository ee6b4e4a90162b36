//! Error types for `registry-core`.

use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("filing schema could not be loaded: {0}")]
  Schema(String),

  #[error("unknown filing type: {0:?}")]
  UnknownFilingType(String),

  #[error("unknown filing status: {0:?}")]
  UnknownFilingStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
