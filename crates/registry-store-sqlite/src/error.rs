//! Error type for `registry-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] registry_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown address type: {0:?}")]
  UnknownAddressType(String),

  #[error("corporation not found: {0}")]
  CorporationNotFound(String),

  /// Undoing events failed part-way; nothing was committed.
  #[error("failed to reset corporation {corp_num}: {source}")]
  ResetCorporation {
    corp_num: String,
    #[source]
    source:   rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
