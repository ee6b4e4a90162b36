use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use registry_core::{reset::EventInfo, store::ColinStore};
use serde::Deserialize;

use crate::{error::ApiError, extract::JsonBody};

#[derive(Debug, Deserialize)]
pub struct ResetBody {
  pub events: Vec<EventInfo>,
}

/// `POST /reset`, body `{"events": [{"corpNum": "CP0001965", "eventId": 1}]}`
///
/// Undoes the listed events in one transaction.
pub async fn handler<C>(
  State(colin): State<Arc<C>>,
  JsonBody(body): JsonBody<ResetBody>,
) -> Result<StatusCode, ApiError>
where
  C: ColinStore,
{
  if body.events.is_empty() {
    return Ok(StatusCode::NO_CONTENT);
  }
  let count = body.events.len();
  colin.reset(body.events).await.map_err(ApiError::store)?;
  tracing::info!(count, "events reset");
  Ok(StatusCode::NO_CONTENT)
}
