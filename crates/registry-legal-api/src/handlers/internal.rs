//! Handlers for `/internal/filings`, used by the job that replays filings
//! into COLIN and by the job that pulls COLIN events back.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
};
use registry_core::{
  filing::Filing,
  store::{ColinStore, LegalStore},
};
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{Authenticated, COLIN_ROLE},
  error::ApiError,
  extract::Path,
};

/// `GET /internal/filings`: completed filings not yet in COLIN.
pub async fn pending<C, L>(
  State(state): State<AppState<C, L>>,
) -> Result<Json<Vec<Value>>, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let filings = state.legal.pending_colin_filings().await.map_err(ApiError::store)?;
  Ok(Json(filings.iter().map(Filing::json).collect()))
}

/// `PATCH /internal/filings/{filing_id}` with body `{"colinId": n}`. A
/// missing or unreadable body counts as a missing `colinId`.
pub async fn set_colin_id<C, L>(
  State(state): State<AppState<C, L>>,
  Authenticated(_): Authenticated,
  Path(filing_id): Path<i64>,
  body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  let colin_id = serde_json::from_slice::<Value>(&body)
    .ok()
    .and_then(|doc| doc.get("colinId").and_then(Value::as_i64))
    .ok_or_else(|| ApiError::BadRequest(format!("No colin id set for {filing_id}.")))?;

  let filing = state
    .legal
    .set_colin_event_id(filing_id, colin_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{filing_id} no filings found")))?;

  tracing::info!(filing_id, colin_id, "filing linked to colin event");
  Ok((StatusCode::ACCEPTED, Json(filing.json())))
}

/// `GET /internal/filings/colin_id`: the newest sync watermark.
pub async fn max_colin_id<C, L>(
  State(state): State<AppState<C, L>>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let max_id = state
    .legal
    .last_colin_event_id()
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("No colin ids found".into()))?;
  Ok(Json(json!({ "maxId": max_id })))
}

/// `GET /internal/filings/colin_id/{colin_id}`
pub async fn get_colin_id<C, L>(
  State(state): State<AppState<C, L>>,
  Path(colin_id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let found = state
    .legal
    .find_colin_event_id(colin_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("No colin ids found".into()))?;
  Ok(Json(json!({ "colinId": found })))
}

/// `POST /internal/filings/colin_id/{colin_id}`: advance the watermark.
pub async fn record_colin_id<C, L>(
  State(state): State<AppState<C, L>>,
  Authenticated(account): Authenticated,
  Path(colin_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  if !account.has_role(COLIN_ROLE) {
    return Err(ApiError::Unauthorized("You are not authorized to update this table".into()));
  }
  state
    .legal
    .record_colin_event_id(colin_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(json!({ "maxId": colin_id }))))
}
