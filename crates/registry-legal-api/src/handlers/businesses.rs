//! Handlers for `/businesses/{identifier}`.

use axum::{Json, extract::State};
use registry_core::store::{ColinStore, LegalStore};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, extract::Path};

/// `GET /businesses/{identifier}`
pub async fn get_one<C, L>(
  State(state): State<AppState<C, L>>,
  Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let business = state
    .colin
    .find_business(&identifier)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{identifier} not found")))?;
  Ok(Json(json!({ "business": business })))
}
