use std::sync::Arc;

use axum::{Json, extract::State};
use registry_core::store::ColinStore;
use serde_json::{Value, json};

use crate::{error::ApiError, extract::Path};

/// `GET /businesses/{identifier}`
pub async fn get_one<C>(
  State(colin): State<Arc<C>>,
  Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
{
  let business = colin
    .find_business(&identifier)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{identifier} not found")))?;
  Ok(Json(json!({ "business": business })))
}
