//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every variant renders a JSON body. Store and upstream failures are logged
//! here, once, as they leave the service.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use registry_core::validation::ErrorDetail;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// No or bad credentials.
  #[error("unauthenticated")]
  Unauthenticated,

  /// Authenticated, but not allowed to do this.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("filing is invalid")]
  Validation(Vec<ErrorDetail>),

  /// The filing was saved but could not be invoiced. Carries the filing
  /// document returned to the caller.
  #[error("payment required")]
  PaymentRequired(Value),

  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "message": message.into() }))).into_response()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthenticated => {
        let mut res = message(StatusCode::UNAUTHORIZED, "Unauthorized");
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"legal-api\""),
        );
        res
      }
      ApiError::Unauthorized(m) => message(StatusCode::UNAUTHORIZED, m),
      ApiError::Forbidden(m) => message(StatusCode::FORBIDDEN, m),
      ApiError::NotFound(m) => message(StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => message(StatusCode::BAD_REQUEST, m),
      ApiError::Validation(errors) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
      }
      ApiError::PaymentRequired(mut filing) => {
        if let Some(obj) = filing.as_object_mut() {
          obj.insert(
            "errors".into(),
            json!([{ "message": "unable to create invoice for payment." }]),
          );
        }
        (StatusCode::PAYMENT_REQUIRED, Json(filing)).into_response()
      }
      ApiError::Upstream(m) => {
        tracing::error!(error = %m, "upstream service failed");
        message(StatusCode::INTERNAL_SERVER_ERROR, m)
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    }
  }
}
