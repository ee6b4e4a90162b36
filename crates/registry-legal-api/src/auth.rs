//! HTTP Basic-auth extractor and account model.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use registry_core::store::{ColinStore, LegalStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Role allowed to file for any business.
pub const STAFF_ROLE: &str = "staff";

/// Role of the legacy synchronisation job.
pub const COLIN_ROLE: &str = "colin";

/// One account allowed to call the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub roles:         Vec<String>,
  /// Identifiers of the businesses this account may file for.
  #[serde(default)]
  pub businesses:    Vec<String>,
}

impl Account {
  pub fn has_role(&self, role: &str) -> bool { self.roles.iter().any(|r| r == role) }

  pub fn may_file_for(&self, identifier: &str) -> bool {
    self.has_role(STAFF_ROLE) || self.businesses.iter().any(|b| b == identifier)
  }
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub accounts: Vec<Account>,
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Account);

/// Check Basic credentials in `headers` against the configured accounts.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Account, ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthenticated)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthenticated)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthenticated)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthenticated)?;

  let account = config
    .accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(ApiError::Unauthenticated)?;

  let parsed_hash =
    PasswordHash::new(&account.password_hash).map_err(|_| ApiError::Unauthenticated)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthenticated)?;

  Ok(account.clone())
}

impl<C, L> FromRequestParts<AppState<C, L>> for Authenticated
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<C, L>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(Authenticated)
  }
}
