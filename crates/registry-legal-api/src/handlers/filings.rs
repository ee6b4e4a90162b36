//! Handlers for `/businesses/{identifier}/filings`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/filings` | Completed filings only |
//! | `GET`  | `/filings/{filing_id}` | 404 if not found |
//! | `POST` | `/filings` | Creates; 201 |
//! | `PUT`  | `/filings/{filing_id}` | Replaces; 202 |
//!
//! `POST` with a filing id and `PUT` without one are rejected with 403.
//! Both submission verbs accept `?only_validate=true` and `?draft=true`.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::{Method, StatusCode},
};
use registry_core::{
  Error as CoreError,
  business::Business,
  filing::{Filing, FilingStatus, NewFiling, business_section, filed_addresses},
  store::{ColinStore, LegalStore},
  validation,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{Account, Authenticated},
  error::ApiError,
  extract::{Path, Query},
  payment::{InvoiceRequest, PaymentError},
};

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /businesses/{identifier}/filings`
pub async fn list<C, L>(
  State(state): State<AppState<C, L>>,
  Path(identifier): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let Some(legal) = state
    .legal
    .find_business(&identifier)
    .await
    .map_err(ApiError::store)?
  else {
    // Known to COLIN but never filed on through this API.
    state
      .colin
      .find_business(&identifier)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound(format!("{identifier} not found")))?;
    return Ok(Json(json!({ "filings": [] })));
  };

  let filings = state
    .legal
    .list_filings(legal.id, vec![FilingStatus::Completed])
    .await
    .map_err(ApiError::store)?;
  let filings: Vec<Value> = filings.iter().map(Filing::json).collect();
  Ok(Json(json!({ "filings": filings })))
}

/// `GET /businesses/{identifier}/filings/{filing_id}`
pub async fn get_one<C, L>(
  State(state): State<AppState<C, L>>,
  Path((identifier, filing_id)): Path<(String, i64)>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let filing = owned_filing(&state, &identifier, filing_id).await?;
  Ok(Json(filing.json()))
}

/// The filing `filing_id`, provided it belongs to `identifier`.
async fn owned_filing<C, L>(
  state: &AppState<C, L>,
  identifier: &str,
  filing_id: i64,
) -> Result<Filing, ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let not_found = || ApiError::NotFound(format!("{identifier} no filings found"));

  let legal = state
    .legal
    .find_business(identifier)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  state
    .legal
    .get_filing(filing_id)
    .await
    .map_err(ApiError::store)?
    .filter(|f| f.business_id == legal.id)
    .ok_or_else(not_found)
}

// ─── Submit ───────────────────────────────────────────────────────────────────

/// Flags are on when their value is `true` in any case; any other value
/// leaves them off.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
  pub only_validate: Option<String>,
  pub draft:         Option<String>,
}

impl SubmitParams {
  pub fn only_validate(&self) -> bool { flag(self.only_validate.as_deref()) }

  pub fn draft(&self) -> bool { flag(self.draft.as_deref()) }
}

fn flag(value: Option<&str>) -> bool { value.is_some_and(|v| v.eq_ignore_ascii_case("true")) }

/// `POST /businesses/{identifier}/filings`
pub async fn post_new<C, L>(
  State(state): State<AppState<C, L>>,
  Authenticated(account): Authenticated,
  Path(identifier): Path<String>,
  Query(params): Query<SubmitParams>,
  body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  let req = Submission { method: Method::POST, identifier, filing_id: None, params };
  submit(&state, &account, req, &body).await
}

/// `POST /businesses/{identifier}/filings/{filing_id}`, always rejected.
pub async fn post_existing<C, L>(
  State(state): State<AppState<C, L>>,
  Authenticated(account): Authenticated,
  Path((identifier, filing_id)): Path<(String, i64)>,
  Query(params): Query<SubmitParams>,
  body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  let req = Submission {
    method: Method::POST,
    identifier,
    filing_id: Some(filing_id),
    params,
  };
  submit(&state, &account, req, &body).await
}

/// `PUT /businesses/{identifier}/filings`, always rejected.
pub async fn put_new<C, L>(
  State(state): State<AppState<C, L>>,
  Authenticated(account): Authenticated,
  Path(identifier): Path<String>,
  Query(params): Query<SubmitParams>,
  body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  let req = Submission { method: Method::PUT, identifier, filing_id: None, params };
  submit(&state, &account, req, &body).await
}

/// `PUT /businesses/{identifier}/filings/{filing_id}`
pub async fn put_existing<C, L>(
  State(state): State<AppState<C, L>>,
  Authenticated(account): Authenticated,
  Path((identifier, filing_id)): Path<(String, i64)>,
  Query(params): Query<SubmitParams>,
  body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore + 'static,
  L: LegalStore + 'static,
{
  let req = Submission {
    method: Method::PUT,
    identifier,
    filing_id: Some(filing_id),
    params,
  };
  submit(&state, &account, req, &body).await
}

struct Submission {
  method:     Method,
  identifier: String,
  filing_id:  Option<i64>,
  params:     SubmitParams,
}

async fn submit<C, L>(
  state: &AppState<C, L>,
  account: &Account,
  req: Submission,
  body: &[u8],
) -> Result<(StatusCode, Json<Value>), ApiError>
where
  C: ColinStore,
  L: LegalStore,
{
  let identifier = req.identifier.as_str();

  let doc: Value = serde_json::from_slice(body)
    .ok()
    .filter(|v: &Value| v.as_object().is_some_and(|o| !o.is_empty()))
    .ok_or_else(|| {
      ApiError::BadRequest(format!("No filing json data in body of post for {identifier}."))
    })?;

  match (&req.method, req.filing_id) {
    (&Method::POST, Some(_)) => {
      return Err(ApiError::Forbidden(format!(
        "Illegal to attempt to create a new filing over an existing filing for {identifier}."
      )));
    }
    (&Method::PUT, None) => {
      return Err(ApiError::Forbidden(format!(
        "Illegal to attempt to update a filing without a filing id for {identifier}."
      )));
    }
    _ => {}
  }

  check_embedded_identifier(&doc, identifier)?;

  if !account.may_file_for(identifier) {
    return Err(ApiError::Unauthorized(format!(
      "You are not authorized to submit a filing for {identifier}."
    )));
  }

  let business = state
    .colin
    .find_business(identifier)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{identifier} not found")))?;

  validate(&business, &doc)?;
  if req.params.only_validate() {
    return Ok((StatusCode::OK, Json(json!({ "message": "Filing is valid" }))));
  }

  let legal = state.legal.upsert_business(&business).await.map_err(ApiError::store)?;
  let draft = req.params.draft();
  let status = if draft { FilingStatus::Draft } else { FilingStatus::Pending };

  let mut filing = match req.filing_id {
    None => state
      .legal
      .create_filing(NewFiling {
        business_id: legal.id,
        filing_json: doc.clone(),
        status,
        submitter: Some(account.username.clone()),
      })
      .await
      .map_err(ApiError::store)?,
    Some(filing_id) => {
      owned_filing(state, identifier, filing_id).await?;
      state
        .legal
        .update_filing(filing_id, doc.clone(), status, Some(account.username.clone()))
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::NotFound(format!("{identifier} no filings found")))?
    }
  };
  tracing::info!(
    %identifier,
    filing_id = filing.id,
    status = filing.status.as_str(),
    "filing saved"
  );

  if !draft {
    for address in filed_addresses(&doc) {
      state
        .legal
        .set_address(legal.id, address)
        .await
        .map_err(ApiError::store)?;
    }
    let mailing = state.legal.mailing_address(legal.id).await.map_err(ApiError::store)?;
    let invoice = InvoiceRequest::new(&legal, mailing, &doc);
    match state.payment.create_invoice(&invoice).await {
      Ok(Some(token)) => {
        state
          .legal
          .set_payment_token(filing.id, token.clone())
          .await
          .map_err(ApiError::store)?;
        filing.payment_token = Some(token);
      }
      Ok(None) => {}
      Err(PaymentError::Connection(e)) => {
        tracing::warn!(%identifier, filing_id = filing.id, error = %e, "invoice not created");
        return Err(ApiError::PaymentRequired(filing.json()));
      }
      Err(e) => return Err(ApiError::Upstream(e.to_string())),
    }
  }

  let code = if req.method == Method::PUT { StatusCode::ACCEPTED } else { StatusCode::CREATED };
  Ok((code, Json(filing.json())))
}

/// An embedded business section, when present, must be non-empty and name
/// the business in the URL.
fn check_embedded_identifier(doc: &Value, identifier: &str) -> Result<(), ApiError> {
  let Some(section) = business_section(doc) else {
    return Ok(());
  };
  if section.as_object().is_none_or(|o| o.is_empty()) {
    return Err(ApiError::BadRequest("Error: Invalid Filing schema".into()));
  }
  match section.get("identifier").and_then(Value::as_str) {
    Some(embedded) if embedded != identifier => Err(ApiError::BadRequest(
      "Error: Identifier in URL does not match identifier in filing data".into(),
    )),
    _ => Ok(()),
  }
}

fn validate(business: &Business, doc: &Value) -> Result<(), ApiError> {
  match validation::validate(business, doc) {
    Ok(()) => Ok(()),
    Err(CoreError::Validation(v)) => Err(ApiError::Validation(v.errors)),
    Err(e) => Err(ApiError::store(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_are_case_insensitive() {
    let params = SubmitParams { only_validate: Some("TRUE".into()), draft: Some("True".into()) };
    assert!(params.only_validate());
    assert!(params.draft());

    let params = SubmitParams { only_validate: Some("1".into()), draft: Some("false".into()) };
    assert!(!params.only_validate());
    assert!(!params.draft());
    assert!(!SubmitParams::default().draft());
  }

  #[test]
  fn embedded_identifier_rules() {
    let ok = json!({"filing": {"business": {"identifier": "CP0001965"}}});
    assert!(check_embedded_identifier(&ok, "CP0001965").is_ok());

    let absent = json!({"filing": {"header": {}}});
    assert!(check_embedded_identifier(&absent, "CP0001965").is_ok());

    let empty = json!({"filing": {"business_info": {}}});
    assert!(matches!(
      check_embedded_identifier(&empty, "CP0001965"),
      Err(ApiError::BadRequest(m)) if m == "Error: Invalid Filing schema"
    ));

    let other = json!({"filing": {"business": {"identifier": "CP0000001"}}});
    assert!(matches!(
      check_embedded_identifier(&other, "CP0001965"),
      Err(ApiError::BadRequest(m)) if m.contains("does not match")
    ));
  }
}
