//! Handlers for `/businesses/{identifier}/filings/annual_report`.
//!
//! Both the camelCase keys used by the legal API and the snake_case keys of
//! older COLIN clients are accepted on the way in; responses use camelCase
//! for the report and `business_info` for the business.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::NaiveDate;
use registry_core::{
  business::Business,
  colin::{AnnualReport, NewAnnualReport},
  filing::business_section,
  store::ColinStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  error::ApiError,
  extract::{JsonBody, Path, Query},
};

/// The filing document returned for a stored annual report.
pub fn render(report: &AnnualReport, business: &Business) -> Value {
  json!({
    "filing": {
      "header": {
        "name":    "annualReport",
        "date":    report.filed_at.date_naive(),
        "eventId": report.event_id,
      },
      "annualReport": {
        "annualGeneralMeetingDate": report.agm_date,
        "annualReportDate":         report.period_end,
      },
      "business_info": business,
    }
  })
}

async fn resolve<C: ColinStore>(colin: &C, identifier: &str) -> Result<Business, ApiError> {
  colin
    .find_business(identifier)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{identifier} not found")))
}

// ─── Get ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  pub year: Option<String>,
}

/// `GET /businesses/{identifier}/filings/annual_report[?year=YYYY]`
pub async fn get_one<C>(
  State(colin): State<Arc<C>>,
  Path(identifier): Path<String>,
  Query(params): Query<GetParams>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
{
  let year = params
    .year
    .map(|y| {
      y.parse::<i32>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid year: {y}")))
    })
    .transpose()?;

  let business = resolve(colin.as_ref(), &identifier).await?;
  let report = colin
    .annual_report(&identifier, year)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("No annual report found for {identifier}")))?;
  Ok(Json(render(&report, &business)))
}

// ─── Post ─────────────────────────────────────────────────────────────────────

/// `POST /businesses/{identifier}/filings/annual_report`
pub async fn post<C>(
  State(colin): State<Arc<C>>,
  Path(identifier): Path<String>,
  JsonBody(doc): JsonBody<Value>,
) -> Result<Json<Value>, ApiError>
where
  C: ColinStore,
{
  let embedded = business_section(&doc)
    .and_then(Value::as_object)
    .filter(|o| !o.is_empty())
    .ok_or_else(|| ApiError::BadRequest("Error: Invalid Filing schema".into()))?;
  if embedded.get("identifier").and_then(Value::as_str) != Some(identifier.as_str()) {
    return Err(ApiError::BadRequest(
      "Error: Identifier in URL does not match identifier in filing data".into(),
    ));
  }

  let input = parse_report(&doc)?;
  resolve(colin.as_ref(), &identifier).await?;

  let report = colin
    .file_annual_report(&identifier, input)
    .await
    .map_err(ApiError::store)?;
  // Re-resolve so the response carries the new AR, AGM and ledger dates.
  let business = resolve(colin.as_ref(), &identifier).await?;
  Ok(Json(render(&report, &business)))
}

fn parse_report(doc: &Value) -> Result<NewAnnualReport, ApiError> {
  let filing = &doc["filing"];
  let section = filing
    .get("annualReport")
    .or_else(|| filing.get("annual_report"))
    .ok_or_else(|| ApiError::BadRequest("Error: Invalid Filing schema".into()))?;

  let agm_date = date(section, &["annualGeneralMeetingDate", "annual_general_meeting_date"])?;
  let period_end = date(section, &["annualReportDate", "annual_report_date"])?
    .or(date(&filing["header"], &["date"])?)
    .ok_or_else(|| ApiError::BadRequest("Error: Invalid Filing schema".into()))?;

  Ok(NewAnnualReport { period_end, agm_date })
}

/// The first of `keys` present in `section`, parsed as `YYYY-MM-DD`.
fn date(section: &Value, keys: &[&str]) -> Result<Option<NaiveDate>, ApiError> {
  let Some(raw) = keys.iter().find_map(|k| section.get(*k)).filter(|v| !v.is_null())
  else {
    return Ok(None);
  };
  raw
    .as_str()
    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    .map(Some)
    .ok_or_else(|| ApiError::BadRequest(format!("Invalid date: {raw}")))
}
