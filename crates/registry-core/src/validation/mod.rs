//! The filing validation pipeline.
//!
//! A submitted document is first checked against the generic filing schema.
//! If it conforms, each known filing type present under `filing` is handed to
//! its own validator, in [`FilingType`] declaration order, and the first
//! validator that reports errors decides the result.
//!
//! A document that carries no known filing-type section passes: there is no
//! type-specific rule to apply. The schema still has to accept it.

mod annual_report;
mod change_of_address;
mod change_of_directors;
mod incorporation;
mod schema;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{Result, business::Business, filing::FilingType};

pub use incorporation::{COMPLETING_PARTY, has_role};
pub use schema::validate_against_schema;

// ─── Error ───────────────────────────────────────────────────────────────────

/// A single problem with a submitted filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
  /// `/`-separated path of the offending value, e.g. `filing/header/date`.
  pub path:  String,
  pub error: String,
}

impl ErrorDetail {
  pub fn new(path: impl Into<String>, error: impl Into<String>) -> Self {
    Self { path: path.into(), error: error.into() }
  }
}

/// A filing failed schema or business-rule validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("filing is invalid ({} error(s))", .errors.len())]
pub struct ValidationError {
  pub errors: Vec<ErrorDetail>,
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// What a type validator may consult besides the document itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
  pub business: &'a Business,
  /// Dates after this are "in the future".
  pub today:    NaiveDate,
}

type Validator = fn(&ValidationContext<'_>, &Value) -> Vec<ErrorDetail>;

fn validator_for(filing_type: FilingType) -> Validator {
  match filing_type {
    FilingType::AnnualReport => annual_report::validate,
    FilingType::ChangeOfAddress => change_of_address::validate,
    FilingType::ChangeOfDirectors => change_of_directors::validate,
    FilingType::IncorporationApplication => incorporation::validate,
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Validate `filing_json` for `business` as of today.
pub fn validate(business: &Business, filing_json: &Value) -> Result<()> {
  let ctx = ValidationContext { business, today: Utc::now().date_naive() };
  validate_with(&ctx, filing_json)
}

/// Validate `filing_json` with an explicit context.
pub fn validate_with(ctx: &ValidationContext<'_>, filing_json: &Value) -> Result<()> {
  validate_against_schema(filing_json)?;

  let present = FilingType::present_in(filing_json);
  if present.is_empty() {
    tracing::debug!(
      identifier = %ctx.business.identifier,
      "filing has no known filing type; no type rules applied"
    );
    return Ok(());
  }

  for filing_type in present {
    let section = &filing_json["filing"][filing_type.key()];
    let errors = validator_for(filing_type)(ctx, section);
    if !errors.is_empty() {
      return Err(ValidationError { errors }.into());
    }
  }
  Ok(())
}

// ─── Helpers shared by the type validators ───────────────────────────────────

/// Parse an optional `YYYY-MM-DD` string field. `Err` carries the raw value.
pub(crate) fn date_field(
  section: &Value,
  key: &str,
) -> std::result::Result<Option<NaiveDate>, String> {
  match section.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .map(Some)
      .map_err(|_| s.clone()),
    Some(other) => Err(other.to_string()),
  }
}

/// A string field that is present and not blank.
pub(crate) fn non_blank<'v>(section: &'v Value, key: &str) -> Option<&'v str> {
  section
    .get(key)
    .and_then(Value::as_str)
    .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{Error, business::CorporationRecord};

  fn business() -> Business {
    CorporationRecord {
      identifier: "CP0001965".into(),
      corp_type: "CP".into(),
      state_desc: "Active".into(),
      corp_state: "ACT".into(),
      last_agm_date: NaiveDate::from_ymd_opt(2017, 11, 7),
      ..Default::default()
    }
    .resolve()
  }

  fn ctx(business: &Business) -> ValidationContext<'_> {
    ValidationContext {
      business,
      today: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
    }
  }

  fn errors(result: Result<()>) -> Vec<ErrorDetail> {
    match result {
      Err(Error::Validation(v)) => v.errors,
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn schema_errors_short_circuit() {
    let b = business();
    let doc = json!({"filing": {"annualReport": {}}});
    let errs = errors(validate_with(&ctx(&b), &doc));
    assert!(errs.iter().any(|e| e.path == "filing"), "{errs:?}");
  }

  #[test]
  fn unknown_filing_type_passes() {
    let b = business();
    let doc = json!({
      "filing": {
        "header": {"name": "specialResolution", "date": "2019-05-01"},
        "specialResolution": {"resolution": "..."}
      }
    });
    assert!(validate_with(&ctx(&b), &doc).is_ok());
  }

  #[test]
  fn valid_annual_report_passes() {
    let b = business();
    let doc = json!({
      "filing": {
        "header": {"name": "annualReport", "date": "2019-05-01"},
        "business": {"identifier": "CP0001965"},
        "annualReport": {"annualGeneralMeetingDate": "2019-04-08"}
      }
    });
    assert!(validate_with(&ctx(&b), &doc).is_ok());
  }

  #[test]
  fn validators_run_in_declaration_order() {
    let b = business();
    // both sections are invalid; the change of address section comes first
    // in the document but annual report rules run first
    let doc = json!({
      "filing": {
        "header": {"name": "annualReport", "date": "2019-05-01"},
        "changeOfAddress": {},
        "annualReport": {"annualGeneralMeetingDate": "2030-01-01"}
      }
    });
    let errs = errors(validate_with(&ctx(&b), &doc));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].path, "filing/annualReport/annualGeneralMeetingDate");
  }

  #[test]
  fn second_validator_runs_when_first_passes() {
    let b = business();
    let doc = json!({
      "filing": {
        "header": {"name": "annualReport", "date": "2019-05-01"},
        "changeOfAddress": {},
        "annualReport": {"annualGeneralMeetingDate": "2019-04-08"}
      }
    });
    let errs = errors(validate_with(&ctx(&b), &doc));
    assert!(errs.iter().all(|e| e.path.starts_with("filing/changeOfAddress")));
  }

  #[test]
  fn date_field_parses_and_rejects() {
    let section = json!({"a": "2019-01-02", "b": "02/01/2019", "c": null});
    assert_eq!(
      date_field(&section, "a").unwrap(),
      NaiveDate::from_ymd_opt(2019, 1, 2)
    );
    assert_eq!(date_field(&section, "b").unwrap_err(), "02/01/2019");
    assert_eq!(date_field(&section, "c").unwrap(), None);
    assert_eq!(date_field(&section, "missing").unwrap(), None);
  }
}
