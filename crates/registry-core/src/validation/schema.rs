//! Conformance against the generic filing JSON schema.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use super::{ErrorDetail, ValidationError};
use crate::{Error, Result};

/// The generic filing schema (draft 7).
pub const FILING_SCHEMA: &str = include_str!("../../schemas/filing.json");

static VALIDATOR: OnceLock<Validator> = OnceLock::new();

fn validator() -> Result<&'static Validator> {
  if let Some(v) = VALIDATOR.get() {
    return Ok(v);
  }
  let schema: Value = serde_json::from_str(FILING_SCHEMA)?;
  let compiled =
    jsonschema::validator_for(&schema).map_err(|e| Error::Schema(e.to_string()))?;
  Ok(VALIDATOR.get_or_init(|| compiled))
}

/// Check `filing_json` against the filing schema, collecting every error.
pub fn validate_against_schema(filing_json: &Value) -> Result<()> {
  let errors: Vec<ErrorDetail> = validator()?
    .iter_errors(filing_json)
    .map(|e| {
      let pointer = e.instance_path.to_string();
      ErrorDetail::new(pointer.trim_start_matches('/'), e.to_string())
    })
    .collect();

  if errors.is_empty() {
    Ok(())
  } else {
    Err(ValidationError { errors }.into())
  }
}
