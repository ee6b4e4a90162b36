//! Incorporation application rules.

use serde_json::Value;

use super::{ErrorDetail, ValidationContext, non_blank};

pub const COMPLETING_PARTY: &str = "Completing Party";

pub(super) fn validate(_ctx: &ValidationContext<'_>, section: &Value) -> Vec<ErrorDetail> {
  let mut errors = Vec::new();

  let name_request = section.get("nameRequest").unwrap_or(&Value::Null);
  if non_blank(name_request, "legalType").is_none() {
    errors.push(ErrorDetail::new(
      "filing/incorporationApplication/nameRequest/legalType",
      "Legal type is required.",
    ));
  }

  let has_completing_party = section
    .get("parties")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .any(|party| has_role(party, COMPLETING_PARTY));
  if !has_completing_party {
    errors.push(ErrorDetail::new(
      "filing/incorporationApplication/parties",
      "A Completing Party is required.",
    ));
  }

  errors
}

/// Whether `party` holds `role` among its `roles`.
pub fn has_role(party: &Value, role: &str) -> bool {
  party
    .get("roles")
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .any(|r| r.get("roleType").and_then(Value::as_str) == Some(role))
}
