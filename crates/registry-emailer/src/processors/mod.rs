//! Turning a filing (or a business) into an [`Email`](crate::client::Email).
//!
//! Processors are pure: the worker resolves everything they need and hands
//! them the fetched attachments.

pub mod business_number;
pub mod filing_notification;
pub mod mras;

use registry_core::{
  filing::FilingType,
  validation::{COMPLETING_PARTY, has_role},
};
use serde_json::Value;

/// Title used in subjects, bodies and attachment names.
pub fn display_name(filing_type: FilingType) -> &'static str {
  match filing_type {
    FilingType::AnnualReport => "Annual Report",
    FilingType::ChangeOfAddress => "Change of Address",
    FilingType::ChangeOfDirectors => "Change of Directors",
    FilingType::IncorporationApplication => "Incorporation Application",
  }
}

fn incorporation(filing_json: &Value) -> &Value {
  &filing_json["filing"][FilingType::IncorporationApplication.key()]
}

/// The contact point email of an incorporation application.
pub fn contact_point_email(filing_json: &Value) -> Option<String> {
  incorporation(filing_json)["contactPoint"]["email"]
    .as_str()
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

/// Emails of every party holding the Completing Party role.
pub fn completing_party_emails(filing_json: &Value) -> Vec<String> {
  incorporation(filing_json)["parties"]
    .as_array()
    .into_iter()
    .flatten()
    .filter(|party| has_role(party, COMPLETING_PARTY))
    .filter_map(|party| party["officer"]["email"].as_str())
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Comma-join `addresses`, dropping repeats.
pub fn join_recipients(addresses: impl IntoIterator<Item = String>) -> String {
  let mut seen: Vec<String> = Vec::new();
  for address in addresses {
    if !seen.contains(&address) {
      seen.push(address);
    }
  }
  seen.join(", ")
}
