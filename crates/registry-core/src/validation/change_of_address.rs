//! Change of address rules.
//!
//! Both addresses are required and the registered office must be delivered
//! to inside the province.

use serde_json::Value;

use super::{ErrorDetail, ValidationContext};

const REQUIRED_REGION: &str = "BC";
const REQUIRED_COUNTRY: &str = "CA";

pub(super) fn validate(_ctx: &ValidationContext<'_>, section: &Value) -> Vec<ErrorDetail> {
  let mut errors = Vec::new();

  match section.get("deliveryAddress").filter(|v| v.is_object()) {
    None => errors.push(ErrorDetail::new(
      "filing/changeOfAddress/deliveryAddress",
      "Delivery address is required.",
    )),
    Some(delivery) => {
      if delivery.get("addressRegion").and_then(Value::as_str) != Some(REQUIRED_REGION) {
        errors.push(ErrorDetail::new(
          "filing/changeOfAddress/deliveryAddress/addressRegion",
          format!("Address Region must be '{REQUIRED_REGION}'."),
        ));
      }
      if delivery.get("addressCountry").and_then(Value::as_str) != Some(REQUIRED_COUNTRY) {
        errors.push(ErrorDetail::new(
          "filing/changeOfAddress/deliveryAddress/addressCountry",
          format!("Address Country must be '{REQUIRED_COUNTRY}'."),
        ));
      }
    }
  }

  if section.get("mailingAddress").filter(|v| v.is_object()).is_none() {
    errors.push(ErrorDetail::new(
      "filing/changeOfAddress/mailingAddress",
      "Mailing address is required.",
    ));
  }

  errors
}
