//! The queue message that asks for an email.

use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// `type` of the business number notification, which has no filing.
pub const BUSINESS_NUMBER: &str = "businessNumber";

/// `option` of the partner-jurisdiction notification.
pub const MRAS_OPTION: &str = "mras";

/// The `email` object of a queue message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
  #[serde(default)]
  pub filing_id:  Option<i64>,
  /// A filing type key, or [`BUSINESS_NUMBER`].
  #[serde(rename = "type")]
  pub email_type: String,
  /// A filing status such as `PAID`, or a special option such as `mras`.
  #[serde(default)]
  pub option:     String,
  #[serde(default)]
  pub identifier: Option<String>,
}

impl EmailRequest {
  /// Extract the request from `{"email": {...}}`.
  pub fn from_message(msg: &Value) -> Result<Self> {
    let email = msg
      .get("email")
      .ok_or_else(|| Error::MissingEmail(msg.to_string()))?;
    Ok(serde_json::from_value(email.clone())?)
  }
}
