//! Client for the payment service's invoice endpoint.

use std::time::Duration;

use registry_core::{
  business::corp_type_prefix,
  filing::{Address, FilingType, LegalBusiness},
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  /// The service could not be reached at all.
  #[error("unable to reach payment service: {0}")]
  Connection(#[source] reqwest::Error),

  #[error("unreadable payment service response: {0}")]
  Response(#[source] reqwest::Error),
}

// ─── Request body ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct InvoiceRequest {
  pub payment_info:  PaymentInfo,
  pub business_info: BusinessInfo,
  pub filing_info:   FilingInfo,
}

#[derive(Debug, Serialize)]
pub struct PaymentInfo {
  pub method_of_payment: String,
}

#[derive(Debug, Serialize)]
pub struct BusinessInfo {
  pub business_identifier: String,
  pub corp_type:           String,
  pub business_name:       Option<String>,
  pub contact_info:        ContactInfo,
}

#[derive(Debug, Default, Serialize)]
pub struct ContactInfo {
  pub city:           Option<String>,
  pub postal_code:    Option<String>,
  pub province:       Option<String>,
  pub address_line_1: Option<String>,
  pub country:        Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilingInfo {
  pub filing_types: Vec<FilingTypeCode>,
}

#[derive(Debug, Serialize)]
pub struct FilingTypeCode {
  pub filing_type_code: String,
}

impl InvoiceRequest {
  /// A credit-card invoice for every known filing type in `filing_json`.
  pub fn new(
    business: &LegalBusiness,
    mailing_address: Option<Address>,
    filing_json: &Value,
  ) -> Self {
    let contact_info = mailing_address
      .map(|a| ContactInfo {
        city:           a.city,
        postal_code:    a.postal_code,
        province:       a.region,
        address_line_1: a.street,
        country:        a.country,
      })
      .unwrap_or_default();

    Self {
      payment_info:  PaymentInfo { method_of_payment: "CC".into() },
      business_info: BusinessInfo {
        business_identifier: business.identifier.clone(),
        corp_type: corp_type_prefix(&business.identifier).to_owned(),
        business_name: business.legal_name.clone(),
        contact_info,
      },
      filing_info:   FilingInfo {
        filing_types: FilingType::present_in(filing_json)
          .into_iter()
          .map(|t| FilingTypeCode { filing_type_code: t.fee_code().to_owned() })
          .collect(),
      },
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PaymentClient {
  client: Client,
  url:    String,
  token:  String,
}

impl PaymentClient {
  /// `token` is the service account's bearer token.
  pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self, PaymentError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(PaymentError::Client)?;
    Ok(Self { client, url: url.into(), token: token.into() })
  }

  /// Post `invoice` and return the payment id, if the service assigned one.
  pub async fn create_invoice(
    &self,
    invoice: &InvoiceRequest,
  ) -> Result<Option<String>, PaymentError> {
    let resp = self
      .client
      .post(&self.url)
      .bearer_auth(&self.token)
      .json(invoice)
      .send()
      .await
      .map_err(PaymentError::Connection)?;

    let status = resp.status();
    let body: Value = resp.json().await.map_err(PaymentError::Response)?;
    let id = match body.get("id") {
      Some(Value::String(s)) => Some(s.clone()),
      Some(Value::Number(n)) => Some(n.to_string()),
      _ => None,
    };
    if id.is_none() {
      tracing::warn!(%status, "payment service returned no invoice id");
    }
    Ok(id)
  }
}
