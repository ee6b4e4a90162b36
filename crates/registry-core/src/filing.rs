//! Filings submitted through the legal API.
//!
//! The submitted JSON document is stored verbatim; everything the services
//! need to query on (type, status, payment token, legacy correlation id)
//! lives in its own column.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{Error, Result};

// ─── Filing types ────────────────────────────────────────────────────────────

/// Every filing type the registry knows how to validate.
///
/// Declaration order is the canonical order in which validators run and in
/// which invoice line items are listed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FilingType {
  AnnualReport,
  ChangeOfAddress,
  ChangeOfDirectors,
  IncorporationApplication,
}

impl FilingType {
  /// The key of this type's section under `filing` in a submitted document.
  pub fn key(self) -> &'static str { self.into() }

  /// Fee code sent to the payment service.
  pub fn fee_code(self) -> &'static str {
    match self {
      Self::AnnualReport => "OTANN",
      Self::ChangeOfAddress => "OTADD",
      Self::ChangeOfDirectors => "OTCDR",
      Self::IncorporationApplication => "BCINC",
    }
  }

  /// Parse a stored type key.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownFilingType(s.to_owned()))
  }

  /// The known filing types present under `filing`, in canonical order.
  pub fn present_in(filing_json: &Value) -> Vec<Self> {
    let Some(section) = filing_json.get("filing").and_then(Value::as_object)
    else {
      return Vec::new();
    };
    Self::iter().filter(|t| section.contains_key(t.key())).collect()
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FilingStatus {
  Draft,
  Pending,
  Paid,
  Completed,
  Error,
}

impl FilingStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownFilingStatus(s.to_owned()))
  }
}

// ─── Businesses ──────────────────────────────────────────────────────────────

/// The legal-side mirror of a COLIN business that has filings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalBusiness {
  pub id:         i64,
  pub identifier: String,
  pub legal_name: Option<String>,
  pub legal_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
  Mailing,
  Delivery,
}

impl AddressType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Mailing => "mailing",
      Self::Delivery => "delivery",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub address_type: AddressType,
  pub street:       Option<String>,
  pub city:         Option<String>,
  pub region:       Option<String>,
  pub postal_code:  Option<String>,
  pub country:      Option<String>,
}

impl Address {
  /// Read an address in the filing document shape (`streetAddress`,
  /// `addressCity`, `addressRegion`, `postalCode`, `addressCountry`).
  pub fn from_document(address_type: AddressType, doc: &Value) -> Self {
    let field = |key: &str| {
      doc
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
    };
    Self {
      address_type,
      street: field("streetAddress"),
      city: field("addressCity"),
      region: field("addressRegion"),
      postal_code: field("postalCode"),
      country: field("addressCountry"),
    }
  }
}

/// The addresses a change of address sets for the business, delivery first.
/// Empty for any other filing.
pub fn filed_addresses(filing_json: &Value) -> Vec<Address> {
  let section = &filing_json["filing"][FilingType::ChangeOfAddress.key()];
  [(AddressType::Delivery, "deliveryAddress"), (AddressType::Mailing, "mailingAddress")]
    .into_iter()
    .filter_map(|(address_type, key)| {
      section
        .get(key)
        .filter(|v| v.is_object())
        .map(|doc| Address::from_document(address_type, doc))
    })
    .collect()
}

// ─── Filing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
  pub id:             i64,
  pub business_id:    i64,
  /// First known type in the document, if any.
  pub filing_type:    Option<FilingType>,
  pub filing_date:    DateTime<Utc>,
  pub filing_json:    Value,
  pub status:         FilingStatus,
  pub payment_token:  Option<String>,
  pub colin_event_id: Option<i64>,
  pub submitter:      Option<String>,
}

impl Filing {
  /// The stored document with the server-side fields merged into
  /// `filing.header`.
  pub fn json(&self) -> Value {
    let mut doc = self.filing_json.clone();
    let Some(filing) = doc.get_mut("filing").and_then(Value::as_object_mut)
    else {
      return doc;
    };
    let header = filing
      .entry("header")
      .or_insert_with(|| Value::Object(Default::default()));
    if let Some(header) = header.as_object_mut() {
      header.insert("filingId".into(), self.id.into());
      header.insert("status".into(), self.status.as_str().into());
      header.insert(
        "date".into(),
        self.filing_date.date_naive().to_string().into(),
      );
      header.insert(
        "paymentToken".into(),
        self.payment_token.clone().map(Value::from).unwrap_or(Value::Null),
      );
      if let Some(colin_id) = self.colin_event_id {
        header.insert("colinId".into(), colin_id.into());
      }
    }
    doc
  }
}

/// Input to [`crate::store::LegalStore::create_filing`]. `filing_date` is
/// always set by the store.
#[derive(Debug, Clone)]
pub struct NewFiling {
  pub business_id: i64,
  pub filing_json: Value,
  pub status:      FilingStatus,
  pub submitter:   Option<String>,
}

impl NewFiling {
  pub fn filing_type(&self) -> Option<FilingType> {
    FilingType::present_in(&self.filing_json).first().copied()
  }
}

// ─── Embedded business section ───────────────────────────────────────────────

/// The business section embedded in a filing, under either of the keys the
/// registry has historically accepted.
pub fn business_section(filing_json: &Value) -> Option<&Value> {
  let filing = filing_json.get("filing")?;
  filing.get("business").or_else(|| filing.get("business_info"))
}
