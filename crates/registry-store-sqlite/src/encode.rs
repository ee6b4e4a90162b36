//! Encoding and decoding helpers between registry domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings in UTC with
//! microsecond precision, so text ordering is chronological. Dates are
//! stored as `YYYY-MM-DD`. Filing documents are stored as compact JSON.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use registry_core::{
  business::CorporationRecord,
  colin::{AnnualReport, Event},
  filing::{Address, AddressType, Filing, FilingStatus, FilingType},
  reset::FilingEventRow,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_ts(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_ts(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_ts).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── AddressType ─────────────────────────────────────────────────────────────

pub fn decode_address_type(s: &str) -> Result<AddressType> {
  match s {
    "mailing" => Ok(AddressType::Mailing),
    "delivery" => Ok(AddressType::Delivery),
    other => Err(Error::UnknownAddressType(other.to_owned())),
  }
}

// ─── COLIN rows ──────────────────────────────────────────────────────────────

/// Raw strings read for one corporation by the business resolver.
pub struct RawCorporation {
  pub corp_num:                String,
  pub corp_type:               String,
  pub frozen_type:             Option<String>,
  pub founding_date:           Option<String>,
  pub business_number:         Option<String>,
  pub last_ar_filed_date:      Option<String>,
  pub last_agm_date:           Option<String>,
  pub corp_state:              String,
  pub state_desc:              String,
  pub jurisdiction_code:       Option<String>,
  pub other_jurisdiction_desc: Option<String>,
  // follow-up lookups
  pub legal_name:              Option<String>,
  pub assumed_name:            Option<String>,
  pub last_ar_date:            Option<String>,
  pub last_ledger_timestamp:   Option<String>,
}

impl RawCorporation {
  pub fn into_record(self) -> Result<CorporationRecord> {
    Ok(CorporationRecord {
      identifier:              self.corp_num,
      corp_type:               self.corp_type,
      frozen_type:             self.frozen_type,
      last_ar_date:            decode_opt_date(self.last_ar_date)?,
      last_ar_filed_date:      decode_opt_ts(self.last_ar_filed_date)?,
      last_agm_date:           decode_opt_date(self.last_agm_date)?,
      state_desc:              self.state_desc,
      corp_state:              self.corp_state,
      legal_name:              self.legal_name,
      assumed_name:            self.assumed_name,
      founding_date:           decode_opt_ts(self.founding_date)?,
      business_number:         self.business_number,
      jurisdiction_code:       self.jurisdiction_code,
      other_jurisdiction_desc: self.other_jurisdiction_desc,
      last_ledger_timestamp:   decode_opt_ts(self.last_ledger_timestamp)?,
    })
  }
}

pub struct RawEvent {
  pub event_id:   i64,
  pub corp_num:   String,
  pub timestamp:  String,
  pub event_type: String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:   self.event_id,
      corp_num:   self.corp_num,
      timestamp:  decode_ts(&self.timestamp)?,
      event_type: self.event_type,
    })
  }
}

/// A `filing` row joined with its `event`.
pub struct RawFilingEvent {
  pub event_id:        i64,
  pub corp_num:        String,
  pub event_timestamp: String,
  pub period_end:      Option<String>,
  pub agm_date:        Option<String>,
}

impl RawFilingEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:        row.get(0)?,
      corp_num:        row.get(1)?,
      event_timestamp: row.get(2)?,
      period_end:      row.get(3)?,
      agm_date:        row.get(4)?,
    })
  }

  pub fn into_annual_report(self) -> Result<AnnualReport> {
    Ok(AnnualReport {
      event_id:   self.event_id,
      corp_num:   self.corp_num,
      filed_at:   decode_ts(&self.event_timestamp)?,
      period_end: decode_opt_date(self.period_end)?,
      agm_date:   decode_opt_date(self.agm_date)?,
    })
  }

  pub fn into_reset_row(self) -> Result<FilingEventRow> {
    Ok(FilingEventRow {
      event_id:        self.event_id,
      event_timestamp: decode_ts(&self.event_timestamp)?,
      period_end:      decode_opt_date(self.period_end)?,
      agm_date:        decode_opt_date(self.agm_date)?,
    })
  }
}

// ─── Legal rows ──────────────────────────────────────────────────────────────

/// Column list matching [`RawFiling::from_row`].
pub const FILING_COLUMNS: &str = "id, business_id, filing_type, filing_date, \
                                  filing_json, status, payment_token, \
                                  colin_event_id, submitter";

/// Raw strings read directly from a `filings` row.
pub struct RawFiling {
  pub id:             i64,
  pub business_id:    i64,
  pub filing_type:    Option<String>,
  pub filing_date:    String,
  pub filing_json:    String,
  pub status:         String,
  pub payment_token:  Option<String>,
  pub colin_event_id: Option<i64>,
  pub submitter:      Option<String>,
}

impl RawFiling {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      business_id:    row.get(1)?,
      filing_type:    row.get(2)?,
      filing_date:    row.get(3)?,
      filing_json:    row.get(4)?,
      status:         row.get(5)?,
      payment_token:  row.get(6)?,
      colin_event_id: row.get(7)?,
      submitter:      row.get(8)?,
    })
  }

  pub fn into_filing(self) -> Result<Filing> {
    Ok(Filing {
      id:             self.id,
      business_id:    self.business_id,
      filing_type:    self
        .filing_type
        .as_deref()
        .map(FilingType::parse)
        .transpose()?,
      filing_date:    decode_ts(&self.filing_date)?,
      filing_json:    serde_json::from_str(&self.filing_json)?,
      status:         FilingStatus::parse(&self.status)?,
      payment_token:  self.payment_token,
      colin_event_id: self.colin_event_id,
      submitter:      self.submitter,
    })
  }
}

pub struct RawAddress {
  pub address_type: String,
  pub street:       Option<String>,
  pub city:         Option<String>,
  pub region:       Option<String>,
  pub postal_code:  Option<String>,
  pub country:      Option<String>,
}

impl RawAddress {
  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      address_type: decode_address_type(&self.address_type)?,
      street:       self.street,
      city:         self.city,
      region:       self.region,
      postal_code:  self.postal_code,
      country:      self.country,
    })
  }
}
