//! Records of the legacy COLIN schema.
//!
//! Events are append-only and anchor every change. Corp states are temporal
//! intervals: a row with no `end_event_id` is the corporation's current
//! state, and at most one such row exists per corporation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── Codes ───────────────────────────────────────────────────────────────────

/// `EVENT.EVENT_TYP_CD` for filings submitted through the registry.
pub const EVENT_FILE: &str = "FILE";

/// `EVENT.EVENT_TYP_CD` for events converted from the previous system.
pub const EVENT_CONVERTED: &str = "CONVOTHER";

/// Event types that appear on a corporation's ledger.
pub const LEDGER_EVENT_TYPES: [&str; 2] = [EVENT_FILE, EVENT_CONVERTED];

/// `FILING.FILING_TYP_CD` of an annual report.
pub const ANNUAL_REPORT_CODE: &str = "OTANN";

/// `CORP_NAME.CORP_NAME_TYP_CD` of the legal name.
pub const LEGAL_NAME_TYPE: &str = "CO";

/// `CORP_NAME.CORP_NAME_TYP_CD` of an assumed name.
pub const ASSUMED_NAME_TYPE: &str = "AS";

/// `CORP_STATE.STATE_TYP_CD` of an active corporation.
pub const STATE_ACTIVE: &str = "ACT";

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub event_id:   i64,
  pub corp_num:   String,
  pub timestamp:  DateTime<Utc>,
  pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpState {
  pub corp_num:       String,
  pub start_event_id: i64,
  /// `None` while this is the corporation's current state.
  pub end_event_id:   Option<i64>,
  pub state_type:     String,
}

impl CorpState {
  pub fn is_active(&self) -> bool { self.end_event_id.is_none() }
}

/// An annual report as recorded in the COLIN `FILING` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualReport {
  pub event_id:   i64,
  pub corp_num:   String,
  pub filed_at:   DateTime<Utc>,
  pub period_end: Option<NaiveDate>,
  pub agm_date:   Option<NaiveDate>,
}

/// Input to [`crate::store::ColinStore::file_annual_report`].
#[derive(Debug, Clone)]
pub struct NewAnnualReport {
  pub period_end: NaiveDate,
  pub agm_date:   Option<NaiveDate>,
}

/// Input to [`crate::store::ColinStore::create_corporation`].
#[derive(Debug, Clone)]
pub struct NewCorporation {
  pub corp_num:                String,
  pub corp_type:               String,
  pub legal_name:              String,
  pub founding_date:           DateTime<Utc>,
  pub business_number:         Option<String>,
  pub jurisdiction_code:       Option<String>,
  pub other_jurisdiction_desc: Option<String>,
}

impl NewCorporation {
  /// A domestic corporation founded now with no business number.
  pub fn new(
    corp_num: impl Into<String>,
    corp_type: impl Into<String>,
    legal_name: impl Into<String>,
  ) -> Self {
    Self {
      corp_num:                corp_num.into(),
      corp_type:               corp_type.into(),
      legal_name:              legal_name.into(),
      founding_date:           Utc::now(),
      business_number:         None,
      jurisdiction_code:       None,
      other_jurisdiction_desc: None,
    }
  }
}
