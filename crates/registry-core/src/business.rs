//! The resolved business view and the rules used to derive it.
//!
//! A [`Business`] is never stored. Backends read a [`CorporationRecord`] from
//! the joined COLIN tables and call [`CorporationRecord::resolve`], which
//! applies the jurisdiction, name and status rules below.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Corporation type code for extra-provincial cooperatives.
pub const FOREIGN_CORP_TYPE: &str = "XCP";

/// Jurisdiction code meaning "see the free-text description".
pub const OTHER_JURISDICTION: &str = "OT";

/// Jurisdiction of every domestic corporation.
pub const DOMESTIC_JURISDICTION: &str = "BC";

/// `CORP_OP_STATE.FULL_DESC` of an active corporation.
pub const ACTIVE_STATE_DESC: &str = "Active";

pub const GOOD_STANDING: &str = "In Good Standing";

// ─── Resolved view ───────────────────────────────────────────────────────────

/// The external representation of a business, serialised in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
  pub identifier:            String,
  pub legal_name:            Option<String>,
  pub legal_type:            String,
  pub status:                String,
  pub corp_state:            String,
  pub founding_date:         Option<DateTime<Utc>>,
  pub business_number:       Option<String>,
  pub jurisdiction:          Option<String>,
  pub last_agm_date:         Option<NaiveDate>,
  pub last_ar_date:          Option<NaiveDate>,
  pub last_ledger_timestamp: Option<DateTime<Utc>>,
  pub cache_id:              i64,
}

// ─── Raw record ──────────────────────────────────────────────────────────────

/// Everything the resolver reads from the COLIN tables for one corporation,
/// before any derivation rule is applied.
#[derive(Debug, Clone, Default)]
pub struct CorporationRecord {
  pub identifier:              String,
  pub corp_type:               String,
  pub frozen_type:             Option<String>,
  /// Period end date of the most recent annual report filing.
  pub last_ar_date:            Option<NaiveDate>,
  pub last_ar_filed_date:      Option<DateTime<Utc>>,
  pub last_agm_date:           Option<NaiveDate>,
  /// `CORP_OP_STATE.FULL_DESC` of the active state.
  pub state_desc:              String,
  /// `CORP_STATE.STATE_TYP_CD` of the active state.
  pub corp_state:              String,
  pub legal_name:              Option<String>,
  pub assumed_name:            Option<String>,
  pub founding_date:           Option<DateTime<Utc>>,
  pub business_number:         Option<String>,
  pub jurisdiction_code:       Option<String>,
  pub other_jurisdiction_desc: Option<String>,
  pub last_ledger_timestamp:   Option<DateTime<Utc>>,
}

impl CorporationRecord {
  /// Apply the derivation rules and drop every internal-only column.
  pub fn resolve(self) -> Business {
    let jurisdiction = derive_jurisdiction(
      &self.corp_type,
      self.jurisdiction_code.as_deref(),
      self.other_jurisdiction_desc.as_deref(),
    );
    let status = derive_status(
      &self.state_desc,
      self.last_ar_filed_date,
      self.last_agm_date,
    );

    Business {
      identifier: self.identifier,
      legal_name: self.assumed_name.or(self.legal_name),
      legal_type: self.corp_type,
      status,
      corp_state: self.corp_state,
      founding_date: self.founding_date,
      business_number: self.business_number,
      jurisdiction,
      last_agm_date: self.last_agm_date,
      last_ar_date: self.last_ar_date.or(self.last_agm_date),
      last_ledger_timestamp: self.last_ledger_timestamp,
      cache_id: 0,
    }
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Foreign corporations report their own jurisdiction (or the free-text
/// description when the code is `OT`); everything else is domestic.
pub fn derive_jurisdiction(
  corp_type: &str,
  code: Option<&str>,
  other_desc: Option<&str>,
) -> Option<String> {
  if corp_type != FOREIGN_CORP_TYPE {
    return Some(DOMESTIC_JURISDICTION.to_owned());
  }
  match code {
    Some(OTHER_JURISDICTION) => other_desc.map(str::to_owned),
    other => other.map(str::to_owned),
  }
}

/// `In Good Standing` requires an active corporation whose last annual report
/// was filed strictly after its last AGM. Otherwise the raw state description
/// is reported.
pub fn derive_status(
  state_desc: &str,
  last_ar_filed: Option<DateTime<Utc>>,
  last_agm: Option<NaiveDate>,
) -> String {
  if state_desc == ACTIVE_STATE_DESC
    && let (Some(filed), Some(agm)) = (last_ar_filed, last_agm)
    && filed.naive_utc() > agm.and_time(NaiveTime::MIN)
  {
    return GOOD_STANDING.to_owned();
  }
  state_desc.to_owned()
}

/// The corp-type prefix of an identifier, e.g. `CP` for `CP0001965`.
pub fn corp_type_prefix(identifier: &str) -> &str {
  let cut = identifier.len().saturating_sub(7);
  identifier.get(..cut).unwrap_or("")
}
