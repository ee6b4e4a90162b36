//! Recovering a corporation's annual report dates when filing events are
//! undone.
//!
//! The store feeds [`last_ar_dates`] the corporation's remaining filing rows,
//! newest event first, and writes the result back onto the corporation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One event being undone, and the corporation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
  pub corp_num: String,
  pub event_id: i64,
}

/// A remaining `FILING` row joined with its `EVENT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingEventRow {
  pub event_id:        i64,
  pub event_timestamp: DateTime<Utc>,
  pub period_end:      Option<NaiveDate>,
  pub agm_date:        Option<NaiveDate>,
}

/// The dates a corporation had before the undone events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetDates {
  pub corp_num:       String,
  /// Smallest undone event id for this corporation.
  pub first_event_id: i64,
  pub event_date:     Option<DateTime<Utc>>,
  pub ar_date:        Option<NaiveDate>,
  pub ar_filed_date:  Option<DateTime<Utc>>,
  pub agm_date:       Option<NaiveDate>,
}

impl ResetDates {
  /// The AGM date written back to the corporation. An annual report filed
  /// without an AGM leaves no AGM date, in which case the AR date stands in.
  pub fn restored_agm_date(&self) -> Option<NaiveDate> {
    self.agm_date.or(self.ar_date)
  }
}

/// Group the undone events by corporation, keeping the smallest event id.
pub fn earliest_event_by_corp(events: &[EventInfo]) -> BTreeMap<String, i64> {
  let mut by_corp: BTreeMap<String, i64> = BTreeMap::new();
  for info in events {
    by_corp
      .entry(info.corp_num.clone())
      .and_modify(|id| *id = (*id).min(info.event_id))
      .or_insert(info.event_id);
  }
  by_corp
}

/// Walk the remaining rows and pick the latest event, the latest period end
/// (with the timestamp it was filed at) and, independently, the latest AGM.
///
/// Comparisons are strict, so among equal values the first row seen wins.
/// Callers must supply rows in a deterministic order.
pub fn last_ar_dates(
  corp_num: &str,
  first_event_id: i64,
  rows: impl IntoIterator<Item = FilingEventRow>,
) -> ResetDates {
  let mut dates = ResetDates {
    corp_num: corp_num.to_owned(),
    first_event_id,
    event_date: None,
    ar_date: None,
    ar_filed_date: None,
    agm_date: None,
  };

  for row in rows {
    if dates.event_date.is_none_or(|d| d < row.event_timestamp) {
      dates.event_date = Some(row.event_timestamp);
    }
    // the closest period end is not always the first row when two annual
    // reports were filed on the same day
    if let Some(period_end) = row.period_end
      && dates.ar_date.is_none_or(|d| d < period_end)
    {
      dates.ar_date = Some(period_end);
      dates.ar_filed_date = Some(row.event_timestamp);
    }
    if let Some(agm) = row.agm_date
      && dates.agm_date.is_none_or(|d| d < agm)
    {
      dates.agm_date = Some(agm);
    }
  }

  dates
}
