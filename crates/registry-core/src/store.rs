//! The `ColinStore` and `LegalStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `registry-store-sqlite`). The HTTP services and the emailer depend on
//! these abstractions, not on any concrete backend.

use std::future::Future;

use serde_json::Value;

use crate::{
  business::Business,
  colin::{AnnualReport, CorpState, Event, NewAnnualReport, NewCorporation},
  filing::{Address, Filing, FilingStatus, FilingType, LegalBusiness, NewFiling},
  reset::{EventInfo, ResetDates},
};

// ─── COLIN ───────────────────────────────────────────────────────────────────

/// Abstraction over the legacy COLIN database.
///
/// Events are append-only. Every multi-statement mutation runs in a single
/// transaction, so readers never observe a corporation with zero or two
/// active corp states.
pub trait ColinStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Corporations ──────────────────────────────────────────────────────

  /// Register a corporation: its founding event, legal name, jurisdiction
  /// and an active corp state, all keyed to the same event.
  fn create_corporation(
    &self,
    input: NewCorporation,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Resolve the business view for `identifier`. Returns `None` if no
  /// corporation (or no active state for it) exists.
  fn find_business<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<Business>, Self::Error>> + Send + 'a;

  // ── Annual reports ────────────────────────────────────────────────────

  /// The most recent annual report, or the one whose period ends in `year`.
  fn annual_report<'a>(
    &'a self,
    identifier: &'a str,
    year: Option<i32>,
  ) -> impl Future<Output = Result<Option<AnnualReport>, Self::Error>> + Send + 'a;

  /// Record an annual report: a new ledger event, its filing row, the
  /// corporation's AR/AGM/ledger dates, and a transition to the active state.
  fn file_annual_report<'a>(
    &'a self,
    identifier: &'a str,
    input: NewAnnualReport,
  ) -> impl Future<Output = Result<AnnualReport, Self::Error>> + Send + 'a;

  // ── Corp states ───────────────────────────────────────────────────────

  /// End the active state of `corp_num` and start `state`, both on
  /// `event_id`.
  fn update_corp_state<'a>(
    &'a self,
    event_id: i64,
    corp_num: &'a str,
    state: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Full corp-state history of `corp_num`, oldest first.
  fn corp_states<'a>(
    &'a self,
    corp_num: &'a str,
  ) -> impl Future<Output = Result<Vec<CorpState>, Self::Error>> + Send + 'a;

  // ── Reset ─────────────────────────────────────────────────────────────

  /// The dates each affected corporation had before `event_ids`.
  fn last_ar_dates_for_reset<'a>(
    &'a self,
    event_info: &'a [EventInfo],
    event_ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<ResetDates>, Self::Error>> + Send + 'a;

  /// Restore each affected corporation's AR, AGM and ledger dates.
  fn reset_corporations<'a>(
    &'a self,
    event_info: &'a [EventInfo],
    event_ids: &'a [i64],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete corp states started by `event_ids` and reopen the ones they
  /// ended.
  fn reset_corp_states<'a>(
    &'a self,
    event_ids: &'a [i64],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Undo `events` entirely: corp states, corporation dates, and the filing
  /// and event rows themselves, in one transaction.
  fn reset(
    &self,
    events: Vec<EventInfo>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Legal ───────────────────────────────────────────────────────────────────

/// Abstraction over the legal API's own database.
pub trait LegalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Businesses ────────────────────────────────────────────────────────

  /// Insert or refresh the legal mirror of a resolved business.
  fn upsert_business<'a>(
    &'a self,
    business: &'a Business,
  ) -> impl Future<Output = Result<LegalBusiness, Self::Error>> + Send + 'a;

  fn find_business<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<LegalBusiness>, Self::Error>> + Send + 'a;

  /// The mirror row a filing's `business_id` points at.
  fn business(
    &self,
    business_id: i64,
  ) -> impl Future<Output = Result<Option<LegalBusiness>, Self::Error>> + Send + '_;

  /// Replace the business's address of `address.address_type`.
  fn set_address(
    &self,
    business_id: i64,
    address: Address,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn mailing_address(
    &self,
    business_id: i64,
  ) -> impl Future<Output = Result<Option<Address>, Self::Error>> + Send + '_;

  // ── Filings ───────────────────────────────────────────────────────────

  /// Persist a new filing. `filing_date` is set by the store.
  fn create_filing(
    &self,
    input: NewFiling,
  ) -> impl Future<Output = Result<Filing, Self::Error>> + Send + '_;

  /// Replace the document, status and submitter of an existing filing and
  /// refresh its filing date. Returns `None` if the filing does not exist.
  fn update_filing(
    &self,
    filing_id: i64,
    filing_json: Value,
    status: FilingStatus,
    submitter: Option<String>,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  fn get_filing(
    &self,
    filing_id: i64,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  /// A business's filings with any of `statuses`, oldest first.
  fn list_filings(
    &self,
    business_id: i64,
    statuses: Vec<FilingStatus>,
  ) -> impl Future<Output = Result<Vec<Filing>, Self::Error>> + Send + '_;

  /// The business's most recently dated filing of `filing_type`.
  fn latest_filing_of_type(
    &self,
    business_id: i64,
    filing_type: FilingType,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  fn set_payment_token(
    &self,
    filing_id: i64,
    token: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_filing_status(
    &self,
    filing_id: i64,
    status: FilingStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Attach the legacy event id. Returns `None` if the filing does not
  /// exist.
  fn set_colin_event_id(
    &self,
    filing_id: i64,
    colin_event_id: i64,
  ) -> impl Future<Output = Result<Option<Filing>, Self::Error>> + Send + '_;

  // ── Legacy synchronisation ────────────────────────────────────────────

  /// Completed filings not yet correlated with a legacy event.
  fn pending_colin_filings(
    &self,
  ) -> impl Future<Output = Result<Vec<Filing>, Self::Error>> + Send + '_;

  /// `colin_event_id` if some filing carries it.
  fn find_colin_event_id(
    &self,
    colin_event_id: i64,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// The newest row of the `colin_last_update` watermark table.
  fn last_colin_event_id(
    &self,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  fn record_colin_event_id(
    &self,
    last_event_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
