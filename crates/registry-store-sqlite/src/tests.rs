//! Integration tests for `ColinDb` and `LegalDb` against in-memory databases.

use chrono::NaiveDate;
use registry_core::{
  business::GOOD_STANDING,
  colin::{NewAnnualReport, NewCorporation},
  filing::{Address, AddressType, FilingStatus, FilingType, NewFiling},
  reset::EventInfo,
  store::{ColinStore, LegalStore},
};
use serde_json::json;

use crate::{ColinDb, Error, LegalDb};

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

async fn colin() -> ColinDb { ColinDb::open_in_memory().await.expect("in-memory colin db") }

async fn legal() -> LegalDb { LegalDb::open_in_memory().await.expect("in-memory legal db") }

async fn coop(db: &ColinDb, corp_num: &str) -> i64 {
  db.create_corporation(NewCorporation::new(corp_num, "CP", "Test Cooperative"))
    .await
    .unwrap()
    .event_id
}

fn report(period_end: NaiveDate, agm: Option<NaiveDate>) -> NewAnnualReport {
  NewAnnualReport { period_end, agm_date: agm }
}

// ─── Business resolution ─────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_identifier_is_not_found() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  assert!(db.find_business("CP9999999").await.unwrap().is_none());
}

#[tokio::test]
async fn resolves_new_domestic_corporation() {
  let db = colin().await;
  coop(&db, "CP0001965").await;

  let b = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(b.identifier, "CP0001965");
  assert_eq!(b.legal_name.as_deref(), Some("Test Cooperative"));
  assert_eq!(b.legal_type, "CP");
  assert_eq!(b.corp_state, "ACT");
  assert_eq!(b.status, "Active");
  assert_eq!(b.jurisdiction.as_deref(), Some("BC"));
  assert_eq!(b.last_ar_date, None);
  assert!(b.last_ledger_timestamp.is_some());
  assert_eq!(b.cache_id, 0);
}

#[tokio::test]
async fn resolves_foreign_jurisdictions() {
  let db = colin().await;

  let mut other = NewCorporation::new("XCP0000001", "XCP", "Other Coop");
  other.jurisdiction_code = Some("OT".into());
  other.other_jurisdiction_desc = Some("Isle of Man".into());
  db.create_corporation(other).await.unwrap();

  let mut alberta = NewCorporation::new("XCP0000002", "XCP", "Alberta Coop");
  alberta.jurisdiction_code = Some("AB".into());
  db.create_corporation(alberta).await.unwrap();

  let b = db.find_business("XCP0000001").await.unwrap().unwrap();
  assert_eq!(b.jurisdiction.as_deref(), Some("Isle of Man"));
  let b = db.find_business("XCP0000002").await.unwrap().unwrap();
  assert_eq!(b.jurisdiction.as_deref(), Some("AB"));
}

// ─── Annual reports ──────────────────────────────────────────────────────────

#[tokio::test]
async fn filing_annual_report_updates_corporation_and_state() {
  let db = colin().await;
  let founding = coop(&db, "CP0001965").await;

  let ar = db
    .file_annual_report("CP0001965", report(date(2018, 12, 31), Some(date(2018, 6, 1))))
    .await
    .unwrap();
  assert_eq!(ar.period_end, Some(date(2018, 12, 31)));

  let b = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(b.last_ar_date, Some(date(2018, 12, 31)));
  assert_eq!(b.last_agm_date, Some(date(2018, 6, 1)));
  assert_eq!(b.status, GOOD_STANDING);

  let states = db.corp_states("CP0001965").await.unwrap();
  assert_eq!(states.len(), 2);
  assert_eq!(states[0].start_event_id, founding);
  assert_eq!(states[0].end_event_id, Some(ar.event_id));
  assert!(states[1].is_active());
  assert_eq!(states[1].start_event_id, ar.event_id);
}

#[tokio::test]
async fn annual_report_without_agm_moves_only_the_ledger() {
  let db = colin().await;
  coop(&db, "CP0001965").await;

  db.file_annual_report("CP0001965", report(date(2018, 12, 31), None))
    .await
    .unwrap();

  let b = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(b.last_agm_date, None);
  assert_eq!(b.last_ar_date, Some(date(2018, 12, 31)));
  assert_eq!(b.status, "Active");
}

#[tokio::test]
async fn annual_report_lookup_by_year() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  db.file_annual_report("CP0001965", report(date(2017, 12, 31), Some(date(2017, 6, 1))))
    .await
    .unwrap();
  db.file_annual_report("CP0001965", report(date(2018, 12, 31), Some(date(2018, 6, 1))))
    .await
    .unwrap();

  let latest = db.annual_report("CP0001965", None).await.unwrap().unwrap();
  assert_eq!(latest.period_end, Some(date(2018, 12, 31)));
  let older = db.annual_report("CP0001965", Some(2017)).await.unwrap().unwrap();
  assert_eq!(older.agm_date, Some(date(2017, 6, 1)));
  assert!(db.annual_report("CP0001965", Some(2016)).await.unwrap().is_none());
}

#[tokio::test]
async fn filing_for_unknown_corporation_fails() {
  let db = colin().await;
  let err = db
    .file_annual_report("CP0000000", report(date(2018, 12, 31), None))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CorporationNotFound(id) if id == "CP0000000"));
}

// ─── Corp states ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_corp_state_keeps_one_active_row() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  let ar = db
    .file_annual_report("CP0001965", report(date(2018, 12, 31), None))
    .await
    .unwrap();

  db.update_corp_state(ar.event_id, "CP0001965", "HIS").await.unwrap();

  let states = db.corp_states("CP0001965").await.unwrap();
  assert_eq!(states.iter().filter(|s| s.is_active()).count(), 1);
  assert_eq!(states.last().unwrap().state_type, "HIS");
  let b = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(b.status, "Historical");
}

#[tokio::test]
async fn reset_corp_states_inverts_transition() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  let before = db.corp_states("CP0001965").await.unwrap();

  let ar = db
    .file_annual_report("CP0001965", report(date(2018, 12, 31), None))
    .await
    .unwrap();
  assert_ne!(db.corp_states("CP0001965").await.unwrap(), before);

  db.reset_corp_states(&[ar.event_id]).await.unwrap();
  assert_eq!(db.corp_states("CP0001965").await.unwrap(), before);
}

#[tokio::test]
async fn reset_corp_states_ignores_unknown_and_empty() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  let before = db.corp_states("CP0001965").await.unwrap();

  db.reset_corp_states(&[]).await.unwrap();
  db.reset_corp_states(&[4242]).await.unwrap();

  assert_eq!(db.corp_states("CP0001965").await.unwrap(), before);
}

#[tokio::test]
async fn undoing_a_superseded_state_names_corporation() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  let first = db
    .file_annual_report("CP0001965", report(date(2017, 12, 31), None))
    .await
    .unwrap();
  db.file_annual_report("CP0001965", report(date(2018, 12, 31), None))
    .await
    .unwrap();
  let before = db.corp_states("CP0001965").await.unwrap();

  let err = db.reset_corp_states(&[first.event_id]).await.unwrap_err();
  assert!(
    matches!(&err, Error::ResetCorporation { corp_num, .. } if corp_num == "CP0001965"),
    "{err:?}"
  );
  assert_eq!(db.corp_states("CP0001965").await.unwrap(), before);

  let err = db
    .reset(vec![EventInfo { corp_num: "CP0001965".into(), event_id: first.event_id }])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ResetCorporation { .. }), "{err:?}");
  assert_eq!(db.corp_states("CP0001965").await.unwrap(), before);
}

// ─── Reset ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_restores_previous_annual_report() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  let first = db
    .file_annual_report("CP0001965", report(date(2017, 12, 31), Some(date(2017, 6, 1))))
    .await
    .unwrap();
  let second = db
    .file_annual_report("CP0001965", report(date(2018, 12, 31), None))
    .await
    .unwrap();

  let events = vec![EventInfo { corp_num: "CP0001965".into(), event_id: second.event_id }];
  let dates = db
    .last_ar_dates_for_reset(&events, &[second.event_id])
    .await
    .unwrap();
  assert_eq!(dates.len(), 1);
  assert_eq!(dates[0].first_event_id, second.event_id);
  assert_eq!(dates[0].ar_date, Some(date(2017, 12, 31)));
  assert_eq!(dates[0].ar_filed_date, Some(first.filed_at));

  db.reset(events).await.unwrap();

  let b = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(b.last_ar_date, Some(date(2017, 12, 31)));
  assert_eq!(b.last_agm_date, Some(date(2017, 6, 1)));
  assert_eq!(b.last_ledger_timestamp, Some(first.filed_at));

  let latest = db.annual_report("CP0001965", None).await.unwrap().unwrap();
  assert_eq!(latest.event_id, first.event_id);

  let states = db.corp_states("CP0001965").await.unwrap();
  assert_eq!(states.len(), 2);
  assert!(states[1].is_active());
  assert_eq!(states[1].start_event_id, first.event_id);
}

#[tokio::test]
async fn reset_corporations_uses_ar_date_when_no_agm_remains() {
  let db = colin().await;
  coop(&db, "CP0001965").await;
  db.file_annual_report("CP0001965", report(date(2017, 12, 31), None))
    .await
    .unwrap();
  let second = db
    .file_annual_report("CP0001965", report(date(2018, 12, 31), Some(date(2018, 6, 1))))
    .await
    .unwrap();

  let events = vec![EventInfo { corp_num: "CP0001965".into(), event_id: second.event_id }];
  db.reset_corporations(&events, &[second.event_id]).await.unwrap();

  let b = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(b.last_agm_date, Some(date(2017, 12, 31)));
}

#[tokio::test]
async fn failed_reset_names_corporation_and_rolls_back() {
  let db = colin().await;
  let founding = coop(&db, "CP0001965").await;
  let before = db.corp_states("CP0001965").await.unwrap();

  // the founding event still anchors the legal name
  let err = db
    .reset(vec![EventInfo { corp_num: "CP0001965".into(), event_id: founding }])
    .await
    .unwrap_err();
  assert!(
    matches!(&err, Error::ResetCorporation { corp_num, .. } if corp_num == "CP0001965"),
    "{err:?}"
  );
  assert_eq!(db.corp_states("CP0001965").await.unwrap(), before);
}

// ─── Legal: businesses ───────────────────────────────────────────────────────

async fn legal_business(db: &LegalDb, colin: &ColinDb) -> i64 {
  coop(colin, "CP0001965").await;
  let b = colin.find_business("CP0001965").await.unwrap().unwrap();
  db.upsert_business(&b).await.unwrap().id
}

#[tokio::test]
async fn upsert_business_is_idempotent() {
  let (db, c) = (legal().await, colin().await);
  coop(&c, "CP0001965").await;
  let mut b = c.find_business("CP0001965").await.unwrap().unwrap();

  let first = db.upsert_business(&b).await.unwrap();
  b.legal_name = Some("Renamed Cooperative".into());
  let second = db.upsert_business(&b).await.unwrap();

  assert_eq!(first.id, second.id);
  let found = db.find_business("CP0001965").await.unwrap().unwrap();
  assert_eq!(found.legal_name.as_deref(), Some("Renamed Cooperative"));
  assert!(db.find_business("CP0000000").await.unwrap().is_none());
  assert_eq!(db.business(first.id).await.unwrap(), Some(found));
  assert!(db.business(first.id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn mailing_address_is_replaced() {
  let (db, c) = (legal().await, colin().await);
  let id = legal_business(&db, &c).await;
  assert!(db.mailing_address(id).await.unwrap().is_none());

  let mut address = Address {
    address_type: AddressType::Mailing,
    street:       Some("1234 Main St".into()),
    city:         Some("Victoria".into()),
    region:       Some("BC".into()),
    postal_code:  Some("V8W 1A1".into()),
    country:      Some("CA".into()),
  };
  db.set_address(id, address.clone()).await.unwrap();
  address.city = Some("Nanaimo".into());
  db.set_address(id, address.clone()).await.unwrap();

  assert_eq!(db.mailing_address(id).await.unwrap(), Some(address));
}

// ─── Legal: filings ──────────────────────────────────────────────────────────

fn ar_doc() -> serde_json::Value {
  json!({
    "filing": {
      "header": {"name": "annualReport", "date": "2019-04-08"},
      "business": {"identifier": "CP0001965"},
      "annualReport": {"annualGeneralMeetingDate": "2019-04-08"}
    }
  })
}

#[tokio::test]
async fn create_and_get_filing() {
  let (db, c) = (legal().await, colin().await);
  let business_id = legal_business(&db, &c).await;

  let filing = db
    .create_filing(NewFiling {
      business_id,
      filing_json: ar_doc(),
      status: FilingStatus::Pending,
      submitter: Some("staff".into()),
    })
    .await
    .unwrap();
  assert_eq!(filing.filing_type, Some(FilingType::AnnualReport));
  assert_eq!(filing.payment_token, None);

  db.set_payment_token(filing.id, "153".into()).await.unwrap();
  let fetched = db.get_filing(filing.id).await.unwrap().unwrap();
  assert_eq!(fetched.payment_token.as_deref(), Some("153"));
  assert_eq!(fetched.filing_json, ar_doc());
  assert!(db.get_filing(filing.id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn update_filing_replaces_document() {
  let (db, c) = (legal().await, colin().await);
  let business_id = legal_business(&db, &c).await;
  let filing = db
    .create_filing(NewFiling {
      business_id,
      filing_json: ar_doc(),
      status: FilingStatus::Draft,
      submitter: None,
    })
    .await
    .unwrap();

  let mut doc = ar_doc();
  doc["filing"]["annualReport"]["annualGeneralMeetingDate"] = json!("2019-04-09");
  let updated = db
    .update_filing(filing.id, doc.clone(), FilingStatus::Pending, None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.status, FilingStatus::Pending);
  assert_eq!(updated.filing_json, doc);

  let missing = db
    .update_filing(filing.id + 10, doc, FilingStatus::Pending, None)
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn list_and_latest_filings() {
  let (db, c) = (legal().await, colin().await);
  let business_id = legal_business(&db, &c).await;

  let mut ids = Vec::new();
  for status in [FilingStatus::Completed, FilingStatus::Draft, FilingStatus::Completed] {
    let f = db
      .create_filing(NewFiling { business_id, filing_json: ar_doc(), status, submitter: None })
      .await
      .unwrap();
    ids.push(f.id);
  }

  let completed = db
    .list_filings(business_id, vec![FilingStatus::Completed])
    .await
    .unwrap();
  assert_eq!(completed.iter().map(|f| f.id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);

  let latest = db
    .latest_filing_of_type(business_id, FilingType::AnnualReport)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(latest.id, ids[2]);
  assert!(
    db.latest_filing_of_type(business_id, FilingType::ChangeOfAddress)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn colin_synchronisation_bookkeeping() {
  let (db, c) = (legal().await, colin().await);
  let business_id = legal_business(&db, &c).await;
  let filing = db
    .create_filing(NewFiling {
      business_id,
      filing_json: ar_doc(),
      status: FilingStatus::Pending,
      submitter: None,
    })
    .await
    .unwrap();

  assert!(db.pending_colin_filings().await.unwrap().is_empty());
  db.set_filing_status(filing.id, FilingStatus::Completed).await.unwrap();
  assert_eq!(db.pending_colin_filings().await.unwrap().len(), 1);

  let synced = db.set_colin_event_id(filing.id, 1234).await.unwrap().unwrap();
  assert_eq!(synced.colin_event_id, Some(1234));
  assert_eq!(synced.json()["filing"]["header"]["colinId"], 1234);
  assert!(db.pending_colin_filings().await.unwrap().is_empty());
  assert_eq!(db.find_colin_event_id(1234).await.unwrap(), Some(1234));
  assert_eq!(db.find_colin_event_id(99).await.unwrap(), None);
  assert!(db.set_colin_event_id(filing.id + 1, 1).await.unwrap().is_none());

  assert_eq!(db.last_colin_event_id().await.unwrap(), None);
  db.record_colin_event_id(3).await.unwrap();
  db.record_colin_event_id(5).await.unwrap();
  assert_eq!(db.last_colin_event_id().await.unwrap(), Some(5));
}
