//! Worker tests against in-memory stores, with the token, document and
//! notify services mocked.

use std::sync::Arc;

use registry_core::{
  colin::NewCorporation,
  filing::{FilingStatus, NewFiling},
  store::{ColinStore, LegalStore},
};
use registry_store_sqlite::{ColinDb, LegalDb};
use serde_json::{Value, json};
use wiremock::{
  Mock, MockServer, Request, ResponseTemplate,
  matchers::{header, method, path, path_regex},
};

use crate::{
  Error, Outcome, ServiceConfig, Worker, client::ServiceClient, processors::fixtures, run,
};

const PDF: &[u8] = b"%PDF-1.4";

struct Harness {
  server: MockServer,
  colin:  Arc<ColinDb>,
  legal:  Arc<LegalDb>,
  worker: Worker<ColinDb, LegalDb>,
}

async fn harness(notify_status: u16) -> Harness { harness_with(notify_status, None).await }

/// `document_url` overrides the mocked document service.
async fn harness_with(notify_status: u16, document_url: Option<&str>) -> Harness {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/token"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "svc-token"})))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path_regex(r"^/api/v1/businesses/[A-Z]+[0-9]+/filings/[0-9]+$"))
    .and(header("accept", "application/pdf"))
    .and(header("authorization", "Bearer svc-token"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF))
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/notify"))
    .and(header("authorization", "Bearer svc-token"))
    .respond_with(ResponseTemplate::new(notify_status))
    .mount(&server)
    .await;

  let client = ServiceClient::new(ServiceConfig {
    token_url:     format!("{}/token", server.uri()),
    client_id:     "emailer".into(),
    client_secret: "secret".into(),
    legal_api_url: document_url.map_or_else(|| format!("{}/api/v1", server.uri()), str::to_owned),
    notify_url:    format!("{}/notify", server.uri()),
  })
  .unwrap();

  let colin = Arc::new(ColinDb::open_in_memory().await.unwrap());
  let legal = Arc::new(LegalDb::open_in_memory().await.unwrap());
  let worker = Worker::new(colin.clone(), legal.clone(), client).unwrap();
  Harness { server, colin, legal, worker }
}

impl Harness {
  /// Register `identifier` in both databases and file `filing_json` for it.
  async fn filing(&self, identifier: &str, filing_json: Value, status: FilingStatus) -> i64 {
    let corp_type = &identifier[..2];
    if self.colin.find_business(identifier).await.unwrap().is_none() {
      self
        .colin
        .create_corporation(NewCorporation::new(identifier, corp_type, "test business"))
        .await
        .unwrap();
    }
    let business = self.colin.find_business(identifier).await.unwrap().unwrap();
    let legal = self.legal.upsert_business(&business).await.unwrap();
    self
      .legal
      .create_filing(NewFiling {
        business_id: legal.id,
        filing_json,
        status,
        submitter: None,
      })
      .await
      .unwrap()
      .id
  }

  async fn requests_to(&self, prefix: &str) -> Vec<Request> {
    self
      .server
      .received_requests()
      .await
      .unwrap()
      .into_iter()
      .filter(|r| r.url.path().starts_with(prefix))
      .collect()
  }

  async fn notified(&self) -> Vec<Value> {
    self
      .requests_to("/notify")
      .await
      .iter()
      .map(|r| serde_json::from_slice(&r.body).unwrap())
      .collect()
  }
}

fn message(filing_id: i64, email_type: &str, option: &str) -> Value {
  json!({"email": {"filingId": filing_id, "type": email_type, "option": option}})
}

// ── Incorporation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn incorporation_paid_email() {
  let h = harness(200).await;
  let id = h.filing("BC1234567", fixtures::incorporation_filing(), FilingStatus::Paid).await;

  let outcome = h
    .worker
    .process_email(&message(id, "incorporationApplication", "PAID"))
    .await
    .unwrap();
  assert!(matches!(outcome, Outcome::Sent(_)));

  let sent = h.notified().await;
  assert_eq!(sent.len(), 1);
  let email = &sent[0];
  let recipients = email["recipients"].as_str().unwrap();
  assert!(recipients.contains("test@test.com"));
  assert!(recipients.contains("comp_party@email.com"));
  assert_eq!(email["content"]["subject"], "Confirmation of Filing from the Business Registry");
  assert!(!email["content"]["body"].as_str().unwrap().is_empty());

  let attachment = &email["content"]["attachments"][0];
  assert_eq!(attachment["fileName"], "Incorporation Application.pdf");
  assert_eq!(attachment["fileBytes"], "JVBERi0xLjQ=");
}

#[tokio::test]
async fn incorporation_completed_email() {
  let h = harness(200).await;
  let id = h
    .filing("BC1234567", fixtures::incorporation_filing(), FilingStatus::Completed)
    .await;

  h.worker
    .process_email(&message(id, "incorporationApplication", "COMPLETED"))
    .await
    .unwrap();

  let sent = h.notified().await;
  assert_eq!(sent[0]["content"]["subject"], "Incorporation Documents from the Business Registry");
  assert_eq!(sent[0]["recipients"], "test@test.com");
}

#[tokio::test]
async fn mras_email_has_no_attachments() {
  let h = harness(200).await;
  let id = h.filing("BC1234567", fixtures::incorporation_filing(), FilingStatus::Paid).await;

  h.worker
    .process_email(&message(id, "incorporationApplication", "mras"))
    .await
    .unwrap();

  let sent = h.notified().await;
  assert_eq!(sent[0]["content"]["subject"], "BC Business Registry Partner Information");
  assert_eq!(sent[0]["recipients"], "test@test.com");
  assert_eq!(sent[0]["content"]["attachments"], json!([]));
  assert!(h.requests_to("/api/v1").await.is_empty());
}

#[tokio::test]
async fn business_number_email() {
  let h = harness(200).await;
  h.filing("BC1234567", fixtures::incorporation_filing(), FilingStatus::Completed)
    .await;

  let msg = json!({
    "email": {"filingId": null, "type": "businessNumber", "option": "bn", "identifier": "BC1234567"}
  });
  h.worker.process_email(&msg).await.unwrap();

  let sent = h.notified().await;
  let recipients = sent[0]["recipients"].as_str().unwrap();
  assert!(recipients.contains("test@test.com"));
  assert!(recipients.contains("comp_party@email.com"));
  assert_eq!(sent[0]["content"]["subject"], "test business - Business Number Information");
  assert_eq!(sent[0]["content"]["attachments"], json!([]));
}

// ── Maintenance filings ─────────────────────────────────────────────────────

#[tokio::test]
async fn maintenance_notifications() {
  for (status, filing_type) in [
    (FilingStatus::Paid, "annualReport"),
    (FilingStatus::Paid, "changeOfAddress"),
    (FilingStatus::Paid, "changeOfDirectors"),
    (FilingStatus::Completed, "changeOfAddress"),
    (FilingStatus::Completed, "changeOfDirectors"),
  ] {
    let h = harness(200).await;
    let id = h
      .filing("BC1234567", fixtures::maintenance_filing(filing_type), status)
      .await;

    let outcome = h
      .worker
      .process_email(&message(id, filing_type, status.as_str()))
      .await
      .unwrap();
    assert!(matches!(outcome, Outcome::Sent(_)), "{filing_type} {status}");

    let sent = h.notified().await;
    assert_eq!(sent[0]["recipients"], "test@test.com", "{filing_type} {status}");
    assert!(!sent[0]["content"]["subject"].as_str().unwrap().is_empty());
    assert_eq!(sent[0]["content"]["attachments"].as_array().unwrap().len(), 1);
  }
}

#[tokio::test]
async fn completed_annual_report_is_skipped() {
  let h = harness(200).await;
  let id = h
    .filing("BC1234567", fixtures::maintenance_filing("annualReport"), FilingStatus::Completed)
    .await;

  let outcome = h
    .worker
    .process_email(&message(id, "annualReport", "COMPLETED"))
    .await
    .unwrap();
  assert_eq!(outcome, Outcome::Skipped);
  assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn cooperative_changes_go_to_nobody() {
  for (status, filing_type) in [
    (FilingStatus::Paid, "changeOfAddress"),
    (FilingStatus::Paid, "changeOfDirectors"),
    (FilingStatus::Completed, "changeOfAddress"),
    (FilingStatus::Completed, "changeOfDirectors"),
  ] {
    let h = harness(200).await;
    let id = h
      .filing("CP1234567", fixtures::maintenance_filing(filing_type), status)
      .await;

    h.worker
      .process_email(&message(id, filing_type, status.as_str()))
      .await
      .unwrap();
    assert_eq!(h.notified().await[0]["recipients"], "", "{filing_type} {status}");
  }
}

// ── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_type_is_skipped() {
  let h = harness(200).await;
  let outcome = h
    .worker
    .process_email(&message(1, "specialResolution", "PAID"))
    .await
    .unwrap();
  assert_eq!(outcome, Outcome::Skipped);
}

#[tokio::test]
async fn message_without_email_fails() {
  let h = harness(200).await;
  let err = h.worker.process_email(&json!({"type": "bn"})).await.unwrap_err();
  assert!(matches!(err, Error::MissingEmail(_)));
}

#[tokio::test]
async fn unknown_filing_fails() {
  let h = harness(200).await;
  let err = h
    .worker
    .process_email(&message(99, "changeOfAddress", "PAID"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::FilingNotFound(99)));
}

#[tokio::test]
async fn unreachable_document_service_sends_without_attachment() {
  let h = harness_with(200, Some("http://127.0.0.1:1/api/v1")).await;
  let id = h
    .filing("BC1234567", fixtures::maintenance_filing("changeOfAddress"), FilingStatus::Paid)
    .await;

  let outcome = h
    .worker
    .process_email(&message(id, "changeOfAddress", "PAID"))
    .await
    .unwrap();
  assert!(matches!(outcome, Outcome::Sent(_)));

  let sent = h.notified().await;
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0]["content"]["attachments"], json!([]));
}

#[tokio::test]
async fn notify_failure_is_reported() {
  let h = harness(500).await;
  let id = h
    .filing("BC1234567", fixtures::maintenance_filing("changeOfAddress"), FilingStatus::Paid)
    .await;
  let err = h
    .worker
    .process_email(&message(id, "changeOfAddress", "PAID"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Upstream { service: "notify service", .. }));
}

// ── Run loop ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn run_processes_each_line_and_survives_failures() {
  let h = harness(200).await;
  let id = h
    .filing("BC1234567", fixtures::maintenance_filing("changeOfAddress"), FilingStatus::Paid)
    .await;

  let input = format!(
    "not json\n\n{}\n{}\n{}\n",
    json!({"nothing": "here"}),
    message(id, "annualReport", "COMPLETED"),
    message(id, "changeOfAddress", "PAID"),
  );
  let sent = run(&h.worker, input.as_bytes()).await.unwrap();
  assert_eq!(sent, 1);
  assert_eq!(h.notified().await.len(), 1);
}
