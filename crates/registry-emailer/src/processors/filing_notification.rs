//! Notifications for filings reaching `PAID` or `COMPLETED`.

use registry_core::{
  business::corp_type_prefix,
  filing::{Filing, FilingStatus, FilingType, LegalBusiness},
};
use serde_json::Value;

use super::{completing_party_emails, contact_point_email, display_name, join_recipients};
use crate::{
  Result,
  client::{Attachment, Content, Email},
  templates::{self, EmailContext, Templates},
};

/// Cooperatives get address and director changes confirmed by mail, not
/// by email.
const COOPERATIVE_PREFIX: &str = "CP";

/// The subject for `filing_type` at `status`, or `None` when no email is
/// sent.
pub fn subject(status: FilingStatus, filing_type: FilingType) -> Option<&'static str> {
  match (status, filing_type) {
    (FilingStatus::Paid, _) => Some("Confirmation of Filing from the Business Registry"),
    (FilingStatus::Completed, FilingType::IncorporationApplication) => {
      Some("Incorporation Documents from the Business Registry")
    }
    (FilingStatus::Completed, FilingType::AnnualReport) => None,
    (FilingStatus::Completed, _) => Some("Filing Documents from the Business Registry"),
    _ => None,
  }
}

fn template(status: FilingStatus, filing_type: FilingType) -> &'static str {
  match (status, filing_type) {
    (FilingStatus::Paid, FilingType::IncorporationApplication) => templates::INCORPORATION_PAID,
    (_, FilingType::IncorporationApplication) => templates::INCORPORATION_COMPLETED,
    (FilingStatus::Paid, _) => templates::FILING_PAID,
    _ => templates::FILING_COMPLETED,
  }
}

/// Comma-joined recipients. Incorporations go to the contact point, plus the
/// completing party once paid; other filings go to the header email, except
/// address and director changes of cooperatives, which go to nobody.
pub fn recipients(
  status: FilingStatus,
  filing_type: FilingType,
  identifier: &str,
  filing_json: &Value,
) -> String {
  match filing_type {
    FilingType::IncorporationApplication => {
      let mut addresses: Vec<String> = contact_point_email(filing_json).into_iter().collect();
      if status == FilingStatus::Paid {
        addresses.extend(completing_party_emails(filing_json));
      }
      join_recipients(addresses)
    }
    FilingType::ChangeOfAddress | FilingType::ChangeOfDirectors
      if corp_type_prefix(identifier) == COOPERATIVE_PREFIX =>
    {
      String::new()
    }
    _ => join_recipients(
      filing_json["filing"]["header"]["email"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_owned),
    ),
  }
}

/// Build the notification, or `None` when this combination is not emailed.
pub fn process(
  templates: &Templates,
  status: FilingStatus,
  filing_type: FilingType,
  filing: &Filing,
  business: &LegalBusiness,
  attachments: Vec<Attachment>,
) -> Result<Option<Email>> {
  let Some(subject) = subject(status, filing_type) else {
    return Ok(None);
  };

  let ctx = EmailContext {
    identifier:      business.identifier.clone(),
    legal_name:      business.legal_name.clone().unwrap_or_default(),
    filing_name:     display_name(filing_type).to_owned(),
    filing_date:     filing.filing_date.date_naive().to_string(),
    business_number: None,
  };
  let body = templates.render(template(status, filing_type), &ctx)?;

  Ok(Some(Email {
    recipients: recipients(status, filing_type, &business.identifier, &filing.filing_json),
    content:    Content { subject: subject.to_owned(), body, attachments },
  }))
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::processors::fixtures;

  fn filing(filing_json: Value, status: FilingStatus) -> Filing {
    Filing {
      id: 1,
      business_id: 1,
      filing_type: FilingType::present_in(&filing_json).first().copied(),
      filing_date: Utc::now(),
      filing_json,
      status,
      payment_token: Some("1".into()),
      colin_event_id: None,
      submitter: None,
    }
  }

  fn business(identifier: &str) -> LegalBusiness {
    LegalBusiness {
      id:         1,
      identifier: identifier.into(),
      legal_name: Some("test business".into()),
      legal_type: corp_type_prefix(identifier).into(),
    }
  }

  #[test]
  fn incorporation_paid_includes_completing_party() {
    let templates = Templates::new().unwrap();
    let f = filing(fixtures::incorporation_filing(), FilingStatus::Paid);
    let email = process(
      &templates,
      FilingStatus::Paid,
      FilingType::IncorporationApplication,
      &f,
      &business("BC1234567"),
      vec![],
    )
    .unwrap()
    .unwrap();
    assert_eq!(email.content.subject, "Confirmation of Filing from the Business Registry");
    assert!(email.recipients.contains("test@test.com"));
    assert!(email.recipients.contains("comp_party@email.com"));
    assert!(!email.recipients.contains("director@email.com"));
    assert!(!email.content.body.is_empty());
    assert!(email.content.attachments.is_empty());
  }

  #[test]
  fn incorporation_completed_goes_to_contact_point() {
    let templates = Templates::new().unwrap();
    let f = filing(fixtures::incorporation_filing(), FilingStatus::Completed);
    let email = process(
      &templates,
      FilingStatus::Completed,
      FilingType::IncorporationApplication,
      &f,
      &business("BC1234567"),
      vec![],
    )
    .unwrap()
    .unwrap();
    assert_eq!(email.content.subject, "Incorporation Documents from the Business Registry");
    assert_eq!(email.recipients, "test@test.com");
  }

  #[test]
  fn maintenance_recipients() {
    for key in ["annualReport", "changeOfAddress", "changeOfDirectors"] {
      let doc = fixtures::maintenance_filing(key);
      let filing_type = FilingType::parse(key).unwrap();
      assert_eq!(
        recipients(FilingStatus::Paid, filing_type, "BC1234567", &doc),
        "test@test.com"
      );
    }
    let doc = fixtures::maintenance_filing("annualReport");
    assert_eq!(
      recipients(FilingStatus::Paid, FilingType::AnnualReport, "CP1234567", &doc),
      "test@test.com"
    );
  }

  #[test]
  fn cooperative_address_and_director_changes_are_suppressed() {
    for filing_type in [FilingType::ChangeOfAddress, FilingType::ChangeOfDirectors] {
      for status in [FilingStatus::Paid, FilingStatus::Completed] {
        let doc = fixtures::maintenance_filing(filing_type.key());
        assert_eq!(recipients(status, filing_type, "CP1234567", &doc), "");
      }
    }
  }

  #[test]
  fn completed_annual_report_is_not_emailed() {
    let templates = Templates::new().unwrap();
    let f = filing(fixtures::maintenance_filing("annualReport"), FilingStatus::Completed);
    let email = process(
      &templates,
      FilingStatus::Completed,
      FilingType::AnnualReport,
      &f,
      &business("BC1234567"),
      vec![],
    )
    .unwrap();
    assert!(email.is_none());
    assert!(subject(FilingStatus::Paid, FilingType::AnnualReport).is_some());
    assert!(subject(FilingStatus::Draft, FilingType::ChangeOfAddress).is_none());
  }
}
