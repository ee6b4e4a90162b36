//! The partner-jurisdiction (MRAS) notice sent after an incorporation.

use registry_core::filing::{Filing, LegalBusiness};

use super::{contact_point_email, join_recipients};
use crate::{
  Result,
  client::{Content, Email},
  templates::{self, EmailContext, Templates},
};

pub const SUBJECT: &str = "BC Business Registry Partner Information";

/// Sent to the incorporation's contact point, without attachments.
pub fn process(templates: &Templates, filing: &Filing, business: &LegalBusiness) -> Result<Email> {
  let ctx = EmailContext {
    identifier: business.identifier.clone(),
    legal_name: business.legal_name.clone().unwrap_or_default(),
    filing_date: filing.filing_date.date_naive().to_string(),
    ..Default::default()
  };
  Ok(Email {
    recipients: join_recipients(contact_point_email(&filing.filing_json)),
    content:    Content {
      subject:     SUBJECT.to_owned(),
      body:        templates.render(templates::MRAS, &ctx)?,
      attachments: Vec::new(),
    },
  })
}
