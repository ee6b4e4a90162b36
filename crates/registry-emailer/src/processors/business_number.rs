//! The notice that CRA has issued a business number.

use registry_core::{business::Business, filing::Filing};

use super::{completing_party_emails, contact_point_email, join_recipients};
use crate::{
  Result,
  client::{Content, Email},
  templates::{self, EmailContext, Templates},
};

/// Sent to the contact point and completing party of the business's
/// incorporation application, without attachments.
pub fn process(
  templates: &Templates,
  business: &Business,
  incorporation: &Filing,
) -> Result<Email> {
  let legal_name = business.legal_name.clone().unwrap_or_default();
  let ctx = EmailContext {
    identifier: business.identifier.clone(),
    legal_name: legal_name.clone(),
    business_number: business.business_number.clone(),
    ..Default::default()
  };

  let doc = &incorporation.filing_json;
  let recipients =
    join_recipients(contact_point_email(doc).into_iter().chain(completing_party_emails(doc)));

  Ok(Email {
    recipients,
    content: Content {
      subject:     format!("{legal_name} - Business Number Information"),
      body:        templates.render(templates::BUSINESS_NUMBER, &ctx)?,
      attachments: Vec::new(),
    },
  })
}
