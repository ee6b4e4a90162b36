//! Routing a queue message to its processor and delivering the result.

use std::sync::Arc;

use registry_core::{
  filing::{Filing, FilingStatus, FilingType, LegalBusiness},
  store::{ColinStore, LegalStore},
};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};

use crate::{
  Error, Result,
  client::{Email, ServiceClient},
  message::{BUSINESS_NUMBER, EmailRequest, MRAS_OPTION},
  processors::{business_number, display_name, filing_notification, mras},
  templates::Templates,
};

/// What became of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Sent(Email),
  /// Nothing to send for this type and option.
  Skipped,
}

pub struct Worker<C, L> {
  colin:     Arc<C>,
  legal:     Arc<L>,
  client:    ServiceClient,
  templates: Templates,
}

impl<C, L> Worker<C, L>
where
  C: ColinStore,
  L: LegalStore,
{
  pub fn new(colin: Arc<C>, legal: Arc<L>, client: ServiceClient) -> Result<Self> {
    Ok(Self { colin, legal, client, templates: Templates::new()? })
  }

  /// Process one `{"email": {...}}` message end to end.
  pub async fn process_email(&self, msg: &Value) -> Result<Outcome> {
    let req = EmailRequest::from_message(msg)?;

    if req.email_type == BUSINESS_NUMBER {
      return self.business_number(&req).await;
    }
    let Ok(filing_type) = FilingType::parse(&req.email_type) else {
      tracing::info!(email_type = %req.email_type, "no email for this type");
      return Ok(Outcome::Skipped);
    };
    if filing_type == FilingType::IncorporationApplication && req.option == MRAS_OPTION {
      return self.mras(&req).await;
    }
    match FilingStatus::parse(&req.option) {
      Ok(status @ (FilingStatus::Paid | FilingStatus::Completed)) => {
        self.filing_notification(&req, status, filing_type).await
      }
      _ => {
        tracing::info!(
          email_type = %req.email_type,
          option = %req.option,
          "no email for this option"
        );
        Ok(Outcome::Skipped)
      }
    }
  }

  // ── Lookups ─────────────────────────────────────────────────────────────

  async fn filing_and_business(&self, req: &EmailRequest) -> Result<(Filing, LegalBusiness)> {
    let filing_id = req
      .filing_id
      .ok_or_else(|| Error::MissingFilingId(req.email_type.clone()))?;
    let filing = self
      .legal
      .get_filing(filing_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::FilingNotFound(filing_id))?;
    let business = self
      .legal
      .business(filing.business_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::BusinessNotFound(filing.business_id.to_string()))?;
    Ok((filing, business))
  }

  async fn send(&self, token: &str, email: Email) -> Result<Outcome> {
    self.client.send_email(token, &email).await?;
    tracing::info!(subject = %email.content.subject, "email sent");
    Ok(Outcome::Sent(email))
  }

  // ── Processors ──────────────────────────────────────────────────────────

  async fn filing_notification(
    &self,
    req: &EmailRequest,
    status: FilingStatus,
    filing_type: FilingType,
  ) -> Result<Outcome> {
    if filing_notification::subject(status, filing_type).is_none() {
      tracing::info!(email_type = %req.email_type, option = %req.option, "notification skipped");
      return Ok(Outcome::Skipped);
    }
    let (filing, business) = self.filing_and_business(req).await?;

    let token = self.client.bearer_token().await?;
    let file_name = format!("{}.pdf", display_name(filing_type));
    let attachments = self
      .client
      .filing_pdf(&token, &business.identifier, filing.id, &file_name)
      .await?
      .into_iter()
      .collect();

    match filing_notification::process(
      &self.templates,
      status,
      filing_type,
      &filing,
      &business,
      attachments,
    )? {
      Some(email) => self.send(&token, email).await,
      None => Ok(Outcome::Skipped),
    }
  }

  async fn mras(&self, req: &EmailRequest) -> Result<Outcome> {
    let (filing, business) = self.filing_and_business(req).await?;
    let email = mras::process(&self.templates, &filing, &business)?;
    let token = self.client.bearer_token().await?;
    self.send(&token, email).await
  }

  async fn business_number(&self, req: &EmailRequest) -> Result<Outcome> {
    let identifier = req
      .identifier
      .as_deref()
      .ok_or_else(|| Error::MissingIdentifier(req.email_type.clone()))?;

    let business = self
      .colin
      .find_business(identifier)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::BusinessNotFound(identifier.to_owned()))?;
    let legal = self
      .legal
      .find_business(identifier)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NoIncorporation(identifier.to_owned()))?;
    let incorporation = self
      .legal
      .latest_filing_of_type(legal.id, FilingType::IncorporationApplication)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NoIncorporation(identifier.to_owned()))?;

    let email = business_number::process(&self.templates, &business, &incorporation)?;
    let token = self.client.bearer_token().await?;
    self.send(&token, email).await
  }
}

/// Process newline-delimited JSON messages from `reader` until it closes,
/// one at a time. A failed message is logged and the loop moves on. Returns
/// the number of emails sent.
pub async fn run<C, L, R>(worker: &Worker<C, L>, reader: R) -> Result<usize>
where
  C: ColinStore,
  L: LegalStore,
  R: AsyncBufRead + Unpin,
{
  let mut lines = reader.lines();
  let mut sent = 0;

  while let Some(line) = lines.next_line().await? {
    if line.trim().is_empty() {
      continue;
    }
    let result = match serde_json::from_str::<Value>(&line) {
      Ok(msg) => worker.process_email(&msg).await,
      Err(e) => Err(e.into()),
    };
    match result {
      Ok(Outcome::Sent(_)) => sent += 1,
      Ok(Outcome::Skipped) => {}
      Err(e) => tracing::error!(error = %e, "failed to process email message"),
    }
  }

  Ok(sent)
}
