//! Async HTTP client for the emailer's collaborators: the OAuth token
//! endpoint, the document service and the notify service.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Endpoints and service-account credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// OAuth token endpoint (client credentials grant).
  pub token_url:     String,
  pub client_id:     String,
  pub client_secret: String,
  /// Base URL of the legal API, which renders filing PDFs.
  pub legal_api_url: String,
  /// Email delivery endpoint.
  pub notify_url:    String,
}

// ─── Email ────────────────────────────────────────────────────────────────────

/// A message ready for the notify service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
  /// Comma-separated addresses. Empty when every recipient is suppressed.
  pub recipients: String,
  pub content:    Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
  pub subject:     String,
  pub body:        String,
  pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
  pub file_name:    String,
  /// Base64 of the file contents.
  pub file_bytes:   String,
  pub file_url:     String,
  pub attach_order: String,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ServiceClient {
  client: Client,
  config: ServiceConfig,
}

impl ServiceClient {
  pub fn new(config: ServiceConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  /// A bearer token for the service account.
  pub async fn bearer_token(&self) -> Result<String> {
    let resp = self
      .client
      .post(&self.config.token_url)
      .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Upstream { service: "token service", status: resp.status() });
    }
    let token: TokenResponse = resp.json().await?;
    Ok(token.access_token)
  }

  /// `GET {legal_api_url}/businesses/{identifier}/filings/{filing_id}` as a
  /// PDF. An unreachable service or a non-success answer is logged and
  /// yields `None`, so the email still goes out without it.
  pub async fn filing_pdf(
    &self,
    token: &str,
    identifier: &str,
    filing_id: i64,
    file_name: &str,
  ) -> Result<Option<Attachment>> {
    let url = format!(
      "{}/businesses/{identifier}/filings/{filing_id}",
      self.config.legal_api_url.trim_end_matches('/')
    );
    let sent = self
      .client
      .get(&url)
      .bearer_auth(token)
      .header(header::ACCEPT, "application/pdf")
      .send()
      .await;
    let resp = match sent {
      Ok(resp) if resp.status().is_success() => resp,
      Ok(resp) => {
        tracing::warn!(%identifier, filing_id, status = %resp.status(), "no pdf for filing");
        return Ok(None);
      }
      Err(e) => {
        tracing::warn!(%identifier, filing_id, error = %e, "document service unreachable");
        return Ok(None);
      }
    };
    let bytes = resp.bytes().await?;
    Ok(Some(Attachment {
      file_name:    file_name.to_owned(),
      file_bytes:   B64.encode(&bytes),
      file_url:     String::new(),
      attach_order: "1".into(),
    }))
  }

  /// Hand `email` to the notify service.
  pub async fn send_email(&self, token: &str, email: &Email) -> Result<()> {
    let resp = self
      .client
      .post(&self.config.notify_url)
      .bearer_auth(token)
      .json(email)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Upstream { service: "notify service", status: resp.status() });
    }
    Ok(())
  }
}
