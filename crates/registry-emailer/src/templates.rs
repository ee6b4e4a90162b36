//! Email bodies, rendered with minijinja from templates compiled into the
//! binary.

use minijinja::Environment;
use serde::Serialize;

use crate::Result;

pub const FILING_PAID: &str = "filing_paid.html";
pub const FILING_COMPLETED: &str = "filing_completed.html";
pub const INCORPORATION_PAID: &str = "incorporation_paid.html";
pub const INCORPORATION_COMPLETED: &str = "incorporation_completed.html";
pub const MRAS: &str = "mras.html";
pub const BUSINESS_NUMBER: &str = "business_number.html";

const SOURCES: [(&str, &str); 6] = [
  (FILING_PAID, include_str!("../templates/filing_paid.html")),
  (FILING_COMPLETED, include_str!("../templates/filing_completed.html")),
  (INCORPORATION_PAID, include_str!("../templates/incorporation_paid.html")),
  (INCORPORATION_COMPLETED, include_str!("../templates/incorporation_completed.html")),
  (MRAS, include_str!("../templates/mras.html")),
  (BUSINESS_NUMBER, include_str!("../templates/business_number.html")),
];

/// Everything a template may refer to.
#[derive(Debug, Default, Serialize)]
pub struct EmailContext {
  pub identifier:      String,
  pub legal_name:      String,
  /// Human-readable filing type, e.g. `Change of Address`.
  pub filing_name:     String,
  pub filing_date:     String,
  pub business_number: Option<String>,
}

pub struct Templates {
  env: Environment<'static>,
}

impl Templates {
  pub fn new() -> Result<Self> {
    let mut env = Environment::new();
    for (name, source) in SOURCES {
      env.add_template(name, source)?;
    }
    Ok(Self { env })
  }

  pub fn render(&self, name: &str, ctx: &EmailContext) -> Result<String> {
    Ok(self.env.get_template(name)?.render(ctx)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_template_renders() {
    let templates = Templates::new().unwrap();
    let ctx = EmailContext {
      identifier: "BC1234567".into(),
      legal_name: "test business".into(),
      filing_name: "Annual Report".into(),
      filing_date: "2019-04-08".into(),
      business_number: Some("123456789BC0001".into()),
    };
    for (name, _) in SOURCES {
      let body = templates.render(name, &ctx).unwrap();
      assert!(body.contains("Business Registry"), "{name}: {body}");
    }
    assert!(templates.render(BUSINESS_NUMBER, &ctx).unwrap().contains("123456789BC0001"));
  }

  #[test]
  fn unknown_template_is_an_error() {
    let templates = Templates::new().unwrap();
    assert!(templates.render("nope.html", &EmailContext::default()).is_err());
  }
}
