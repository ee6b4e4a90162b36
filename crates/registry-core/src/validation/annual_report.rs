//! Annual report rules.

use serde_json::Value;

use super::{ErrorDetail, ValidationContext, date_field};

const AGM_PATH: &str = "filing/annualReport/annualGeneralMeetingDate";

pub(super) fn validate(ctx: &ValidationContext<'_>, section: &Value) -> Vec<ErrorDetail> {
  let agm = match date_field(section, "annualGeneralMeetingDate") {
    Ok(Some(agm)) => agm,
    Ok(None) => return Vec::new(),
    Err(raw) => {
      return vec![ErrorDetail::new(
        AGM_PATH,
        format!("Annual General Meeting Date must be a valid date: {raw}."),
      )];
    }
  };

  if agm > ctx.today {
    return vec![ErrorDetail::new(
      AGM_PATH,
      "Annual General Meeting Date cannot be in the future.",
    )];
  }

  if let Some(last) = ctx.business.last_agm_date
    && agm <= last
  {
    return vec![ErrorDetail::new(
      AGM_PATH,
      format!("Annual General Meeting Date must be after the last AGM date of {last}."),
    )];
  }

  Vec::new()
}
