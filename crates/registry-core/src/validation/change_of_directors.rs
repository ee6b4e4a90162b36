//! Change of directors rules.

use serde_json::Value;

use super::{ErrorDetail, ValidationContext, date_field, non_blank};

pub(super) fn validate(ctx: &ValidationContext<'_>, section: &Value) -> Vec<ErrorDetail> {
  let directors = section
    .get("directors")
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or_default();

  if directors.is_empty() {
    return vec![ErrorDetail::new(
      "filing/changeOfDirectors/directors",
      "At least one director is required.",
    )];
  }

  let mut errors = Vec::new();
  for (i, director) in directors.iter().enumerate() {
    let base = format!("filing/changeOfDirectors/directors/{i}");
    let officer = director.get("officer").unwrap_or(&Value::Null);

    if non_blank(officer, "firstName").is_none() {
      errors.push(ErrorDetail::new(
        format!("{base}/officer/firstName"),
        "Director first name is required.",
      ));
    }
    if non_blank(officer, "lastName").is_none() {
      errors.push(ErrorDetail::new(
        format!("{base}/officer/lastName"),
        "Director last name is required.",
      ));
    }

    match date_field(director, "appointmentDate") {
      Ok(Some(d)) if d > ctx.today => errors.push(ErrorDetail::new(
        format!("{base}/appointmentDate"),
        "Appointment date cannot be in the future.",
      )),
      Ok(_) => {}
      Err(raw) => errors.push(ErrorDetail::new(
        format!("{base}/appointmentDate"),
        format!("Appointment date must be a valid date: {raw}."),
      )),
    }

    if let Some(country) = director
      .get("deliveryAddress")
      .and_then(|a| a.get("addressCountry"))
      .and_then(Value::as_str)
      && !is_country_code(country)
    {
      errors.push(ErrorDetail::new(
        format!("{base}/deliveryAddress/addressCountry"),
        "Address Country must be a 2-letter ISO 3166 code.",
      ));
    }
  }
  errors
}

fn is_country_code(s: &str) -> bool {
  s.len() == 2 && s.bytes().all(|b| b.is_ascii_uppercase())
}
