use serde_json::Value;

use super::{DiameterError, MAX_DIAMETER_CM, MIN_DIAMETER_CM, NOT_FOUND_SENTINEL};

/// Pull the answer text out of a model response.
///
/// Accepted shapes: a bare JSON string, or an object whose `response`
/// field is a string.
pub fn response_text(response: &Value) -> Result<&str, DiameterError> {
    match response {
        Value::String(text) => Ok(text.as_str()),
        Value::Object(fields) => fields
            .get("response")
            .and_then(Value::as_str)
            .ok_or(DiameterError::UnexpectedFormat),
        _ => Err(DiameterError::UnexpectedFormat),
    }
}

/// Interpret the model's answer as a diameter in centimetres.
pub fn parse_diameter_response(text: &str) -> Result<f64, DiameterError> {
    let answer = text.trim();

    if answer == NOT_FOUND_SENTINEL {
        return Err(DiameterError::NotFound);
    }

    let value = match answer.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => return Err(DiameterError::InvalidValue(answer.to_string())),
    };

    if !(MIN_DIAMETER_CM..=MAX_DIAMETER_CM).contains(&value) {
        return Err(DiameterError::OutOfRange {
            value,
            min: MIN_DIAMETER_CM,
            max: MAX_DIAMETER_CM,
        });
    }

    Ok(value)
}
