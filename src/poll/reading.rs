use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::poll::PollError;

/// Name of the temperature field in the status body.
pub const TEMP_FIELD: &str = "temp";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
        }
    }
}

/// Decodes a status body into a reading stamped with `at`.
///
/// The body must be a JSON object carrying a finite numeric `temp`. Any other
/// field is ignored.
pub fn decode_reading(body: &str, at: DateTime<Utc>) -> Result<Reading, PollError> {
    let json: Value = serde_json::from_str(body)?;
    let object = json.as_object().ok_or(PollError::NotAnObject)?;
    let field = object
        .get(TEMP_FIELD)
        .ok_or(PollError::MissingField(TEMP_FIELD))?;
    let value = field.as_f64().ok_or(PollError::WrongType(TEMP_FIELD))?;
    if !value.is_finite() {
        return Err(PollError::NotFinite(value));
    }
    Ok(Reading::new(at, value))
}
