//! Parsing the solution payload embedded in an offer record.

use crate::error::PayloadError;
use crate::models::{OfferRecord, SolutionPayload};
use serde_json::Value;

/// Parse `record.solution` as a [`SolutionPayload`].
///
/// The payload must be a JSON object with exactly the string fields
/// `product`, `description` and `monetization`. Anything else is reported as
/// [`PayloadError::Malformed`]; deciding whether to skip the record is left to
/// the caller.
pub fn parse_solution(record: &OfferRecord) -> Result<SolutionPayload, PayloadError> {
    let malformed = |e: serde_json::Error| PayloadError::Malformed {
        reason: e.to_string(),
    };

    // serde accepts a struct from a JSON array too; only objects are allowed.
    let value: Value = serde_json::from_str(&record.solution).map_err(malformed)?;
    if !value.is_object() {
        return Err(PayloadError::Malformed {
            reason: format!("expected a JSON object, found {}", kind_of(&value)),
        });
    }
    serde_json::from_value(value).map_err(malformed)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
