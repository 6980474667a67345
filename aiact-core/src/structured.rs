//! Strict parsing of structured model output.

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Locate the JSON object in a model response.
///
/// Handles ```` ```json ```` fenced blocks and responses that wrap the object
/// in a sentence of prose. Returns the trimmed input unchanged when neither
/// applies, so the deserialiser reports the real problem.
pub fn extract_json_payload(text: &str) -> &str {
    let trimmed = text.trim();

    for marker in ["```json", "```JSON", "```"] {
        if let Some(start) = trimmed.find(marker) {
            let body = &trimmed[start + marker.len()..];
            if let Some(end) = body.find("```") {
                return body[..end].trim();
            }
        }
    }

    if trimmed.starts_with('{') {
        return trimmed;
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Deserialize a model response into `T`.
///
/// Missing required fields, wrong types and non-JSON output all become
/// [`ModelError::MalformedOutput`]; nothing is filled in beyond the defaults
/// `T` itself declares.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T> {
    let payload = extract_json_payload(text);
    if payload.is_empty() {
        return Err(ModelError::MalformedOutput("empty response".to_string()));
    }
    serde_json::from_str(payload).map_err(|e| ModelError::MalformedOutput(e.to_string()))
}

/// Parse a model response, check it against `schema`, then deserialize it.
///
/// Schema violations (missing fields, out-of-range numbers, blank strings the
/// schema forbids) become [`ModelError::MalformedOutput`] carrying the
/// validator's message.
pub fn parse_validated<T: DeserializeOwned>(text: &str, schema: &Validator) -> Result<T> {
    let value: Value = parse_structured(text)?;
    if let Err(e) = schema.validate(&value) {
        let path = e.instance_path.to_string();
        let path = if path.is_empty() { "/" } else { path.as_str() };
        return Err(ModelError::MalformedOutput(format!("schema validation failed at {path}: {e}")));
    }
    serde_json::from_value(value).map_err(|e| ModelError::MalformedOutput(e.to_string()))
}
