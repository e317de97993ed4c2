//! Flat request payloads assembled from bodies and query strings.

use serde_json::{Map, Value};

use crate::error::{StevieError, StevieResult};

/// Merged body and query data available for argument binding.
pub type Payload = Map<String, Value>;

/// Flatten a parsed body into a payload.
///
/// Objects are used as-is. Arrays become index-keyed maps, and so do strings,
/// one entry per character. Numbers, booleans, and `null` carry no named
/// entries and produce an empty payload.
pub fn payload_from_value(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item))
            .collect(),
        Value::String(text) => text
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Payload::new(),
    }
}

/// Parse JSON body text into a payload.
pub fn parse_json_payload(text: &str) -> StevieResult<Payload> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| StevieError::MalformedBody(e.to_string()))?;
    Ok(payload_from_value(value))
}

/// Merge query parameters into a payload. Query values win on key collision.
pub fn merge_query<I, K, V>(payload: &mut Payload, query: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    for (key, value) in query {
        payload.insert(key.into(), Value::String(value.into()));
    }
}
