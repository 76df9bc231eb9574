//! Path walkers over the provider's nested-array responses
//!
//! All lookups return an explicit absence instead of raising, so extractor
//! logic stays a pure mapping from index paths to record fields.

use crate::extract::ExtractError;
use serde_json::Value;

/// Parses a raw response body into a JSON value.
///
/// The provider prefixes responses with the anti-JSON guard `)]}'` and may
/// precede the payload with other noise; parsing starts at the first `[`
/// and ignores anything after the complete top-level array.
pub fn parse_payload(body: &[u8]) -> Result<Value, ExtractError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ExtractError::MalformedPayload(e.to_string()))?;

    let start = text
        .find('[')
        .ok_or_else(|| ExtractError::MalformedPayload("no JSON array in body".to_string()))?;

    let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ExtractError::MalformedPayload(e.to_string())),
        None => Err(ExtractError::MalformedPayload("empty payload".to_string())),
    }
}

/// Walks a sequence of array indices, returning `None` at the first miss
pub fn value_at<'a>(root: &'a Value, path: &[usize]) -> Option<&'a Value> {
    let mut current = root;
    for &idx in path {
        current = current.as_array()?.get(idx)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Non-empty string at the given path
pub fn str_at<'a>(root: &'a Value, path: &[usize]) -> Option<&'a str> {
    value_at(root, path)?.as_str().filter(|s| !s.is_empty())
}

/// Number at the given path, integer slots widened to f64
pub fn f64_at(root: &Value, path: &[usize]) -> Option<f64> {
    value_at(root, path)?.as_f64()
}

pub fn u64_at(root: &Value, path: &[usize]) -> Option<u64> {
    value_at(root, path)?.as_u64()
}

/// Coordinate at the given path, handling both encodings the provider uses:
/// plain degrees, or an E7 integer form (degrees scaled by 1e7) recognizable
/// by its magnitude.
pub fn coord_at(root: &Value, path: &[usize]) -> Option<f64> {
    let raw = f64_at(root, path)?;
    if raw.abs() > 360.0 && raw.fract() == 0.0 {
        Some(raw / 1e7)
    } else {
        Some(raw)
    }
}
