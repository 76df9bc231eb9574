//! Place detail extraction from place-preview responses
//!
//! The detail payload sits at index 6 of the response. Opening hours appear
//! in one of two layouts: a legacy seven-slot day array at `[34]`, or the
//! newer per-day entry list at `[203][0]` where each entry is
//! `[day name, day number, date, [[span string, …]], …]`.

use crate::extract::business::website_from_contact;
use crate::extract::tree::{f64_at, str_at, u64_at, value_at};
use crate::extract::ExtractError;
use crate::record::PlaceDetails;
use serde_json::Value;
use std::collections::BTreeMap;

const LEGACY_DAYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Extracts detail fields from one place-preview response.
///
/// Fails only when the top-level container is not an array. Every detail
/// field is optional; a response with no recognizable payload yields an
/// empty `PlaceDetails`.
pub fn extract_place_details(data: &Value) -> Result<PlaceDetails, ExtractError> {
    if !data.is_array() {
        return Err(ExtractError::ShapeMismatch {
            expected: "top-level array",
        });
    }

    // Payload at [6]; some variants put the payload at the top level
    let payload = value_at(data, &[6]).unwrap_or(data);

    let categories: Vec<String> = value_at(payload, &[13])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let hours = extract_hours_new(value_at(payload, &[203, 0]))
        .or_else(|| extract_hours_legacy(value_at(payload, &[34])));

    Ok(PlaceDetails {
        phone: str_at(payload, &[178, 0, 0]).map(String::from),
        website: website_from_contact(value_at(payload, &[7])),
        hours,
        rating: f64_at(payload, &[4, 7]),
        review_count: u64_at(payload, &[4, 8]),
        categories,
    })
}

/// Newer hours layout: per-day entries `[day name, _, _, [[span]], …]`
fn extract_hours_new(hours_data: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let entries = hours_data?.as_array()?;
    let mut hours = BTreeMap::new();

    for entry in entries {
        let Some(day) = str_at(entry, &[0]) else {
            continue;
        };
        let span = match value_at(entry, &[3, 0, 0]).and_then(Value::as_str) {
            Some(s) => normalize_span(s),
            None => "Unknown".to_string(),
        };
        hours.insert(day.to_lowercase(), span);
    }

    (!hours.is_empty()).then_some(hours)
}

/// Legacy hours layout: seven day slots at `[34][1]`, Sunday first
fn extract_hours_legacy(hours_data: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let data = hours_data?;
    let schedule = value_at(data, &[1]).unwrap_or(data).as_array()?;
    let mut hours = BTreeMap::new();

    for (i, day_data) in schedule.iter().take(7).enumerate() {
        let span = match value_at(day_data, &[0]) {
            Some(Value::String(s)) => normalize_span(s),
            Some(Value::Array(slots)) if slots.is_empty() => "Closed".to_string(),
            Some(other) => other.to_string(),
            None => "Unknown".to_string(),
        };
        hours.insert(LEGACY_DAYS[i].to_string(), span);
    }

    (!hours.is_empty()).then_some(hours)
}

/// The provider embeds narrow no-break spaces and en dashes in span strings
fn normalize_span(span: &str) -> String {
    span.replace('\u{202f}', " ").replace('\u{2013}', "-")
}
