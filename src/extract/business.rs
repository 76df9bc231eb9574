//! Business record extraction from search responses
//!
//! Search responses place organic result entries under index 64, with the
//! record payload at `entry[1]`; some response variants bury entries deeper,
//! so a bounded sweep also looks for entry-shaped arrays whose payload sits
//! at index 14. Sponsored entries live under `[2][11][0]` in a different
//! layout. Within one payload:
//!
//! ```text
//! [11]        name              [4][7]   rating
//! [18]        address           [4][8]   review count
//! [78]        place id          [9][2]   latitude
//! [10]        hex id            [9][3]   longitude
//! [89]        feature id        [178]    phone block
//! [13]        categories        [7]      contact block (website)
//! ```

use crate::extract::tree::{coord_at, f64_at, str_at, u64_at, value_at};
use crate::extract::ExtractError;
use crate::record::BusinessRecord;
use serde_json::Value;
use std::collections::HashSet;

/// Index of the organic results section in a search response
const ORGANIC_SECTION: usize = 64;

/// Maximum nesting depth for the entry sweep
const SWEEP_DEPTH: usize = 8;

/// One decoded page of search results
#[derive(Debug, Default)]
pub struct SearchPage {
    pub records: Vec<BusinessRecord>,
    /// Total result count for the whole query, when the provider reports one
    pub total_hint: Option<u64>,
}

/// Extracts every business record from one search response page.
///
/// Fails only when the top-level container is not an array; any individual
/// entry that does not look like a business is skipped.
pub fn extract_search_page(data: &Value, found_in: &str) -> Result<SearchPage, ExtractError> {
    if !data.is_array() {
        return Err(ExtractError::ShapeMismatch {
            expected: "top-level array",
        });
    }

    let mut records = Vec::new();

    // Organic entries: [64][i][1]
    if let Some(section) = value_at(data, &[ORGANIC_SECTION]).and_then(Value::as_array) {
        for entry in section {
            if let Some(record) = value_at(entry, &[1]).and_then(|p| record_from_payload(p, found_in)) {
                records.push(record);
            }
        }
    }

    // Sweep for entry-shaped arrays with the payload at [14]
    sweep_entries(data, found_in, 0, &mut records);

    // Sponsored entries: [2][11][0][i]
    if let Some(ads) = value_at(data, &[2, 11, 0]).and_then(Value::as_array) {
        for ad in ads {
            if let Some(record) = record_from_ad(ad, found_in) {
                records.push(record);
            }
        }
    }

    // A page can surface the same entity through more than one section
    dedupe_page(&mut records);

    Ok(SearchPage {
        records,
        total_hint: u64_at(data, &[1]),
    })
}

/// Recursively looks for arrays whose element 14 is a business payload
fn sweep_entries(value: &Value, found_in: &str, depth: usize, out: &mut Vec<BusinessRecord>) {
    if depth > SWEEP_DEPTH {
        return;
    }
    let Some(items) = value.as_array() else {
        return;
    };

    for item in items {
        if let Some(record) = value_at(item, &[14]).and_then(|p| record_from_payload(p, found_in)) {
            out.push(record);
        } else {
            sweep_entries(item, found_in, depth + 1, out);
        }
    }
}

/// Maps one business payload array into a record, or `None` when the
/// payload has no plausible name.
fn record_from_payload(payload: &Value, found_in: &str) -> Option<BusinessRecord> {
    if !payload.is_array() {
        return None;
    }

    let name = str_at(payload, &[11])?;
    if !plausible_name(name) {
        return None;
    }

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

    Some(BusinessRecord {
        name: name.to_string(),
        address: str_at(payload, &[18]).map(String::from),
        place_id: str_at(payload, &[78]).map(String::from),
        hex_id: str_at(payload, &[10]).map(String::from),
        ftid: str_at(payload, &[89]).map(String::from),
        rating: f64_at(payload, &[4, 7]),
        review_count: u64_at(payload, &[4, 8]),
        latitude: coord_at(payload, &[9, 2]),
        longitude: coord_at(payload, &[9, 3]),
        phone: phone_from_payload(payload),
        website: website_from_contact(value_at(payload, &[7])),
        category: categories.first().cloned(),
        categories,
        found_in: found_in.to_string(),
        ..Default::default()
    })
}

/// Maps one sponsored entry into a record
fn record_from_ad(ad: &Value, found_in: &str) -> Option<BusinessRecord> {
    let name = str_at(ad, &[1])?;
    if !plausible_name(name) {
        return None;
    }

    let website = str_at(ad, &[3, 1])
        .filter(|url| !url.starts_with("https://www.google.com"))
        .map(String::from);

    Some(BusinessRecord {
        name: name.to_string(),
        place_id: str_at(ad, &[0]).map(String::from),
        latitude: coord_at(ad, &[2, 0, 2]),
        longitude: coord_at(ad, &[2, 0, 3]),
        rating: f64_at(ad, &[2, 6]),
        website,
        is_ad: true,
        found_in: found_in.to_string(),
        ..Default::default()
    })
}

/// Rejects slots that carry encoded blobs instead of display names
fn plausible_name(name: &str) -> bool {
    if name.len() < 2 || name.ends_with('=') {
        return false;
    }
    // Long runs of pure base64 alphabet are payload data, not names
    let base64ish = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/');
    !(base64ish && name.len() >= 24)
}

/// Phone number from the payload's phone block: `[178][0][0]` or `[178][0]`
fn phone_from_payload(payload: &Value) -> Option<String> {
    let candidate = str_at(payload, &[178, 0, 0]).or_else(|| str_at(payload, &[178, 0]))?;
    if candidate.starts_with('+') || candidate.starts_with('(') {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Website URL from a contact block: the first entry wrapping a target in
/// the provider's `/url?q=…` redirect form, unwrapped.
pub(crate) fn website_from_contact(contact: Option<&Value>) -> Option<String> {
    let items = contact?.as_array()?;

    for item in items.iter().take(5) {
        let Some(text) = item.as_str() else { continue };
        if let Some(url) = unwrap_redirect(text) {
            return Some(url);
        }
        if text.starts_with("http") && !text.contains("google.com") {
            return Some(text.to_string());
        }
    }
    None
}

/// Unwraps `…/url?q={target}&…` into the decoded target URL
fn unwrap_redirect(text: &str) -> Option<String> {
    let query_start = text.find("/url?")? + "/url?".len();
    url::form_urlencoded::parse(text[query_start..].as_bytes())
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.into_owned())
}

/// Drops within-page duplicates, keyed by place id or name
fn dedupe_page(records: &mut Vec<BusinessRecord>) {
    let mut seen = HashSet::new();
    records.retain(|r| {
        let key = r
            .place_id()
            .map(String::from)
            .unwrap_or_else(|| r.name.clone());
        seen.insert(key)
    });
}
