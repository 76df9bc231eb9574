//! Record types for discovered businesses and their reviews
//!
//! A [`BusinessRecord`] is created by the search executor from a raw response
//! payload and later mutated in place by the enrichment pipeline (fields are
//! added, identifiers never change). Identity for deduplication purposes is
//! the pair of provider identifiers: two records describe the same entity if
//! either non-empty identifier matches.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One discovered business entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Display name
    pub name: String,

    /// Full street address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Primary provider identifier (opaque token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,

    /// Secondary provider identifier (`0x…:0x…` form); required for enrichment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_id: Option<String>,

    /// Feature identifier (`/g/…` form)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ftid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Primary category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// All categories reported by the provider
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Opening hours, day name → span string (enrichment only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<BTreeMap<String, String>>,

    /// True for sponsored/ad entries
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_ad: bool,

    /// Label of the region (sub-region or whole area) whose cell found this
    pub found_in: String,

    /// Reviews fetched during enrichment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<ReviewRecord>,
}

impl BusinessRecord {
    /// Returns true if at least one identifier is present and non-empty
    pub fn has_identity(&self) -> bool {
        self.place_id.as_deref().is_some_and(|s| !s.is_empty())
            || self.hex_id.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Non-empty primary identifier, if any
    pub fn place_id(&self) -> Option<&str> {
        self.place_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Non-empty secondary identifier, if any
    pub fn hex_id(&self) -> Option<&str> {
        self.hex_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Identifier used for enrichment bookkeeping: place_id, else hex_id
    pub fn enrichment_key(&self) -> Option<&str> {
        self.place_id().or_else(|| self.hex_id())
    }

    /// Merges detail fields into this record, never overwriting a value that
    /// is already present and never touching the identifiers.
    pub fn merge_details(&mut self, details: PlaceDetails) {
        if self.phone.is_none() {
            self.phone = details.phone;
        }
        if self.website.is_none() {
            self.website = details.website;
        }
        if self.hours.is_none() {
            self.hours = details.hours;
        }
        if self.rating.is_none() {
            self.rating = details.rating;
        }
        if self.review_count.is_none() {
            self.review_count = details.review_count;
        }
        if self.categories.is_empty() {
            self.categories = details.categories;
        }
        if self.category.is_none() {
            self.category = self.categories.first().cloned();
        }
    }
}

/// One review, immutable once created
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_photo: Option<String>,

    /// Star rating 1–5
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    /// Relative date string as reported ("3 years ago")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ReviewRecord {
    /// A review with neither author nor text carries no information
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.text.is_none()
    }
}

/// Detail fields fetched by the enrichment pipeline before merging
#[derive(Debug, Clone, Default)]
pub struct PlaceDetails {
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Option<BTreeMap<String, String>>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_ids(place_id: Option<&str>, hex_id: Option<&str>) -> BusinessRecord {
        BusinessRecord {
            name: "Test".to_string(),
            place_id: place_id.map(String::from),
            hex_id: hex_id.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_has_identity() {
        assert!(record_with_ids(Some("p1"), None).has_identity());
        assert!(record_with_ids(None, Some("0x1:0x2")).has_identity());
        assert!(!record_with_ids(None, None).has_identity());
        assert!(!record_with_ids(Some(""), Some("")).has_identity());
    }

    #[test]
    fn test_enrichment_key_prefers_place_id() {
        let rec = record_with_ids(Some("p1"), Some("0x1:0x2"));
        assert_eq!(rec.enrichment_key(), Some("p1"));

        let rec = record_with_ids(Some(""), Some("0x1:0x2"));
        assert_eq!(rec.enrichment_key(), Some("0x1:0x2"));
    }

    #[test]
    fn test_merge_details_never_overwrites() {
        let mut rec = record_with_ids(Some("p1"), None);
        rec.phone = Some("+1 555 0100".to_string());
        rec.rating = Some(4.5);

        rec.merge_details(PlaceDetails {
            phone: Some("+1 555 9999".to_string()),
            website: Some("https://example.com".to_string()),
            rating: Some(1.0),
            review_count: Some(12),
            ..Default::default()
        });

        assert_eq!(rec.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(rec.rating, Some(4.5));
        assert_eq!(rec.website.as_deref(), Some("https://example.com"));
        assert_eq!(rec.review_count, Some(12));
        assert_eq!(rec.place_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_merge_details_fills_category_from_list() {
        let mut rec = record_with_ids(Some("p1"), None);
        rec.merge_details(PlaceDetails {
            categories: vec!["Lawyer".to_string(), "Notary".to_string()],
            ..Default::default()
        });
        assert_eq!(rec.category.as_deref(), Some("Lawyer"));
        assert_eq!(rec.categories.len(), 2);
    }

    #[test]
    fn test_review_is_empty() {
        assert!(ReviewRecord::default().is_empty());
        let review = ReviewRecord {
            author: Some("A".to_string()),
            ..Default::default()
        };
        assert!(!review.is_empty());
    }

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let rec = record_with_ids(Some("p1"), None);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("place_id"));
        assert!(!json.contains("hex_id"));
        assert!(!json.contains("is_ad"));
        assert!(!json.contains("reviews"));
    }
}
