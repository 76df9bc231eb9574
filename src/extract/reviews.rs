//! Review extraction from the paginated reviews endpoint
//!
//! A reviews response carries a continuation token at index 1 and the review
//! entries at index 2. Within one entry:
//!
//! ```text
//! [0][0]            review id
//! [0][1][4][5][0]   author name
//! [0][1][4][5][1]   author photo URL
//! [0][1][6]         relative date string
//! [0][2][0][0]      star rating
//! [0][2][15][0][0]  review text
//! ```

use crate::extract::tree::{str_at, u64_at, value_at};
use crate::extract::ExtractError;
use crate::record::ReviewRecord;
use serde_json::Value;

/// One decoded page of reviews
#[derive(Debug, Default)]
pub struct ReviewsPage {
    pub reviews: Vec<ReviewRecord>,
    /// Token for the next page; absent on the last page
    pub next_token: Option<String>,
}

/// Extracts a page of reviews and its continuation token.
///
/// Fails only when the top-level container is not an array. Entries with
/// neither author nor text are dropped.
pub fn extract_reviews_page(data: &Value) -> Result<ReviewsPage, ExtractError> {
    if !data.is_array() {
        return Err(ExtractError::ShapeMismatch {
            expected: "top-level array",
        });
    }

    let reviews = value_at(data, &[2])
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(review_from_entry)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(ReviewsPage {
        reviews,
        next_token: str_at(data, &[1]).map(String::from),
    })
}

fn review_from_entry(entry: &Value) -> Option<ReviewRecord> {
    let review = ReviewRecord {
        id: str_at(entry, &[0, 0]).map(String::from),
        author: str_at(entry, &[0, 1, 4, 5, 0]).map(String::from),
        author_photo: str_at(entry, &[0, 1, 4, 5, 1]).map(String::from),
        date: str_at(entry, &[0, 1, 6]).map(String::from),
        rating: u64_at(entry, &[0, 2, 0, 0])
            .filter(|r| (1..=5).contains(r))
            .map(|r| r as u8),
        text: str_at(entry, &[0, 2, 15, 0, 0]).map(String::from),
    };

    (!review.is_empty()).then_some(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review_entry(id: &str, author: &str, rating: u64, date: &str, text: &str) -> Value {
        json!([[
            id,
            [
                null,
                null,
                null,
                null,
                [null, null, null, null, null, [author, "https://img.example/a.jpg"]],
                null,
                date
            ],
            [
                [rating],
                null, null, null, null, null, null, null, null, null,
                null, null, null, null, null,
                [[text]]
            ]
        ]])
    }

    fn reviews_response(token: Option<&str>, entries: Vec<Value>) -> Value {
        json!([null, token, entries])
    }

    #[test]
    fn test_extract_reviews_page() {
        let data = reviews_response(
            Some("tok-2"),
            vec![
                review_entry("r1", "Alice", 5, "2 weeks ago", "Great service, would return."),
                review_entry("r2", "Bob", 3, "a month ago", "Average experience overall."),
            ],
        );

        let page = extract_reviews_page(&data).unwrap();
        assert_eq!(page.next_token.as_deref(), Some("tok-2"));
        assert_eq!(page.reviews.len(), 2);

        let first = &page.reviews[0];
        assert_eq!(first.id.as_deref(), Some("r1"));
        assert_eq!(first.author.as_deref(), Some("Alice"));
        assert_eq!(
            first.author_photo.as_deref(),
            Some("https://img.example/a.jpg")
        );
        assert_eq!(first.rating, Some(5));
        assert_eq!(first.date.as_deref(), Some("2 weeks ago"));
        assert_eq!(
            first.text.as_deref(),
            Some("Great service, would return.")
        );
    }

    #[test]
    fn test_last_page_has_no_token() {
        let data = reviews_response(None, vec![review_entry("r1", "Ann", 4, "ago", "ok here")]);
        let page = extract_reviews_page(&data).unwrap();
        assert!(page.next_token.is_none());
        assert_eq!(page.reviews.len(), 1);
    }

    #[test]
    fn test_out_of_range_rating_dropped() {
        let data = reviews_response(None, vec![review_entry("r1", "Ann", 9, "ago", "words")]);
        let page = extract_reviews_page(&data).unwrap();
        assert_eq!(page.reviews[0].rating, None);
    }

    #[test]
    fn test_empty_entries_skipped() {
        let data = json!([null, null, [[[null]], [["id-only"]]]]);
        let page = extract_reviews_page(&data).unwrap();
        assert!(page.reviews.is_empty());
    }

    #[test]
    fn test_missing_reviews_section() {
        let page = extract_reviews_page(&json!([null, null])).unwrap();
        assert!(page.reviews.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_non_array_is_structural_error() {
        assert!(extract_reviews_page(&json!({"blocked": true})).is_err());
    }
}
