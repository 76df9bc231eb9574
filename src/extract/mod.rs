//! Extraction of structured records from the provider's schema-free responses
//!
//! The API answers with deeply nested, positionally-addressed JSON arrays and
//! no schema. Extractors walk fixed index paths into the decoded tree and map
//! whatever is present into record fields:
//! - missing or short arrays and null slots make a field absent, never an
//!   error;
//! - only a top-level container that is not an array at all fails extraction,
//!   which signals an upstream format change.

mod business;
mod place;
mod reviews;
mod tree;

pub use business::{extract_search_page, SearchPage};
pub use place::extract_place_details;
pub use reviews::{extract_reviews_page, ReviewsPage};
pub use tree::{f64_at, parse_payload, str_at, u64_at, value_at};

use thiserror::Error;

/// Errors signalling a structural mismatch with the expected response shape
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("response payload is not valid JSON: {0}")]
    MalformedPayload(String),

    #[error("response shape mismatch: expected {expected}")]
    ShapeMismatch { expected: &'static str },
}
