//! Serialization of a field tree into the packed parameter string

use crate::codec::field::{FieldValue, QueryField};
use std::fmt::Write;

/// Encodes an ordered field tree into one `!`-delimited parameter string.
///
/// Message fields emit their token count followed by their serialized
/// children; the count covers every descendant token, not just direct
/// children, matching the wire format's declared-length framing.
pub fn encode(fields: &[QueryField]) -> String {
    let mut out = String::new();
    encode_into(&mut out, fields);
    out
}

fn encode_into(out: &mut String, fields: &[QueryField]) {
    for field in fields {
        match &field.value {
            FieldValue::Str(v) => {
                let _ = write!(out, "!{}s{}", field.number, v);
            }
            FieldValue::Int(v) => {
                let _ = write!(out, "!{}i{}", field.number, v);
            }
            FieldValue::Double(v) => {
                let _ = write!(out, "!{}d{}", field.number, v);
            }
            FieldValue::Float(v) => {
                let _ = write!(out, "!{}f{}", field.number, v);
            }
            FieldValue::Bool(v) => {
                let _ = write!(out, "!{}b{}", field.number, u8::from(*v));
            }
            FieldValue::Enum(v) => {
                let _ = write!(out, "!{}e{}", field.number, v);
            }
            FieldValue::Message(children) => {
                let _ = write!(out, "!{}m{}", field.number, token_count(children));
                encode_into(out, children);
            }
        }
    }
}

/// Total number of tokens a field list serializes to, messages included
pub(crate) fn token_count(fields: &[QueryField]) -> usize {
    fields
        .iter()
        .map(|f| {
            1 + match &f.value {
                FieldValue::Message(children) => token_count(children),
                _ => 0,
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_leaf_fields() {
        let fields = vec![
            QueryField::string(1, "coffee"),
            QueryField::int(7, 400),
            QueryField::boolean(10, true),
            QueryField::boolean(11, false),
            QueryField::enumeration(3, 2),
        ];
        assert_eq!(encode(&fields), "!1scoffee!7i400!10b1!11b0!3e2");
    }

    #[test]
    fn test_encode_viewport_message() {
        // Shape of the search request's viewport block
        let fields = vec![QueryField::message(
            4,
            vec![
                QueryField::message(
                    1,
                    vec![
                        QueryField::double(1, 10000.0),
                        QueryField::double(2, -74.006),
                        QueryField::double(3, 40.7128),
                    ],
                ),
                QueryField::message(
                    3,
                    vec![QueryField::int(1, 1024), QueryField::int(2, 768)],
                ),
                QueryField::float(4, 13.1),
            ],
        )];
        assert_eq!(
            encode(&fields),
            "!4m8!1m3!1d10000!2d-74.006!3d40.7128!3m2!1i1024!2i768!4f13.1"
        );
    }

    #[test]
    fn test_token_count_counts_descendants() {
        let fields = vec![QueryField::message(
            4,
            vec![
                QueryField::message(1, vec![QueryField::int(1, 0), QueryField::int(2, 0)]),
                QueryField::int(5, 9),
            ],
        )];
        // 4m -> 1m + 1i + 2i + 5i = 4 tokens beneath it
        assert_eq!(token_count(&fields), 5);
        assert!(encode(&fields).starts_with("!4m4"));
    }

    #[test]
    fn test_encode_empty_tree() {
        assert_eq!(encode(&[]), "");
    }
}
