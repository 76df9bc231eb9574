//! Parsing of packed parameter strings back into a field tree
//!
//! Decoding is strict: any token that cannot be parsed, and any message
//! whose declared token count overruns the available input, fails the whole
//! decode with the offending token's position. There is no silent partial
//! result.

use crate::codec::field::{FieldTag, FieldValue, QueryField};
use thiserror::Error;

/// Errors produced while decoding a parameter string
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("token {index} ({token:?}): missing field number")]
    MissingFieldNumber { index: usize, token: String },

    #[error("token {index} ({token:?}): missing or unknown type tag")]
    UnknownTag { index: usize, token: String },

    #[error("token {index} ({token:?}): invalid {tag} value")]
    InvalidValue {
        index: usize,
        token: String,
        tag: FieldTag,
    },

    #[error(
        "token {index} ({token:?}): message declares {declared} tokens but only {available} remain"
    )]
    Truncated {
        index: usize,
        token: String,
        declared: usize,
        available: usize,
    },
}

/// A token as scanned from the wire, before tree reconstruction
struct RawToken<'a> {
    number: u32,
    tag: FieldTag,
    value: &'a str,
    index: usize,
    text: &'a str,
}

/// Decodes a `!`-delimited parameter string into an ordered field tree.
///
/// The empty string decodes to an empty tree. `decode(encode(t)) == t` holds
/// for every tree `t` produced through [`QueryField`] constructors.
///
/// [`QueryField`]: crate::codec::QueryField
pub fn decode(input: &str) -> Result<Vec<QueryField>, CodecError> {
    let tokens = scan(input)?;
    let mut pos = 0;
    let fields = build(&tokens, &mut pos, tokens.len())?;
    Ok(fields)
}

/// Splits the input on `!` and parses each segment's number/tag/value
fn scan(input: &str) -> Result<Vec<RawToken<'_>>, CodecError> {
    let mut tokens = Vec::new();

    for (index, text) in input.split('!').skip(1).enumerate() {
        let digits_end = text
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(text.len(), |(i, _)| i);

        if digits_end == 0 {
            return Err(CodecError::MissingFieldNumber {
                index,
                token: text.to_string(),
            });
        }

        let number: u32 =
            text[..digits_end]
                .parse()
                .map_err(|_| CodecError::MissingFieldNumber {
                    index,
                    token: text.to_string(),
                })?;

        let mut rest = text[digits_end..].chars();
        let tag = rest
            .next()
            .and_then(FieldTag::from_char)
            .ok_or_else(|| CodecError::UnknownTag {
                index,
                token: text.to_string(),
            })?;

        tokens.push(RawToken {
            number,
            tag,
            value: rest.as_str(),
            index,
            text,
        });
    }

    Ok(tokens)
}

/// Consumes exactly `count` tokens starting at `*pos`, reconstructing
/// nesting from the counts declared by message tokens.
fn build(
    tokens: &[RawToken<'_>],
    pos: &mut usize,
    count: usize,
) -> Result<Vec<QueryField>, CodecError> {
    let mut fields = Vec::new();
    let mut consumed = 0;

    while consumed < count {
        let token = &tokens[*pos];
        *pos += 1;
        consumed += 1;

        let value = match token.tag {
            FieldTag::String => FieldValue::Str(token.value.to_string()),
            FieldTag::Integer => FieldValue::Int(parse_int(token)?),
            FieldTag::Enum => FieldValue::Enum(parse_int(token)?),
            FieldTag::Double => FieldValue::Double(parse_num(token)?),
            FieldTag::Float => FieldValue::Float(parse_num(token)?),
            FieldTag::Boolean => FieldValue::Bool(token.value == "1"),
            FieldTag::Message => {
                let declared = if token.value.is_empty() {
                    0
                } else {
                    token
                        .value
                        .parse::<usize>()
                        .map_err(|_| CodecError::InvalidValue {
                            index: token.index,
                            token: token.text.to_string(),
                            tag: FieldTag::Message,
                        })?
                };

                let available = count - consumed;
                if declared > available {
                    return Err(CodecError::Truncated {
                        index: token.index,
                        token: token.text.to_string(),
                        declared,
                        available,
                    });
                }

                let children = build(tokens, pos, declared)?;
                consumed += declared;
                FieldValue::Message(children)
            }
        };

        fields.push(QueryField {
            number: token.number,
            value,
        });
    }

    Ok(fields)
}

/// Empty numeric values decode as zero, matching the wire format's own
/// tolerance for elided values.
fn parse_int(token: &RawToken<'_>) -> Result<i64, CodecError> {
    if token.value.is_empty() {
        return Ok(0);
    }
    token.value.parse().map_err(|_| CodecError::InvalidValue {
        index: token.index,
        token: token.text.to_string(),
        tag: token.tag,
    })
}

fn parse_num(token: &RawToken<'_>) -> Result<f64, CodecError> {
    if token.value.is_empty() {
        return Ok(0.0);
    }
    token.value.parse().map_err(|_| CodecError::InvalidValue {
        index: token.index,
        token: token.text.to_string(),
        tag: token.tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::codec::field::{field_at_mut, QueryField};

    fn search_tree() -> Vec<QueryField> {
        vec![
            QueryField::string(1, "lawyers"),
            QueryField::message(
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
            ),
            QueryField::int(7, 400),
            QueryField::int(8, 0),
            QueryField::boolean(10, true),
        ]
    }

    #[test]
    fn test_roundtrip_search_tree() {
        let tree = search_tree();
        let encoded = encode(&tree);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_decode_flat_fields() {
        let fields = decode("!1scoffee!7i400!10b1!3e2").unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], QueryField::string(1, "coffee"));
        assert_eq!(fields[1], QueryField::int(7, 400));
        assert_eq!(fields[2], QueryField::boolean(10, true));
        assert_eq!(fields[3], QueryField::enumeration(3, 2));
    }

    #[test]
    fn test_decode_nested_messages() {
        let fields = decode("!4m5!1m3!1d5000!2d2.35!3d48.85!4f13.1").unwrap();
        assert_eq!(fields.len(), 1);
        let children = fields[0].children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].children().len(), 3);
    }

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(decode("").unwrap(), vec![]);
    }

    #[test]
    fn test_decode_empty_numeric_values() {
        let fields = decode("!7i!1d!2f").unwrap();
        assert_eq!(fields[0], QueryField::int(7, 0));
        assert_eq!(fields[1], QueryField::double(1, 0.0));
        assert_eq!(fields[2], QueryField::float(2, 0.0));
    }

    #[test]
    fn test_decode_unknown_tag_reports_position() {
        let err = decode("!1scoffee!2z9").unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownTag {
                index: 1,
                token: "2z9".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_missing_field_number() {
        let err = decode("!sbroken").unwrap_err();
        assert!(matches!(err, CodecError::MissingFieldNumber { index: 0, .. }));
    }

    #[test]
    fn test_decode_bad_integer_value() {
        let err = decode("!7iabc").unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidValue {
                index: 0,
                tag: FieldTag::Integer,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_truncated_message() {
        let err = decode("!4m8!1i1").unwrap_err();
        assert_eq!(
            err,
            CodecError::Truncated {
                index: 0,
                token: "4m8".to_string(),
                declared: 8,
                available: 1,
            }
        );
    }

    #[test]
    fn test_decode_nested_overrun() {
        // Inner message claims more tokens than its parent has left
        let err = decode("!4m2!1m5!1i1").unwrap_err();
        assert!(matches!(err, CodecError::Truncated { index: 1, .. }));
    }

    #[test]
    fn test_mutate_one_field_changes_one_token() {
        let tree = search_tree();
        let encoded = encode(&tree);

        let mut decoded = decode(&encoded).unwrap();
        field_at_mut(&mut decoded, "8").unwrap().value = crate::codec::FieldValue::Int(400);
        let re_encoded = encode(&decoded);

        let before: Vec<&str> = encoded.split('!').collect();
        let after: Vec<&str> = re_encoded.split('!').collect();
        assert_eq!(before.len(), after.len());

        let diffs: Vec<usize> = (0..before.len())
            .filter(|&i| before[i] != after[i])
            .collect();
        assert_eq!(diffs.len(), 1);
        assert_eq!(after[diffs[0]], "8i400");
    }

    #[test]
    fn test_roundtrip_is_stable_under_reencoding() {
        let encoded = encode(&search_tree());
        let once = decode(&encoded).unwrap();
        let twice = decode(&encode(&once)).unwrap();
        assert_eq!(once, twice);
    }
}
