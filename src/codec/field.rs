//! Field tree types and path addressing for the wire codec

use std::fmt;

/// Single-letter type tags used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    /// `s`: string (caller is responsible for percent-encoding)
    String,
    /// `i`: signed integer
    Integer,
    /// `d`: double
    Double,
    /// `f`: float
    Float,
    /// `b`: boolean, serialized as `1` / `0`
    Boolean,
    /// `e`: enum, serialized as an integer discriminant
    Enum,
    /// `m`: nested message carrying a token count
    Message,
}

impl FieldTag {
    /// Parses a tag from its wire character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::String),
            'i' => Some(Self::Integer),
            'd' => Some(Self::Double),
            'f' => Some(Self::Float),
            'b' => Some(Self::Boolean),
            'e' => Some(Self::Enum),
            'm' => Some(Self::Message),
            _ => None,
        }
    }

    /// Returns the wire character for this tag
    pub fn as_char(&self) -> char {
        match self {
            Self::String => 's',
            Self::Integer => 'i',
            Self::Double => 'd',
            Self::Float => 'f',
            Self::Boolean => 'b',
            Self::Enum => 'e',
            Self::Message => 'm',
        }
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Value of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Double(f64),
    Float(f64),
    Bool(bool),
    Enum(i64),
    /// Ordered child fields of a nested message
    Message(Vec<QueryField>),
}

impl FieldValue {
    /// The wire tag corresponding to this value
    pub fn tag(&self) -> FieldTag {
        match self {
            Self::Str(_) => FieldTag::String,
            Self::Int(_) => FieldTag::Integer,
            Self::Double(_) => FieldTag::Double,
            Self::Float(_) => FieldTag::Float,
            Self::Bool(_) => FieldTag::Boolean,
            Self::Enum(_) => FieldTag::Enum,
            Self::Message(_) => FieldTag::Message,
        }
    }
}

/// One field in the wire parameter tree
#[derive(Debug, Clone, PartialEq)]
pub struct QueryField {
    /// Field number within the enclosing message
    pub number: u32,
    pub value: FieldValue,
}

impl QueryField {
    pub fn string(number: u32, value: impl Into<String>) -> Self {
        Self {
            number,
            value: FieldValue::Str(value.into()),
        }
    }

    pub fn int(number: u32, value: i64) -> Self {
        Self {
            number,
            value: FieldValue::Int(value),
        }
    }

    pub fn double(number: u32, value: f64) -> Self {
        Self {
            number,
            value: FieldValue::Double(value),
        }
    }

    pub fn float(number: u32, value: f64) -> Self {
        Self {
            number,
            value: FieldValue::Float(value),
        }
    }

    pub fn boolean(number: u32, value: bool) -> Self {
        Self {
            number,
            value: FieldValue::Bool(value),
        }
    }

    pub fn enumeration(number: u32, value: i64) -> Self {
        Self {
            number,
            value: FieldValue::Enum(value),
        }
    }

    pub fn message(number: u32, children: Vec<QueryField>) -> Self {
        Self {
            number,
            value: FieldValue::Message(children),
        }
    }

    /// The wire tag of this field
    pub fn tag(&self) -> FieldTag {
        self.value.tag()
    }

    /// Child fields, or an empty slice for leaf fields
    pub fn children(&self) -> &[QueryField] {
        match &self.value {
            FieldValue::Message(children) => children,
            _ => &[],
        }
    }
}

/// Looks up a field by dotted field-number path, e.g. `"4.1.3"`.
///
/// At each level the first field with the matching number is taken; interior
/// path segments must address message fields. Returns `None` for any path
/// that does not resolve: never an error.
pub fn field_at<'a>(fields: &'a [QueryField], path: &str) -> Option<&'a QueryField> {
    let mut current = fields;
    let mut found = None;

    for segment in path.split('.') {
        let number: u32 = segment.parse().ok()?;
        let field = current.iter().find(|f| f.number == number)?;
        current = field.children();
        found = Some(field);
    }

    found
}

/// Mutable variant of [`field_at`], used to edit a single field before
/// re-encoding.
pub fn field_at_mut<'a>(fields: &'a mut [QueryField], path: &str) -> Option<&'a mut QueryField> {
    let (segment, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };
    let number: u32 = segment.parse().ok()?;
    let field = fields.iter_mut().find(|f| f.number == number)?;

    match rest {
        None => Some(field),
        Some(rest) => match &mut field.value {
            FieldValue::Message(children) => field_at_mut(children, rest),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Vec<QueryField> {
        vec![
            QueryField::string(1, "lawyers"),
            QueryField::message(
                4,
                vec![
                    QueryField::message(
                        1,
                        vec![
                            QueryField::double(1, 10000.0),
                            QueryField::double(2, -74.0),
                            QueryField::double(3, 40.7),
                        ],
                    ),
                    QueryField::float(4, 13.1),
                ],
            ),
            QueryField::int(7, 400),
        ]
    }

    #[test]
    fn test_tag_roundtrip() {
        for tag in [
            FieldTag::String,
            FieldTag::Integer,
            FieldTag::Double,
            FieldTag::Float,
            FieldTag::Boolean,
            FieldTag::Enum,
            FieldTag::Message,
        ] {
            assert_eq!(FieldTag::from_char(tag.as_char()), Some(tag));
        }
        assert_eq!(FieldTag::from_char('x'), None);
    }

    #[test]
    fn test_field_at_root() {
        let tree = sample_tree();
        let field = field_at(&tree, "7").unwrap();
        assert_eq!(field.value, FieldValue::Int(400));
    }

    #[test]
    fn test_field_at_nested() {
        let tree = sample_tree();
        let field = field_at(&tree, "4.1.3").unwrap();
        assert_eq!(field.value, FieldValue::Double(40.7));

        let field = field_at(&tree, "4.4").unwrap();
        assert_eq!(field.value, FieldValue::Float(13.1));
    }

    #[test]
    fn test_field_at_missing() {
        let tree = sample_tree();
        assert!(field_at(&tree, "9").is_none());
        assert!(field_at(&tree, "4.2").is_none());
        // Path through a leaf does not resolve
        assert!(field_at(&tree, "1.1").is_none());
        // Non-numeric segment
        assert!(field_at(&tree, "4.x").is_none());
    }

    #[test]
    fn test_field_at_mut_edits_value() {
        let mut tree = sample_tree();
        let field = field_at_mut(&mut tree, "4.1.2").unwrap();
        field.value = FieldValue::Double(-73.5);
        assert_eq!(
            field_at(&tree, "4.1.2").unwrap().value,
            FieldValue::Double(-73.5)
        );
    }
}
