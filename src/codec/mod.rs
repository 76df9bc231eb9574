//! Wire codec for the provider's `!`-delimited parameter format
//!
//! Every request to the search and place endpoints carries a single packed
//! parameter string in which each field is serialized as
//! `!{field number}{type tag}{value}`. Nested message fields declare the
//! total number of tokens beneath them, so the string
//! `!4m8!1m3!1d1000!2d-74!3d40.7!3m2!1i1024!2i768` is one message (field 4)
//! owning eight tokens, two of which are themselves messages.
//!
//! This module provides:
//! - [`QueryField`] / [`FieldValue`]: the ordered field tree
//! - [`encode`]: tree → parameter string
//! - [`decode`]: parameter string → tree, with positioned errors
//! - [`field_at`] / [`field_at_mut`]: dotted field-number path addressing

mod decode;
mod encode;
mod field;

pub use decode::{decode, CodecError};
pub use encode::encode;
pub use field::{field_at, field_at_mut, FieldTag, FieldValue, QueryField};
