//! Conversions between BSON and [Canonical Extended JSON v2](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/).
//!
//! Scalars round-trip exactly, with one caveat: a [`crate::Decimal128`]
//! travels as its canonical decimal string, so non-canonical bit patterns
//! do not survive the trip. Documents lose duplicate field names, which
//! JSON objects cannot represent.
//!
//! ```
//! use mongowire::{doc, extjson};
//!
//! let doc = doc! { "ok": 1.0 };
//! let value = extjson::to_value(&mongowire::Bson::Document(doc))?;
//! assert_eq!(value.to_string(), r#"{"ok":{"$numberDouble":"1.0"}}"#);
//! # Ok::<(), mongowire::Error>(())
//! ```

mod de;
mod json;
pub(crate) mod models;

pub use self::{
    de::{from_value, parse_document},
    json::{to_value, value_for_document},
};
