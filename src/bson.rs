//! BSON values, the core of the crate's data model.

use std::fmt;

use crate::{
    array::Array,
    binary::Binary,
    datetime::DateTime,
    decimal128::Decimal128,
    document::Document,
    oid::ObjectId,
    raw::{RawArray, RawDocument},
    spec::ElementType,
};

/// A BSON value.
///
/// Composites decoded shallowly appear as the [`Bson::RawDocument`] /
/// [`Bson::RawArray`] variants, which reference the encoded bytes without
/// copying; a deep decode never produces them.
///
/// Equality is structural with two deliberate exceptions: doubles compare by
/// bit pattern (distinct NaN payloads and signed zeros are preserved, and a
/// NaN is equal to itself), and a raw composite compares equal to a decoded
/// one when decoding the raw side yields an equal value.
#[derive(Clone, Debug)]
pub enum Bson {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Embedded document
    Document(Document),
    /// Array
    Array(Array),
    /// Binary data
    Binary(Binary),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// Boolean value
    Boolean(bool),
    /// UTC datetime
    DateTime(DateTime),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(Regex),
    /// 32-bit signed integer
    Int32(i32),
    /// Timestamp
    Timestamp(Timestamp),
    /// 64-bit signed integer
    Int64(i64),
    /// [128-bit decimal floating point](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md)
    Decimal128(Decimal128),
    /// Embedded document in its encoded form
    RawDocument(RawDocument),
    /// Array in its encoded form
    RawArray(RawArray),
}

impl Bson {
    /// The element type of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Document(..) | Bson::RawDocument(..) => ElementType::EmbeddedDocument,
            Bson::Array(..) | Bson::RawArray(..) => ElementType::Array,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Decimal128(..) => ElementType::Decimal128,
        }
    }

    /// If this value is a double, returns it.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a string, returns a reference to it.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// If this value is a decoded document, returns a reference to it.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// If this value is a decoded array, returns a reference to it.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// If this value is a raw document, returns a reference to it.
    pub fn as_raw_document(&self) -> Option<&RawDocument> {
        match self {
            Bson::RawDocument(raw) => Some(raw),
            _ => None,
        }
    }

    /// If this value is a raw array, returns a reference to it.
    pub fn as_raw_array(&self) -> Option<&RawArray> {
        match self {
            Bson::RawArray(raw) => Some(raw),
            _ => None,
        }
    }

    /// If this value is a boolean, returns it.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an int32, returns it.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an int64, returns it.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is an ObjectId, returns it.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Bson::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a binary, returns a reference to it.
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Bson::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a regular expression, returns a reference to it.
    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            Bson::RegularExpression(v) => Some(v),
            _ => None,
        }
    }

    /// If this value is a timestamp, returns it.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Bson::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a decimal128, returns it.
    pub fn as_decimal128(&self) -> Option<Decimal128> {
        match self {
            Bson::Decimal128(v) => Some(*v),
            _ => None,
        }
    }

    /// If this value is a datetime, returns it.
    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Bson::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Bson::Null)
    }
}

impl PartialEq for Bson {
    fn eq(&self, other: &Self) -> bool {
        use Bson::*;

        match (self, other) {
            // all bit patterns, including every NaN, are distinct and
            // equal to themselves
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (Document(a), Document(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (RawDocument(a), RawDocument(b)) => a.as_bytes() == b.as_bytes(),
            (RawArray(a), RawArray(b)) => a.as_bytes() == b.as_bytes(),
            (RawDocument(r), Document(d)) | (Document(d), RawDocument(r)) => {
                r.decode().map(|dec| &dec == d).unwrap_or(false)
            }
            (RawArray(r), Array(a)) | (Array(a), RawArray(r)) => {
                r.decode().map(|dec| &dec == a).unwrap_or(false)
            }
            (Binary(a), Binary(b)) => a == b,
            (ObjectId(a), ObjectId(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Null, Null) => true,
            (RegularExpression(a), RegularExpression(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Decimal128(a), Decimal128(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Bson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::logging::write_compact(f, self)
    }
}

impl Bson {
    /// Returns an indented, multi-line rendering of this value, suitable for
    /// diffs and debug logs.
    pub fn to_indented_string(&self) -> String {
        crate::logging::indented_string(self)
    }
}

/// A BSON timestamp, used internally by MongoDB replication and sharding.
///
/// The wire form is a single 64-bit value whose high half is the `time`
/// component and whose low half is the `increment` component.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub time: u32,

    /// Ordinal distinguishing operations within the same second.
    pub increment: u32,
}

impl Timestamp {
    pub(crate) fn from_u64(v: u64) -> Self {
        Timestamp {
            time: (v >> 32) as u32,
            increment: v as u32,
        }
    }

    pub(crate) fn to_u64(self) -> u64 {
        (self.time as u64) << 32 | self.increment as u64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_u64())
    }
}

/// A BSON regular expression: a pattern and a set of option characters.
///
/// Both parts travel as C strings and therefore must not contain NUL bytes;
/// encoding a regex that does fails with an invalid-input error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern.
    pub pattern: String,

    /// The regex options, one character per option.
    pub options: String,
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}

impl From<f64> for Bson {
    fn from(v: f64) -> Bson {
        Bson::Double(v)
    }
}

impl From<&str> for Bson {
    fn from(v: &str) -> Bson {
        Bson::String(v.to_owned())
    }
}

impl From<String> for Bson {
    fn from(v: String) -> Bson {
        Bson::String(v)
    }
}

impl From<Document> for Bson {
    fn from(v: Document) -> Bson {
        Bson::Document(v)
    }
}

impl From<Array> for Bson {
    fn from(v: Array) -> Bson {
        Bson::Array(v)
    }
}

impl From<Binary> for Bson {
    fn from(v: Binary) -> Bson {
        Bson::Binary(v)
    }
}

impl From<ObjectId> for Bson {
    fn from(v: ObjectId) -> Bson {
        Bson::ObjectId(v)
    }
}

impl From<bool> for Bson {
    fn from(v: bool) -> Bson {
        Bson::Boolean(v)
    }
}

impl From<DateTime> for Bson {
    fn from(v: DateTime) -> Bson {
        Bson::DateTime(v)
    }
}

impl From<Regex> for Bson {
    fn from(v: Regex) -> Bson {
        Bson::RegularExpression(v)
    }
}

impl From<i32> for Bson {
    fn from(v: i32) -> Bson {
        Bson::Int32(v)
    }
}

impl From<Timestamp> for Bson {
    fn from(v: Timestamp) -> Bson {
        Bson::Timestamp(v)
    }
}

impl From<i64> for Bson {
    fn from(v: i64) -> Bson {
        Bson::Int64(v)
    }
}

impl From<Decimal128> for Bson {
    fn from(v: Decimal128) -> Bson {
        Bson::Decimal128(v)
    }
}

impl From<RawDocument> for Bson {
    fn from(v: RawDocument) -> Bson {
        Bson::RawDocument(v)
    }
}

impl From<RawArray> for Bson {
    fn from(v: RawArray) -> Bson {
        Bson::RawArray(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_equality_is_bitwise() {
        assert_eq!(Bson::Double(f64::NAN), Bson::Double(f64::NAN));
        assert_ne!(Bson::Double(0.0), Bson::Double(-0.0));
        assert_eq!(Bson::Double(1.5), Bson::Double(1.5));

        let weird_nan = f64::from_bits(0x7FF8_0000_0000_0042);
        assert_eq!(Bson::Double(weird_nan), Bson::Double(weird_nan));
        assert_ne!(Bson::Double(weird_nan), Bson::Double(f64::NAN));
    }

    #[test]
    fn cross_type_comparison_is_false() {
        assert_ne!(Bson::Int32(1), Bson::Int64(1));
        assert_ne!(Bson::Null, Bson::Boolean(false));
    }

    #[test]
    fn timestamp_halves() {
        let ts = Timestamp {
            time: 7,
            increment: 12,
        };
        assert_eq!(ts.to_u64(), 7 << 32 | 12);
        assert_eq!(Timestamp::from_u64(ts.to_u64()), ts);
    }
}
