//! Constants derived from the [BSON specification](http://bsonspec.org/spec.html).

use std::fmt;

const ELEMENT_TYPE_DOUBLE: u8 = 0x01;
const ELEMENT_TYPE_STRING: u8 = 0x02;
const ELEMENT_TYPE_EMBEDDED_DOCUMENT: u8 = 0x03;
const ELEMENT_TYPE_ARRAY: u8 = 0x04;
const ELEMENT_TYPE_BINARY: u8 = 0x05;
const ELEMENT_TYPE_UNDEFINED: u8 = 0x06; // retired
const ELEMENT_TYPE_OBJECT_ID: u8 = 0x07;
const ELEMENT_TYPE_BOOLEAN: u8 = 0x08;
const ELEMENT_TYPE_DATETIME: u8 = 0x09;
const ELEMENT_TYPE_NULL: u8 = 0x0A;
const ELEMENT_TYPE_REGULAR_EXPRESSION: u8 = 0x0B;
const ELEMENT_TYPE_DB_POINTER: u8 = 0x0C; // retired
const ELEMENT_TYPE_JAVASCRIPT_CODE: u8 = 0x0D; // retired
const ELEMENT_TYPE_SYMBOL: u8 = 0x0E; // retired
const ELEMENT_TYPE_JAVASCRIPT_CODE_WITH_SCOPE: u8 = 0x0F; // retired
const ELEMENT_TYPE_INT32: u8 = 0x10;
const ELEMENT_TYPE_TIMESTAMP: u8 = 0x11;
const ELEMENT_TYPE_INT64: u8 = 0x12;
const ELEMENT_TYPE_DECIMAL128: u8 = 0x13;
const ELEMENT_TYPE_MIN_KEY: u8 = 0xFF; // retired
const ELEMENT_TYPE_MAX_KEY: u8 = 0x7F; // retired

/// All BSON element types, including the retired ones that are recognized on
/// decode only to be rejected with a structured error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Double = ELEMENT_TYPE_DOUBLE,
    String = ELEMENT_TYPE_STRING,
    EmbeddedDocument = ELEMENT_TYPE_EMBEDDED_DOCUMENT,
    Array = ELEMENT_TYPE_ARRAY,
    Binary = ELEMENT_TYPE_BINARY,
    Undefined = ELEMENT_TYPE_UNDEFINED,
    ObjectId = ELEMENT_TYPE_OBJECT_ID,
    Boolean = ELEMENT_TYPE_BOOLEAN,
    DateTime = ELEMENT_TYPE_DATETIME,
    Null = ELEMENT_TYPE_NULL,
    RegularExpression = ELEMENT_TYPE_REGULAR_EXPRESSION,
    DbPointer = ELEMENT_TYPE_DB_POINTER,
    JavaScriptCode = ELEMENT_TYPE_JAVASCRIPT_CODE,
    Symbol = ELEMENT_TYPE_SYMBOL,
    JavaScriptCodeWithScope = ELEMENT_TYPE_JAVASCRIPT_CODE_WITH_SCOPE,
    Int32 = ELEMENT_TYPE_INT32,
    Timestamp = ELEMENT_TYPE_TIMESTAMP,
    Int64 = ELEMENT_TYPE_INT64,
    Decimal128 = ELEMENT_TYPE_DECIMAL128,
    MinKey = ELEMENT_TYPE_MIN_KEY,
    MaxKey = ELEMENT_TYPE_MAX_KEY,
}

impl ElementType {
    /// Converts a tag byte to an element type, returning `None` for bytes
    /// that are not BSON tags at all.
    pub fn from_tag(tag: u8) -> Option<Self> {
        use ElementType::*;

        Some(match tag {
            ELEMENT_TYPE_DOUBLE => Double,
            ELEMENT_TYPE_STRING => String,
            ELEMENT_TYPE_EMBEDDED_DOCUMENT => EmbeddedDocument,
            ELEMENT_TYPE_ARRAY => Array,
            ELEMENT_TYPE_BINARY => Binary,
            ELEMENT_TYPE_UNDEFINED => Undefined,
            ELEMENT_TYPE_OBJECT_ID => ObjectId,
            ELEMENT_TYPE_BOOLEAN => Boolean,
            ELEMENT_TYPE_DATETIME => DateTime,
            ELEMENT_TYPE_NULL => Null,
            ELEMENT_TYPE_REGULAR_EXPRESSION => RegularExpression,
            ELEMENT_TYPE_DB_POINTER => DbPointer,
            ELEMENT_TYPE_JAVASCRIPT_CODE => JavaScriptCode,
            ELEMENT_TYPE_SYMBOL => Symbol,
            ELEMENT_TYPE_JAVASCRIPT_CODE_WITH_SCOPE => JavaScriptCodeWithScope,
            ELEMENT_TYPE_INT32 => Int32,
            ELEMENT_TYPE_TIMESTAMP => Timestamp,
            ELEMENT_TYPE_INT64 => Int64,
            ELEMENT_TYPE_DECIMAL128 => Decimal128,
            ELEMENT_TYPE_MIN_KEY => MinKey,
            ELEMENT_TYPE_MAX_KEY => MaxKey,
            _ => return None,
        })
    }

    /// Whether this type was retired by MongoDB. Retired tags are rejected
    /// on decode, and no [`crate::Bson`] variant exists for them.
    pub fn is_retired(self) -> bool {
        matches!(
            self,
            ElementType::Undefined
                | ElementType::DbPointer
                | ElementType::JavaScriptCode
                | ElementType::Symbol
                | ElementType::JavaScriptCodeWithScope
                | ElementType::MinKey
                | ElementType::MaxKey
        )
    }
}

const BINARY_SUBTYPE_GENERIC: u8 = 0x00;
const BINARY_SUBTYPE_FUNCTION: u8 = 0x01;
const BINARY_SUBTYPE_BINARY_OLD: u8 = 0x02;
const BINARY_SUBTYPE_UUID_OLD: u8 = 0x03;
const BINARY_SUBTYPE_UUID: u8 = 0x04;
const BINARY_SUBTYPE_MD5: u8 = 0x05;
const BINARY_SUBTYPE_ENCRYPTED: u8 = 0x06;
const BINARY_SUBTYPE_COMPRESSED: u8 = 0x07;
const BINARY_SUBTYPE_SENSITIVE: u8 = 0x08;
const BINARY_SUBTYPE_VECTOR: u8 = 0x09;
const BINARY_SUBTYPE_USER: u8 = 0x80;

/// Subtype of a BSON binary value.
///
/// Subtypes the crate does not know about are carried through verbatim in
/// [`BinarySubtype::Reserved`] and [`BinarySubtype::UserDefined`]; decoding
/// never rejects a subtype.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    BinaryOld,
    UuidOld,
    Uuid,
    Md5,
    Encrypted,
    Compressed,
    Sensitive,
    Vector,
    /// A subtype in the reserved range (0x0A..0x80) with no assigned meaning.
    Reserved(u8),
    /// A subtype in the user-defined range (0x80..).
    UserDefined(u8),
}

impl From<BinarySubtype> for u8 {
    fn from(t: BinarySubtype) -> u8 {
        match t {
            BinarySubtype::Generic => BINARY_SUBTYPE_GENERIC,
            BinarySubtype::Function => BINARY_SUBTYPE_FUNCTION,
            BinarySubtype::BinaryOld => BINARY_SUBTYPE_BINARY_OLD,
            BinarySubtype::UuidOld => BINARY_SUBTYPE_UUID_OLD,
            BinarySubtype::Uuid => BINARY_SUBTYPE_UUID,
            BinarySubtype::Md5 => BINARY_SUBTYPE_MD5,
            BinarySubtype::Encrypted => BINARY_SUBTYPE_ENCRYPTED,
            BinarySubtype::Compressed => BINARY_SUBTYPE_COMPRESSED,
            BinarySubtype::Sensitive => BINARY_SUBTYPE_SENSITIVE,
            BinarySubtype::Vector => BINARY_SUBTYPE_VECTOR,
            BinarySubtype::Reserved(b) => b,
            BinarySubtype::UserDefined(b) => b,
        }
    }
}

impl From<u8> for BinarySubtype {
    fn from(t: u8) -> BinarySubtype {
        match t {
            BINARY_SUBTYPE_GENERIC => BinarySubtype::Generic,
            BINARY_SUBTYPE_FUNCTION => BinarySubtype::Function,
            BINARY_SUBTYPE_BINARY_OLD => BinarySubtype::BinaryOld,
            BINARY_SUBTYPE_UUID_OLD => BinarySubtype::UuidOld,
            BINARY_SUBTYPE_UUID => BinarySubtype::Uuid,
            BINARY_SUBTYPE_MD5 => BinarySubtype::Md5,
            BINARY_SUBTYPE_ENCRYPTED => BinarySubtype::Encrypted,
            BINARY_SUBTYPE_COMPRESSED => BinarySubtype::Compressed,
            BINARY_SUBTYPE_SENSITIVE => BinarySubtype::Sensitive,
            BINARY_SUBTYPE_VECTOR => BinarySubtype::Vector,
            _ if t < BINARY_SUBTYPE_USER => BinarySubtype::Reserved(t),
            _ => BinarySubtype::UserDefined(t),
        }
    }
}

impl fmt::Display for BinarySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinarySubtype::Generic => f.write_str("generic"),
            BinarySubtype::Function => f.write_str("function"),
            BinarySubtype::BinaryOld => f.write_str("generic-old"),
            BinarySubtype::UuidOld => f.write_str("uuid-old"),
            BinarySubtype::Uuid => f.write_str("uuid"),
            BinarySubtype::Md5 => f.write_str("md5"),
            BinarySubtype::Encrypted => f.write_str("encrypted"),
            BinarySubtype::Compressed => f.write_str("compressed"),
            BinarySubtype::Sensitive => f.write_str("sensitive"),
            BinarySubtype::Vector => f.write_str("vector"),
            BinarySubtype::Reserved(b) => write!(f, "reserved({})", b),
            BinarySubtype::UserDefined(b) => write!(f, "user({})", b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for tag in 0x01..=0x13u8 {
            let et = ElementType::from_tag(tag).expect("known tag");
            assert_eq!(et as u8, tag);
        }

        assert_eq!(ElementType::from_tag(0xFF), Some(ElementType::MinKey));
        assert_eq!(ElementType::from_tag(0x7F), Some(ElementType::MaxKey));
        assert_eq!(ElementType::from_tag(0x14), None);
        assert_eq!(ElementType::from_tag(0x00), None);
    }

    #[test]
    fn subtype_round_trip() {
        for b in 0..=255u8 {
            let subtype = BinarySubtype::from(b);
            assert_eq!(u8::from(subtype), b);
        }
    }

    #[test]
    fn unknown_subtypes_carried_verbatim() {
        assert_eq!(BinarySubtype::from(0x0A), BinarySubtype::Reserved(0x0A));
        assert_eq!(BinarySubtype::from(0x80), BinarySubtype::UserDefined(0x80));
        assert_eq!(BinarySubtype::from(0xF0), BinarySubtype::UserDefined(0xF0));
    }
}
