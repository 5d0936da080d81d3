//! Encoding of BSON values and exact size computation.
//!
//! [`size`] is purely structural and computed before any byte is written,
//! so a composite can be encoded into a single allocation of exactly the
//! right length. Encoding a value decoded from bytes reproduces those bytes
//! exactly; raw composites are emitted verbatim.

use crate::{
    array::Array,
    bson::Bson,
    document::Document,
    error::{Error, Result},
    raw::{RawArray, RawDocument},
};

/// The number of bytes [`encode_document`] / [`encode_array`] will produce
/// for the given value.
pub fn size(value: &Bson) -> usize {
    match value {
        Bson::Double(_) => 8,
        Bson::String(s) => s.len() + 5,
        Bson::Document(doc) => size_document(doc),
        Bson::Array(arr) => size_array(arr),
        Bson::Binary(bin) => bin.bytes.len() + 5,
        Bson::ObjectId(_) => 12,
        Bson::Boolean(_) => 1,
        Bson::DateTime(_) => 8,
        Bson::Null => 0,
        Bson::RegularExpression(re) => re.pattern.len() + re.options.len() + 2,
        Bson::Int32(_) => 4,
        Bson::Timestamp(_) => 8,
        Bson::Int64(_) => 8,
        Bson::Decimal128(_) => 16,
        Bson::RawDocument(raw) => raw.len(),
        Bson::RawArray(raw) => raw.len(),
    }
}

pub(crate) fn size_document(doc: &Document) -> usize {
    let mut res = 5;

    for (name, value) in doc.iter() {
        res += 1 + size_cstring(name) + size(value);
    }

    res
}

pub(crate) fn size_array(arr: &Array) -> usize {
    let mut res = 5;

    for (i, value) in arr.iter().enumerate() {
        res += 1 + size_cstring(&i.to_string()) + size(value);
    }

    res
}

pub(crate) fn size_cstring(s: &str) -> usize {
    s.len() + 1
}

/// Encodes a document into a freshly allocated buffer of exactly
/// [`size_document`] bytes.
pub(crate) fn encode_document(doc: &Document) -> Result<RawDocument> {
    let size = size_document(doc);
    let mut buf = Vec::with_capacity(size);

    write_composite_header(&mut buf, size);
    for (name, value) in doc.iter() {
        write_field(&mut buf, name, value)?;
    }
    buf.push(0);

    debug_assert_eq!(buf.len(), size);
    Ok(RawDocument::from_bytes_unchecked(buf.into()))
}

/// Encodes an array into a freshly allocated buffer of exactly
/// [`size_array`] bytes, generating the decimal index names.
pub(crate) fn encode_array(arr: &Array) -> Result<RawArray> {
    let size = size_array(arr);
    let mut buf = Vec::with_capacity(size);

    write_composite_header(&mut buf, size);
    for (i, value) in arr.iter().enumerate() {
        write_field(&mut buf, &i.to_string(), value)?;
    }
    buf.push(0);

    debug_assert_eq!(buf.len(), size);
    Ok(RawArray::from_bytes_unchecked(buf.into()))
}

fn write_composite_header(buf: &mut Vec<u8>, size: usize) {
    buf.extend_from_slice(&(size as i32).to_le_bytes());
}

fn write_field(buf: &mut Vec<u8>, name: &str, value: &Bson) -> Result<()> {
    buf.push(value.element_type() as u8);
    write_cstring(buf, name)?;
    write_value(buf, value)
}

fn write_value(buf: &mut Vec<u8>, value: &Bson) -> Result<()> {
    match value {
        Bson::Double(v) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),

        Bson::String(s) => write_string(buf, s),

        Bson::Document(doc) => {
            let raw = encode_document(doc)?;
            buf.extend_from_slice(raw.as_bytes());
        }

        Bson::Array(arr) => {
            let raw = encode_array(arr)?;
            buf.extend_from_slice(raw.as_bytes());
        }

        Bson::RawDocument(raw) => buf.extend_from_slice(raw.as_bytes()),

        Bson::RawArray(raw) => buf.extend_from_slice(raw.as_bytes()),

        Bson::Binary(bin) => {
            buf.extend_from_slice(&(bin.bytes.len() as i32).to_le_bytes());
            buf.push(bin.subtype.into());
            buf.extend_from_slice(&bin.bytes);
        }

        Bson::ObjectId(oid) => buf.extend_from_slice(&oid.bytes()),

        Bson::Boolean(v) => buf.push(*v as u8),

        Bson::DateTime(dt) => buf.extend_from_slice(&dt.timestamp_millis().to_le_bytes()),

        Bson::Null => {}

        Bson::RegularExpression(re) => {
            write_cstring(buf, &re.pattern)?;
            write_cstring(buf, &re.options)?;
        }

        Bson::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),

        Bson::Timestamp(ts) => buf.extend_from_slice(&ts.to_u64().to_le_bytes()),

        Bson::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),

        Bson::Decimal128(d) => {
            // the low half travels first
            buf.extend_from_slice(&d.low().to_le_bytes());
            buf.extend_from_slice(&d.high().to_le_bytes());
        }
    }

    Ok(())
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as i32 + 1).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn write_cstring(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::invalid_input(format!(
            "cstring {:?} contains a NUL byte",
            s
        )));
    }

    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array, doc, Timestamp};

    #[test]
    fn empty_document_is_five_bytes() {
        let raw = doc! {}.encode().expect("encode");
        assert_eq!(raw.as_bytes(), [0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn flat_bool_document() {
        let raw = doc! { "f": true }.encode().expect("encode");
        assert_eq!(
            raw.as_bytes(),
            [0x09, 0x00, 0x00, 0x00, 0x08, 0x66, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn duplicate_empty_keys_encode_to_eleven_bytes() {
        let doc = doc! { "": false, "": true };
        let raw = doc.encode().expect("encode");
        assert_eq!(raw.len(), 11);

        assert_eq!(raw.decode().expect("shallow"), doc);
        assert_eq!(raw.decode_deep().expect("deep"), doc);
    }

    #[test]
    fn size_matches_encoded_length() {
        let doc = doc! {
            "double": 3.25,
            "string": "ten bytes!",
            "doc": doc! { "nested": "yes" },
            "arr": array![1, 2, 3],
            "bin": crate::Binary { subtype: crate::BinarySubtype::Generic, bytes: vec![1, 2, 3] },
            "oid": crate::oid::ObjectId::from_bytes([7; 12]),
            "bool": false,
            "date": crate::DateTime::from_millis(0),
            "null": crate::Bson::Null,
            "regex": crate::Regex { pattern: "^a".into(), options: "i".into() },
            "i32": 1i32,
            "ts": Timestamp { time: 1, increment: 2 },
            "i64": 1i64,
            "dec": crate::Decimal128::from_bits(0, 0),
        };

        let raw = doc.encode().expect("encode");
        assert_eq!(size_document(&doc), raw.len());

        for (_, value) in doc.iter() {
            // each scalar's size matches what write_value emits
            let mut buf = Vec::new();
            write_value(&mut buf, value).expect("write");
            assert_eq!(buf.len(), size(value));
        }
    }

    #[test]
    fn array_field_names_are_indices() {
        let raw = array![true].encode().expect("encode");
        assert_eq!(
            raw.as_bytes(),
            [0x09, 0x00, 0x00, 0x00, 0x08, b'0', 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn interior_nul_in_key_is_rejected() {
        let doc = doc! { "a\0b": 1 };
        assert!(doc.encode().expect_err("nul in key").is_invalid_input());

        let doc = doc! { "re": crate::Regex { pattern: "a\0b".into(), options: "".into() } };
        assert!(doc.encode().expect_err("nul in pattern").is_invalid_input());
    }

    #[test]
    fn interior_nul_in_string_value_is_fine() {
        let doc = doc! { "s": "a\0b" };
        let raw = doc.encode().expect("encode");
        assert_eq!(raw.decode().expect("decode"), doc);
    }
}
