//! Decoding of encoded BSON into owned values.
//!
//! Every decoder is driven by byte slices and is strict: multi-byte values
//! are little-endian, all reads are bounds-checked, and a document must
//! consume exactly the number of bytes its length prefix declares. Any byte
//! sequence yields either a value or a structured error, never a panic.

use bytes::Bytes;

use crate::{
    array::Array,
    binary::Binary,
    bson::{Bson, Regex, Timestamp},
    datetime::DateTime,
    decimal128::Decimal128,
    document::Document,
    error::{Error, Result},
    oid::ObjectId,
    raw::{find_raw, RawArray, RawDocument},
    spec::ElementType,
};

/// How deeply nested composites are materialized.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum DecodeMode {
    /// Only top-level fields are decoded; nested documents and arrays
    /// become [`RawDocument`] / [`RawArray`] subslices without copying.
    Shallow,

    /// Nested documents and arrays are decoded recursively; raw values are
    /// never produced.
    Deep,
}

/// Decodes a single document occupying the whole of `raw`.
pub(crate) fn decode_document(raw: &Bytes, mode: DecodeMode) -> Result<Document> {
    let mut doc = Document::new();

    walk(raw, mode, |_, name, value| {
        doc.add(name, value);
        Ok(())
    })?;

    Ok(doc)
}

/// Decodes a single array occupying the whole of `raw`, enforcing that each
/// field is named by its decimal index.
pub(crate) fn decode_array(raw: &Bytes, mode: DecodeMode) -> Result<Array> {
    let mut arr = Array::new();

    walk(raw, mode, |index, name, value| {
        if name != index.to_string() {
            return Err(Error::invalid_input(format!(
                "invalid array element name {:?}, expected {:?}",
                name,
                index.to_string()
            ))
            .with_index(index));
        }

        arr.push(value);
        Ok(())
    })?;

    Ok(arr)
}

/// Walks the fields of an encoded composite, handing each decoded
/// `(index, name, value)` to `field`.
fn walk(
    raw: &Bytes,
    mode: DecodeMode,
    mut field: impl FnMut(usize, &str, Bson) -> Result<()>,
) -> Result<()> {
    let declared = find_raw(raw)?;
    if declared != raw.len() {
        return Err(Error::invalid_input(format!(
            "trailing bytes: length prefix is {}, buffer is {}",
            declared,
            raw.len()
        )));
    }

    let end = raw.len();
    let mut offset = 4;
    let mut index = 0;

    loop {
        if offset >= end {
            return Err(Error::invalid_input("unterminated document"));
        }

        let tag = raw[offset];
        if tag == 0 {
            offset += 1;
            break;
        }

        let (name, name_len) = decode_cstring_ref(&raw[offset + 1..])?;
        let value_offset = offset + 1 + name_len;

        let (value, consumed) =
            decode_value(raw, value_offset, tag, mode).map_err(|e| e.with_key(name))?;

        field(index, name, value)?;

        offset = value_offset + consumed;
        index += 1;
    }

    if offset != end {
        return Err(Error::invalid_input(format!(
            "decoded {} bytes of a {}-byte document",
            offset, end
        )));
    }

    Ok(())
}

/// Decodes one field value starting at `offset`, returning the value and
/// the number of bytes it occupied.
pub(crate) fn decode_value(
    raw: &Bytes,
    offset: usize,
    tag: u8,
    mode: DecodeMode,
) -> Result<(Bson, usize)> {
    if offset > raw.len() {
        return Err(Error::short_input(offset, raw.len()));
    }
    let b = &raw[offset..];

    let element_type = match ElementType::from_tag(tag) {
        Some(et) => et,
        None => {
            return Err(Error::invalid_input(format!(
                "unexpected tag 0x{:02X}",
                tag
            )))
        }
    };

    if element_type.is_retired() {
        return Err(Error::unsupported(format!(
            "retired BSON type {:?} (tag 0x{:02X})",
            element_type, tag
        )));
    }

    let pair = match element_type {
        ElementType::Double => (Bson::Double(decode_f64(b)?), 8),

        ElementType::String => {
            let (s, n) = decode_string(b)?;
            (Bson::String(s), n)
        }

        ElementType::EmbeddedDocument => {
            let len = find_raw(b)?;
            let sub = raw.slice(offset..offset + len);
            let value = match mode {
                DecodeMode::Shallow => Bson::RawDocument(RawDocument::from_bytes_unchecked(sub)),
                DecodeMode::Deep => Bson::Document(decode_document(&sub, DecodeMode::Deep)?),
            };
            (value, len)
        }

        ElementType::Array => {
            let len = find_raw(b)?;
            let sub = raw.slice(offset..offset + len);
            let value = match mode {
                DecodeMode::Shallow => Bson::RawArray(RawArray::from_bytes_unchecked(sub)),
                DecodeMode::Deep => Bson::Array(decode_array(&sub, DecodeMode::Deep)?),
            };
            (value, len)
        }

        ElementType::Binary => {
            let (bin, n) = decode_binary(b)?;
            (Bson::Binary(bin), n)
        }

        ElementType::ObjectId => (Bson::ObjectId(decode_object_id(b)?), 12),

        ElementType::Boolean => (Bson::Boolean(decode_bool(b)?), 1),

        ElementType::DateTime => (Bson::DateTime(DateTime::from_millis(decode_i64(b)?)), 8),

        ElementType::Null => (Bson::Null, 0),

        ElementType::RegularExpression => {
            let (re, n) = decode_regex(b)?;
            (Bson::RegularExpression(re), n)
        }

        ElementType::Int32 => (Bson::Int32(decode_i32(b)?), 4),

        ElementType::Timestamp => (
            Bson::Timestamp(Timestamp::from_u64(decode_u64(b)?)),
            8,
        ),

        ElementType::Int64 => (Bson::Int64(decode_i64(b)?), 8),

        ElementType::Decimal128 => (Bson::Decimal128(decode_decimal128(b)?), 16),

        // covered by the is_retired check above
        _ => unreachable!(),
    };

    Ok(pair)
}

pub(crate) fn decode_f64(b: &[u8]) -> Result<f64> {
    Ok(f64::from_bits(decode_u64(b)?))
}

pub(crate) fn decode_i32(b: &[u8]) -> Result<i32> {
    if b.len() < 4 {
        return Err(Error::short_input(4, b.len()));
    }
    Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn decode_i64(b: &[u8]) -> Result<i64> {
    Ok(decode_u64(b)? as i64)
}

pub(crate) fn decode_u64(b: &[u8]) -> Result<u64> {
    if b.len() < 8 {
        return Err(Error::short_input(8, b.len()));
    }
    Ok(u64::from_le_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

/// Decodes a length-prefixed, NUL-terminated string, returning it and the
/// number of bytes consumed.
pub(crate) fn decode_string(b: &[u8]) -> Result<(String, usize)> {
    if b.len() < 5 {
        return Err(Error::short_input(5, b.len()));
    }

    let prefix = decode_i32(b)?;
    if prefix < 1 {
        return Err(Error::invalid_input(format!(
            "string length prefix {} is below the minimum of 1",
            prefix
        )));
    }

    let total = 4 + prefix as usize;
    if b.len() < total {
        return Err(Error::short_input(total, b.len()));
    }

    if b[total - 1] != 0 {
        return Err(Error::invalid_input("string is not null-terminated"));
    }

    let s = std::str::from_utf8(&b[4..total - 1])
        .map_err(|e| Error::invalid_input(format!("invalid UTF-8 in string: {}", e)))?;

    Ok((s.to_owned(), total))
}

/// Decodes a NUL-terminated string, returning it and the number of bytes
/// consumed (including the terminator).
pub(crate) fn decode_cstring(b: &[u8]) -> Result<(String, usize)> {
    let (s, n) = decode_cstring_ref(b)?;
    Ok((s.to_owned(), n))
}

/// Borrowing variant of [`decode_cstring`].
pub(crate) fn decode_cstring_ref(b: &[u8]) -> Result<(&str, usize)> {
    let nul = b
        .iter()
        .position(|&c| c == 0)
        .ok_or_else(|| Error::invalid_input("cstring has no null terminator"))?;

    let s = std::str::from_utf8(&b[..nul])
        .map_err(|e| Error::invalid_input(format!("invalid UTF-8 in cstring: {}", e)))?;

    Ok((s, nul + 1))
}

pub(crate) fn decode_binary(b: &[u8]) -> Result<(Binary, usize)> {
    if b.len() < 5 {
        return Err(Error::short_input(5, b.len()));
    }

    let payload_len = decode_i32(b)?;
    if payload_len < 0 {
        return Err(Error::invalid_input(format!(
            "negative binary length {}",
            payload_len
        )));
    }

    let total = 5 + payload_len as usize;
    if b.len() < total {
        return Err(Error::short_input(total, b.len()));
    }

    let bin = Binary {
        subtype: b[4].into(),
        bytes: b[5..total].to_vec(),
    };

    Ok((bin, total))
}

pub(crate) fn decode_object_id(b: &[u8]) -> Result<ObjectId> {
    if b.len() < 12 {
        return Err(Error::short_input(12, b.len()));
    }

    let mut bytes = [0u8; 12];
    bytes.copy_from_slice(&b[..12]);
    Ok(ObjectId::from_bytes(bytes))
}

pub(crate) fn decode_bool(b: &[u8]) -> Result<bool> {
    if b.is_empty() {
        return Err(Error::short_input(1, 0));
    }

    match b[0] {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(Error::invalid_input(format!("invalid boolean value {}", v))),
    }
}

/// Decodes two consecutive NUL-terminated strings (pattern, then options).
pub(crate) fn decode_regex(b: &[u8]) -> Result<(Regex, usize)> {
    let (pattern, pattern_len) = decode_cstring(b)?;
    let (options, options_len) = decode_cstring(&b[pattern_len..])?;

    Ok((Regex { pattern, options }, pattern_len + options_len))
}

pub(crate) fn decode_decimal128(b: &[u8]) -> Result<Decimal128> {
    if b.len() < 16 {
        return Err(Error::short_input(16, b.len()));
    }

    // the low half travels first
    let low = decode_u64(b)?;
    let high = decode_u64(&b[8..])?;
    Ok(Decimal128::from_bits(high, low))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<Document> {
        decode_document(&Bytes::copy_from_slice(bytes), DecodeMode::Shallow)
    }

    #[test]
    fn empty_document() {
        let doc = decode(b"\x05\x00\x00\x00\x00").expect("decode");
        assert_eq!(doc.len(), 0);
    }

    #[test]
    fn flat_scalar() {
        let doc = decode(b"\x09\x00\x00\x00\x08f\x00\x01\x00").expect("decode");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("f"), Some(&Bson::Boolean(true)));
    }

    #[test]
    fn duplicate_empty_keys() {
        let bytes = b"\x0B\x00\x00\x00\x08\x00\x00\x08\x00\x01\x00";
        let doc = decode(bytes).expect("decode");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get_by_index(0), Some(("", &Bson::Boolean(false))));
        assert_eq!(doc.get_by_index(1), Some(("", &Bson::Boolean(true))));
    }

    #[test]
    fn bad_bool_byte() {
        let err = decode(b"\x09\x00\x00\x00\x08f\x00\x02\x00").expect_err("bad bool");
        assert!(err.is_invalid_input());
        assert_eq!(err.key.as_deref(), Some("f"));
    }

    #[test]
    fn length_mismatch() {
        // declared 10, one bool field only fills 9
        let err = decode(b"\x0A\x00\x00\x00\x08f\x00\x01\x00\x00").expect_err("mismatch");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn early_terminator_is_a_length_mismatch() {
        let err = decode(b"\x0A\x00\x00\x00\x00\x08f\x00\x01\x00").expect_err("early zero");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn retired_tags_are_unsupported() {
        for tag in [0x06u8, 0x0C, 0x0D, 0x0E, 0x0F, 0xFF, 0x7F] {
            // {<tag> "a": } with no body; tag dispatch happens first
            let bytes = vec![0x08, 0, 0, 0, tag, b'a', 0, 0];
            let err = decode(&bytes).expect_err("retired tag");
            assert!(err.is_unsupported(), "tag 0x{:02X}: {}", tag, err);
        }
    }

    #[test]
    fn unknown_tag_is_invalid() {
        let bytes = vec![0x08, 0, 0, 0, 0x42, b'a', 0, 0];
        assert!(decode(&bytes).expect_err("unknown tag").is_invalid_input());
    }

    #[test]
    fn truncated_string_is_short_input() {
        // declares a 10-byte string but the document ends first
        let bytes = b"\x0E\x00\x00\x00\x02s\x00\x0A\x00\x00\x00ab\x00";
        let err = decode(bytes).expect_err("truncated");
        assert!(err.is_short_input());
        assert_eq!(err.key.as_deref(), Some("s"));
    }

    #[test]
    fn string_prefix_below_one_is_invalid() {
        let bytes = b"\x0C\x00\x00\x00\x02s\x00\x00\x00\x00\x00\x00";
        assert!(decode(bytes).expect_err("zero prefix").is_invalid_input());
    }

    #[test]
    fn scalar_decoders_report_needed_bytes() {
        assert!(decode_f64(&[0; 4]).expect_err("f64").is_short_input());
        assert!(decode_i32(&[0; 2]).expect_err("i32").is_short_input());
        assert!(decode_object_id(&[0; 11]).expect_err("oid").is_short_input());
        assert!(decode_decimal128(&[0; 15]).expect_err("d128").is_short_input());
        assert!(decode_string(&[0; 3]).expect_err("string").is_short_input());
    }

    #[test]
    fn regex_needs_two_terminators() {
        let (re, n) = decode_regex(b"ab\x00i\x00").expect("decode");
        assert_eq!(re.pattern, "ab");
        assert_eq!(re.options, "i");
        assert_eq!(n, 5);

        assert!(decode_regex(b"ab\x00i").expect_err("one zero").is_invalid_input());
    }
}
