use std::fmt;

use bytes::Bytes;

use crate::{
    array::Array,
    decode::{self, DecodeMode},
    error::{Error, Result},
    raw::find_raw,
};

/// A single BSON array in its encoded form.
///
/// Encoded arrays are documents whose field names are decimal indices;
/// decoding enforces the names. As with [`crate::RawDocument`], cloning is
/// cheap and construction validates only the framing.
#[derive(Clone)]
pub struct RawArray {
    data: Bytes,
}

impl RawArray {
    /// Constructs a raw array from bytes holding exactly one encoded array
    /// and nothing else.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();

        let len = find_raw(&data)?;
        if len != data.len() {
            return Err(Error::invalid_input(format!(
                "trailing bytes after array: length prefix is {}, buffer is {}",
                len,
                data.len()
            )));
        }

        Ok(Self { data })
    }

    /// Wraps bytes whose framing has already been validated by
    /// [`find_raw`].
    pub(crate) fn from_bytes_unchecked(data: Bytes) -> Self {
        Self { data }
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the view and returns the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// The size of the encoded array in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this is the empty array (which still occupies five bytes).
    pub fn is_empty(&self) -> bool {
        self.data.len() == crate::raw::MIN_DOCUMENT_LEN
    }

    /// Decodes the top-level elements of the array.
    ///
    /// Nested documents and arrays are left in their raw form, sharing this
    /// view's backing buffer without copying.
    pub fn decode(&self) -> Result<Array> {
        decode::decode_array(&self.data, DecodeMode::Shallow)
    }

    /// Decodes the array and every composite nested inside it. The result
    /// owns all of its data.
    pub fn decode_deep(&self) -> Result<Array> {
        decode::decode_array(&self.data, DecodeMode::Deep)
    }
}

impl TryFrom<Vec<u8>> for RawArray {
    type Error = Error;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes(data)
    }
}

impl PartialEq for RawArray {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for RawArray {}

impl fmt::Debug for RawArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawArray<{}>", self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array, Bson};

    #[test]
    fn decode_round_trips() {
        let raw = array![1, "two", 3.0].encode().expect("encode");
        let arr = raw.decode().expect("decode");
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(1), Some(&Bson::String("two".into())));
        assert_eq!(arr.encode().expect("re-encode"), raw);
    }

    #[test]
    fn rejects_wrong_index_names() {
        // {"0": false, "x": true} is a valid document but not an array
        let bytes = b"\x0D\x00\x00\x00\x080\x00\x00\x08x\x00\x01\x00".to_vec();
        let raw = RawArray::from_bytes(bytes).expect("framing is fine");
        assert!(raw.decode().expect_err("bad index").is_invalid_input());
    }
}
