use std::fmt;

use bytes::Bytes;

use crate::{
    bson::Bson,
    decode::{self, DecodeMode},
    document::Document,
    error::{Error, Result},
    raw::find_raw,
};

/// A single BSON document in its encoded form.
///
/// The contained bytes are usually a subslice of a larger buffer (a wire
/// message body); cloning is cheap and shares that buffer. Construction
/// validates only the framing (length prefix, minimum size, trailing zero
/// byte); field-level problems surface when the document is decoded.
#[derive(Clone)]
pub struct RawDocument {
    data: Bytes,
}

impl RawDocument {
    /// Constructs a raw document from bytes holding exactly one encoded
    /// document and nothing else.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();

        let len = find_raw(&data)?;
        if len != data.len() {
            return Err(Error::invalid_input(format!(
                "trailing bytes after document: length prefix is {}, buffer is {}",
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

    pub(crate) fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// The size of the encoded document in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this is the empty document (which still occupies five
    /// bytes).
    pub fn is_empty(&self) -> bool {
        self.data.len() == crate::raw::MIN_DOCUMENT_LEN
    }

    /// An iterator over the fields of the document, parsed as it advances.
    ///
    /// Nested composites are yielded as raw subslices; a malformed field
    /// surfaces as an `Err` item and ends the iteration.
    pub fn iter(&self) -> crate::raw::Iter<'_> {
        crate::raw::Iter::new(self)
    }

    /// Returns the value of the first field with the given name, parsing
    /// only as far into the document as needed.
    ///
    /// Like [`iter`](Self::iter), nested composites come back raw.
    pub fn get(&self, name: impl AsRef<str>) -> Result<Option<Bson>> {
        let name = name.as_ref();

        for field in self {
            let (key, value) = field?;
            if key == name {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Decodes the top-level fields of the document.
    ///
    /// Nested documents and arrays are left in their raw form, sharing this
    /// view's backing buffer without copying.
    pub fn decode(&self) -> Result<Document> {
        decode::decode_document(&self.data, DecodeMode::Shallow)
    }

    /// Decodes the document and every composite nested inside it. The
    /// result owns all of its data.
    ///
    /// Malformed nested documents that shallow decoding would pass over are
    /// reported here.
    pub fn decode_deep(&self) -> Result<Document> {
        decode::decode_document(&self.data, DecodeMode::Deep)
    }
}

impl TryFrom<Vec<u8>> for RawDocument {
    type Error = Error;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes(data)
    }
}

impl PartialEq for RawDocument {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for RawDocument {}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawDocument<{}>", self.data.len())
    }
}

/// Either an owned, decoded document or a raw encoded one.
///
/// Message constructors accept both: encoding a [`Document`] produces fresh
/// bytes, while "encoding" a [`RawDocument`] just hands back its buffer.
pub trait AnyDocument {
    /// The encoded form of the document.
    fn encode(&self) -> Result<RawDocument>;

    /// The decoded form of the document. Shallow for raw documents; a plain
    /// copy for decoded ones.
    fn decode(&self) -> Result<Document>;
}

impl AnyDocument for Document {
    fn encode(&self) -> Result<RawDocument> {
        Document::encode(self)
    }

    fn decode(&self) -> Result<Document> {
        Ok(self.clone())
    }
}

impl AnyDocument for RawDocument {
    fn encode(&self) -> Result<RawDocument> {
        Ok(self.clone())
    }

    fn decode(&self) -> Result<Document> {
        RawDocument::decode(self)
    }
}
