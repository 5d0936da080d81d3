use std::fmt;

use bitflags::bitflags;
use bytes::Bytes;

use crate::{
    decode::{decode_cstring, decode_i32},
    doc,
    document::Document,
    encode::size_cstring,
    error::{Error, Result},
    raw::{find_raw, AnyDocument, RawDocument},
    wire::op_msg::write_flag_names,
};

bitflags! {
    /// Flag bits of an OP_QUERY message.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct OpQueryFlags: u32 {
        const TAILABLE_CURSOR = 1 << 1;
        const SLAVE_OK = 1 << 2;
        const OPLOG_REPLAY = 1 << 3;
        const NO_CURSOR_TIMEOUT = 1 << 4;
        const AWAIT_DATA = 1 << 5;
        const EXHAUST = 1 << 6;
        const PARTIAL = 1 << 7;
    }
}

impl fmt::Display for OpQueryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_flag_names(f, self.iter_names().map(|(name, _)| name))
    }
}

/// The deprecated OP_QUERY request message, still used by drivers for the
/// initial handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct OpQuery {
    /// The flag bits.
    pub flags: OpQueryFlags,

    /// The fully qualified `database.collection` name.
    pub full_collection_name: String,

    /// Number of documents to skip.
    pub number_to_skip: i32,

    /// Number of documents to return; negative values close the cursor
    /// after the first batch.
    pub number_to_return: i32,

    query: RawDocument,
    return_fields_selector: Option<RawDocument>,
}

impl OpQuery {
    /// Creates a new OP_QUERY carrying the given query document.
    pub fn new(doc: &impl AnyDocument) -> Result<Self> {
        Ok(Self {
            flags: OpQueryFlags::empty(),
            full_collection_name: String::new(),
            number_to_skip: 0,
            number_to_return: 0,
            query: doc.encode()?,
            return_fields_selector: None,
        })
    }

    /// The query document with only its top-level fields decoded.
    pub fn query(&self) -> Result<Document> {
        self.query.decode()
    }

    /// The fully decoded query document.
    pub fn query_deep(&self) -> Result<Document> {
        self.query.decode_deep()
    }

    /// The raw view of the query document.
    pub fn query_raw(&self) -> &RawDocument {
        &self.query
    }

    /// The optional field selector with only its top-level fields decoded.
    pub fn return_fields_selector(&self) -> Result<Option<Document>> {
        self.return_fields_selector
            .as_ref()
            .map(RawDocument::decode)
            .transpose()
    }

    /// The fully decoded optional field selector.
    pub fn return_fields_selector_deep(&self) -> Result<Option<Document>> {
        self.return_fields_selector
            .as_ref()
            .map(RawDocument::decode_deep)
            .transpose()
    }

    /// The raw view of the optional field selector.
    pub fn return_fields_selector_raw(&self) -> Option<&RawDocument> {
        self.return_fields_selector.as_ref()
    }

    /// Sets the optional field selector.
    pub fn set_return_fields_selector(&mut self, doc: &impl AnyDocument) -> Result<()> {
        self.return_fields_selector = Some(doc.encode()?);
        Ok(())
    }

    /// The size of the encoded body in bytes.
    pub fn size(&self) -> usize {
        12 + size_cstring(&self.full_collection_name)
            + self.query.len()
            + self
                .return_fields_selector
                .as_ref()
                .map(RawDocument::len)
                .unwrap_or(0)
    }

    pub(crate) fn decode(body: Bytes) -> Result<Self> {
        if body.len() < 4 {
            return Err(Error::short_input(4, body.len()));
        }

        let flags = OpQueryFlags::from_bits_retain(decode_i32(&body)? as u32);

        let (full_collection_name, name_len) = decode_cstring(&body[4..])?;

        let numbers = 4 + name_len;
        if body.len() < numbers + 8 {
            return Err(Error::short_input(numbers + 8, body.len()));
        }
        let number_to_skip = decode_i32(&body[numbers..])?;
        let number_to_return = decode_i32(&body[numbers + 4..])?;

        let query_offset = numbers + 8;
        let query_len = find_raw(&body[query_offset..])?;
        let query =
            RawDocument::from_bytes_unchecked(body.slice(query_offset..query_offset + query_len));

        let selector_offset = query_offset + query_len;
        let return_fields_selector = if body.len() == selector_offset {
            None
        } else {
            let len = find_raw(&body[selector_offset..])?;
            if body.len() != selector_offset + len {
                return Err(Error::invalid_input(format!(
                    "trailing bytes after field selector: {} != {}",
                    body.len(),
                    selector_offset + len
                )));
            }
            Some(RawDocument::from_bytes_unchecked(
                body.slice(selector_offset..),
            ))
        };

        let query = Self {
            flags,
            full_collection_name,
            number_to_skip,
            number_to_return,
            query,
            return_fields_selector,
        };

        #[cfg(feature = "extra-checks")]
        query.check()?;

        Ok(query)
    }

    pub(crate) fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        #[cfg(feature = "extra-checks")]
        self.check()?;

        buf.extend_from_slice(&self.flags.bits().to_le_bytes());

        if self.full_collection_name.as_bytes().contains(&0) {
            return Err(Error::invalid_input(
                "collection name contains a NUL byte",
            ));
        }
        buf.extend_from_slice(self.full_collection_name.as_bytes());
        buf.push(0);

        buf.extend_from_slice(&self.number_to_skip.to_le_bytes());
        buf.extend_from_slice(&self.number_to_return.to_le_bytes());

        buf.extend_from_slice(self.query.as_bytes());
        if let Some(selector) = &self.return_fields_selector {
            buf.extend_from_slice(selector.as_bytes());
        }

        Ok(())
    }

    #[cfg(feature = "extra-checks")]
    fn check(&self) -> Result<()> {
        self.query.decode_deep()?;
        if let Some(selector) = &self.return_fields_selector {
            selector.decode_deep()?;
        }
        Ok(())
    }

    fn log_document(&self) -> Document {
        let mut m = doc! {
            "Flags": self.flags.to_string(),
            "FullCollectionName": self.full_collection_name.as_str(),
            "NumberToSkip": self.number_to_skip,
            "NumberToReturn": self.number_to_return,
        };

        match self.query_deep() {
            Ok(doc) => m.add("Query", doc),
            Err(e) => m.add("QueryError", e.to_string()),
        };

        match self.return_fields_selector_deep() {
            Ok(Some(doc)) => {
                m.add("ReturnFieldsSelector", doc);
            }
            Ok(None) => {}
            Err(e) => {
                m.add("ReturnFieldsSelectorError", e.to_string());
            }
        }

        m
    }

    /// Returns an indented, multi-line rendering of the message.
    pub fn to_indented_string(&self) -> String {
        self.log_document().to_indented_string()
    }
}

impl fmt::Display for OpQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log_document())
    }
}
