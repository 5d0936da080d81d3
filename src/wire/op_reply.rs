use std::fmt;

use bitflags::bitflags;
use bytes::Bytes;

use crate::{
    decode::{decode_i32, decode_i64},
    doc,
    document::Document,
    error::{Error, Result},
    raw::{find_raw, AnyDocument, RawDocument},
    wire::op_msg::write_flag_names,
};

bitflags! {
    /// Flag bits of an OP_REPLY message.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct OpReplyFlags: u32 {
        const CURSOR_NOT_FOUND = 1 << 0;
        const QUERY_FAILURE = 1 << 1;
        const SHARD_CONFIG_STALE = 1 << 2;
        const AWAIT_CAPABLE = 1 << 3;
    }
}

impl fmt::Display for OpReplyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_flag_names(f, self.iter_names().map(|(name, _)| name))
    }
}

/// The deprecated OP_REPLY response message, sent in answer to OP_QUERY.
///
/// Only zero or one returned documents are supported; the wire
/// `numberReturned` field must be consistent with the document's presence.
#[derive(Debug, Clone, PartialEq)]
pub struct OpReply {
    /// The flag bits.
    pub flags: OpReplyFlags,

    /// Cursor identifier for follow-up OP_GET_MORE requests.
    pub cursor_id: i64,

    /// Position of the first returned document in the cursor.
    pub starting_from: i32,

    document: Option<RawDocument>,
}

impl OpReply {
    /// Creates a reply carrying one document.
    pub fn new(doc: &impl AnyDocument) -> Result<Self> {
        Ok(Self {
            flags: OpReplyFlags::empty(),
            cursor_id: 0,
            starting_from: 0,
            document: Some(doc.encode()?),
        })
    }

    /// Creates a reply carrying no documents.
    pub fn empty() -> Self {
        Self {
            flags: OpReplyFlags::empty(),
            cursor_id: 0,
            starting_from: 0,
            document: None,
        }
    }

    /// The returned document with only its top-level fields decoded, if
    /// one is present.
    pub fn document(&self) -> Result<Option<Document>> {
        self.document.as_ref().map(RawDocument::decode).transpose()
    }

    /// The fully decoded returned document, if one is present.
    pub fn document_deep(&self) -> Result<Option<Document>> {
        self.document
            .as_ref()
            .map(RawDocument::decode_deep)
            .transpose()
    }

    /// The raw view of the returned document, if one is present.
    pub fn document_raw(&self) -> Option<&RawDocument> {
        self.document.as_ref()
    }

    /// The size of the encoded body in bytes.
    pub fn size(&self) -> usize {
        20 + self.document.as_ref().map(RawDocument::len).unwrap_or(0)
    }

    pub(crate) fn decode(body: Bytes) -> Result<Self> {
        if body.len() < 20 {
            return Err(Error::short_input(20, body.len()));
        }

        let flags = OpReplyFlags::from_bits_retain(decode_i32(&body)? as u32);
        let cursor_id = decode_i64(&body[4..])?;
        let starting_from = decode_i32(&body[12..])?;
        let number_returned = decode_i32(&body[16..])?;

        if !(0..=1).contains(&number_returned) {
            return Err(Error::invalid_input(format!(
                "unsupported number of returned documents {}",
                number_returned
            )));
        }

        let document = if body.len() == 20 {
            None
        } else {
            let len = find_raw(&body[20..])?;
            if body.len() != 20 + len {
                return Err(Error::invalid_input(format!(
                    "trailing bytes after document: {} != {}",
                    body.len(),
                    20 + len
                )));
            }
            Some(RawDocument::from_bytes_unchecked(body.slice(20..)))
        };

        if (number_returned == 0) != document.is_none() {
            return Err(Error::invalid_input(format!(
                "numberReturned is {} but document presence disagrees",
                number_returned
            )));
        }

        let reply = Self {
            flags,
            cursor_id,
            starting_from,
            document,
        };

        #[cfg(feature = "extra-checks")]
        reply.check()?;

        Ok(reply)
    }

    pub(crate) fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        #[cfg(feature = "extra-checks")]
        self.check()?;

        buf.extend_from_slice(&self.flags.bits().to_le_bytes());
        buf.extend_from_slice(&self.cursor_id.to_le_bytes());
        buf.extend_from_slice(&self.starting_from.to_le_bytes());

        match &self.document {
            Some(doc) => {
                buf.extend_from_slice(&1i32.to_le_bytes());
                buf.extend_from_slice(doc.as_bytes());
            }
            None => buf.extend_from_slice(&0i32.to_le_bytes()),
        }

        Ok(())
    }

    #[cfg(feature = "extra-checks")]
    fn check(&self) -> Result<()> {
        if let Some(doc) = &self.document {
            doc.decode_deep()?;
        }
        Ok(())
    }

    fn log_document(&self) -> Document {
        let mut m = doc! {
            "ResponseFlags": self.flags.to_string(),
            "CursorID": self.cursor_id,
            "StartingFrom": self.starting_from,
        };

        match &self.document {
            None => {
                m.add("NumberReturned", 0);
            }
            Some(_) => {
                m.add("NumberReturned", 1);
                match self.document_deep() {
                    Ok(Some(doc)) => m.add("Document", doc),
                    Ok(None) => unreachable!(),
                    Err(e) => m.add("DocumentError", e.to_string()),
                };
            }
        }

        m
    }

    /// Returns an indented, multi-line rendering of the message.
    pub fn to_indented_string(&self) -> String {
        self.log_document().to_indented_string()
    }
}

impl fmt::Display for OpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn round_trip(reply: &OpReply) -> OpReply {
        let mut buf = Vec::new();
        reply.encode_to(&mut buf).expect("encode");
        assert_eq!(buf.len(), reply.size());

        let decoded = OpReply::decode(Bytes::from(buf)).expect("decode");
        assert_eq!(&decoded, reply);
        decoded
    }

    #[test]
    fn reply_with_document() {
        let mut reply = OpReply::new(&doc! { "ok": 1.0 }).expect("new");
        reply.cursor_id = 42;
        reply.flags |= OpReplyFlags::AWAIT_CAPABLE;

        let decoded = round_trip(&reply);
        assert_eq!(decoded.cursor_id, 42);
        let doc = decoded.document().expect("decode").expect("present");
        assert_eq!(doc.get("ok"), Some(&crate::Bson::Double(1.0)));
    }

    #[test]
    fn reply_without_document() {
        let decoded = round_trip(&OpReply::empty());
        assert_eq!(decoded.document().expect("decode"), None);
        assert_eq!(decoded.size(), 20);
    }

    #[test]
    fn number_returned_must_match_document_presence() {
        // numberReturned = 1 but no document follows
        let mut body = vec![0u8; 16];
        body.extend_from_slice(&1i32.to_le_bytes());
        assert!(OpReply::decode(Bytes::from(body)).expect_err("missing doc").is_invalid_input());

        // numberReturned = 0 but a document follows
        let mut body = vec![0u8; 16];
        body.extend_from_slice(&0i32.to_le_bytes());
        body.extend_from_slice(doc! {}.encode().expect("encode").as_bytes());
        assert!(OpReply::decode(Bytes::from(body)).expect_err("extra doc").is_invalid_input());
    }

    #[test]
    fn out_of_range_number_returned_is_rejected() {
        let mut body = vec![0u8; 16];
        body.extend_from_slice(&2i32.to_le_bytes());
        body.extend_from_slice(doc! {}.encode().expect("encode").as_bytes());
        assert!(OpReply::decode(Bytes::from(body)).expect_err("two docs").is_invalid_input());
    }

    #[test]
    fn rendering_shows_number_returned() {
        let reply = OpReply::empty();
        assert!(reply.to_string().contains("`NumberReturned`: 0"));
    }
}
