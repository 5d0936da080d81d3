use std::fmt;

use bitflags::bitflags;
use bytes::Bytes;

use crate::{
    array::Array,
    decode::{decode_cstring, decode_i32},
    doc,
    document::Document,
    encode::size_cstring,
    error::{Error, Result},
    raw::{find_raw, AnyDocument, RawDocument},
};

bitflags! {
    /// Flag bits of an OP_MSG message.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
    pub struct OpMsgFlags: u32 {
        /// A CRC-32C checksum follows the sections.
        const CHECKSUM_PRESENT = 1 << 0;
        /// Another message follows without awaiting a response.
        const MORE_TO_COME = 1 << 1;
        /// The recipient may reply with a MORE_TO_COME stream.
        const EXHAUST_ALLOWED = 1 << 16;
    }
}

impl fmt::Display for OpMsgFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_flag_names(f, self.iter_names().map(|(name, _)| name))
    }
}

pub(crate) fn write_flag_names<'a>(
    f: &mut fmt::Formatter<'_>,
    names: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, name) in names.enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        f.write_str(name)?;
    }
    f.write_str("]")
}

/// One section of an OP_MSG message.
#[derive(Debug, Clone, PartialEq)]
pub enum OpMsgSection {
    /// A kind-0 section: exactly one document and no identifier. Every
    /// message has exactly one of these; it carries the command.
    Body(RawDocument),

    /// A kind-1 section: a non-empty identifier naming a batch of zero or
    /// more documents (e.g. `documents` for `insert`).
    DocumentSequence {
        identifier: String,
        documents: Vec<RawDocument>,
    },
}

impl OpMsgSection {
    /// The wire kind byte of this section.
    pub fn kind(&self) -> u8 {
        match self {
            OpMsgSection::Body(_) => 0,
            OpMsgSection::DocumentSequence { .. } => 1,
        }
    }

    fn size(&self) -> usize {
        match self {
            OpMsgSection::Body(doc) => 1 + doc.len(),
            OpMsgSection::DocumentSequence {
                identifier,
                documents,
            } => {
                1 + 4
                    + size_cstring(identifier)
                    + documents.iter().map(RawDocument::len).sum::<usize>()
            }
        }
    }
}

/// The main wire protocol message type.
///
/// An OP_MSG body is a set of flags, one or more sections, and an optional
/// trailing checksum. The checksum is carried verbatim; it is neither
/// computed nor verified here.
#[derive(Debug, Clone, PartialEq)]
pub struct OpMsg {
    /// The flag bits.
    pub flags: OpMsgFlags,

    sections: Vec<OpMsgSection>,
    checksum: Option<u32>,
}

impl OpMsg {
    /// Creates a message with a single kind-0 section holding the given
    /// document.
    pub fn new(doc: &impl AnyDocument) -> Result<Self> {
        Self::with_sections(vec![OpMsgSection::Body(doc.encode()?)])
    }

    /// Creates a message from the given sections.
    pub fn with_sections(sections: Vec<OpMsgSection>) -> Result<Self> {
        check_sections(&sections)?;

        let msg = Self {
            flags: OpMsgFlags::empty(),
            sections,
            checksum: None,
        };

        #[cfg(feature = "extra-checks")]
        msg.check()?;

        Ok(msg)
    }

    /// Replaces the sections of the message.
    pub fn set_sections(&mut self, sections: Vec<OpMsgSection>) -> Result<()> {
        check_sections(&sections)?;
        self.sections = sections;

        #[cfg(feature = "extra-checks")]
        self.check()?;

        Ok(())
    }

    /// The sections of the message.
    pub fn sections(&self) -> &[OpMsgSection] {
        &self.sections
    }

    /// The trailing checksum, when the peer sent one.
    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    fn body_section(&self) -> &RawDocument {
        self.sections
            .iter()
            .find_map(|s| match s {
                OpMsgSection::Body(doc) => Some(doc),
                _ => None,
            })
            .expect("OpMsg always has a kind-0 section")
    }

    /// The raw view of the command document.
    pub fn document_raw(&self) -> &RawDocument {
        self.body_section()
    }

    /// The command document with only its top-level fields decoded.
    ///
    /// The returned document is frozen: it may share buffers with the
    /// message's other sections, so callers must not mutate it in place.
    pub fn document(&self) -> Result<Document> {
        let mut doc = self.body_section().decode()?;
        doc.freeze();
        Ok(doc)
    }

    /// The fully decoded command document.
    pub fn document_deep(&self) -> Result<Document> {
        self.body_section().decode_deep()
    }

    /// The raw command document together with the concatenated documents of
    /// all kind-1 sections.
    pub fn raw_sections(&self) -> (&RawDocument, Vec<u8>) {
        let mut seq = Vec::new();

        for section in &self.sections {
            if let OpMsgSection::DocumentSequence { documents, .. } = section {
                for doc in documents {
                    seq.extend_from_slice(doc.as_bytes());
                }
            }
        }

        (self.body_section(), seq)
    }

    /// The size of the encoded body in bytes.
    pub fn size(&self) -> usize {
        let mut res = 4 + self.sections.iter().map(OpMsgSection::size).sum::<usize>();
        if self.flags.contains(OpMsgFlags::CHECKSUM_PRESENT) {
            res += 4;
        }
        res
    }

    pub(crate) fn decode(body: Bytes) -> Result<Self> {
        if body.len() < 6 {
            return Err(Error::short_input(6, body.len()));
        }

        let flags = OpMsgFlags::from_bits_retain(decode_i32(&body)? as u32);

        let checksum_len = if flags.contains(OpMsgFlags::CHECKSUM_PRESENT) {
            4
        } else {
            0
        };
        let body_end = body
            .len()
            .checked_sub(checksum_len)
            .ok_or_else(|| Error::short_input(4 + checksum_len, body.len()))?;

        let mut sections = Vec::new();
        let mut offset = 4;

        loop {
            if offset >= body_end {
                return Err(Error::invalid_input("truncated section list"));
            }

            let kind = body[offset];
            offset += 1;

            match kind {
                0 => {
                    let len = find_raw(&body[offset..body_end])?;
                    let doc = RawDocument::from_bytes_unchecked(body.slice(offset..offset + len));
                    sections.push(OpMsgSection::Body(doc));
                    offset += len;
                }

                1 => {
                    let remaining = &body[offset..body_end];
                    let section_size = decode_i32(remaining)?;

                    // the size includes its own four bytes
                    let content_len = section_size as i64 - 4;
                    if content_len < 1 {
                        return Err(Error::invalid_input(format!(
                            "invalid document sequence size {}",
                            section_size
                        )));
                    }

                    offset += 4;
                    let section_end = offset
                        .checked_add(content_len as usize)
                        .filter(|&end| end <= body_end)
                        .ok_or_else(|| {
                            Error::short_input(offset + content_len as usize, body_end)
                        })?;

                    let (identifier, id_len) = decode_cstring(&body[offset..section_end])?;
                    offset += id_len;

                    let mut documents = Vec::new();
                    while offset < section_end {
                        let len = find_raw(&body[offset..section_end])?;
                        documents.push(RawDocument::from_bytes_unchecked(
                            body.slice(offset..offset + len),
                        ));
                        offset += len;
                    }

                    sections.push(OpMsgSection::DocumentSequence {
                        identifier,
                        documents,
                    });
                }

                kind => {
                    return Err(Error::invalid_input(format!(
                        "unknown section kind {}",
                        kind
                    )))
                }
            }

            if offset == body_end {
                break;
            }
        }

        let checksum = if checksum_len > 0 {
            Some(decode_i32(&body[body_end..])? as u32)
        } else {
            None
        };

        check_sections(&sections)?;

        let msg = Self {
            flags,
            sections,
            checksum,
        };

        #[cfg(feature = "extra-checks")]
        msg.check()?;

        Ok(msg)
    }

    pub(crate) fn encode_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        check_sections(&self.sections)?;

        #[cfg(feature = "extra-checks")]
        self.check()?;

        buf.extend_from_slice(&self.flags.bits().to_le_bytes());

        for section in &self.sections {
            buf.push(section.kind());

            match section {
                OpMsgSection::Body(doc) => buf.extend_from_slice(doc.as_bytes()),

                OpMsgSection::DocumentSequence {
                    identifier,
                    documents,
                } => {
                    if identifier.as_bytes().contains(&0) {
                        return Err(Error::invalid_input(
                            "section identifier contains a NUL byte",
                        ));
                    }

                    let content: usize = size_cstring(identifier)
                        + documents.iter().map(RawDocument::len).sum::<usize>();

                    buf.extend_from_slice(&(content as i32 + 4).to_le_bytes());
                    buf.extend_from_slice(identifier.as_bytes());
                    buf.push(0);
                    for doc in documents {
                        buf.extend_from_slice(doc.as_bytes());
                    }
                }
            }
        }

        if self.flags.contains(OpMsgFlags::CHECKSUM_PRESENT) {
            buf.extend_from_slice(&self.checksum.unwrap_or(0).to_le_bytes());
        }

        Ok(())
    }

    /// Deep-decodes every document in every section, surfacing any
    /// malformed embedded document.
    #[cfg(feature = "extra-checks")]
    fn check(&self) -> Result<()> {
        for section in &self.sections {
            match section {
                OpMsgSection::Body(doc) => {
                    doc.decode_deep()?;
                }
                OpMsgSection::DocumentSequence { documents, .. } => {
                    for doc in documents {
                        doc.decode_deep()?;
                    }
                }
            }
        }

        Ok(())
    }

    fn log_document(&self) -> Document {
        let mut sections = Array::with_capacity(self.sections.len());

        for section in &self.sections {
            let mut s = doc! { "Kind": section.kind() as i32 };

            match section {
                OpMsgSection::Body(doc) => match doc.decode_deep() {
                    Ok(decoded) => s.add("Document", decoded),
                    Err(e) => s.add("DocumentError", e.to_string()),
                },
                OpMsgSection::DocumentSequence {
                    identifier,
                    documents,
                } => {
                    s.add("Identifier", identifier.as_str());

                    let mut docs = Array::with_capacity(documents.len());
                    for doc in documents {
                        match doc.decode_deep() {
                            Ok(decoded) => docs.push(decoded),
                            Err(e) => docs.push(doc! { "error": e.to_string() }),
                        };
                    }
                    s.add("Documents", docs)
                }
            };

            sections.push(s);
        }

        doc! {
            "FlagBits": self.flags.to_string(),
            "Checksum": self.checksum.unwrap_or(0) as i64,
            "Sections": sections,
        }
    }

    /// Returns an indented, multi-line rendering of the message.
    pub fn to_indented_string(&self) -> String {
        self.log_document().to_indented_string()
    }
}

impl fmt::Display for OpMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log_document())
    }
}

/// Validates the section invariants: at least one section, exactly one
/// kind-0 section with exactly one document, and a non-empty identifier on
/// every kind-1 section.
fn check_sections(sections: &[OpMsgSection]) -> Result<()> {
    if sections.is_empty() {
        return Err(Error::invalid_input("no sections"));
    }

    let mut body_found = false;

    for section in sections {
        match section {
            OpMsgSection::Body(_) => {
                if body_found {
                    return Err(Error::invalid_input("multiple kind-0 sections"));
                }
                body_found = true;
            }
            OpMsgSection::DocumentSequence { identifier, .. } => {
                if identifier.is_empty() {
                    return Err(Error::invalid_input("kind-1 section has no identifier"));
                }
            }
        }
    }

    if !body_found {
        return Err(Error::invalid_input("no kind-0 section"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array, doc};

    fn raw(doc: Document) -> RawDocument {
        doc.encode().expect("encode")
    }

    fn round_trip(msg: &OpMsg) -> OpMsg {
        let mut buf = Vec::new();
        msg.encode_to(&mut buf).expect("encode");
        assert_eq!(buf.len(), msg.size());

        let decoded = OpMsg::decode(Bytes::from(buf)).expect("decode");
        assert_eq!(&decoded, msg);
        decoded
    }

    #[test]
    fn single_section_round_trip() {
        let msg = OpMsg::new(&doc! { "ping": 1 }).expect("new");
        let decoded = round_trip(&msg);

        assert_eq!(decoded.document().expect("doc").command(), "ping");
    }

    #[test]
    fn kind1_sections_round_trip() {
        let msg = OpMsg::with_sections(vec![
            OpMsgSection::DocumentSequence {
                identifier: "documents".into(),
                documents: vec![raw(doc! { "a": 1 }), raw(doc! { "b": 2 })],
            },
            OpMsgSection::Body(raw(doc! { "insert": "coll" })),
            OpMsgSection::DocumentSequence {
                identifier: "updates".into(),
                documents: vec![],
            },
        ])
        .expect("sections");

        let decoded = round_trip(&msg);
        assert_eq!(decoded.sections().len(), 3);

        let (spec, seq) = decoded.raw_sections();
        assert_eq!(spec.decode().expect("decode").command(), "insert");
        let expected: Vec<u8> = [raw(doc! { "a": 1 }), raw(doc! { "b": 2 })]
            .iter()
            .flat_map(|d| d.as_bytes().to_vec())
            .collect();
        assert_eq!(seq, expected);
    }

    #[test]
    fn checksum_is_preserved_verbatim() {
        let mut msg = OpMsg::new(&doc! { "ping": 1 }).expect("new");
        msg.flags |= OpMsgFlags::CHECKSUM_PRESENT;
        msg.checksum = Some(0xDEAD_BEEF);

        let mut buf = Vec::new();
        msg.encode_to(&mut buf).expect("encode");
        assert_eq!(buf.len(), msg.size());
        assert_eq!(&buf[buf.len() - 4..], 0xDEAD_BEEFu32.to_le_bytes());

        let decoded = OpMsg::decode(Bytes::from(buf)).expect("decode");
        assert_eq!(decoded.checksum(), Some(0xDEAD_BEEF));
    }

    #[test]
    fn two_body_sections_are_rejected() {
        let err = OpMsg::with_sections(vec![
            OpMsgSection::Body(raw(doc! { "a": 1 })),
            OpMsgSection::Body(raw(doc! { "b": 2 })),
        ])
        .expect_err("two kind-0");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn decoding_two_body_sections_is_rejected() {
        let a = raw(doc! { "a": 1 });
        let mut body = vec![0u8; 4]; // flags
        body.push(0);
        body.extend_from_slice(a.as_bytes());
        body.push(0);
        body.extend_from_slice(a.as_bytes());

        let err = OpMsg::decode(Bytes::from(body)).expect_err("two kind-0");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn one_body_and_two_sequences_succeed() {
        let msg = OpMsg::with_sections(vec![
            OpMsgSection::Body(raw(doc! { "update": "coll" })),
            OpMsgSection::DocumentSequence {
                identifier: "documents".into(),
                documents: vec![raw(doc! { "x": 1 })],
            },
            OpMsgSection::DocumentSequence {
                identifier: "updates".into(),
                documents: vec![raw(doc! { "y": 2 })],
            },
        ])
        .expect("valid sections");

        round_trip(&msg);
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let err = OpMsg::with_sections(vec![
            OpMsgSection::Body(raw(doc! { "a": 1 })),
            OpMsgSection::DocumentSequence {
                identifier: String::new(),
                documents: vec![],
            },
        ])
        .expect_err("empty identifier");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn unknown_section_kind_is_rejected() {
        let mut body = vec![0u8; 4];
        body.push(2);
        body.extend_from_slice(raw(doc! {}).as_bytes());

        let err = OpMsg::decode(Bytes::from(body)).expect_err("kind 2");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn command_document_is_frozen() {
        let msg = OpMsg::new(&doc! { "ping": 1 }).expect("new");
        let doc = msg.document().expect("doc");
        assert!(doc.is_frozen());
    }

    #[test]
    fn rendering_shows_sections() {
        let msg = OpMsg::new(&doc! { "ping": 1, "tags": array!["a"] }).expect("new");
        let compact = msg.to_string();
        assert!(compact.contains("`FlagBits`: `[]`"), "{}", compact);
        assert!(compact.contains("`ping`: 1"), "{}", compact);

        let indented = msg.to_indented_string();
        assert!(indented.contains("`Sections`: [\n"), "{}", indented);
    }
}
