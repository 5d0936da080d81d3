//! Wire protocol framing: the 16-byte message header, the OP_MSG /
//! OP_QUERY / OP_REPLY body shapes, and length-prefixed reading and writing
//! over a byte stream.
//!
//! The codec here is single-threaded per connection and purely synchronous;
//! integrating with an async runtime, correlating `request_id` /
//! `response_to` pairs, and retrying are all the caller's responsibility.
//! Bodies hold their documents as raw byte ranges ([`crate::RawDocument`])
//! until the caller asks to decode them.

mod header;
mod op_msg;
mod op_query;
mod op_reply;

pub use self::{
    header::{MsgHeader, OpCode, MAX_MSG_LEN, MSG_HEADER_LEN},
    op_msg::{OpMsg, OpMsgFlags, OpMsgSection},
    op_query::{OpQuery, OpQueryFlags},
    op_reply::{OpReply, OpReplyFlags},
};

use std::io::{self, Read, Write};

use bytes::Bytes;

use crate::error::{Error, Result};

/// A decoded wire message body.
#[derive(Debug, Clone, PartialEq)]
pub enum MsgBody {
    /// An OP_MSG message.
    Msg(OpMsg),
    /// An OP_QUERY message.
    Query(OpQuery),
    /// An OP_REPLY message.
    Reply(OpReply),
}

impl MsgBody {
    /// The opcode matching this body shape.
    pub fn op_code(&self) -> OpCode {
        match self {
            MsgBody::Msg(_) => OpCode::Msg,
            MsgBody::Query(_) => OpCode::Query,
            MsgBody::Reply(_) => OpCode::Reply,
        }
    }

    /// The size of the encoded body in bytes.
    pub fn size(&self) -> usize {
        match self {
            MsgBody::Msg(msg) => msg.size(),
            MsgBody::Query(query) => query.size(),
            MsgBody::Reply(reply) => reply.size(),
        }
    }

    /// Encodes the body into a fresh buffer of exactly [`MsgBody::size`]
    /// bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size());

        match self {
            MsgBody::Msg(msg) => msg.encode_to(&mut buf)?,
            MsgBody::Query(query) => query.encode_to(&mut buf)?,
            MsgBody::Reply(reply) => reply.encode_to(&mut buf)?,
        }

        debug_assert_eq!(buf.len(), self.size());
        Ok(buf)
    }

    /// Decodes a body of the given opcode. The body must occupy the whole
    /// buffer.
    pub fn decode(op_code: OpCode, body: Bytes) -> Result<Self> {
        match op_code {
            OpCode::Msg => Ok(MsgBody::Msg(OpMsg::decode(body)?)),
            OpCode::Query => Ok(MsgBody::Query(OpQuery::decode(body)?)),
            OpCode::Reply => Ok(MsgBody::Reply(OpReply::decode(body)?)),
            other => Err(Error::unsupported(format!(
                "unsupported opcode {}",
                other
            ))),
        }
    }

    /// Returns an indented, multi-line rendering of the body.
    pub fn to_indented_string(&self) -> String {
        match self {
            MsgBody::Msg(msg) => msg.to_indented_string(),
            MsgBody::Query(query) => query.to_indented_string(),
            MsgBody::Reply(reply) => reply.to_indented_string(),
        }
    }
}

impl std::fmt::Display for MsgBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsgBody::Msg(msg) => msg.fmt(f),
            MsgBody::Query(query) => query.fmt(f),
            MsgBody::Reply(reply) => reply.fmt(f),
        }
    }
}

/// Reads one length-prefixed message from the stream.
///
/// Returns the [`ErrorKind::ZeroRead`](crate::ErrorKind::ZeroRead) signal
/// if the stream is at EOF at the message boundary. The body must decode by
/// consuming exactly `header.message_length - 16` bytes.
pub fn read_message(reader: &mut impl Read) -> Result<(MsgHeader, MsgBody)> {
    let header = MsgHeader::read_from(reader)?;

    // the header's length bounds were validated on read
    let body_len = header.message_length as usize - MSG_HEADER_LEN;
    let mut buf = vec![0u8; body_len];
    let mut filled = 0;

    while filled < body_len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::short_input(body_len, filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let body = MsgBody::decode(header.op_code, Bytes::from(buf))?;
    Ok((header, body))
}

/// Writes one length-prefixed message to the stream and flushes it.
///
/// `header.message_length` is set from the encoded body size, so the caller
/// may leave it zero.
pub fn write_message(
    writer: &mut impl Write,
    header: &mut MsgHeader,
    body: &MsgBody,
) -> Result<()> {
    let encoded = body.encode()?;
    header.message_length = (encoded.len() + MSG_HEADER_LEN) as i32;

    if header.message_length > MAX_MSG_LEN {
        return Err(Error::invalid_input(format!(
            "message length {} exceeds the maximum of {}",
            header.message_length, MAX_MSG_LEN
        )));
    }

    writer.write_all(&header.to_bytes())?;
    writer.write_all(&encoded)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn ping_message() -> (MsgHeader, MsgBody) {
        let body = MsgBody::Msg(OpMsg::new(&doc! { "ping": 1 }).expect("new"));
        (MsgHeader::new(OpCode::Msg, 7), body)
    }

    #[test]
    fn stream_round_trip() {
        let (mut header, body) = ping_message();

        let mut stream = Vec::new();
        write_message(&mut stream, &mut header, &body).expect("write");
        assert_eq!(stream.len(), header.message_length as usize);

        let (read_header, read_body) = read_message(&mut &stream[..]).expect("read");
        assert_eq!(read_header, header);
        assert_eq!(read_body, body);

        // writing the returned pair reproduces the stream byte for byte
        let mut rewritten = Vec::new();
        let mut header2 = read_header;
        write_message(&mut rewritten, &mut header2, &read_body).expect("rewrite");
        assert_eq!(rewritten, stream);
    }

    #[test]
    fn eof_at_message_boundary_is_zero_read() {
        let err = read_message(&mut &[][..]).expect_err("eof");
        assert!(err.is_zero_read());
    }

    #[test]
    fn truncated_body_is_short_input() {
        let (mut header, body) = ping_message();
        let mut stream = Vec::new();
        write_message(&mut stream, &mut header, &body).expect("write");
        stream.truncate(stream.len() - 3);

        let err = read_message(&mut &stream[..]).expect_err("truncated");
        assert!(err.is_short_input());
    }

    #[test]
    fn unsupported_opcode_bodies_are_signalled() {
        // a syntactically valid header for an OP_COMPRESSED message
        let mut stream = Vec::new();
        let header = MsgHeader {
            message_length: (MSG_HEADER_LEN + 4) as i32,
            request_id: 1,
            response_to: 0,
            op_code: OpCode::Compressed,
        };
        header.write_to(&mut stream).expect("header");
        stream.extend_from_slice(&[0; 4]);

        let err = read_message(&mut &stream[..]).expect_err("compressed");
        assert!(err.is_unsupported());
    }

    #[test]
    fn reply_round_trips_through_the_stream() {
        let body = MsgBody::Reply(OpReply::new(&doc! { "ok": 1.0 }).expect("new"));
        let mut header = MsgHeader::new(OpCode::Reply, 3);
        header.response_to = 7;

        let mut stream = Vec::new();
        write_message(&mut stream, &mut header, &body).expect("write");

        let (read_header, read_body) = read_message(&mut &stream[..]).expect("read");
        assert_eq!(read_header.response_to, 7);
        assert_eq!(read_body, body);
    }
}
