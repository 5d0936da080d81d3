use std::{
    fmt,
    io::{self, Read, Write},
};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, ErrorKind, Result};

/// The length of a wire message header in bytes.
pub const MSG_HEADER_LEN: usize = 16;

/// The maximum length of a wire message, header included.
pub const MAX_MSG_LEN: i32 = 48_000_000;

/// A wire protocol operation code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum OpCode {
    /// OP_REPLY
    Reply = 1,
    /// OP_UPDATE
    Update = 2001,
    /// OP_INSERT
    Insert = 2002,
    /// OP_GET_BY_OID
    GetByOid = 2003,
    /// OP_QUERY
    Query = 2004,
    /// OP_GET_MORE
    GetMore = 2005,
    /// OP_DELETE
    Delete = 2006,
    /// OP_KILL_CURSORS
    KillCursors = 2007,
    /// OP_COMPRESSED
    Compressed = 2012,
    /// OP_MSG
    Msg = 2013,
}

impl TryFrom<i32> for OpCode {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            1 => OpCode::Reply,
            2001 => OpCode::Update,
            2002 => OpCode::Insert,
            2003 => OpCode::GetByOid,
            2004 => OpCode::Query,
            2005 => OpCode::GetMore,
            2006 => OpCode::Delete,
            2007 => OpCode::KillCursors,
            2012 => OpCode::Compressed,
            2013 => OpCode::Msg,
            _ => return Err(Error::invalid_input(format!("invalid opcode {}", value))),
        })
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpCode::Reply => "OP_REPLY",
            OpCode::Update => "OP_UPDATE",
            OpCode::Insert => "OP_INSERT",
            OpCode::GetByOid => "OP_GET_BY_OID",
            OpCode::Query => "OP_QUERY",
            OpCode::GetMore => "OP_GET_MORE",
            OpCode::Delete => "OP_DELETE",
            OpCode::KillCursors => "OP_KILL_CURSORS",
            OpCode::Compressed => "OP_COMPRESSED",
            OpCode::Msg => "OP_MSG",
        })
    }
}

/// The fixed 16-byte header common to all wire protocol messages.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MsgHeader {
    /// Total message size in bytes, header included.
    pub message_length: i32,

    /// Identifier assigned by the requesting side.
    pub request_id: i32,

    /// The `request_id` of the message this one responds to.
    pub response_to: i32,

    /// The operation code identifying the body shape.
    pub op_code: OpCode,
}

impl MsgHeader {
    /// Creates a request header for the given opcode. The length is filled
    /// in by [`crate::wire::write_message`].
    pub fn new(op_code: OpCode, request_id: i32) -> Self {
        Self {
            message_length: 0,
            request_id,
            response_to: 0,
            op_code,
        }
    }

    /// Reads a header from the stream.
    ///
    /// Reading zero bytes at the very start returns the distinct
    /// [`ErrorKind::ZeroRead`] signal so callers can close idle connections
    /// cleanly; any partial header is an error.
    pub fn read_from(reader: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; MSG_HEADER_LEN];
        let mut filled = 0;

        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Err(ErrorKind::ZeroRead.into()),
                Ok(0) => return Err(Error::short_input(MSG_HEADER_LEN, filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Self::from_bytes(buf)
    }

    /// Writes the 16 header bytes to the stream.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub(crate) fn from_bytes(buf: [u8; MSG_HEADER_LEN]) -> Result<Self> {
        let mut rdr = &buf[..];

        let message_length = rdr.read_i32::<LittleEndian>()?;
        let request_id = rdr.read_i32::<LittleEndian>()?;
        let response_to = rdr.read_i32::<LittleEndian>()?;
        let op_code = OpCode::try_from(rdr.read_i32::<LittleEndian>()?)?;

        if message_length < MSG_HEADER_LEN as i32 || message_length > MAX_MSG_LEN {
            return Err(Error::invalid_input(format!(
                "invalid message length {}",
                message_length
            )));
        }

        Ok(Self {
            message_length,
            request_id,
            response_to,
            op_code,
        })
    }

    pub(crate) fn to_bytes(self) -> [u8; MSG_HEADER_LEN] {
        let mut bytes = [0u8; MSG_HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.message_length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.request_id.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.response_to.to_le_bytes());
        bytes[12..16].copy_from_slice(&(self.op_code as i32).to_le_bytes());
        bytes
    }
}

impl fmt::Display for MsgHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length: {:5}, id: {:4}, response_to: {:4}, opcode: {}",
            self.message_length, self.request_id, self.response_to, self.op_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MsgHeader {
        MsgHeader {
            message_length: 372,
            request_id: 1,
            response_to: 0,
            op_code: OpCode::Query,
        }
    }

    #[test]
    fn byte_round_trip() {
        let header = sample();
        let bytes = header.to_bytes();
        assert_eq!(bytes[..4], 372i32.to_le_bytes());
        assert_eq!(bytes[12..], 2004i32.to_le_bytes());
        assert_eq!(MsgHeader::from_bytes(bytes).expect("parse"), header);
    }

    #[test]
    fn stream_round_trip() {
        let mut buf = Vec::new();
        sample().write_to(&mut buf).expect("write");
        assert_eq!(buf.len(), MSG_HEADER_LEN);

        let parsed = MsgHeader::read_from(&mut &buf[..]).expect("read");
        assert_eq!(parsed, sample());
    }

    #[test]
    fn empty_stream_signals_zero_read() {
        let err = MsgHeader::read_from(&mut &[][..]).expect_err("empty");
        assert!(err.is_zero_read());
    }

    #[test]
    fn partial_header_is_an_error() {
        let bytes = sample().to_bytes();
        let err = MsgHeader::read_from(&mut &bytes[..7]).expect_err("partial");
        assert!(err.is_short_input());
    }

    #[test]
    fn length_bounds_are_enforced() {
        let mut bytes = sample().to_bytes();
        bytes[..4].copy_from_slice(&15i32.to_le_bytes());
        assert!(MsgHeader::from_bytes(bytes).expect_err("too short").is_invalid_input());

        bytes[..4].copy_from_slice(&(MAX_MSG_LEN + 1).to_le_bytes());
        assert!(MsgHeader::from_bytes(bytes).expect_err("too long").is_invalid_input());
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[12..].copy_from_slice(&9999i32.to_le_bytes());
        assert!(MsgHeader::from_bytes(bytes).expect_err("opcode").is_invalid_input());
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            sample().to_string(),
            "length:   372, id:    1, response_to:    0, opcode: OP_QUERY"
        );
    }
}
