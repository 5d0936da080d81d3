//! MongoDB wire protocol messages and the BSON binary format, with
//! bit-exact round-tripping.
//!
//! This crate is the codec layer shared by servers, proxies, and clients
//! that read, inspect, construct, and write MongoDB-compatible messages:
//!
//! - [`Document`] / [`Array`] are the owned, decoded composites; the
//!   [`doc!`] and [`array!`] macros build them.
//! - [`RawDocument`] / [`RawArray`] are zero-copy views over encoded bytes;
//!   shallow decoding leaves nested composites raw, deep decoding
//!   materializes the whole tree. See the [`raw`] module.
//! - The [`wire`] module frames OP_MSG, OP_QUERY, and OP_REPLY messages
//!   over any [`std::io::Read`] / [`std::io::Write`] pair.
//! - The [`extjson`] module converts values to and from Canonical Extended
//!   JSON v2.
//!
//! The core invariant is exact round-tripping: decoding bytes and
//! re-encoding the result reproduces the input bit for bit, including NaN
//! payloads, signed zeros, duplicate field names, and field order.
//!
//! ```
//! use mongowire::{doc, wire};
//!
//! let body = wire::MsgBody::Msg(wire::OpMsg::new(&doc! { "ping": 1 })?);
//! let mut header = wire::MsgHeader::new(wire::OpCode::Msg, 1);
//!
//! let mut stream = Vec::new();
//! wire::write_message(&mut stream, &mut header, &body)?;
//!
//! let (echo_header, echo_body) = wire::read_message(&mut &stream[..])?;
//! assert_eq!(echo_header, header);
//! assert_eq!(echo_body, body);
//! # Ok::<(), mongowire::Error>(())
//! ```

pub mod extjson;
pub mod oid;
pub mod raw;
pub mod wire;

mod array;
mod binary;
mod bson;
mod datetime;
mod decimal128;
mod decode;
mod document;
mod encode;
mod error;
mod logging;
mod macros;
mod spec;

pub use self::{
    array::Array,
    binary::Binary,
    bson::{Bson, Regex, Timestamp},
    datetime::DateTime,
    decimal128::Decimal128,
    document::Document,
    encode::size,
    error::{Error, ErrorKind, Result},
    logging::LOG_MAX_DEPTH,
    raw::{RawArray, RawDocument},
    spec::{BinarySubtype, ElementType},
};
