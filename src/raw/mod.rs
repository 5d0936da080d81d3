//! Zero-copy views over encoded BSON.
//!
//! A [`RawDocument`] or [`RawArray`] wraps a [`bytes::Bytes`] slice holding
//! exactly one encoded composite. Subslices taken during parsing (nested
//! documents, OP_MSG sections) share the refcounted backing buffer of the
//! message body they came from, so no copying happens until a caller asks
//! for a decoded form.
//!
//! Shallow decoding ([`RawDocument::decode`]) materializes only the
//! top-level fields, leaving nested composites as raw subslices; deep
//! decoding ([`RawDocument::decode_deep`]) materializes the whole tree and
//! severs the tie to the backing buffer. Both forms re-encode to the exact
//! original bytes.

mod array;
mod document;
mod iter;

pub use self::{
    array::RawArray,
    document::{AnyDocument, RawDocument},
    iter::Iter,
};

use crate::error::{Error, Result};

/// The smallest valid encoded composite: a 4-byte length prefix plus the
/// terminating zero byte.
pub(crate) const MIN_DOCUMENT_LEN: usize = 5;

/// Finds the first encoded BSON document or array at the start of `buf` and
/// returns its length.
///
/// `buf` may contain further bytes after the composite; only the length
/// prefix, minimum size, and trailing zero byte are validated here, so
/// `buf[..len]` still has to be decoded before its contents can be trusted.
///
/// Used when parsing streams of composites, such as OP_MSG document
/// sequences.
pub fn find_raw(buf: &[u8]) -> Result<usize> {
    if buf.len() < MIN_DOCUMENT_LEN {
        return Err(Error::short_input(MIN_DOCUMENT_LEN, buf.len()));
    }

    let len = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if len < MIN_DOCUMENT_LEN as i32 {
        return Err(Error::invalid_input(format!(
            "document length {} is below the minimum of {}",
            len, MIN_DOCUMENT_LEN
        )));
    }

    let len = len as usize;
    if buf.len() < len {
        return Err(Error::short_input(len, buf.len()));
    }

    if buf[len - 1] != 0 {
        return Err(Error::invalid_input("document is not null-terminated"));
    }

    Ok(len)
}
