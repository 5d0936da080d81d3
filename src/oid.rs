//! Module containing functionality related to BSON ObjectIds.

use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering},
    time::SystemTime,
};

use once_cell::sync::Lazy;
use rand::{random, thread_rng, Rng};

use crate::error::{Error, Result};

const TIMESTAMP_SIZE: usize = 4;
const PROCESS_ID_SIZE: usize = 5;
const COUNTER_SIZE: usize = 3;

const TIMESTAMP_OFFSET: usize = 0;
const PROCESS_ID_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const COUNTER_OFFSET: usize = PROCESS_ID_OFFSET + PROCESS_ID_SIZE;

const MAX_U24: usize = 0xFF_FFFF;

static OID_COUNTER: Lazy<AtomicUsize> =
    Lazy::new(|| AtomicUsize::new(thread_rng().gen_range(0..=MAX_U24)));

/// A 12-byte BSON ObjectId: a 4-byte big-endian timestamp in seconds since
/// the Unix epoch, a 5-byte random value, and a 3-byte big-endian counter
/// starting from a random value.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl ObjectId {
    /// The number of bytes an ObjectId occupies on the wire.
    pub const LEN: usize = 12;

    /// Generates a new ObjectId from the current time.
    pub fn new() -> Self {
        let timestamp = Self::gen_timestamp();
        let process_id = Self::gen_process_id();
        let counter = Self::gen_count();

        let mut buf: [u8; 12] = [0; 12];
        buf[TIMESTAMP_OFFSET..PROCESS_ID_OFFSET].copy_from_slice(&timestamp);
        buf[PROCESS_ID_OFFSET..COUNTER_OFFSET].copy_from_slice(&process_id);
        buf[COUNTER_OFFSET..].copy_from_slice(&counter);

        Self::from_bytes(buf)
    }

    /// Constructs an ObjectId from its 12 raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self { id: bytes }
    }

    /// Returns the raw 12 bytes of the ObjectId.
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Returns the creation time of this ObjectId with second-level
    /// precision.
    pub fn timestamp(&self) -> crate::DateTime {
        let secs = u32::from_be_bytes([self.id[0], self.id[1], self.id[2], self.id[3]]);
        crate::DateTime::from_millis(secs as i64 * 1000)
    }

    /// Converts this ObjectId to its 24-character hexadecimal representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }

    /// Parses a 24-character hexadecimal string into an ObjectId.
    pub fn parse_str(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref();

        let bytes: Vec<u8> = hex::decode(s.as_bytes())
            .map_err(|_| Error::invalid_input(format!("invalid ObjectId hex string: {:?}", s)))?;
        if bytes.len() != Self::LEN {
            return Err(Error::invalid_input(format!(
                "expected hex string of length {}, got {}",
                Self::LEN * 2,
                s.len()
            )));
        }

        let mut buf = [0u8; 12];
        buf.copy_from_slice(&bytes);
        Ok(Self::from_bytes(buf))
    }

    fn gen_timestamp() -> [u8; 4] {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as u32;
        secs.to_be_bytes()
    }

    fn gen_process_id() -> [u8; 5] {
        static BUF: Lazy<[u8; 5]> = Lazy::new(random);
        *BUF
    }

    fn gen_count() -> [u8; 3] {
        let count = OID_COUNTER.fetch_add(1, Ordering::SeqCst) % (MAX_U24 + 1);

        let b = (count as u32).to_be_bytes();
        [b[1], b[2], b[3]]
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip() {
        let s = "507f1f77bcf86cd799439011";
        let oid = ObjectId::parse_str(s).expect("parse");
        assert_eq!(oid.to_hex(), s);
        assert_eq!(oid.to_string(), s);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(ObjectId::parse_str("not hex at all!").is_err());
        assert!(ObjectId::parse_str("507f1f77").is_err());
        assert!(ObjectId::parse_str("507f1f77bcf86cd79943901122").is_err());
    }

    #[test]
    fn generated_ids_are_distinct_and_increasing() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);

        // same process id, consecutive counter
        assert_eq!(a.bytes()[4..9], b.bytes()[4..9]);
    }

    #[test]
    fn timestamp_extraction() {
        let oid = ObjectId::parse_str("000000f0aabbccddee000001").expect("parse");
        assert_eq!(oid.timestamp().timestamp_millis(), 0xf0 * 1000);
    }
}
