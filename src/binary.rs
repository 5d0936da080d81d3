//! Module containing functionality related to BSON binary values.

use std::fmt;

use crate::{
    error::{Error, Result},
    spec::BinarySubtype,
};

/// A BSON binary value: a subtype byte plus an opaque payload.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the payload.
    pub subtype: BinarySubtype,

    /// The payload itself.
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Creates a [`Binary`] from a base64 string and optional subtype; the
    /// subtype defaults to [`BinarySubtype::Generic`].
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = base64::decode(input.as_ref())
            .map_err(|e| Error::invalid_input(format!("invalid base64: {}", e)))?;
        let subtype = subtype.into().unwrap_or(BinarySubtype::Generic);
        Ok(Binary { subtype, bytes })
    }

    /// The base64 encoding of the payload.
    pub fn to_base64(&self) -> String {
        base64::encode(&self.bytes)
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binary")
            .field("subtype", &self.subtype)
            .field("bytes", &format_args!("0x{}", hex::encode(&self.bytes)))
            .finish()
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binary({}:{})", self.subtype, self.to_base64())
    }
}
