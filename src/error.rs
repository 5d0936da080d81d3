use thiserror::Error;

/// The result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised while encoding, decoding, or framing BSON and wire
/// protocol messages.
///
/// Decoding errors carry the document key or array index closest to the
/// failure site when one is known.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The kinds of errors raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// More bytes were needed than the input provided.
    #[error("short input: needed {needed} bytes, got {actual}")]
    #[non_exhaustive]
    ShortInput { needed: usize, actual: usize },

    /// Structurally invalid bytes were encountered.
    #[error("invalid input: {message}")]
    #[non_exhaustive]
    InvalidInput { message: String },

    /// The input stream was at EOF at a message boundary.
    ///
    /// This is a non-fatal signal; servers use it to close idle connections
    /// cleanly.
    #[error("zero bytes read at message boundary")]
    ZeroRead,

    /// A recognized but intentionally unimplemented opcode or BSON tag.
    #[error("unsupported: {message}")]
    #[non_exhaustive]
    Unsupported { message: String },

    /// A [`std::io::Error`] occurred on the underlying transport.
    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        ErrorKind::Io(value).into()
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        if self.key.is_none() && self.index.is_none() {
            self.key = Some(key.into());
        }
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        if self.key.is_none() && self.index.is_none() {
            self.index = Some(index);
        }
        self
    }

    pub(crate) fn short_input(needed: usize, actual: usize) -> Self {
        ErrorKind::ShortInput { needed, actual }.into()
    }

    pub(crate) fn invalid_input(message: impl ToString) -> Self {
        ErrorKind::InvalidInput {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn unsupported(message: impl ToString) -> Self {
        ErrorKind::Unsupported {
            message: message.to_string(),
        }
        .into()
    }

    /// Whether this error is the non-fatal end-of-stream signal returned by
    /// [`crate::wire::read_message`] when the peer has closed the connection
    /// between messages.
    pub fn is_zero_read(&self) -> bool {
        matches!(self.kind, ErrorKind::ZeroRead)
    }

    #[cfg(test)]
    pub(crate) fn is_short_input(&self) -> bool {
        matches!(self.kind, ErrorKind::ShortInput { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_invalid_input(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidInput { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_unsupported(&self) -> bool {
        matches!(self.kind, ErrorKind::Unsupported { .. })
    }
}
