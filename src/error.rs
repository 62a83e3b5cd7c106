//! Error types for lexwire.

use std::io;
use thiserror::Error;

/// The result type used throughout lexwire.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for lexwire operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error raised by an underlying stream.
    ///
    /// Filter stages propagate these unchanged.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed input was encountered while decoding.
    ///
    /// Covers truncated input, invalid lengths, unknown tags, unknown
    /// interning IDs and out-of-range enum ordinals.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A type or option cannot be used as configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An I/O error raised while accessing a sorted index file.
    #[error("Storage IO error: {0}")]
    Storage(#[source] io::Error),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload body could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Creates a new decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Creates a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Returns true if this is a decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }

    /// Re-labels a stream I/O error as a storage error.
    ///
    /// Other variants pass through untouched.
    pub(crate) fn into_storage(self) -> Self {
        match self {
            Error::Io(e) => Error::Storage(e),
            other => other,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

/// Maps an I/O error from a codec read into the crate error.
///
/// Running out of input mid-value is a decode failure, not a stream failure.
pub(crate) fn read_error(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::decode("truncated input")
    } else {
        Error::Io(err)
    }
}
