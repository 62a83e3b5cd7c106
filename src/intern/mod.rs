//! String transmission strategies.
//!
//! A connection writes strings through a [`StringIo`]. [`DirectStringIo`]
//! always sends the full string. [`StringCompressor`] runs the interning
//! protocol, replacing strings the peer already knows with integer IDs.
//!
//! ## ID numbering
//!
//! ```text
//! Client: 1, 2, 3, ...        Server: -1, -2, -3, ...
//! 0           => null string
//! i32::MIN    => extended frame follows
//! ```

pub mod compressor;
pub mod dictionary;
pub mod frame;

pub use compressor::StringCompressor;
pub use dictionary::{Assignment, Dictionary};
pub use frame::{Block, Frame, Tag, INFO_FOLLOWS, NULL_ID};

use crate::codec::{WireRead, WireWrite};
use crate::config::StringIoMode;
use crate::error::Result;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// The side of a connection an endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerRole {
    /// Numbers new strings 1, 2, 3, ...
    Client,
    /// Numbers new strings -1, -2, -3, ...
    Server,
}

impl PeerRole {
    /// The role of the other endpoint.
    pub fn opposite(self) -> Self {
        match self {
            PeerRole::Client => PeerRole::Server,
            PeerRole::Server => PeerRole::Client,
        }
    }
}

/// Writes and reads optional strings on a byte stream.
pub trait StringIo: Send + Sync + fmt::Debug {
    /// Write `value`.
    fn write(&self, out: &mut dyn Write, value: Option<&str>) -> Result<()>;

    /// Read a value written by the peer's counterpart.
    fn read(&self, input: &mut dyn Read) -> Result<Option<String>>;
}

/// Sends every string in full with the chunked string encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectStringIo;

impl StringIo for DirectStringIo {
    fn write(&self, out: &mut dyn Write, value: Option<&str>) -> Result<()> {
        out.write_string(value)
    }

    fn read(&self, input: &mut dyn Read) -> Result<Option<String>> {
        input.read_string()
    }
}

/// Create the string transmission strategy for one side of a connection.
pub fn string_io(mode: StringIoMode, role: PeerRole) -> Arc<dyn StringIo> {
    match mode {
        StringIoMode::Direct => Arc::new(DirectStringIo),
        StringIoMode::Interning => Arc::new(StringCompressor::new(role)),
    }
}
