//! Byte-exact wire codec.
//!
//! The codec is a pair of extension traits, [`WireWrite`] and [`WireRead`],
//! implemented for every `std::io::Write` and `std::io::Read`. Scalars use
//! big-endian byte order. On top of the scalars sit four composite encodings:
//!
//! ```text
//! optional byte array : [len: i32] [bytes: len]          len == -1 => null
//! optional string     : ([true: u8] [chunk: utf])* [false: u8]
//!                       a lone false => null
//! utf chunk           : [byte_len: u16] [utf-8 bytes]
//! enum literal        : [ordinal + 1: u8]                0 => null
//! payload             : [type name: optional string] [body: optional byte array]
//! ```
//!
//! Every decode violation surfaces as [`Error::Decode`](crate::Error::Decode).
//!
//! ## Usage
//!
//! ```rust
//! use lexwire::codec::{WireRead, WireWrite};
//!
//! # fn main() -> Result<(), lexwire::Error> {
//! let mut buf = Vec::new();
//! buf.write_string(Some("hello"))?;
//! buf.write_byte_array(None)?;
//!
//! let mut input = buf.as_slice();
//! assert_eq!(input.read_string()?.as_deref(), Some("hello"));
//! assert_eq!(input.read_byte_array()?, None);
//! # Ok(())
//! # }
//! ```

pub mod enums;
pub mod payload;
pub mod reader;
pub mod writer;

pub use enums::{EnumCodec, WireEnum};
pub use payload::{AliasResolver, DefaultResolver, Payload, PayloadKind, PayloadResolver, RemoteError};
pub use reader::WireRead;
pub use writer::WireWrite;

/// Length marker for a null byte array.
pub const NULL_LENGTH: i32 = -1;

/// Largest byte array a reader accepts (256MB).
pub const MAX_BYTE_ARRAY_LEN: usize = 256 * 1024 * 1024;

/// Maximum number of characters carried by one string chunk.
///
/// A char needs at most 4 UTF-8 bytes, so a full chunk stays below the
/// u16 length limit of a utf frame.
pub const MAX_CHUNK_CHARS: usize = MAX_UTF_BYTES / 4;

/// Maximum encoded length of a single utf frame.
pub const MAX_UTF_BYTES: usize = u16::MAX as usize;
