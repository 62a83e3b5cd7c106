//! # lexwire - Binary Wire Plumbing for Terminology Servers
//!
//! lexwire provides the byte-level layers a client and server use to talk
//! over a single raw byte channel, plus a small on-disk index.
//!
//! ## Architecture
//!
//! - **Codec**: Byte-exact encodings for scalars, optional byte arrays,
//!   chunked optional strings, enum literals and typed payloads
//! - **Filters**: Reversible stream transforms (compression, obfuscation,
//!   digesting) stacked beneath the codec
//! - **Interning**: A protocol replacing repeated strings with integer IDs
//!   once the peer has acknowledged them
//! - **Index**: A persistent sorted file of fixed-width records with an
//!   optional read-through cache
//!
//! ## Example Usage
//!
//! ```rust
//! use lexwire::codec::{WireRead, WireWrite};
//! use lexwire::filter::{DefaultFilterFactory, FilterFactory, OutputStage};
//! use lexwire::intern::{string_io, PeerRole, StringIo};
//! use lexwire::FilterOptions;
//! use std::sync::{Arc, Mutex};
//!
//! # #[derive(Clone, Default)]
//! # struct Shared(Arc<Mutex<Vec<u8>>>);
//! # impl std::io::Write for Shared {
//! #     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
//! #         self.0.lock().unwrap().extend_from_slice(buf);
//! #         Ok(buf.len())
//! #     }
//! #     fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
//! # }
//! # fn main() -> Result<(), lexwire::Error> {
//! let options = FilterOptions::new().obfuscation_key(b"shared secret".to_vec());
//! let chain = DefaultFilterFactory.create(&options)?;
//! let client = string_io(options.string_io, PeerRole::Client);
//! let server = string_io(options.string_io, PeerRole::Server);
//!
//! // Client side: codec -> filters -> raw channel
//! let sink = Shared::default();
//! let mut out = chain.wrap_output_raw(sink.clone())?;
//! out.write_int(42)?;
//! client.write(&mut out, Some("http://snomed.info/sct"))?;
//! out.finish()?;
//!
//! // Server side: raw channel -> filters -> codec
//! let raw = sink.0.lock().unwrap().clone();
//! let mut input = chain.wrap_input_raw(std::io::Cursor::new(raw))?;
//! assert_eq!(input.read_int()?, 42);
//! assert_eq!(server.read(&mut input)?.as_deref(), Some("http://snomed.info/sct"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod intern;

// Re-exports
pub use codec::{Payload, PayloadKind, PayloadResolver, WireEnum, WireRead, WireWrite};
pub use config::{CompressionType, DigestAlgorithm, FilterOptions, StringIoMode};
pub use error::{Error, Result};
pub use filter::{FilterChain, OutputStage, StreamFilter};
pub use index::{CachingIndex, KeyValueStore, SortedFileIndex};
pub use intern::{PeerRole, StringCompressor, StringIo};
