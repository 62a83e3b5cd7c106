//! The string interning protocol.

use super::dictionary::{Assignment, Dictionary};
use super::frame::{Block, Frame};
use super::{PeerRole, StringIo};
use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Replaces repeated strings with small integer IDs.
///
/// One instance serves both directions of a connection and may be shared
/// between a reading and a writing thread. Each side numbers the strings it
/// introduces in its own direction, so the two sides never hand out the
/// same ID and no handshake is needed.
///
/// A string is sent in full until the peer acknowledges its ID.
/// Acknowledgements travel piggy-backed on the next frame written in the
/// opposite direction. If writing a frame fails, the acknowledgements it
/// carried are queued again for the next write.
///
/// ```rust
/// use lexwire::intern::{PeerRole, StringCompressor, StringIo};
///
/// # fn main() -> Result<(), lexwire::Error> {
/// let client = StringCompressor::new(PeerRole::Client);
/// let server = StringCompressor::new(PeerRole::Server);
///
/// let mut wire = Vec::new();
/// client.write(&mut wire, Some("http://snomed.info/sct"))?;
/// assert_eq!(server.read(&mut wire.as_slice())?.as_deref(), Some("http://snomed.info/sct"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StringCompressor {
    dictionary: Dictionary,
}

impl StringCompressor {
    /// Create a protocol instance for one side of a connection.
    pub fn new(role: PeerRole) -> Self {
        Self { dictionary: Dictionary::new(role) }
    }

    /// This side's role.
    pub fn role(&self) -> PeerRole {
        self.dictionary.role()
    }

    /// Number of distinct strings known to this side.
    pub fn dictionary_len(&self) -> usize {
        self.dictionary.len()
    }

    /// Number of acknowledgements waiting to be sent.
    pub fn pending_acks(&self) -> usize {
        self.dictionary.pending_len()
    }

    /// Build the frame for `value`, updating dictionary state.
    fn frame_for(&self, value: Option<&str>) -> Result<Frame> {
        let string = match value {
            Some(s) => s,
            None => return Ok(Frame::Null),
        };

        let Assignment { id, string_follows } = self.dictionary.assign(string)?;
        let acks = self.dictionary.drain_pending();

        if !string_follows && acks.is_empty() {
            return Ok(Frame::Id(id));
        }

        let mut blocks = Vec::with_capacity(acks.len() + 1);
        if string_follows {
            blocks.push(Block::String(string.to_owned()));
        }
        blocks.extend(acks.into_iter().map(Block::Ack));
        Ok(Frame::Info { id, blocks })
    }
}

impl StringIo for StringCompressor {
    fn write(&self, out: &mut dyn Write, value: Option<&str>) -> Result<()> {
        let frame = self.frame_for(value)?;
        frame.write_to(out).inspect_err(|e| {
            if let Frame::Info { blocks, .. } = &frame {
                let acks: Vec<i32> = blocks
                    .iter()
                    .filter_map(|block| match block {
                        Block::Ack(id) => Some(*id),
                        Block::String(_) => None,
                    })
                    .collect();
                log::debug!("Requeueing {} acknowledgements after failed write: {}", acks.len(), e);
                self.dictionary.requeue(acks);
            }
        })
    }

    fn read(&self, input: &mut dyn Read) -> Result<Option<String>> {
        let (id, blocks) = match Frame::read_from(input)? {
            Frame::Null => return Ok(None),
            Frame::Id(id) => (id, Vec::new()),
            Frame::Info { id, blocks } => (id, blocks),
        };

        let mut announced = None;
        let mut acks = Vec::new();
        for block in blocks {
            match block {
                Block::String(s) => {
                    if announced.replace(s).is_some() {
                        return Err(Error::decode(format!("id {} announced twice in one frame", id)));
                    }
                }
                Block::Ack(acked) => acks.push(acked),
            }
        }

        let string = self.dictionary.receive(id, announced, &acks)?;
        Ok(Some(string.to_string()))
    }
}
