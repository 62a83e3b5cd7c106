//! Interning protocol frames.
//!
//! ```text
//! frame      : [id: i32]                              id != INFO_FOLLOWS
//!            | [INFO_FOLLOWS: i32] [id: i32] block* [NOTHING_FOLLOWS: u8]
//! block      : [STRING_FOLLOWS: u8] [optional string]
//!            | [ACK_FOLLOWS: u8] [acked id: i32]
//! ```
//!
//! An id of [`NULL_ID`] stands for a null string.

use crate::codec::{WireRead, WireWrite};
use crate::error::{Error, Result};
use std::io::{Read, Write};

/// ID denoting a null string.
pub const NULL_ID: i32 = 0;

/// Marks a frame carrying blocks after its ID.
///
/// Neither role can ever assign this value.
pub const INFO_FOLLOWS: i32 = i32::MIN;

/// Block tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// Ends the block list.
    NothingFollows = 1,
    /// The string for the frame's ID follows.
    StringFollows = 2,
    /// An acknowledged ID follows.
    AckFollows = 3,
}

impl Tag {
    /// Convert from u8 to Tag
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Tag::NothingFollows),
            2 => Ok(Tag::StringFollows),
            3 => Ok(Tag::AckFollows),
            _ => Err(Error::decode(format!("invalid interning tag: {}", value))),
        }
    }
}

/// One block of an extended frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Announces the string bound to the frame's ID.
    String(String),
    /// Confirms receipt of an ID announced earlier by the reader.
    Ack(i32),
}

/// A complete interning frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A null string.
    Null,
    /// A bare reference to a known ID.
    Id(i32),
    /// An ID followed by blocks.
    Info {
        /// The string's ID.
        id: i32,
        /// String and acknowledgement blocks.
        blocks: Vec<Block>,
    },
}

impl Frame {
    /// Encode the frame.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        match self {
            Frame::Null => out.write_int(NULL_ID),
            Frame::Id(id) => out.write_int(*id),
            Frame::Info { id, blocks } => {
                out.write_int(INFO_FOLLOWS)?;
                out.write_int(*id)?;
                for block in blocks {
                    match block {
                        Block::String(s) => {
                            out.write_byte(Tag::StringFollows as u8)?;
                            out.write_string(Some(s.as_str()))?;
                        }
                        Block::Ack(acked) => {
                            out.write_byte(Tag::AckFollows as u8)?;
                            out.write_int(*acked)?;
                        }
                    }
                }
                out.write_byte(Tag::NothingFollows as u8)
            }
        }
    }

    /// Decode one frame.
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let id = input.read_int()?;
        match id {
            NULL_ID => Ok(Frame::Null),
            INFO_FOLLOWS => {
                let id = input.read_int()?;
                if id == NULL_ID || id == INFO_FOLLOWS {
                    return Err(Error::decode(format!("invalid extended frame id: {}", id)));
                }

                let mut blocks = Vec::new();
                loop {
                    match Tag::from_u8(input.read_byte()?)? {
                        Tag::NothingFollows => break,
                        Tag::StringFollows => {
                            let s = input.read_string()?.ok_or_else(|| {
                                Error::decode(format!("null string announced for id {}", id))
                            })?;
                            blocks.push(Block::String(s));
                        }
                        Tag::AckFollows => blocks.push(Block::Ack(input.read_int()?)),
                    }
                }
                Ok(Frame::Info { id, blocks })
            }
            id => Ok(Frame::Id(id)),
        }
    }

    /// Encoded size of the frame in bytes.
    pub fn encoded_len(&self) -> usize {
        let mut buf = Vec::new();
        match self.write_to(&mut buf) {
            Ok(()) => buf.len(),
            Err(_) => 0,
        }
    }
}
