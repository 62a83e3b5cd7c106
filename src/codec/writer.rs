//! Encoding half of the wire codec.

use super::enums::{EnumCodec, WireEnum};
use super::payload::Payload;
use super::{MAX_CHUNK_CHARS, MAX_UTF_BYTES, NULL_LENGTH};
use crate::error::{Error, Result};
use std::io::Write;

/// Wire encoding for any byte sink.
///
/// All multi-byte scalars are written big-endian.
pub trait WireWrite: Write {
    /// Write a single byte.
    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])?;
        Ok(())
    }

    /// Write a boolean as one byte, `1` or `0`.
    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(value as u8)
    }

    /// Write a signed 16-bit integer.
    fn write_short(&mut self, value: i16) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a signed 32-bit integer.
    fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a signed 64-bit integer.
    fn write_long(&mut self, value: i64) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a 32-bit float.
    fn write_float(&mut self, value: f32) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write a 64-bit float.
    fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_all(&value.to_be_bytes())?;
        Ok(())
    }

    /// Write one length-prefixed utf frame.
    ///
    /// Fails if the encoded string does not fit a u16 length.
    fn write_utf(&mut self, value: &str) -> Result<()> {
        if value.len() > MAX_UTF_BYTES {
            return Err(Error::invalid_argument(format!(
                "utf frame too long: {} bytes",
                value.len()
            )));
        }
        self.write_all(&(value.len() as u16).to_be_bytes())?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Write an optional byte array.
    ///
    /// Format: [length: i32][bytes], where length -1 marks null.
    fn write_byte_array(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            None => self.write_int(NULL_LENGTH),
            Some(bytes) => {
                let len = i32::try_from(bytes.len()).map_err(|_| {
                    Error::invalid_argument(format!("byte array too long: {} bytes", bytes.len()))
                })?;
                self.write_int(len)?;
                self.write_all(bytes)?;
                Ok(())
            }
        }
    }

    /// Write an optional string of any length as a sequence of chunks.
    ///
    /// Each chunk is preceded by `true`; the sequence ends with `false`.
    /// The empty string still writes one empty chunk, so it stays distinct
    /// from null.
    fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(s) = value {
            for chunk in StringChunks::new(s) {
                self.write_bool(true)?;
                self.write_utf(chunk)?;
            }
        }
        self.write_bool(false)
    }

    /// Write an enum literal through a validated codec.
    fn write_enum<E: WireEnum>(&mut self, codec: &EnumCodec<E>, literal: Option<E>) -> Result<()> {
        let byte = codec.encode(literal)?;
        self.write_byte(byte)
    }

    /// Write an optional payload.
    fn write_payload(&mut self, payload: Option<&Payload>) -> Result<()> {
        match payload {
            None => {
                self.write_string(None)?;
                self.write_byte_array(None)
            }
            Some(payload) => {
                let body = payload.encode_body()?;
                self.write_string(Some(payload.kind().type_name()))?;
                self.write_byte_array(Some(&body))
            }
        }
    }
}

impl<W: Write + ?Sized> WireWrite for W {}

/// Splits a string into chunks of at most [`MAX_CHUNK_CHARS`] characters.
///
/// Always yields at least one chunk, which is empty for the empty string.
pub(crate) struct StringChunks<'a> {
    rest: &'a str,
    started: bool,
}

impl<'a> StringChunks<'a> {
    pub(crate) fn new(s: &'a str) -> Self {
        Self { rest: s, started: false }
    }
}

impl<'a> Iterator for StringChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.started && self.rest.is_empty() {
            return None;
        }
        self.started = true;

        let split = self
            .rest
            .char_indices()
            .nth(MAX_CHUNK_CHARS)
            .map_or(self.rest.len(), |(i, _)| i);
        let (chunk, tail) = self.rest.split_at(split);
        self.rest = tail;
        Some(chunk)
    }
}
