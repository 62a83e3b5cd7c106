//! Decoding half of the wire codec.

use super::enums::{EnumCodec, WireEnum};
use super::payload::{DefaultResolver, Payload, PayloadResolver};
use super::{MAX_BYTE_ARRAY_LEN, NULL_LENGTH};
use crate::error::{read_error, Error, Result};
use std::io::Read;

/// Wire decoding for any byte source.
///
/// Running out of input in the middle of a value is reported as a decode
/// error. Values are only handed back once fully decoded.
pub trait WireRead: Read {
    /// Read a single byte.
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf).map_err(read_error)?;
        Ok(buf[0])
    }

    /// Read a boolean. Only `0` and `1` are accepted.
    fn read_bool(&mut self) -> Result<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::decode(format!("invalid boolean byte: {}", other))),
        }
    }

    /// Read a signed 16-bit integer.
    fn read_short(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf).map_err(read_error)?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Read a signed 32-bit integer.
    fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf).map_err(read_error)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a signed 64-bit integer.
    fn read_long(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf).map_err(read_error)?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Read a 32-bit float.
    fn read_float(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf).map_err(read_error)?;
        Ok(f32::from_be_bytes(buf))
    }

    /// Read a 64-bit float.
    fn read_double(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf).map_err(read_error)?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Read one length-prefixed utf frame.
    fn read_utf(&mut self) -> Result<String> {
        let mut len = [0u8; 2];
        self.read_exact(&mut len).map_err(read_error)?;
        let mut buf = vec![0u8; u16::from_be_bytes(len) as usize];
        self.read_exact(&mut buf).map_err(read_error)?;
        String::from_utf8(buf).map_err(|e| Error::decode(format!("invalid utf-8 in chunk: {}", e)))
    }

    /// Read an optional byte array.
    ///
    /// The declared length is never trusted for allocation: the body is read
    /// through a bounded reader and the call fails once input runs out.
    fn read_byte_array(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.read_int()?;
        if len == NULL_LENGTH {
            return Ok(None);
        }
        if len < 0 {
            return Err(Error::decode(format!("invalid byte array length: {}", len)));
        }

        let len = len as usize;
        if len > MAX_BYTE_ARRAY_LEN {
            return Err(Error::decode(format!(
                "byte array length {} exceeds limit {}",
                len, MAX_BYTE_ARRAY_LEN
            )));
        }

        let mut buf = Vec::with_capacity(len.min(64 * 1024));
        Read::take(&mut *self, len as u64)
            .read_to_end(&mut buf)
            .map_err(read_error)?;
        if buf.len() < len {
            return Err(Error::decode(format!(
                "truncated byte array: expected {} bytes, got {}",
                len,
                buf.len()
            )));
        }
        Ok(Some(buf))
    }

    /// Read an optional string written as a chunk sequence.
    fn read_string(&mut self) -> Result<Option<String>> {
        let mut result: Option<String> = None;
        while self.read_bool()? {
            let chunk = self.read_utf()?;
            result.get_or_insert_with(String::new).push_str(&chunk);
        }
        Ok(result)
    }

    /// Read an enum literal through a validated codec.
    fn read_enum<E: WireEnum>(&mut self, codec: &EnumCodec<E>) -> Result<Option<E>> {
        let byte = self.read_byte()?;
        codec.decode(byte)
    }

    /// Read an optional payload, resolving its type name with `resolver`
    /// first and [`DefaultResolver`] second.
    fn read_payload(&mut self, resolver: Option<&dyn PayloadResolver>) -> Result<Option<Payload>> {
        let type_name = self.read_string()?;
        let body = self.read_byte_array()?;

        let (type_name, body) = match (type_name, body) {
            (None, None) => return Ok(None),
            (Some(name), Some(body)) => (name, body),
            (Some(name), None) => {
                return Err(Error::decode(format!("payload {} has no body", name)));
            }
            (None, Some(_)) => return Err(Error::decode("payload body without type name")),
        };

        let kind = resolver
            .and_then(|r| r.resolve(&type_name))
            .or_else(|| DefaultResolver.resolve(&type_name))
            .ok_or_else(|| Error::decode(format!("unknown payload type: {}", type_name)))?;

        Payload::decode_body(kind, &body).map(Some)
    }
}

impl<R: Read + ?Sized> WireRead for R {}
