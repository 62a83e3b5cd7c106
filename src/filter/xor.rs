//! Symmetric XOR obfuscation.
//!
//! Every byte is XORed with the key byte at a cyclic position. The
//! transform is its own inverse, so both sides of a channel apply the same
//! filter with the same key.

use super::{finish_delegate, InputStream, OutputStage, OutputStream, StreamFilter};
use crate::error::Result;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Obfuscates a stream with a repeating multi-byte key.
///
/// An empty key leaves streams untouched.
#[derive(Debug, Clone)]
pub struct XorFilter {
    key: Arc<[u8]>,
}

impl XorFilter {
    /// Create a filter for `key`.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into().into() }
    }

    /// The obfuscation key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl StreamFilter for XorFilter {
    fn wrap_input(&self, input: InputStream) -> Result<InputStream> {
        if self.key.is_empty() {
            return Ok(input);
        }
        Ok(Box::new(XorReader { inner: input, cipher: KeyCycle::new(self.key.clone()) }))
    }

    fn wrap_output(&self, output: OutputStream) -> Result<OutputStream> {
        if self.key.is_empty() {
            return Ok(output);
        }
        Ok(Box::new(XorWriter {
            inner: output,
            cipher: KeyCycle::new(self.key.clone()),
            scratch: Vec::new(),
        }))
    }
}

/// Cyclic position within the key.
struct KeyCycle {
    key: Arc<[u8]>,
    index: usize,
}

impl KeyCycle {
    fn new(key: Arc<[u8]>) -> Self {
        Self { key, index: 0 }
    }

    fn apply(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte ^= self.key[self.index];
            self.index = (self.index + 1) % self.key.len();
        }
    }
}

struct XorReader {
    inner: InputStream,
    cipher: KeyCycle,
}

impl Read for XorReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.cipher.apply(&mut buf[..n]);
        Ok(n)
    }
}

struct XorWriter {
    inner: OutputStream,
    cipher: KeyCycle,
    scratch: Vec<u8>,
}

impl Write for XorWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.cipher.apply(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl OutputStage for XorWriter {
    fn finish(&mut self) -> io::Result<()> {
        // nothing buffered here
        finish_delegate(Ok(()), &mut self.inner)
    }
}
