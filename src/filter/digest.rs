//! Digest filter for the writing side.
//!
//! Every byte written through the filter updates a running digest while the
//! digest is enabled. The digest is read and toggled through a shared
//! [`DigestHandle`], so a writer can switch digesting off, append the digest
//! as an integrity trailer, and switch it back on.

use super::{finish_delegate, InputStream, OutputStage, OutputStream, StreamFilter};
use crate::config::DigestAlgorithm;
use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
enum Hasher {
    Crc32(crc32fast::Hasher),
    HmacSha256(HmacSha256),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm, key: &[u8]) -> Result<Self> {
        match algorithm {
            DigestAlgorithm::None => {
                Err(Error::invalid_argument("digest filter requires a digest algorithm"))
            }
            DigestAlgorithm::Crc32 => Ok(Hasher::Crc32(crc32fast::Hasher::new())),
            DigestAlgorithm::HmacSha256 => HmacSha256::new_from_slice(key)
                .map(Hasher::HmacSha256)
                .map_err(|e| Error::configuration(format!("invalid HMAC key: {}", e))),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Crc32(h) => h.update(data),
            Hasher::HmacSha256(h) => h.update(data),
        }
    }

    fn finalize(&self) -> Vec<u8> {
        match self {
            Hasher::Crc32(h) => h.clone().finalize().to_be_bytes().to_vec(),
            Hasher::HmacSha256(h) => h.clone().finalize().into_bytes().to_vec(),
        }
    }
}

struct DigestState {
    enabled: bool,
    hasher: Hasher,
    initial: Hasher,
}

/// Shared access to the running digest of one output stream.
#[derive(Clone)]
pub struct DigestHandle {
    algorithm: DigestAlgorithm,
    state: Arc<Mutex<DigestState>>,
}

impl DigestHandle {
    fn new(algorithm: DigestAlgorithm, key: &[u8]) -> Result<Self> {
        let hasher = Hasher::new(algorithm, key)?;
        Ok(Self {
            algorithm,
            state: Arc::new(Mutex::new(DigestState {
                enabled: true,
                initial: hasher.clone(),
                hasher,
            })),
        })
    }

    /// The digest algorithm.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Switch digesting on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    /// Returns true if written bytes currently update the digest.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// The digest over everything written so far.
    pub fn digest(&self) -> Vec<u8> {
        self.state.lock().hasher.finalize()
    }

    /// Compare the current digest with `expected`.
    pub fn verify(&self, expected: &[u8]) -> bool {
        let state = self.state.lock();
        match &state.hasher {
            Hasher::HmacSha256(h) => h.clone().verify_slice(expected).is_ok(),
            other => other.finalize() == expected,
        }
    }

    /// Restart the digest from scratch.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.hasher = state.initial.clone();
    }

    fn update(&self, data: &[u8]) {
        let mut state = self.state.lock();
        if state.enabled {
            state.hasher.update(data);
        }
    }
}

impl fmt::Debug for DigestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestHandle")
            .field("algorithm", &self.algorithm)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Digests everything written through it.
///
/// The filter owns a single digest, so it should wrap one output stream.
/// The reading side is left untouched.
#[derive(Debug, Clone)]
pub struct DigestFilter {
    handle: DigestHandle,
}

impl DigestFilter {
    /// Create a filter computing `algorithm`, keyed with `key` where the
    /// algorithm takes one.
    pub fn new(algorithm: DigestAlgorithm, key: &[u8]) -> Result<Self> {
        Ok(Self { handle: DigestHandle::new(algorithm, key)? })
    }

    /// The handle to this filter's digest.
    pub fn handle(&self) -> DigestHandle {
        self.handle.clone()
    }
}

impl StreamFilter for DigestFilter {
    fn wrap_input(&self, input: InputStream) -> Result<InputStream> {
        Ok(input)
    }

    fn wrap_output(&self, output: OutputStream) -> Result<OutputStream> {
        Ok(Box::new(DigestWriter { inner: output, handle: self.handle.clone() }))
    }

    fn digest_handle(&self) -> Option<DigestHandle> {
        Some(self.handle.clone())
    }
}

struct DigestWriter {
    inner: OutputStream,
    handle: DigestHandle,
}

impl Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.handle.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl OutputStage for DigestWriter {
    fn finish(&mut self) -> io::Result<()> {
        finish_delegate(Ok(()), &mut self.inner)
    }
}
