//! Persistent sorted index of fixed-width records.
//!
//! ## File Format
//!
//! ```text
//! [Record 0: key | value]
//! [Record 1: key | value]
//! ...
//! [Record N-1: key | value]
//! ```
//!
//! There is no header: records are stored in strictly ascending key order
//! and the record count is the file length divided by the record size.
//! Keys and values are encoded with the wire codec and must have a fixed
//! encoded width, described by [`FixedWidth`].

pub mod cached;
pub mod sorted;

pub use cached::{CacheStats, CachingIndex};
pub use sorted::{Entries, SortedFileIndex};

use crate::codec::{WireRead, WireWrite};
use crate::error::Result;
use std::io::{Read, Write};

/// A key-value store with overwrite-on-put semantics.
pub trait KeyValueStore<K, V> {
    /// Look up the value stored for `key`.
    fn get(&mut self, key: &K) -> Result<Option<V>>;

    /// Store `value` under `key`, returning the value it replaced.
    fn put(&mut self, key: K, value: V) -> Result<Option<V>>;
}

/// A type with a fixed-width wire encoding.
pub trait FixedWidth: Sized {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Write exactly [`WIDTH`](Self::WIDTH) bytes.
    fn write_to(&self, out: &mut dyn Write) -> Result<()>;

    /// Read exactly [`WIDTH`](Self::WIDTH) bytes.
    fn read_from(input: &mut dyn Read) -> Result<Self>;
}

impl FixedWidth for i32 {
    const WIDTH: usize = 4;

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        out.write_int(*self)
    }

    fn read_from(input: &mut dyn Read) -> Result<Self> {
        input.read_int()
    }
}

impl FixedWidth for u32 {
    const WIDTH: usize = 4;

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        out.write_int(*self as i32)
    }

    fn read_from(input: &mut dyn Read) -> Result<Self> {
        input.read_int().map(|v| v as u32)
    }
}

impl FixedWidth for i64 {
    const WIDTH: usize = 8;

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        out.write_long(*self)
    }

    fn read_from(input: &mut dyn Read) -> Result<Self> {
        input.read_long()
    }
}

impl FixedWidth for u64 {
    const WIDTH: usize = 8;

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        out.write_long(*self as i64)
    }

    fn read_from(input: &mut dyn Read) -> Result<Self> {
        input.read_long().map(|v| v as u64)
    }
}

/// A fixed-width byte string, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedBytes<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedBytes<N> {
    /// Build from a slice, zero-padding or truncating to `N` bytes.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; N];
        let len = data.len().min(N);
        bytes[..len].copy_from_slice(&data[..len]);
        Self(bytes)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> FixedWidth for FixedBytes<N> {
    const WIDTH: usize = N;

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.0)?;
        Ok(())
    }

    fn read_from(input: &mut dyn Read) -> Result<Self> {
        let mut bytes = [0u8; N];
        input.read_exact(&mut bytes).map_err(crate::error::read_error)?;
        Ok(Self(bytes))
    }
}
