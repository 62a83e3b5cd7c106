//! Configuration options for lexwire connections.
//!
//! [`FilterOptions`] carries the parameters two peers negotiate before they
//! start exchanging data: which compression to apply, the shared obfuscation
//! key, the digest algorithm and how strings are transmitted.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Negotiated stream and string-transmission parameters for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Compression algorithm applied beneath the codec.
    /// Default: CompressionType::Deflate
    pub compression: CompressionType,

    /// Compression block size (in bytes).
    /// Default: 64KB
    pub compression_block_size: usize,

    /// Compression level. Algorithms without levels only accept the default.
    /// Default: 4
    pub compression_level: u32,

    /// Shared obfuscation key. Empty disables obfuscation.
    /// Default: empty
    pub obfuscation_key: Vec<u8>,

    /// Digest computed over everything written.
    /// Default: DigestAlgorithm::None
    pub digest: DigestAlgorithm,

    /// Key for keyed digests.
    /// Default: empty
    pub digest_key: Vec<u8>,

    /// How strings are transmitted.
    /// Default: StringIoMode::Interning
    pub string_io: StringIoMode,
}

/// Compression level used when none is negotiated.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 4;

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            compression_block_size: 64 * 1024, // 64KB
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            obfuscation_key: Vec::new(),
            digest: DigestAlgorithm::None,
            digest_key: Vec::new(),
            string_io: StringIoMode::Interning,
        }
    }
}

/// Compression algorithms supported by the compression filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionType {
    /// No compression.
    None = 0,

    /// Zlib-framed deflate with a level from 0 to 9.
    #[cfg(feature = "deflate")]
    Deflate = 3,

    /// Snappy frame compression (fast, moderate compression ratio).
    #[cfg(feature = "snappy")]
    Snappy = 1,

    /// LZ4 frame compression with configurable block size and level.
    #[cfg(feature = "lz4-compression")]
    Lz4 = 2,
}

impl CompressionType {
    /// The levels this algorithm accepts, or `None` if it has no level.
    pub fn level_range(self) -> Option<RangeInclusive<u32>> {
        match self {
            CompressionType::None => None,
            #[cfg(feature = "deflate")]
            CompressionType::Deflate => Some(0..=9),
            #[cfg(feature = "snappy")]
            CompressionType::Snappy => None,
            #[cfg(feature = "lz4-compression")]
            CompressionType::Lz4 => Some(0..=16),
        }
    }
}

impl Default for CompressionType {
    fn default() -> Self {
        #[cfg(feature = "deflate")]
        return CompressionType::Deflate;

        #[cfg(all(not(feature = "deflate"), feature = "snappy"))]
        return CompressionType::Snappy;

        #[cfg(not(any(feature = "deflate", feature = "snappy")))]
        CompressionType::None
    }
}

/// Digest algorithms supported by the digest filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// No digest.
    #[default]
    None,
    /// Unkeyed CRC32 checksum.
    Crc32,
    /// HMAC-SHA256 keyed with `digest_key`.
    HmacSha256,
}

/// String transmission strategy for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StringIoMode {
    /// Every string is sent in full.
    Direct,
    /// Repeated strings are replaced by dictionary IDs.
    #[default]
    Interning,
}

impl FilterOptions {
    /// Creates a new FilterOptions with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON document, filling absent fields with defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let options: FilterOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Sets the compression algorithm.
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the compression block size.
    pub fn compression_block_size(mut self, size: usize) -> Self {
        self.compression_block_size = size;
        self
    }

    /// Sets the compression level.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the shared obfuscation key.
    pub fn obfuscation_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.obfuscation_key = key.into();
        self
    }

    /// Sets the digest algorithm and its key.
    pub fn digest(mut self, algorithm: DigestAlgorithm, key: impl Into<Vec<u8>>) -> Self {
        self.digest = algorithm;
        self.digest_key = key.into();
        self
    }

    /// Sets the string transmission mode.
    pub fn string_io(mut self, mode: StringIoMode) -> Self {
        self.string_io = mode;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.compression_block_size == 0 {
            return Err(crate::Error::invalid_argument("compression_block_size must be > 0"));
        }
        match self.compression.level_range() {
            Some(range) if !range.contains(&self.compression_level) => {
                return Err(crate::Error::invalid_argument(format!(
                    "compression_level for {:?} must be within {}..={}",
                    self.compression,
                    range.start(),
                    range.end()
                )));
            }
            None if self.compression_level != DEFAULT_COMPRESSION_LEVEL => {
                return Err(crate::Error::invalid_argument(format!(
                    "{:?} compression has no level; compression_level must stay {}",
                    self.compression, DEFAULT_COMPRESSION_LEVEL
                )));
            }
            _ => {}
        }
        if self.digest == DigestAlgorithm::HmacSha256 && self.digest_key.is_empty() {
            return Err(crate::Error::invalid_argument("HmacSha256 digest requires a digest_key"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = FilterOptions::default();
        assert_eq!(opts.compression, CompressionType::default());
        assert_eq!(opts.compression_block_size, 64 * 1024);
        assert!(opts.obfuscation_key.is_empty());
        assert_eq!(opts.digest, DigestAlgorithm::None);
        assert_eq!(opts.string_io, StringIoMode::Interning);
    }

    #[test]
    fn test_options_builder() {
        let opts = FilterOptions::new()
            .compression(CompressionType::None)
            .compression_block_size(8 * 1024)
            .obfuscation_key(b"secret".to_vec())
            .string_io(StringIoMode::Direct);

        assert_eq!(opts.compression, CompressionType::None);
        assert_eq!(opts.compression_block_size, 8 * 1024);
        assert_eq!(opts.obfuscation_key, b"secret");
        assert_eq!(opts.string_io, StringIoMode::Direct);
    }

    #[test]
    fn test_options_validation() {
        let mut opts = FilterOptions::default();
        assert!(opts.validate().is_ok());

        opts.compression_block_size = 0;
        assert!(opts.validate().is_err());

        opts.compression_block_size = 1024;
        opts.compression_level = 99;
        assert!(opts.validate().is_err());

        opts.compression_level = DEFAULT_COMPRESSION_LEVEL;
        opts.digest = DigestAlgorithm::HmacSha256;
        assert!(opts.validate().is_err());

        opts.digest_key = b"k".to_vec();
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_from_json() {
        let opts = FilterOptions::from_json(
            r#"{ "compression": "None", "obfuscation_key": [1, 2, 3], "digest": "Crc32" }"#,
        )
        .unwrap();
        assert_eq!(opts.compression, CompressionType::None);
        assert_eq!(opts.obfuscation_key, vec![1, 2, 3]);
        assert_eq!(opts.digest, DigestAlgorithm::Crc32);
        assert_eq!(opts.compression_level, 4);

        assert!(FilterOptions::from_json(r#"{ "compression_block_size": 0 }"#).is_err());
        assert!(FilterOptions::from_json("not json").is_err());
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_validate_level_per_algorithm() {
        let deflate = FilterOptions::new().compression(CompressionType::Deflate);
        assert!(deflate.clone().compression_level(9).validate().is_ok());
        assert!(deflate.clone().compression_level(0).validate().is_ok());
        assert!(deflate.compression_level(10).validate().is_err());

        let plain = FilterOptions::new().compression(CompressionType::None);
        assert!(plain.validate().is_ok());
        assert!(plain.compression_level(9).validate().is_err());
    }

    #[cfg(feature = "snappy")]
    #[test]
    fn test_snappy_rejects_explicit_level() {
        let opts = FilterOptions::new().compression(CompressionType::Snappy);
        assert!(opts.validate().is_ok());

        let err = opts.compression_level(16).validate().unwrap_err();
        assert!(matches!(err, crate::Error::InvalidArgument(_)));
    }
}
