// Stream Filter Tests for lexwire
// These tests verify filter chains end to end over a shared in-memory channel

use anyhow::Result;
use lexwire::codec::{WireRead, WireWrite};
use lexwire::filter::{
    CompressionFilter, DefaultFilterFactory, DigestFilter, FilterChain, FilterFactory, OutputStage,
    XorFilter,
};
use lexwire::{CompressionType, DigestAlgorithm, FilterOptions, StreamFilter};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

/// In-memory channel shared between the writing and reading side.
#[derive(Clone, Default)]
struct Channel(Arc<Mutex<Vec<u8>>>);

impl Channel {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for Channel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn round_trip(chain: &FilterChain, data: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let channel = Channel::default();
    let mut out = chain.wrap_output_raw(channel.clone())?;
    out.write_all(data)?;
    out.finish()?;

    let raw = channel.contents();
    let mut input = chain.wrap_input_raw(Cursor::new(raw.clone()))?;
    let mut read = Vec::new();
    input.read_to_end(&mut read)?;
    Ok((raw, read))
}

/// Test obfuscate-then-compress for empty, single byte and large payloads
#[test]
fn test_obfuscate_compress_round_trip() -> Result<()> {
    let chain = FilterChain::new()
        .with(CompressionFilter::new(CompressionType::default(), 64 * 1024, 4))
        .with(XorFilter::new(b"terminology".to_vec()));

    for size in [0, 1, 10000] {
        let data = pattern(size);
        let (_, read) = round_trip(&chain, &data)?;
        assert_eq!(read, data, "size {}", size);
    }
    Ok(())
}

/// Test that obfuscation actually changes the bytes on the channel
#[test]
fn test_obfuscation_hides_plaintext() -> Result<()> {
    let chain = FilterChain::new().with(XorFilter::new(vec![0x5A, 0xA5, 0x0F]));
    let data = b"SELECT conceptId FROM concepts".to_vec();
    let (raw, read) = round_trip(&chain, &data)?;
    assert_eq!(raw.len(), data.len());
    assert_ne!(raw, data);
    assert_eq!(read, data);
    Ok(())
}

/// Test that repetitive data shrinks on the channel when compressed
#[cfg(feature = "snappy")]
#[test]
fn test_compression_shrinks_repetitive_data() -> Result<()> {
    let chain = FilterChain::new().with(CompressionFilter::new(CompressionType::Snappy, 4096, 4));
    let data = b"concept ".repeat(5000);
    let (raw, read) = round_trip(&chain, &data)?;
    assert!(raw.len() < data.len() / 4);
    assert_eq!(read, data);
    Ok(())
}

/// Test that the negotiated level reaches the default deflate stage
#[cfg(feature = "deflate")]
#[test]
fn test_deflate_level_from_options() -> Result<()> {
    let data: Vec<u8> = (0..20_000u32)
        .flat_map(|i| format!("{}|{} ", i % 977, (i * 7919) % 1543).into_bytes())
        .collect();
    let mut sizes = Vec::new();
    for level in [1, 9] {
        let options = FilterOptions::new().compression_level(level);
        assert_eq!(options.compression, CompressionType::Deflate);
        let chain = DefaultFilterFactory.create(&options)?;
        let (raw, read) = round_trip(&chain, &data)?;
        assert_eq!(read, data);
        sizes.push(raw.len());
    }
    assert!(sizes[1] < sizes[0], "level 9 {} vs level 1 {}", sizes[1], sizes[0]);
    Ok(())
}

/// Test that a level is refused for an algorithm that cannot use it
#[cfg(feature = "snappy")]
#[test]
fn test_factory_rejects_snappy_level() {
    let options = FilterOptions::new().compression(CompressionType::Snappy).compression_level(16);
    assert!(DefaultFilterFactory.create(&options).is_err());
}

/// Test LZ4 with explicit block size and level
#[cfg(feature = "lz4-compression")]
#[test]
fn test_lz4_round_trip() -> Result<()> {
    let chain = FilterChain::new().with(CompressionFilter::new(CompressionType::Lz4, 64 * 1024, 9));
    let data = pattern(100_000);
    let (_, read) = round_trip(&chain, &data)?;
    assert_eq!(read, data);
    Ok(())
}

/// Test the codec on top of a chain built from negotiated options
#[test]
fn test_codec_over_factory_chain() -> Result<()> {
    let options = FilterOptions::from_json(
        r#"{ "obfuscation_key": [1, 2, 3, 4], "compression_block_size": 8192 }"#,
    )?;
    let chain = DefaultFilterFactory.create(&options)?;

    let channel = Channel::default();
    let text = "Body structure ".repeat(2000);
    let mut out = chain.wrap_output_raw(channel.clone())?;
    out.write_string(Some(text.as_str()))?;
    out.write_byte_array(None)?;
    out.write_long(-1)?;
    out.finish()?;

    let mut input = chain.wrap_input_raw(Cursor::new(channel.contents()))?;
    assert_eq!(input.read_string()?, Some(text));
    assert_eq!(input.read_byte_array()?, None);
    assert_eq!(input.read_long()?, -1);
    Ok(())
}

/// Test a digest trailer appended with digesting switched off
#[test]
fn test_digest_trailer() -> Result<()> {
    let options = FilterOptions::new()
        .compression(CompressionType::None)
        .digest(DigestAlgorithm::HmacSha256, b"session-key".to_vec());
    let chain = DefaultFilterFactory.create(&options)?;
    let handle = chain
        .digest_handle()
        .ok_or_else(|| anyhow::anyhow!("chain has no digest stage"))?;

    let channel = Channel::default();
    let mut out = chain.wrap_output_raw(channel.clone())?;
    out.write_string(Some("message body"))?;
    handle.set_enabled(false);
    let trailer = handle.digest();
    out.write_byte_array(Some(trailer.as_slice()))?;
    handle.set_enabled(true);
    out.finish()?;

    // the receiver recomputes the digest over the body only
    let verifier = DigestFilter::new(DigestAlgorithm::HmacSha256, b"session-key")?;
    let check = FilterChain::new().with(verifier.clone());
    let mut sink = check.wrap_output_raw(io::sink())?;

    let mut input = Cursor::new(channel.contents());
    let body = input.read_string()?;
    sink.write_string(body.as_deref())?;
    sink.finish()?;

    let received = input.read_byte_array()?.unwrap_or_default();
    assert!(verifier.handle().verify(&received));
    assert!(!verifier.handle().verify(b"forged"));
    Ok(())
}

/// Test that finishing the chain flushes every buffered byte
#[test]
fn test_finish_flushes_everything() -> Result<()> {
    let options = FilterOptions::new().obfuscation_key(b"k".to_vec());
    let chain = DefaultFilterFactory.create(&options)?;
    let channel = Channel::default();

    let mut out = chain.wrap_output_raw(channel.clone())?;
    out.write_all(&pattern(300_000))?;
    out.finish()?;
    let written = channel.contents().len();
    assert!(written > 0);

    let mut input = chain.wrap_input_raw(Cursor::new(channel.contents()))?;
    let mut read = Vec::new();
    input.read_to_end(&mut read)?;
    assert_eq!(read, pattern(300_000));
    Ok(())
}
