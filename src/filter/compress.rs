//! Compression filter.
//!
//! Deflate writes a zlib stream at the configured level, buffered in
//! block-sized writes. Snappy uses the framed stream format with the configured block size as
//! its write buffer. LZ4 uses the frame format with the configured block
//! size and compression level. Finishing the output side flushes the last
//! compressed block (and for deflate and LZ4 writes the end of the stream);
//! the input side needs no completion.

use super::{InputStream, OutputStream, StreamFilter};
use crate::config::{CompressionType, FilterOptions};
use crate::error::Result;

#[cfg(any(feature = "deflate", feature = "snappy", feature = "lz4-compression"))]
use super::{finish_delegate, OutputStage};
#[cfg(any(feature = "deflate", feature = "snappy", feature = "lz4-compression"))]
use std::io::{self, Write};

/// Compresses the writing side and decompresses the reading side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionFilter {
    compression: CompressionType,
    block_size: usize,
    level: u32,
}

impl CompressionFilter {
    /// Create a filter for `compression` with explicit block size and level.
    pub fn new(compression: CompressionType, block_size: usize, level: u32) -> Self {
        Self { compression, block_size: block_size.max(1), level }
    }

    /// Create a filter from negotiated options.
    pub fn from_options(options: &FilterOptions) -> Self {
        Self::new(options.compression, options.compression_block_size, options.compression_level)
    }

    /// The compression algorithm.
    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    /// The block size in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The compression level.
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl StreamFilter for CompressionFilter {
    fn wrap_input(&self, input: InputStream) -> Result<InputStream> {
        match self.compression {
            CompressionType::None => Ok(input),
            #[cfg(feature = "deflate")]
            CompressionType::Deflate => Ok(Box::new(flate2::read::ZlibDecoder::new(input))),
            #[cfg(feature = "snappy")]
            CompressionType::Snappy => Ok(Box::new(snap::read::FrameDecoder::new(input))),
            #[cfg(feature = "lz4-compression")]
            CompressionType::Lz4 => Ok(Box::new(lz4::Decoder::new(input)?)),
        }
    }

    fn wrap_output(&self, output: OutputStream) -> Result<OutputStream> {
        match self.compression {
            CompressionType::None => Ok(output),
            #[cfg(feature = "deflate")]
            CompressionType::Deflate => Ok(Box::new(DeflateOutput {
                writer: io::BufWriter::with_capacity(
                    self.block_size,
                    flate2::write::ZlibEncoder::new(output, flate2::Compression::new(self.level)),
                ),
            })),
            #[cfg(feature = "snappy")]
            CompressionType::Snappy => Ok(Box::new(SnappyOutput {
                writer: io::BufWriter::with_capacity(
                    self.block_size,
                    snap::write::FrameEncoder::new(output),
                ),
            })),
            #[cfg(feature = "lz4-compression")]
            CompressionType::Lz4 => {
                let encoder = lz4::EncoderBuilder::new()
                    .block_size(lz4_block_size(self.block_size))
                    .level(self.level)
                    .build(output)?;
                Ok(Box::new(Lz4Output { encoder: Some(encoder), finished: None }))
            }
        }
    }
}

#[cfg(feature = "deflate")]
struct DeflateOutput {
    writer: io::BufWriter<flate2::write::ZlibEncoder<OutputStream>>,
}

#[cfg(feature = "deflate")]
impl Write for DeflateOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(feature = "deflate")]
impl OutputStage for DeflateOutput {
    fn finish(&mut self) -> io::Result<()> {
        // try_finish is idempotent, so a second finish only re-finishes the delegate
        let own = self.writer.flush().and_then(|()| self.writer.get_mut().try_finish());
        finish_delegate(own, self.writer.get_mut().get_mut())
    }
}

#[cfg(feature = "snappy")]
struct SnappyOutput {
    writer: io::BufWriter<snap::write::FrameEncoder<OutputStream>>,
}

#[cfg(feature = "snappy")]
impl Write for SnappyOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(feature = "snappy")]
impl OutputStage for SnappyOutput {
    fn finish(&mut self) -> io::Result<()> {
        let own = self.writer.flush();
        finish_delegate(own, self.writer.get_mut().get_mut())
    }
}

#[cfg(feature = "lz4-compression")]
fn lz4_block_size(block_size: usize) -> lz4::BlockSize {
    match block_size {
        0..=0x1_0000 => lz4::BlockSize::Max64KB,
        0x1_0001..=0x4_0000 => lz4::BlockSize::Max256KB,
        0x4_0001..=0x10_0000 => lz4::BlockSize::Max1MB,
        _ => lz4::BlockSize::Max4MB,
    }
}

#[cfg(feature = "lz4-compression")]
struct Lz4Output {
    encoder: Option<lz4::Encoder<OutputStream>>,
    finished: Option<OutputStream>,
}

#[cfg(feature = "lz4-compression")]
impl Write for Lz4Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.write(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "lz4 stream already finished")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match (self.encoder.as_mut(), self.finished.as_mut()) {
            (Some(encoder), _) => encoder.flush(),
            (None, Some(inner)) => inner.flush(),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(feature = "lz4-compression")]
impl OutputStage for Lz4Output {
    fn finish(&mut self) -> io::Result<()> {
        match self.encoder.take() {
            Some(encoder) => {
                let (mut inner, own) = encoder.finish();
                let result = finish_delegate(own, &mut inner);
                self.finished = Some(inner);
                result
            }
            None => match self.finished.as_mut() {
                Some(inner) => inner.finish(),
                None => Ok(()),
            },
        }
    }
}
