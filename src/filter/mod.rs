//! Reversible stream filters.
//!
//! A [`StreamFilter`] decorates a raw byte channel on both ends: it wraps the
//! writing side with one transform and the reading side with its inverse.
//! Filters compose into a [`FilterChain`]. Wrapping applies the stages in
//! order, so stage 0 sits directly on the raw stream and every later stage
//! treats the stages below it as its delegate:
//!
//! ```text
//! write: codec -> stage N -> ... -> stage 0 -> raw sink
//! read:  codec <- stage N <- ... <- stage 0 <- raw source
//! ```
//!
//! The output side of every stage is an [`OutputStage`], whose `finish`
//! completes the stage (flushing buffered blocks, writing trailers) and then
//! finishes the stage beneath it. If the stage's own completion fails, the
//! delegate is still finished but the stage's own error is the one reported.

pub mod compress;
pub mod digest;
pub mod factory;
pub mod xor;

pub use compress::CompressionFilter;
pub use digest::{DigestFilter, DigestHandle};
pub use factory::{DefaultFilterFactory, FilterFactory};
pub use xor::XorFilter;

use crate::error::Result;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Boxed reading side of a filtered stream.
pub type InputStream = Box<dyn Read + Send>;

/// Boxed writing side of a filtered stream.
pub type OutputStream = Box<dyn OutputStage>;

/// The writing side of one filter stage.
pub trait OutputStage: Write + Send {
    /// Complete this stage, then finish every stage beneath it.
    fn finish(&mut self) -> io::Result<()>;
}

impl<S: OutputStage + ?Sized> OutputStage for Box<S> {
    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// A reversible transform applied to both sides of a byte channel.
pub trait StreamFilter: Send + Sync + fmt::Debug {
    /// Wrap the reading side.
    fn wrap_input(&self, input: InputStream) -> Result<InputStream>;

    /// Wrap the writing side.
    fn wrap_output(&self, output: OutputStream) -> Result<OutputStream>;

    /// The digest handle of this filter, if it computes one.
    fn digest_handle(&self) -> Option<DigestHandle> {
        None
    }
}

/// Adapts a plain writer into the bottom stage of a chain.
///
/// Finishing a raw stage flushes the writer.
pub struct RawOutput<W> {
    inner: W,
}

impl<W: Write + Send> RawOutput<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> Write for RawOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> OutputStage for RawOutput<W> {
    fn finish(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Finish `delegate` after a stage has completed its own work.
///
/// The delegate always runs; the stage's own failure takes precedence.
pub(crate) fn finish_delegate(own: io::Result<()>, delegate: &mut dyn OutputStage) -> io::Result<()> {
    let delegated = delegate.finish();
    own.and(delegated)
}

/// An ordered composition of stream filters.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    stages: Vec<Arc<dyn StreamFilter>>,
}

impl FilterChain {
    /// Create an empty chain, which passes data through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `filter` on top of the current stages.
    pub fn with(mut self, filter: impl StreamFilter + 'static) -> Self {
        self.stages.push(Arc::new(filter));
        self
    }

    /// Add a shared filter on top of the current stages.
    pub fn push(&mut self, filter: Arc<dyn StreamFilter>) {
        self.stages.push(filter);
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Wrap any reader with every stage of the chain.
    pub fn wrap_input_raw<R: Read + Send + 'static>(&self, input: R) -> Result<InputStream> {
        self.wrap_input(Box::new(input))
    }

    /// Wrap any writer with every stage of the chain.
    pub fn wrap_output_raw<W: Write + Send + 'static>(&self, output: W) -> Result<OutputStream> {
        self.wrap_output(Box::new(RawOutput::new(output)))
    }
}

impl StreamFilter for FilterChain {
    fn wrap_input(&self, input: InputStream) -> Result<InputStream> {
        self.stages.iter().try_fold(input, |stream, stage| stage.wrap_input(stream))
    }

    fn wrap_output(&self, output: OutputStream) -> Result<OutputStream> {
        self.stages.iter().try_fold(output, |stream, stage| stage.wrap_output(stream))
    }

    fn digest_handle(&self) -> Option<DigestHandle> {
        self.stages.iter().find_map(|stage| stage.digest_handle())
    }
}
