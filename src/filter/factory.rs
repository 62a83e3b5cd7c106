//! Builds filter chains from negotiated connection parameters.

use super::{CompressionFilter, DigestFilter, FilterChain, XorFilter};
use crate::config::{CompressionType, DigestAlgorithm, FilterOptions};
use crate::error::Result;

/// Turns negotiated [`FilterOptions`] into a filter chain.
pub trait FilterFactory: Send + Sync {
    /// Build the chain both peers wrap around the raw stream.
    fn create(&self, options: &FilterOptions) -> Result<FilterChain>;
}

/// The standard stage layout.
///
/// From the raw stream upwards: compression, obfuscation, digest. Data is
/// therefore digested before it is obfuscated and compressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilterFactory;

impl FilterFactory for DefaultFilterFactory {
    fn create(&self, options: &FilterOptions) -> Result<FilterChain> {
        options.validate()?;

        let mut chain = FilterChain::new();
        if options.compression != CompressionType::None {
            chain = chain.with(CompressionFilter::from_options(options));
        }
        if !options.obfuscation_key.is_empty() {
            chain = chain.with(XorFilter::new(options.obfuscation_key.clone()));
        }
        if options.digest != DigestAlgorithm::None {
            chain = chain.with(DigestFilter::new(options.digest, &options.digest_key)?);
        }

        log::info!(
            "Created filter chain: {} stages (compression={:?}, obfuscated={}, digest={:?})",
            chain.len(),
            options.compression,
            !options.obfuscation_key.is_empty(),
            options.digest
        );
        Ok(chain)
    }
}
