//! Traits and types for audio transcoding

use crate::error::ConversionError;
use crate::types::TranscodeTarget;
use async_trait::async_trait;
use std::path::Path;

/// Encoder settings for one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Output format
    pub target: TranscodeTarget,
    /// FLAC compression level 0-12 (ignored by lossy targets)
    pub compression_level: u8,
}

impl TranscodeOptions {
    /// Options for `target` with the default FLAC compression level (8)
    pub fn new(target: TranscodeTarget) -> Self {
        Self {
            target,
            compression_level: 8,
        }
    }
}

/// Trait for converting an audio file into another format
///
/// Implementations can run an external binary or provide stub functionality
/// when no conversion is wanted.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `source` into `destination`
    ///
    /// The destination is overwritten if it exists. The source is never
    /// modified; deleting it afterwards is the caller's decision.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transcoder cannot be started
    /// - The transcoder exits unsuccessfully
    /// - The operation is not supported (for stub implementations)
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &TranscodeOptions,
    ) -> Result<(), ConversionError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
