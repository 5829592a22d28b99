//! No-op transcoder for runs without conversion

use super::traits::{TranscodeOptions, Transcoder};
use crate::error::ConversionError;
use async_trait::async_trait;
use std::path::Path;

/// Transcoder used when no conversion was requested or no binary is available
///
/// Every conversion returns [`ConversionError::Unsupported`].
///
/// ```
/// use catalog_dl::transcode::{NoOpTranscoder, TranscodeOptions, Transcoder};
/// use catalog_dl::TranscodeTarget;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let result = NoOpTranscoder
///     .convert(
///         Path::new("a.m4a"),
///         Path::new("a.flac"),
///         &TranscodeOptions::new(TranscodeTarget::Flac),
///     )
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpTranscoder;

#[async_trait]
impl Transcoder for NoOpTranscoder {
    async fn convert(
        &self,
        _source: &Path,
        _destination: &Path,
        options: &TranscodeOptions,
    ) -> Result<(), ConversionError> {
        Err(ConversionError::Unsupported(format!(
            "{} conversion requires the external ffmpeg binary. \
             Configure tools.ffmpeg_path or ensure ffmpeg is in PATH.",
            options.target
        )))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
