//! Conversion of fetched tracks
//!
//! Runs after a collection has been fetched. Each successfully fetched track is
//! handed to the [`Transcoder`]; a conversion failure marks only that track as
//! failed and leaves its original file in place.

use crate::config::ConversionConfig;
use crate::error::ConversionError;
use crate::transcode::{TranscodeOptions, Transcoder};
use crate::types::{CollectionResult, TrackResult, TrackStatus, TranscodeTarget};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Converts fetched tracks with a [`Transcoder`]
pub struct PostProcessor {
    transcoder: Arc<dyn Transcoder>,
    conversion: ConversionConfig,
}

impl PostProcessor {
    /// Create a post-processor
    pub fn new(transcoder: Arc<dyn Transcoder>, conversion: ConversionConfig) -> Self {
        Self {
            transcoder,
            conversion,
        }
    }

    /// Convert one track to `target`, returning the path of the converted file
    ///
    /// The converted file is written next to the source with the target's
    /// extension. An existing file at that path is reused without re-encoding.
    /// On success the source is deleted unless `keep_original` is set; on
    /// failure any partial output is removed and the source is left untouched.
    pub async fn convert(
        &self,
        track_path: &Path,
        target: TranscodeTarget,
    ) -> Result<PathBuf, ConversionError> {
        let destination = track_path.with_extension(target.extension());
        if destination == track_path {
            debug!(path = ?track_path, %target, "track already in target format");
            return Ok(destination);
        }

        if destination.exists() {
            info!(path = ?destination, "converted file already exists, skipping conversion");
            self.discard_original(track_path).await;
            return Ok(destination);
        }

        let options = TranscodeOptions {
            target,
            compression_level: self.conversion.compression_level,
        };

        debug!(
            source = ?track_path,
            ?destination,
            transcoder = self.transcoder.name(),
            "converting track"
        );

        match self
            .transcoder
            .convert(track_path, &destination, &options)
            .await
        {
            Ok(()) => {
                self.discard_original(track_path).await;
                Ok(destination)
            }
            Err(e) => {
                if destination.exists()
                    && let Err(remove_err) = tokio::fs::remove_file(&destination).await
                {
                    warn!(path = ?destination, error = %remove_err, "could not remove partial output");
                }
                Err(e)
            }
        }
    }

    /// Convert every fetched track of `collection`, calling `on_track` after each attempt
    ///
    /// Tracks that failed to fetch are left alone. Conversions run one after
    /// another in track order.
    pub async fn process_collection<F>(
        &self,
        collection: &mut CollectionResult,
        target: TranscodeTarget,
        mut on_track: F,
    ) where
        F: FnMut(&TrackResult),
    {
        for track in collection.tracks.iter_mut() {
            if track.status != TrackStatus::Ok {
                continue;
            }
            let Some(source) = track.source_path.clone() else {
                continue;
            };

            match self.convert(&source, target).await {
                Ok(converted) => {
                    info!(index = track.index, path = ?converted, "track converted");
                    track.source_path = Some(converted);
                    track.status = TrackStatus::Converted;
                }
                Err(e) => {
                    warn!(index = track.index, error = %e, "track conversion failed");
                    track.status = TrackStatus::Failed;
                    track.error_detail = Some(format!("conversion failed: {}", e));
                }
            }
            on_track(track);
        }
    }

    async fn discard_original(&self, original: &Path) {
        if self.conversion.keep_original {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(original).await {
            warn!(path = ?original, error = %e, "could not remove original after conversion");
        }
    }
}
