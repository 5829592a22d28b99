//! Core types for catalog-dl

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio format requested from the downloader
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AudioFormat {
    /// AAC 256 kbps (most compatible)
    #[default]
    AacLegacy,
    /// AAC-HE 64 kbps (smaller files)
    AacHeLegacy,
    /// Apple Lossless (requires a wrapper setup on the downloader side)
    Alac,
}

impl AudioFormat {
    /// Codec name understood by the downloader's `--song-codec` option
    pub fn codec_name(&self) -> &'static str {
        match self {
            AudioFormat::AacLegacy => "aac-legacy",
            AudioFormat::AacHeLegacy => "aac-he-legacy",
            AudioFormat::Alac => "alac",
        }
    }

    /// Short description for the settings panel
    pub fn description(&self) -> &'static str {
        match self {
            AudioFormat::AacLegacy => "AAC 256kbps",
            AudioFormat::AacHeLegacy => "AAC-HE 64kbps",
            AudioFormat::Alac => "Apple Lossless",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codec_name())
    }
}

/// Format fetched tracks are converted to
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TranscodeTarget {
    /// FLAC (lossless container)
    #[default]
    Flac,
    /// MP3 320 kbps
    Mp3,
    /// Opus 192 kbps
    Opus,
}

impl TranscodeTarget {
    /// File extension of converted files
    pub fn extension(&self) -> &'static str {
        match self {
            TranscodeTarget::Flac => "flac",
            TranscodeTarget::Mp3 => "mp3",
            TranscodeTarget::Opus => "opus",
        }
    }
}

impl std::fmt::Display for TranscodeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TranscodeTarget::Flac => "FLAC",
            TranscodeTarget::Mp3 => "MP3",
            TranscodeTarget::Opus => "Opus",
        })
    }
}

/// How lyrics are delivered by the downloader
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LyricsMode {
    /// Lyrics embedded in the audio file tags only
    #[default]
    Embedded,
    /// Separate synced `.lrc` file next to each track
    Lrc,
    /// No lyrics at all
    None,
}

/// One catalog URL to fetch, immutable once parsed from the command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Playlist, album, song or artist URL
    pub url: String,
    /// Audio format requested from the downloader
    pub format: AudioFormat,
    /// Conversion applied after fetching (`Some(Flac)` for `--flac`)
    pub convert: Option<TranscodeTarget>,
}

impl DownloadRequest {
    /// Create a request for `url`
    pub fn new(url: impl Into<String>, format: AudioFormat, convert: Option<TranscodeTarget>) -> Self {
        Self {
            url: url.into(),
            format,
            convert,
        }
    }
}

/// Per-track outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    /// Fetched, not converted
    Ok,
    /// Fetch or conversion failed
    Failed,
    /// Fetched and converted
    Converted,
}

/// Outcome for one track of a collection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackResult {
    /// 1-based position in resolution order (the on-disk `NN` prefix)
    pub index: u32,
    /// Track title as resolved
    pub title: String,
    /// File on disk, if any (the original when a conversion failed)
    pub source_path: Option<PathBuf>,
    /// Outcome
    pub status: TrackStatus,
    /// Why the track failed
    pub error_detail: Option<String>,
}

impl TrackResult {
    /// A fetched track
    pub fn fetched(index: u32, title: impl Into<String>, path: PathBuf) -> Self {
        Self {
            index,
            title: title.into(),
            source_path: Some(path),
            status: TrackStatus::Ok,
            error_detail: None,
        }
    }

    /// A track that could not be fetched
    pub fn failed(index: u32, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            source_path: None,
            status: TrackStatus::Failed,
            error_detail: Some(detail.into()),
        }
    }
}

/// Outcome for one resolved catalog URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionResult {
    /// Collection title as resolved by the downloader
    pub collection_name: String,
    /// Folder the tracks were written to; `None` until the first track succeeded
    pub output_folder: Option<PathBuf>,
    /// One entry per resolved track, in resolution order
    pub tracks: Vec<TrackResult>,
}

impl CollectionResult {
    /// Number of tracks with the given status
    pub fn count(&self, status: TrackStatus) -> usize {
        self.tracks.iter().filter(|t| t.status == status).count()
    }

    /// Number of tracks that reached the collection folder
    ///
    /// A track whose conversion failed still counts: its fetched file stays
    /// on disk.
    pub fn fetched_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.source_path.is_some()).count()
    }

    /// Tracks that failed to fetch or convert
    pub fn failures(&self) -> impl Iterator<Item = &TrackResult> {
        self.tracks
            .iter()
            .filter(|t| t.status == TrackStatus::Failed)
    }
}
