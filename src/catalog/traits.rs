//! Traits and types for catalog fetching

use crate::cookies::CookieFile;
use crate::error::{Result, TrackFetchError};
use crate::types::DownloadRequest;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One track as returned by the downloader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    /// Track title
    pub title: String,
    /// Fetcher-specific handle used by `fetch_track` (None for unavailable tracks)
    pub locator: Option<String>,
    /// Why the downloader could not provide this track
    pub failure: Option<String>,
}

impl ResolvedTrack {
    /// A track that can be fetched
    pub fn available(title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locator: Some(locator.into()),
            failure: None,
        }
    }

    /// A track the downloader reported as failed
    pub fn unavailable(title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locator: None,
            failure: Some(reason.into()),
        }
    }
}

/// A catalog URL resolved into its ordered tracks
#[derive(Debug)]
pub struct ResolvedCollection {
    /// Collection title (playlist or album name)
    pub title: String,
    /// Tracks in the order the downloader returned them
    pub tracks: Vec<ResolvedTrack>,
    /// Scratch space backing the locators; removed when the collection is dropped
    pub workspace: Option<tempfile::TempDir>,
}

impl ResolvedCollection {
    /// A collection without a scratch workspace
    pub fn new(title: impl Into<String>, tracks: Vec<ResolvedTrack>) -> Self {
        Self {
            title: title.into(),
            tracks,
            workspace: None,
        }
    }
}

/// Trait for turning catalog URLs into tracks on disk
///
/// # Examples
///
/// ```no_run
/// use catalog_dl::{CatalogFetcher, DownloadRequest, AudioFormat, locate_cookies};
/// use std::path::Path;
///
/// # async fn example(fetcher: &dyn CatalogFetcher) -> Result<(), Box<dyn std::error::Error>> {
/// let cookies = locate_cookies(Path::new("cookies.txt"), "music.apple.com")?;
/// let request = DownloadRequest::new(
///     "https://music.apple.com/us/album/example/123",
///     AudioFormat::AacLegacy,
///     None,
/// );
///
/// let collection = fetcher.resolve(&request, &cookies).await?;
/// for (i, track) in collection.tracks.iter().enumerate() {
///     let stem = format!("{:02} {}", i + 1, track.title);
///     fetcher.fetch_track(i as u32 + 1, track, Path::new("out"), &stem).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Resolve a catalog URL into its collection title and ordered tracks
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Resolution`] if the URL is not a catalog URL or
    /// the downloader produced no tracks for it.
    async fn resolve(
        &self,
        request: &DownloadRequest,
        cookies: &CookieFile,
    ) -> Result<ResolvedCollection>;

    /// Place one resolved track at `<folder>/<file_stem>.<ext>`
    ///
    /// `index` is the 1-based position of the track in its collection.
    /// Returns the path of the written file.
    async fn fetch_track(
        &self,
        index: u32,
        track: &ResolvedTrack,
        folder: &Path,
        file_stem: &str,
    ) -> std::result::Result<PathBuf, TrackFetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
