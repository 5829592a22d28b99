//! Per-collection fetch orchestration
//!
//! For one catalog URL the orchestrator asks the [`CatalogFetcher`] to resolve
//! the collection, then folds over the resolved tracks in order, fetching each
//! into the collection folder and recording its outcome. A failed track is
//! recorded and the fold moves on; there are no retries beyond the
//! downloader's own.
//!
//! The collection folder is created lazily, right before the first track is
//! placed, under a name that does not collide with an existing folder.

use crate::catalog::{CatalogFetcher, ResolvedTrack};
use crate::config::Config;
use crate::cookies::CookieFile;
use crate::error::{Error, Result};
use crate::types::{CollectionResult, DownloadRequest, TrackResult};
use crate::utils::{sanitize_component, track_file_stem, unique_dir};
use futures::stream::{self, TryStreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Fetches collections through a [`CatalogFetcher`]
pub struct Orchestrator {
    config: Arc<Config>,
    fetcher: Arc<dyn CatalogFetcher>,
}

/// Accumulator threaded through the track fold
struct FoldState<F> {
    folder: Option<PathBuf>,
    tracks: Vec<TrackResult>,
    on_track: F,
}

impl Orchestrator {
    /// Create an orchestrator writing under `config.output_root`
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Resolve `request` and fetch every track of the collection
    ///
    /// # Errors
    ///
    /// - [`Error::Resolution`] if the URL cannot be resolved
    /// - [`Error::Io`] if the collection folder cannot be created
    ///
    /// Per-track failures are not errors; they are recorded in the result.
    pub async fn fetch(
        &self,
        request: &DownloadRequest,
        cookies: &CookieFile,
    ) -> Result<CollectionResult> {
        self.fetch_with_progress(request, cookies, |_| {}).await
    }

    /// Like [`fetch`](Self::fetch), calling `on_track` after each track
    pub async fn fetch_with_progress<F>(
        &self,
        request: &DownloadRequest,
        cookies: &CookieFile,
        on_track: F,
    ) -> Result<CollectionResult>
    where
        F: FnMut(&TrackResult),
    {
        let collection = self.fetcher.resolve(request, cookies).await?;
        info!(
            url = %request.url,
            collection = %collection.title,
            tracks = collection.tracks.len(),
            fetcher = self.fetcher.name(),
            "collection resolved"
        );

        let folder_candidate = self
            .config
            .output_root
            .join(sanitize_component(&collection.title));

        let init = FoldState {
            folder: None,
            tracks: Vec::with_capacity(collection.tracks.len()),
            on_track,
        };

        let state = stream::iter(
            collection
                .tracks
                .iter()
                .enumerate()
                .map(|(i, track)| Ok::<_, Error>((i as u32 + 1, track))),
        )
        .try_fold(init, |mut state, (index, track)| {
            let folder_candidate = &folder_candidate;
            async move {
                let result = self
                    .fetch_one(index, track, &mut state.folder, folder_candidate)
                    .await?;
                (state.on_track)(&result);
                state.tracks.push(result);
                Ok(state)
            }
        })
        .await?;

        Ok(CollectionResult {
            collection_name: collection.title.clone(),
            output_folder: state.folder,
            tracks: state.tracks,
        })
    }

    async fn fetch_one(
        &self,
        index: u32,
        track: &ResolvedTrack,
        folder: &mut Option<PathBuf>,
        folder_candidate: &Path,
    ) -> Result<TrackResult> {
        if let Some(reason) = &track.failure {
            warn!(index, title = %track.title, reason = %reason, "track unavailable");
            return Ok(TrackResult::failed(index, &track.title, reason));
        }

        let (target, created_now) = match folder {
            Some(existing) => (existing.clone(), false),
            None => {
                let fresh = unique_dir(folder_candidate)?;
                tokio::fs::create_dir_all(&fresh).await?;
                info!(folder = ?fresh, "created collection folder");
                (fresh, true)
            }
        };

        let stem = track_file_stem(index, &track.title);
        match self.fetcher.fetch_track(index, track, &target, &stem).await {
            Ok(path) => {
                info!(index, title = %track.title, ?path, "track fetched");
                *folder = Some(target);
                Ok(TrackResult::fetched(index, &track.title, path))
            }
            Err(e) => {
                warn!(index, title = %track.title, reason = %e.reason, "track fetch failed");
                if created_now {
                    // Nothing was written yet; keep the folder for the first success only
                    if let Err(remove_err) = tokio::fs::remove_dir(&target).await {
                        warn!(folder = ?target, error = %remove_err, "could not remove empty folder");
                    }
                }
                Ok(TrackResult::failed(index, &track.title, e.reason))
            }
        }
    }
}
