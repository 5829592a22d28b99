//! End-to-end run over all requested URLs
//!
//! For each request, in command line order: fetch the collection through the
//! [`Orchestrator`], then convert its fetched tracks through the
//! [`PostProcessor`] when the request asks for a conversion. A URL that cannot
//! be resolved is recorded and the run moves on to the next one.

use crate::cookies::CookieFile;
use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;
use crate::postprocess::PostProcessor;
use crate::types::{CollectionResult, DownloadRequest, TrackStatus};
use crate::ui::Console;
use tracing::{info, warn};

/// Everything a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One entry per resolved URL, in request order
    pub collections: Vec<CollectionResult>,
    /// URLs that could not be resolved, with the reason
    pub resolution_failures: Vec<(String, String)>,
}

impl RunSummary {
    /// Number of tracks across all collections
    pub fn total_tracks(&self) -> usize {
        self.collections.iter().map(|c| c.tracks.len()).sum()
    }

    /// Number of tracks with `status` across all collections
    pub fn count(&self, status: TrackStatus) -> usize {
        self.collections.iter().map(|c| c.count(status)).sum()
    }

    /// Number of tracks that made it to disk, converted or not
    pub fn fetched_tracks(&self) -> usize {
        self.collections.iter().map(|c| c.fetched_count()).sum()
    }

    /// Process exit code for this run
    ///
    /// - 0 when at least one track made it to disk (partial failures and
    ///   failed conversions included)
    /// - 5 when no URL could be resolved
    /// - 1 when URLs resolved but no track could be fetched
    pub fn exit_code(&self) -> u8 {
        if self.collections.is_empty() {
            5
        } else if self.fetched_tracks() == 0 {
            1
        } else {
            0
        }
    }
}

/// Fetch then convert, for every request
pub struct Pipeline {
    orchestrator: Orchestrator,
    post_processor: PostProcessor,
    console: Console,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(orchestrator: Orchestrator, post_processor: PostProcessor, console: Console) -> Self {
        Self {
            orchestrator,
            post_processor,
            console,
        }
    }

    /// Run every request in order
    ///
    /// # Errors
    ///
    /// Resolution errors are recorded in the summary. Any other error (for
    /// example an output folder that cannot be created) aborts the run.
    pub async fn run(
        &self,
        requests: &[DownloadRequest],
        cookies: &CookieFile,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let console = self.console;

        for request in requests {
            console.info(&format!("Fetching {}", request.url));

            let fetched = self
                .orchestrator
                .fetch_with_progress(request, cookies, |track| {
                    println!("  {}", console.render_track(track));
                })
                .await;

            let mut collection = match fetched {
                Ok(collection) => collection,
                Err(Error::Resolution { url, reason }) => {
                    warn!(url = %url, reason = %reason, "could not resolve URL");
                    console.error(&format!("Could not resolve {}: {}", url, reason));
                    summary.resolution_failures.push((url, reason));
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(target) = request.convert {
                let pending = collection.count(TrackStatus::Ok);
                if pending > 0 {
                    console.info(&format!("Converting {} tracks to {}", pending, target));
                    let mut bar = console.progress_bar(pending, "Converting");
                    self.post_processor
                        .process_collection(&mut collection, target, |_| console.advance(&mut bar))
                        .await;
                    console.finish(bar);
                }
            }

            info!(
                collection = %collection.collection_name,
                ok = collection.count(TrackStatus::Ok),
                failed = collection.count(TrackStatus::Failed),
                converted = collection.count(TrackStatus::Converted),
                "collection finished"
            );
            summary.collections.push(collection);
        }

        Ok(summary)
    }
}
