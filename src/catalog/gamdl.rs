//! Catalog fetcher backed by the external `gamdl` downloader
//!
//! `gamdl` has no resolve-only mode, so a URL is resolved by running the
//! downloader once into a staging directory under the output root. The staged
//! files become the resolved tracks, and per-track failures are recovered from
//! the downloader's console output. `fetch_track` then moves each staged file
//! to its final name in the collection folder.

use super::output::DownloaderReport;
use super::traits::{CatalogFetcher, ResolvedCollection, ResolvedTrack};
use crate::config::Config;
use crate::cookies::CookieFile;
use crate::deps::DownloaderCommand;
use crate::error::{Error, Result, TrackFetchError};
use crate::types::{DownloadRequest, LyricsMode};
use crate::utils;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::SystemTime;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

/// Extensions of audio files the downloader produces
const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp4", "aac", "flac", "mp3", "opus"];

/// Prefix of staging directories created under the output root
const STAGING_PREFIX: &str = ".staging-";

/// Playlist layout: one folder named after the playlist, files prefixed with
/// their playlist position
const PLAYLIST_FILE_TEMPLATE: &str = "{playlist_title}/{track:02d} {title}";

// Leading "07 " or "1-07 " (disc-track) from the downloader's file name templates
#[allow(clippy::expect_used)]
static LEADING_TRACK_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)-)?(\d+)[\s._-]+").expect("valid regex"));

/// Fetcher that runs `gamdl` (or `python -m gamdl`)
pub struct GamdlFetcher {
    downloader: DownloaderCommand,
    output_root: PathBuf,
    catalog_host: String,
    lyrics: LyricsMode,
}

/// A file the downloader left in the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
struct StagedFile {
    path: PathBuf,
    title: String,
}

impl GamdlFetcher {
    /// Create a fetcher that stages under `config.output_root`
    pub fn new(downloader: DownloaderCommand, config: &Config) -> Self {
        Self {
            downloader,
            output_root: config.output_root.clone(),
            catalog_host: config.catalog_host.clone(),
            lyrics: config.lyrics,
        }
    }

    /// Check that `url` points at the catalog
    ///
    /// Accepts http(s) URLs whose host is the catalog host or its `www.`
    /// alias and whose path is not empty.
    pub fn validate_url(&self, url: &str) -> Result<Url> {
        let invalid = |reason: &str| Error::Resolution {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url.trim()).map_err(|e| invalid(&format!("not a URL ({})", e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("only http and https URLs are supported"));
        }

        let host = parsed.host_str().unwrap_or_default();
        let www = format!("www.{}", self.catalog_host);
        if !host.eq_ignore_ascii_case(&self.catalog_host) && !host.eq_ignore_ascii_case(&www) {
            return Err(invalid(&format!(
                "not a {} URL (host is {:?})",
                self.catalog_host, host
            )));
        }

        if parsed.path().trim_matches('/').is_empty() {
            return Err(invalid("URL does not point at a playlist, album or song"));
        }

        Ok(parsed)
    }

    fn downloader_args(
        &self,
        request: &DownloadRequest,
        cookies: &CookieFile,
        staging: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--cookies-path".into(),
            cookies.path.clone().into_os_string(),
            "--output-path".into(),
            staging.as_os_str().to_owned(),
            "--song-codec".into(),
            request.format.codec_name().into(),
            "--playlist-file-template".into(),
            PLAYLIST_FILE_TEMPLATE.into(),
        ];
        match self.lyrics {
            LyricsMode::Embedded => args.push("--no-synced-lyrics".into()),
            LyricsMode::Lrc => {}
            LyricsMode::None => {
                args.push("--no-synced-lyrics".into());
                args.push("--exclude-tags".into());
                args.push("lyrics".into());
            }
        }
        args.push(request.url.trim().into());
        args
    }
}

#[async_trait]
impl CatalogFetcher for GamdlFetcher {
    async fn resolve(
        &self,
        request: &DownloadRequest,
        cookies: &CookieFile,
    ) -> Result<ResolvedCollection> {
        let url = self.validate_url(&request.url)?;

        tokio::fs::create_dir_all(&self.output_root).await?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.output_root)?;

        let args = self.downloader_args(request, cookies, staging.path());
        info!(
            url = %url,
            format = %request.format,
            downloader = %self.downloader.describe(),
            "running downloader"
        );

        let mut child = self
            .downloader
            .command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Resolution {
                url: request.url.clone(),
                reason: format!("failed to execute downloader: {}", e),
            })?;

        // Both pipes are drained together so neither can fill up and stall the child
        let (stdout_lines, stderr_lines) = tokio::join!(
            collect_lines(child.stdout.take(), "stdout"),
            collect_lines(child.stderr.take(), "stderr"),
        );
        let status = child.wait().await?;

        let report = DownloaderReport::parse(
            stdout_lines
                .iter()
                .chain(stderr_lines.iter())
                .map(String::as_str),
        );
        let staged = discover_staged(staging.path());
        let tracks = assemble_tracks(staged.clone(), &report);

        debug!(
            %status,
            staged = staged.len(),
            reported_total = ?report.total,
            reported_failures = report.failures.len(),
            "downloader finished"
        );

        if tracks.is_empty() {
            return Err(Error::Resolution {
                url: request.url.clone(),
                reason: empty_resolution_reason(status, &report),
            });
        }
        if !status.success() {
            warn!(url = %url, %status, "downloader exited unsuccessfully, keeping the tracks it produced");
        }

        let title = common_folder_name(staging.path(), &staged)
            .unwrap_or_else(|| url_slug(&url));

        Ok(ResolvedCollection {
            title,
            tracks,
            workspace: Some(staging),
        })
    }

    async fn fetch_track(
        &self,
        index: u32,
        track: &ResolvedTrack,
        folder: &Path,
        file_stem: &str,
    ) -> std::result::Result<PathBuf, TrackFetchError> {
        let fail = |reason: String| TrackFetchError {
            index,
            title: track.title.clone(),
            reason,
        };

        if let Some(reason) = &track.failure {
            return Err(fail(reason.clone()));
        }
        let source = track
            .locator
            .as_deref()
            .map(PathBuf::from)
            .ok_or_else(|| fail("downloader produced no file".to_string()))?;

        let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("m4a");
        let destination = utils::unique_file_path(&folder.join(format!("{}.{}", file_stem, extension)))
            .map_err(|e| fail(e.to_string()))?;

        utils::move_file(&source, &destination)
            .await
            .map_err(|e| fail(format!("cannot move {}: {}", source.display(), e)))?;

        let lyrics = source.with_extension("lrc");
        if lyrics.is_file() {
            let lyrics_destination = destination.with_extension("lrc");
            if let Err(e) = utils::move_file(&lyrics, &lyrics_destination).await {
                warn!(?lyrics, error = %e, "could not move lyrics file");
            }
        }

        debug!(index, ?destination, "track placed");
        Ok(destination)
    }

    fn name(&self) -> &'static str {
        "gamdl"
    }
}

async fn collect_lines<R>(reader: Option<R>, stream: &'static str) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Vec::new();
    };

    let mut lines = BufReader::new(reader).lines();
    let mut collected = Vec::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(stream, line = %line, "downloader output");
                collected.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(stream, error = %e, "stopped reading downloader output");
                break;
            }
        }
    }
    collected
}

/// Audio files under `root`, in retrieval order
fn discover_staged(root: &Path) -> Vec<StagedFile> {
    let files: Vec<(SystemTime, PathBuf)> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.into_path())
        })
        .collect();

    retrieval_order(files)
        .into_iter()
        .map(|path| {
            let title = title_from_stem(&path);
            StagedFile { path, title }
        })
        .collect()
}

/// Order staged files the way the collection lists them
///
/// Folders come in the order the downloader started writing them (an artist
/// URL yields one folder per album). Inside a folder the `NN` (or `D-NN`)
/// prefix of the file name decides; modification time and then path break
/// ties and order files without a prefix.
fn retrieval_order(files: Vec<(SystemTime, PathBuf)>) -> Vec<PathBuf> {
    let mut folder_started: HashMap<PathBuf, SystemTime> = HashMap::new();
    for (modified, path) in &files {
        folder_started
            .entry(parent_of(path))
            .and_modify(|started| *started = (*started).min(*modified))
            .or_insert(*modified);
    }

    let mut keyed: Vec<_> = files
        .into_iter()
        .map(|(modified, path)| {
            let folder = parent_of(&path);
            let started = folder_started
                .get(&folder)
                .copied()
                .unwrap_or(modified);
            let position = track_position(&path);
            ((started, folder, position.is_none(), position, modified), path)
        })
        .collect();
    keyed.sort();

    keyed.into_iter().map(|(_, path)| path).collect()
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// `(disc, track)` from a `07 Title` or `1-07 Title` file name
fn track_position(path: &Path) -> Option<(u32, u32)> {
    let stem = path.file_stem()?.to_string_lossy();
    let captures = LEADING_TRACK_NUMBER.captures(&stem)?;
    let disc = match captures.get(1) {
        Some(disc) => disc.as_str().parse().ok()?,
        None => 1,
    };
    let track = captures.get(2)?.as_str().parse().ok()?;
    Some((disc, track))
}

fn title_from_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = LEADING_TRACK_NUMBER.replace(&stem, "");
    if stripped.trim().is_empty() {
        stem
    } else {
        stripped.trim().to_string()
    }
}

/// Interleave staged files with the failures the downloader reported
///
/// Failed positions keep their slot, staged files fill the remaining slots in
/// order, and positions up to the reported total that produced nothing become
/// failed placeholders.
fn assemble_tracks(staged: Vec<StagedFile>, report: &DownloaderReport) -> Vec<ResolvedTrack> {
    let known = (staged.len() + report.failures.len()) as u32;
    let total = report.total.unwrap_or(known).max(known);

    let mut staged = staged.into_iter();
    let mut tracks = Vec::with_capacity(total as usize);

    for position in 1..=total {
        if let Some(failure) = report.failures.get(&position) {
            let title = failure
                .title
                .clone()
                .unwrap_or_else(|| format!("Track {}", position));
            tracks.push(ResolvedTrack::unavailable(title, failure.reason.clone()));
        } else if let Some(file) = staged.next() {
            tracks.push(ResolvedTrack::available(
                file.title,
                file.path.to_string_lossy(),
            ));
        } else {
            tracks.push(ResolvedTrack::unavailable(
                format!("Track {}", position),
                "not retrieved by the downloader",
            ));
        }
    }

    tracks
}

/// Name of the deepest folder containing every staged file
fn common_folder_name(root: &Path, staged: &[StagedFile]) -> Option<String> {
    let mut common: Option<PathBuf> = None;
    for file in staged {
        let parent = file.path.parent()?.strip_prefix(root).ok()?;
        common = Some(match common {
            None => parent.to_path_buf(),
            Some(current) => current
                .components()
                .zip(parent.components())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect::<PathBuf>(),
        });
    }

    common?
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .next_back()
}

/// Readable name from a catalog URL: `/us/playlist/road-trip/pl.123` -> `road-trip`
fn url_slug(url: &Url) -> String {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    segments
        .get(2)
        .or(segments.last())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn empty_resolution_reason(status: std::process::ExitStatus, report: &DownloaderReport) -> String {
    let mut reason = format!("downloader produced no tracks ({})", status);
    if let Some(error) = &report.last_error {
        reason.push_str(&format!(": {}", error));
    }
    if report.auth_problem {
        reason.push_str(
            "; the session cookies may have expired, export them again (see --setup)",
        );
    }
    reason
}
