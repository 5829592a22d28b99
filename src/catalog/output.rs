//! Parser for the downloader's console output
//!
//! The downloader prefixes per-track log lines with a position marker:
//!
//! ```text
//! [INFO     12:00:01] (Track 1/3 from URL 1/1) Downloading "Intro"
//! [ERROR    12:00:04] (Track 2/3 from URL 1/1) Failed to download "Second": not available
//! ```
//!
//! Only the marker, a quoted title and the error keywords are relied upon.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

// The patterns are literals; compiling them cannot fail
#[allow(clippy::expect_used)]
static TRACK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Track (\d+)/(\d+)[^)]*\)").expect("valid regex"));

#[allow(clippy::expect_used)]
static QUOTED_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));

#[allow(clippy::expect_used)]
static FAILURE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(error|failed|failure)\b").expect("valid regex"));

#[allow(clippy::expect_used)]
static AUTH_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(401|403|unauthori[sz]ed|forbidden|cookies?|media-user-token|token)\b")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid regex"));

/// A track the downloader reported as failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackFailure {
    /// Title, when the line quoted one
    pub title: Option<String>,
    /// Text following the position marker
    pub reason: String,
}

/// What the downloader said about one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DownloaderReport {
    /// Track count from the last position marker seen
    pub total: Option<u32>,
    /// Failed tracks keyed by 1-based position
    pub failures: BTreeMap<u32, TrackFailure>,
    /// Whether any error line mentioned authorization or cookies
    pub auth_problem: bool,
    /// Last error line without a position marker
    pub last_error: Option<String>,
}

impl DownloaderReport {
    /// Parse every output line of one downloader run
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut report = Self::default();
        for line in lines {
            report.feed(line);
        }
        report
    }

    fn feed(&mut self, raw: &str) {
        let line = ANSI_ESCAPE.replace_all(raw, "");
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let is_failure = FAILURE_KEYWORD.is_match(line);
        if is_failure && AUTH_KEYWORD.is_match(line) {
            self.auth_problem = true;
        }

        let Some(marker) = TRACK_MARKER.captures(line) else {
            if is_failure {
                self.last_error = Some(line.to_string());
            }
            return;
        };

        let position = marker[1].parse::<u32>().ok();
        if let Ok(total) = marker[2].parse::<u32>() {
            self.total = Some(total);
        }

        if let Some(position) = position.filter(|&p| p > 0)
            && is_failure
        {
            let rest = line[marker.get(0).map_or(0, |m| m.end())..].trim();
            let title = QUOTED_TITLE
                .captures(rest)
                .map(|c| c[1].to_string());
            let reason = if rest.is_empty() {
                "download failed".to_string()
            } else {
                rest.to_string()
            };
            self.failures
                .entry(position)
                .or_insert(TrackFailure { title, reason });
        }
    }
}
