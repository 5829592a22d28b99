//! Utility functions for file naming and moving

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Maximum number of suffixes tried when resolving name collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Longest name component written to disk, in characters
const MAX_COMPONENT_CHARS: usize = 180;

/// Name used when a title sanitizes to nothing
const UNTITLED: &str = "Untitled";

/// Make a title safe to use as a single path component
///
/// Reserved characters (`/ \ : * ? " < > |`) and control characters are
/// replaced with `_`, Windows reserved names are neutralized, leading and
/// trailing dots and spaces are trimmed and overly long names are truncated.
///
/// # Examples
///
/// ```
/// use catalog_dl::utils::sanitize_component;
///
/// assert_eq!(sanitize_component("AC/DC: Live?"), "AC_DC_ Live_");
/// assert_eq!(sanitize_component("..."), "Untitled");
/// ```
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    let options = sanitize_filename::Options {
        truncate: true,
        windows: true,
        replacement: "_",
    };
    let is_edge = |c: char| c == '.' || c.is_whitespace();
    let sanitized = sanitize_filename::sanitize_with_options(name.trim_matches(is_edge), options);
    let truncated: String = sanitized.chars().take(MAX_COMPONENT_CHARS).collect();
    let trimmed = truncated.trim_matches(is_edge);

    if trimmed.chars().all(|c| c == '_') {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File stem of a track on disk: zero-padded position and sanitized title
///
/// ```
/// use catalog_dl::utils::track_file_stem;
///
/// assert_eq!(track_file_stem(3, "Intro"), "03 Intro");
/// assert_eq!(track_file_stem(112, "Outro"), "112 Outro");
/// ```
#[must_use]
pub fn track_file_stem(index: u32, title: &str) -> String {
    format!("{:02} {}", index, sanitize_component(title))
}

/// Get a directory path that does not exist yet
///
/// Returns `path` itself when free, otherwise `path (1)`, `path (2)`, ...
/// The whole final component is treated as the name, so `Vol. 2` becomes
/// `Vol. 2 (1)` rather than `Vol (1). 2`.
pub fn unique_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| invalid_path(path, "cannot extract directory name"))?;
    let parent = path
        .parent()
        .ok_or_else(|| invalid_path(path, "cannot extract parent directory"))?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = parent.join(format!("{} ({})", name, i));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(invalid_path(
        path,
        "could not find unique name after 9999 attempts",
    ))
}

/// Get a file path that does not exist yet, keeping the extension
///
/// `song.m4a` becomes `song (1).m4a`, `song (2).m4a`, ...
pub fn unique_file_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| invalid_path(path, "cannot extract file stem"))?;
    let extension = path.extension().and_then(|e| e.to_str());
    let parent = path
        .parent()
        .ok_or_else(|| invalid_path(path, "cannot extract parent directory"))?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        };
        let candidate = parent.join(new_name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(invalid_path(
        path,
        "could not find unique filename after 9999 attempts",
    ))
}

/// Move a file, falling back to copy + remove when a rename is not possible
/// (e.g. across filesystems)
pub async fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(
                ?source,
                ?destination,
                error = %rename_err,
                "rename failed, falling back to copy"
            );
            tokio::fs::copy(source, destination).await?;
            tokio::fs::remove_file(source).await
        }
    }
}

fn invalid_path(path: &Path, reason: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("{}: {}", path.display(), reason),
    ))
}
