//! Transcoder backed by the external ffmpeg binary

use super::traits::{TranscodeOptions, Transcoder};
use crate::error::ConversionError;
use crate::types::TranscodeTarget;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Number of trailing stderr lines kept in a failure
const STDERR_TAIL_LINES: usize = 5;

/// Transcoder that executes `ffmpeg`
///
/// The binary location comes from the dependency check, see
/// [`check_dependencies`](crate::deps::check_dependencies).
pub struct FfmpegTranscoder {
    binary_path: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a transcoder with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

/// Full ffmpeg argument list for one conversion
pub(crate) fn ffmpeg_args(
    source: &Path,
    destination: &Path,
    options: &TranscodeOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-hide_banner", "-loglevel", "error", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(source.as_os_str().to_owned());
    args.extend(codec_args(options).into_iter().map(OsString::from));
    args.push("-y".into());
    args.push(destination.as_os_str().to_owned());
    args
}

fn codec_args(options: &TranscodeOptions) -> Vec<String> {
    match options.target {
        TranscodeTarget::Flac => vec![
            "-c:a".into(),
            "flac".into(),
            "-compression_level".into(),
            options.compression_level.to_string(),
        ],
        TranscodeTarget::Mp3 => vec![
            "-c:a".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            "320k".into(),
        ],
        TranscodeTarget::Opus => vec![
            "-c:a".into(),
            "libopus".into(),
            "-b:a".into(),
            "192k".into(),
        ],
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &TranscodeOptions,
    ) -> Result<(), ConversionError> {
        if !source.is_file() {
            return Err(ConversionError::InvalidPath {
                path: source.to_path_buf(),
                reason: "source file does not exist".to_string(),
            });
        }
        if source == destination {
            return Err(ConversionError::InvalidPath {
                path: destination.to_path_buf(),
                reason: "destination equals source".to_string(),
            });
        }

        let args = ffmpeg_args(source, destination, options);
        debug!(binary = ?self.binary_path, ?args, "running ffmpeg");

        let output = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ConversionError::Spawn(format!("Failed to execute ffmpeg: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ConversionError::Failed {
                path: source.to_path_buf(),
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            })
        }
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
