//! Audio transcoding of fetched tracks
//!
//! The core abstraction is the [`Transcoder`] trait. Two implementations are
//! provided:
//!
//! - [`FfmpegTranscoder`]: runs the external `ffmpeg` binary
//! - [`NoOpTranscoder`]: used when no conversion was requested
//!
//! ## Usage
//!
//! ```no_run
//! use catalog_dl::transcode::{FfmpegTranscoder, TranscodeOptions, Transcoder};
//! use catalog_dl::TranscodeTarget;
//! use std::path::{Path, PathBuf};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transcoder = FfmpegTranscoder::new(PathBuf::from("/usr/bin/ffmpeg"));
//!     let options = TranscodeOptions::new(TranscodeTarget::Flac);
//!
//!     transcoder
//!         .convert(Path::new("01 Intro.m4a"), Path::new("01 Intro.flac"), &options)
//!         .await?;
//!     Ok(())
//! }
//! ```

mod ffmpeg;
mod noop;
mod traits;

pub use ffmpeg::FfmpegTranscoder;
pub use noop::NoOpTranscoder;
pub use traits::{TranscodeOptions, Transcoder};
