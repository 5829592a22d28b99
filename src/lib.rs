//! # catalog-dl
//!
//! Command-line front end that fetches playlists, albums and songs from a
//! streaming catalog through the external `gamdl` downloader and optionally
//! converts the results with `ffmpeg`.
//!
//! The crate does no catalog traversal, decryption or audio encoding itself.
//! It checks that the external tools exist, validates the exported session
//! cookies, sequences the per-track work and lays the results out as
//! `<output root>/<Collection>/<NN> <Title>.<ext>`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_dl::cli::{Cli, execute};
//! use clap::Parser;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::process::ExitCode {
//!     execute(Cli::parse()).await
//! }
//! ```
//!
//! Both external tools sit behind traits ([`CatalogFetcher`] and
//! [`Transcoder`]) so the [`Pipeline`] can be driven with fakes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog resolution and track retrieval through the external downloader
pub mod catalog;
/// Command line surface
pub mod cli;
/// Configuration types
pub mod config;
/// Session cookie file validation
pub mod cookies;
/// External dependency discovery
pub mod deps;
/// Error types
pub mod error;
/// Menu-driven session
pub mod interactive;
/// Per-collection fetch orchestration
pub mod orchestrator;
/// End-to-end run over all requested URLs
pub mod pipeline;
/// Conversion of fetched tracks
pub mod postprocess;
/// Transcoder capability and implementations
pub mod transcode;
/// Core types
pub mod types;
/// Terminal presentation
pub mod ui;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::{CatalogFetcher, GamdlFetcher, ResolvedCollection, ResolvedTrack};
pub use config::{Config, ConversionConfig, ToolsConfig};
pub use cookies::{CookieFile, locate_cookies};
pub use deps::{DownloaderCommand, ResolvedTools, check_dependencies, dependency_report};
pub use error::{
    ConversionError, CredentialError, Error, MissingDependency, Result, ToExitCode,
    TrackFetchError,
};
pub use orchestrator::Orchestrator;
pub use pipeline::{Pipeline, RunSummary};
pub use postprocess::PostProcessor;
pub use transcode::{FfmpegTranscoder, NoOpTranscoder, TranscodeOptions, Transcoder};
pub use types::{
    AudioFormat, CollectionResult, DownloadRequest, LyricsMode, TrackResult, TrackStatus,
    TranscodeTarget,
};
