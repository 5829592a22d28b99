//! Error types for catalog-dl
//!
//! This module provides the error taxonomy of the tool:
//! - Precondition failures (missing dependency, credentials, configuration) that abort a run
//! - Per-URL resolution failures that abort only that URL
//! - Per-track fetch and conversion failures that are recorded and reported in the summary
//! - Exit code mapping for the command line surface

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catalog-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for catalog-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_root")
        key: Option<String>,
    },

    /// A required external tool is not installed or not callable
    #[error(transparent)]
    MissingDependency(#[from] MissingDependency),

    /// Session cookie file is unusable
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The downloader could not turn a URL into tracks
    #[error("could not resolve {url}: {reason}")]
    Resolution {
        /// The catalog URL that failed to resolve
        url: String,
        /// Why resolution failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A required external dependency that could not be found
#[derive(Debug, Clone, Error)]
#[error("{name} not found")]
pub struct MissingDependency {
    /// Dependency name as shown to the user (e.g., "ffmpeg")
    pub name: String,
    /// Platform-specific install hint
    pub hint: String,
}

/// Session cookie file problems
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No cookie file at the expected location
    #[error("cookie file not found at {path}")]
    NotFound {
        /// Where the cookie file was expected
        path: PathBuf,
    },

    /// Cookie file exists but contains nothing
    #[error("cookie file {path} is empty")]
    Empty {
        /// The empty cookie file
        path: PathBuf,
    },

    /// Cookie file is not in the Netscape cookies.txt format
    #[error("cookie file {path} is malformed: {reason}")]
    MalformedFormat {
        /// The malformed cookie file
        path: PathBuf,
        /// What is wrong with it (usually includes a line number)
        reason: String,
    },

    /// Every catalog cookie in the file has an expiry in the past
    #[error("session cookies in {path} expired on {expired_at}")]
    Expired {
        /// The stale cookie file
        path: PathBuf,
        /// Latest expiry among the catalog cookies (RFC 3339)
        expired_at: String,
    },
}

/// Failure to fetch one track; recorded in its `TrackResult`, never fatal to the run
#[derive(Debug, Clone, Error)]
#[error("track {index} ({title}) could not be fetched: {reason}")]
pub struct TrackFetchError {
    /// 1-based position of the track in its collection
    pub index: u32,
    /// Track title as resolved
    pub title: String,
    /// Why the fetch failed
    pub reason: String,
}

/// Conversion failures; recorded in the track's `TrackResult`, never fatal to the run
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The transcoder ran and exited unsuccessfully
    #[error("transcoding {path} failed (exit code {code:?}): {stderr}")]
    Failed {
        /// Source file that failed to convert
        path: PathBuf,
        /// Exit code of the transcoder, if it exited normally
        code: Option<i32>,
        /// Last lines of the transcoder's stderr
        stderr: String,
    },

    /// The transcoder could not be started
    #[error("failed to execute transcoder: {0}")]
    Spawn(String),

    /// Source or target path cannot be used
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why it cannot be used
        reason: String,
    },

    /// No transcoder is configured
    #[error("conversion not supported: {0}")]
    Unsupported(String),

    /// Filesystem error around the conversion (removing the original, etc.)
    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

/// Map errors to process exit codes for the command line surface
pub trait ToExitCode {
    /// Process exit code for this error (never 0)
    fn exit_code(&self) -> u8;

    /// Machine-readable error code, used in log fields
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        match self {
            // 2 - usage / configuration
            Error::Config { .. } => 2,

            // 3 - precondition: tooling
            Error::MissingDependency(_) => 3,

            // 4 - precondition: credentials
            Error::Credential(_) => 4,

            // 5 - nothing could be resolved
            Error::Resolution { .. } => 5,

            // 1 - everything else
            Error::Io(_) => 1,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::MissingDependency(_) => "missing_dependency",
            Error::Credential(e) => match e {
                CredentialError::NotFound { .. } => "credentials_not_found",
                CredentialError::Empty { .. } => "credentials_empty",
                CredentialError::MalformedFormat { .. } => "credentials_malformed",
                CredentialError::Expired { .. } => "credentials_expired",
            },
            Error::Resolution { .. } => "resolution_error",
            Error::Io(_) => "io_error",
        }
    }
}

impl Error {
    /// What the user can do about this error, if there is a known remedy
    pub fn remediation(&self) -> Option<String> {
        match self {
            Error::MissingDependency(missing) => Some(missing.hint.clone()),
            Error::Credential(CredentialError::MalformedFormat { .. }) => Some(
                "Export the cookies again in Netscape cookies.txt format (run with --setup)"
                    .to_string(),
            ),
            Error::Credential(_) => {
                Some("Run with --setup to see how to export your session cookies".to_string())
            }
            Error::Config { key: Some(key), .. } => {
                Some(format!("Check the `{}` setting in your configuration", key))
            }
            _ => None,
        }
    }
}
