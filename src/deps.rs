//! External dependency discovery
//!
//! Two external programs do the real work:
//! - the `gamdl` downloader, either as an executable or as `python3 -m gamdl`
//! - the `ffmpeg` transcoder
//!
//! Discovery is inspection only. Nothing is ever installed; a missing
//! dependency is reported with a platform-specific install hint.

use crate::config::ToolsConfig;
use crate::error::MissingDependency;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Downloader name shown to users
pub const DOWNLOADER_NAME: &str = "gamdl";

/// Transcoder name shown to users
pub const TRANSCODER_NAME: &str = "ffmpeg";

/// Python module name of the downloader
const DOWNLOADER_MODULE: &str = "gamdl";

/// Upper bound for a `--help` run (python imports can be slow on first run)
const HELP_TIMEOUT: Duration = Duration::from_secs(60);

/// How to invoke the downloader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderCommand {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments that precede the downloader's own options (e.g. `-m gamdl`)
    pub base_args: Vec<String>,
}

impl DownloaderCommand {
    /// Run a `gamdl` executable directly
    pub fn executable(program: PathBuf) -> Self {
        Self {
            program,
            base_args: Vec::new(),
        }
    }

    /// Run the downloader as a python module
    pub fn python_module(python: PathBuf) -> Self {
        Self {
            program: python,
            base_args: vec!["-m".to_string(), DOWNLOADER_MODULE.to_string()],
        }
    }

    /// A command with the base arguments applied
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.base_args);
        command
    }

    /// Human-readable invocation, e.g. `/usr/bin/python3 -m gamdl`
    pub fn describe(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.base_args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Tools available for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTools {
    /// Downloader invocation
    pub downloader: DownloaderCommand,
    /// Transcoder binary, if found
    pub transcoder: Option<PathBuf>,
}

/// Status line for `--check`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    /// Dependency name
    pub name: &'static str,
    /// Where it was found (None if missing)
    pub location: Option<String>,
    /// Install hint shown when missing
    pub hint: String,
}

impl DependencyStatus {
    /// Whether the dependency is available
    pub fn is_found(&self) -> bool {
        self.location.is_some()
    }
}

/// Verify the dependencies a run needs
///
/// The downloader is always required; the transcoder only when
/// `require_transcoder` is set (a conversion was requested).
pub async fn check_dependencies(
    tools: &ToolsConfig,
    require_transcoder: bool,
) -> Result<ResolvedTools, MissingDependency> {
    let transcoder = locate_transcoder(tools);
    if require_transcoder && transcoder.is_none() {
        return Err(MissingDependency {
            name: TRANSCODER_NAME.to_string(),
            hint: transcoder_install_hint(),
        });
    }

    let downloader = locate_downloader(tools)
        .await
        .ok_or_else(|| MissingDependency {
            name: DOWNLOADER_NAME.to_string(),
            hint: downloader_install_hint(),
        })?;

    info!(
        downloader = %downloader.describe(),
        transcoder = ?transcoder,
        "dependencies resolved"
    );

    Ok(ResolvedTools {
        downloader,
        transcoder,
    })
}

/// Status of every dependency, for `--check`
pub async fn dependency_report(tools: &ToolsConfig) -> Vec<DependencyStatus> {
    let transcoder = locate_transcoder(tools);
    let downloader = locate_downloader(tools).await;

    vec![
        DependencyStatus {
            name: TRANSCODER_NAME,
            location: transcoder.map(|p| p.display().to_string()),
            hint: transcoder_install_hint(),
        },
        DependencyStatus {
            name: DOWNLOADER_NAME,
            location: downloader.map(|d| d.describe()),
            hint: downloader_install_hint(),
        },
    ]
}

/// Find the transcoder binary
///
/// An explicit `ffmpeg_path` must point at an existing file; otherwise PATH is
/// searched when `search_path` is enabled.
pub fn locate_transcoder(tools: &ToolsConfig) -> Option<PathBuf> {
    match &tools.ffmpeg_path {
        Some(path) if path.is_file() => Some(path.clone()),
        Some(path) => {
            debug!(?path, "configured ffmpeg path does not exist");
            None
        }
        None if tools.search_path => which::which(TRANSCODER_NAME).ok(),
        None => None,
    }
}

/// Candidate downloader invocations, in preference order
pub fn downloader_candidates(tools: &ToolsConfig) -> Vec<DownloaderCommand> {
    if let Some(path) = &tools.gamdl_path {
        return vec![DownloaderCommand::executable(path.clone())];
    }

    let mut candidates = Vec::new();
    if tools.search_path
        && let Ok(path) = which::which(DOWNLOADER_NAME)
    {
        candidates.push(DownloaderCommand::executable(path));
    }

    let python = match &tools.python_path {
        Some(path) => Some(path.clone()),
        None if tools.search_path => which::which("python3")
            .or_else(|_| which::which("python"))
            .ok(),
        None => None,
    };
    if let Some(python) = python {
        candidates.push(DownloaderCommand::python_module(python));
    }

    candidates
}

/// First candidate downloader that answers `--help` successfully
pub async fn locate_downloader(tools: &ToolsConfig) -> Option<DownloaderCommand> {
    for candidate in downloader_candidates(tools) {
        if answers_help(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

async fn answers_help(candidate: &DownloaderCommand) -> bool {
    let mut command = candidate.command();
    command
        .arg("--help")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(HELP_TIMEOUT, command.status()).await {
        Ok(Ok(status)) => {
            debug!(candidate = %candidate.describe(), %status, "downloader --help finished");
            status.success()
        }
        Ok(Err(e)) => {
            debug!(candidate = %candidate.describe(), error = %e, "downloader --help failed to start");
            false
        }
        Err(_) => {
            debug!(candidate = %candidate.describe(), "downloader --help timed out");
            false
        }
    }
}

/// Install hint for the transcoder on this platform
pub fn transcoder_install_hint() -> String {
    let command = if cfg!(target_os = "macos") {
        "brew install ffmpeg"
    } else if cfg!(target_os = "windows") {
        "winget install ffmpeg"
    } else {
        "sudo apt install ffmpeg (or your distribution's package manager)"
    };
    format!("Install with: {}", command)
}

/// Install hint for the downloader on this platform
pub fn downloader_install_hint() -> String {
    let pip = if cfg!(target_os = "windows") {
        "py -m pip install gamdl"
    } else {
        "python3 -m pip install gamdl"
    };
    format!("Install with: {}", pip)
}

/// Whether `path` looks like something we could execute
pub fn is_executable_file(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
