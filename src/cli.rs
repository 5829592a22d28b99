//! Command line surface
//!
//! Parsing with `clap`, configuration layering (defaults, optional TOML file,
//! flags) and the linear run: dependency check, credential check, pipeline,
//! summary. Every outcome maps to a process exit code; see
//! [`ToExitCode`](crate::error::ToExitCode).

use crate::catalog::GamdlFetcher;
use crate::config::Config;
use crate::cookies::locate_cookies;
use crate::deps::{ResolvedTools, check_dependencies, dependency_report};
use crate::error::{Error, Result, ToExitCode};
use crate::interactive::{TerminalPrompter, run_session};
use crate::orchestrator::Orchestrator;
use crate::pipeline::Pipeline;
use crate::postprocess::PostProcessor;
use crate::transcode::{FfmpegTranscoder, NoOpTranscoder, Transcoder};
use crate::types::{AudioFormat, DownloadRequest, LyricsMode, TranscodeTarget};
use crate::ui::Console;
use clap::{ArgAction, CommandFactory, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};

const AFTER_HELP: &str = "\
Supported URL types:
  • Playlists (public and library)
  • Albums
  • Songs
  • Artists (downloads all albums)

Examples:
  catalog-dl https://music.apple.com/us/playlist/todays-hits/pl.f4d106fed2bd41149aaacabb233eb5eb
  catalog-dl --flac https://music.apple.com/us/album/example/1234567890
  catalog-dl --check";

/// Fetch playlists, albums and songs from the music catalog
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "catalog-dl", author, version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Playlist, album, song or artist URLs
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Audio format to download [default: aac-legacy]
    #[arg(short, long, value_enum)]
    pub format: Option<AudioFormat>,

    /// Convert downloaded files to FLAC
    #[arg(long, conflicts_with = "convert")]
    pub flac: bool,

    /// Convert downloaded files to another format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub convert: Option<TranscodeTarget>,

    /// Keep the downloaded file next to the converted one
    #[arg(long)]
    pub keep_original: bool,

    /// How lyrics are saved [default: embedded]
    #[arg(long, value_enum)]
    pub lyrics: Option<LyricsMode>,

    /// Exported session cookie file [default: ./cookies.txt]
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,

    /// Root directory for downloaded collections [default: ./downloads]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Check dependencies and exit
    #[arg(long, conflicts_with = "setup")]
    pub check: bool,

    /// Show cookie setup instructions and exit
    #[arg(long)]
    pub setup: bool,

    /// Choose format, cookies and lyrics from menus, then enter URLs one by one
    #[arg(short, long, conflicts_with_all = ["check", "setup", "urls"])]
    pub interactive: bool,

    /// Delete the cookie file when the run is over
    #[arg(long)]
    pub forget_cookies: bool,

    /// Disable colors and progress bars
    #[arg(long)]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Configuration in effect: defaults, then `--config`, then flags
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the file cannot be read or a value is invalid.
    pub fn build_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };

        if let Some(format) = self.format {
            config.format = format;
        }
        if self.flac {
            config.convert = true;
            config.conversion.target = TranscodeTarget::Flac;
        }
        if let Some(target) = self.convert {
            config.convert = true;
            config.conversion.target = target;
        }
        if self.keep_original {
            config.conversion.keep_original = true;
        }
        if let Some(lyrics) = self.lyrics {
            config.lyrics = lyrics;
        }
        if let Some(cookies) = &self.cookies {
            config.cookie_path = cookies.clone();
        }
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn console(&self) -> Console {
        if self.no_color {
            Console::plain()
        } else {
            Console::detect()
        }
    }
}

/// Run the command line and return the process exit code
pub async fn execute(cli: Cli) -> ExitCode {
    ExitCode::from(run(cli).await)
}

/// Run the command line and return the raw exit code
pub async fn run(cli: Cli) -> u8 {
    let console = cli.console();

    let config = match cli.build_config() {
        Ok(config) => config,
        Err(e) => return report_error(&console, &e),
    };
    debug!(?config, "configuration loaded");

    if cli.setup {
        console.block(&console.render_setup(&config.cookie_path, &config.catalog_host));
        return 0;
    }

    if cli.check {
        return check(&console, &config).await;
    }

    if cli.interactive {
        let search_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut prompter = TerminalPrompter::new(&console);
        return run_session(&mut prompter, &console, &config, &search_dir).await;
    }

    if cli.urls.is_empty() {
        let _ = Cli::command().print_help();
        println!();
        console.info("Run with --setup to see cookie setup instructions");
        console.info("Run with --check to verify all dependencies");
        console.info("Run with --interactive to pick settings from menus");
        return 0;
    }

    let code = download(&console, &config, &cli.urls).await;

    if cli.forget_cookies {
        forget_cookies(&console, &config).await;
    }

    code
}

async fn check(console: &Console, config: &Config) -> u8 {
    console.info("Checking dependencies...");
    let report = dependency_report(&config.tools).await;
    console.block(&console.render_dependency_report(&report));

    match locate_cookies(&config.cookie_path, &config.catalog_host) {
        Ok(cookies) => console.success(&format!(
            "Cookie file {} ({} catalog cookies)",
            cookies.path.display(),
            cookies.catalog_cookie_count
        )),
        Err(e) => console.warning(&format!("{} (run with --setup)", e)),
    }

    if report.iter().all(|status| status.is_found()) {
        console.success("All dependencies are installed! Ready to download.");
        0
    } else {
        console.warning("Some dependencies are missing. Please install them first.");
        3
    }
}

async fn download(console: &Console, config: &Config, urls: &[String]) -> u8 {
    let convert = config.conversion_target();
    let requests: Vec<DownloadRequest> = urls
        .iter()
        .map(|url| DownloadRequest::new(url.trim(), config.format, convert))
        .collect();

    console.block(&console.render_settings(config, requests.len()));

    let tools = match check_dependencies(&config.tools, convert.is_some()).await {
        Ok(tools) => tools,
        Err(missing) => return report_error(console, &Error::from(missing)),
    };

    let cookies = match locate_cookies(&config.cookie_path, &config.catalog_host) {
        Ok(cookies) => cookies,
        Err(e) => return report_error(console, &Error::from(e)),
    };
    console.success(&format!("Using cookies from {}", cookies.path.display()));

    let pipeline = build_pipeline(console, config, tools);

    let summary = match pipeline.run(&requests, &cookies).await {
        Ok(summary) => summary,
        Err(e) => return report_error(console, &e),
    };

    console.block(&console.render_summary(&summary));

    let code = summary.exit_code();
    if code == 0 {
        console.success(&format!(
            "Done! Your music is ready in {}",
            config.output_root.display()
        ));
    } else {
        console.error("Nothing was downloaded");
    }
    code
}

/// Fetcher, transcoder and post-processor for the tools that were found
pub(crate) fn build_pipeline(console: &Console, config: &Config, tools: ResolvedTools) -> Pipeline {
    let transcoder: Arc<dyn Transcoder> = match (config.conversion_target(), tools.transcoder) {
        (Some(_), Some(path)) => Arc::new(FfmpegTranscoder::new(path)),
        _ => Arc::new(NoOpTranscoder),
    };
    let fetcher = Arc::new(GamdlFetcher::new(tools.downloader, config));
    Pipeline::new(
        Orchestrator::new(Arc::new(config.clone()), fetcher),
        PostProcessor::new(transcoder, config.conversion.clone()),
        *console,
    )
}

async fn forget_cookies(console: &Console, config: &Config) {
    remove_cookie_file(console, &config.cookie_path).await;
}

/// Delete the cookie file; returns whether a file was deleted
pub(crate) async fn remove_cookie_file(console: &Console, path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            console.success(&format!("Deleted cookie file {}", path.display()));
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            console.warning(&format!(
                "Could not delete cookie file {}: {}",
                path.display(),
                e
            ));
            false
        }
    }
}

pub(crate) fn report_error(console: &Console, e: &Error) -> u8 {
    error!(code = e.error_code(), error = %e, "run aborted");
    console.error(&e.to_string());
    if let Some(remediation) = e.remediation() {
        console.info(&remediation);
    }
    e.exit_code()
}
