//! Interactive session
//!
//! A menu-driven front end over the same [`Pipeline`] the command line uses:
//! pick an audio format, a cookie file and a lyrics mode, then download URLs
//! one at a time until done, and finally decide whether to keep the cookie
//! file.
//!
//! Prompts go through the [`Prompter`] trait. [`TerminalPrompter`] asks on
//! the terminal with `dialoguer`; tests answer from a script.

use crate::cli::{build_pipeline, remove_cookie_file, report_error};
use crate::config::Config;
use crate::cookies::{CookieFile, locate_cookies};
use crate::deps::check_dependencies;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, RunSummary};
use crate::types::{AudioFormat, DownloadRequest, LyricsMode, TranscodeTarget};
use crate::ui::Console;
use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Answers the questions of an interactive session
pub trait Prompter {
    /// Pick one of `items`; `None` when the user backs out
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<Option<usize>>;

    /// Free text answer, may be empty
    fn input(&mut self, prompt: &str) -> Result<String>;

    /// Yes or no
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// Prompts on the terminal
pub struct TerminalPrompter {
    theme: Box<dyn Theme>,
}

impl TerminalPrompter {
    /// Colored prompts when the console uses color
    pub fn new(console: &Console) -> Self {
        let theme: Box<dyn Theme> = if console.colored() {
            Box::new(ColorfulTheme::default())
        } else {
            Box::new(SimpleTheme)
        };
        Self { theme }
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<Option<usize>> {
        Select::with_theme(self.theme.as_ref())
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_opt()
            .map_err(prompt_error)
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::with_theme(self.theme.as_ref())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(self.theme.as_ref())
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Io(std::io::Error::other(e))
}

/// Entries of the format menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    /// AAC 256 as delivered
    Aac,
    /// Apple Lossless as delivered
    Alac,
    /// AAC converted to FLAC
    Flac,
    /// AAC converted to MP3
    Mp3,
    /// AAC converted to Opus
    Opus,
}

impl FormatChoice {
    /// Menu order
    pub const ALL: [FormatChoice; 5] = [
        FormatChoice::Aac,
        FormatChoice::Alac,
        FormatChoice::Flac,
        FormatChoice::Mp3,
        FormatChoice::Opus,
    ];

    /// Downloaded format and the conversion applied afterwards
    pub fn resolve(self) -> (AudioFormat, Option<TranscodeTarget>) {
        match self {
            FormatChoice::Aac => (AudioFormat::AacLegacy, None),
            FormatChoice::Alac => (AudioFormat::Alac, None),
            FormatChoice::Flac => (AudioFormat::AacLegacy, Some(TranscodeTarget::Flac)),
            FormatChoice::Mp3 => (AudioFormat::AacLegacy, Some(TranscodeTarget::Mp3)),
            FormatChoice::Opus => (AudioFormat::AacLegacy, Some(TranscodeTarget::Opus)),
        }
    }

    fn label(self) -> &'static str {
        match self {
            FormatChoice::Aac => "AAC 256 (~7 MB/song) - Standard",
            FormatChoice::Alac => "ALAC (~30 MB/song) - Lossless",
            FormatChoice::Flac => "FLAC (~35 MB/song) - Converted lossless",
            FormatChoice::Mp3 => "MP3 320 (~8 MB/song) - Universal",
            FormatChoice::Opus => "Opus (~6 MB/song) - Efficient",
        }
    }
}

const LYRICS_CHOICES: [(LyricsMode, &str); 3] = [
    (LyricsMode::Embedded, "Embedded (lyrics in the audio file)"),
    (LyricsMode::Lrc, ".lrc file (separate synced lyrics)"),
    (LyricsMode::None, "No lyrics"),
];

const EXIT_ITEM: &str = "Exit";
const OTHER_PATH_ITEM: &str = "Enter another path";

/// Choices made at the start of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Format requested from the downloader
    pub format: AudioFormat,
    /// Conversion after fetching
    pub convert: Option<TranscodeTarget>,
    /// Validated cookie file
    pub cookie_path: PathBuf,
    /// Lyrics delivery
    pub lyrics: LyricsMode,
}

impl SessionSettings {
    /// Write the choices into `config`
    pub fn apply(&self, config: &mut Config) {
        config.format = self.format;
        config.lyrics = self.lyrics;
        config.cookie_path = self.cookie_path.clone();
        match self.convert {
            Some(target) => {
                config.convert = true;
                config.conversion.target = target;
            }
            None => config.convert = false,
        }
    }
}

/// Ask for format, cookie file and lyrics mode
///
/// Returns `None` when the user exits from a menu. Cookie files found in
/// `search_dir` are offered; an unusable file is reported and the question
/// asked again.
///
/// # Errors
///
/// [`Error::Io`] when the terminal cannot be read.
pub fn choose_settings(
    prompter: &mut dyn Prompter,
    console: &Console,
    config: &Config,
    search_dir: &Path,
) -> Result<Option<SessionSettings>> {
    let mut items: Vec<String> = FormatChoice::ALL
        .iter()
        .map(|choice| choice.label().to_string())
        .collect();
    items.push(EXIT_ITEM.to_string());

    let Some(choice) = prompter
        .select("Select audio format", &items, 0)?
        .and_then(|i| FormatChoice::ALL.get(i).copied())
    else {
        return Ok(None);
    };
    let (format, convert) = choice.resolve();

    let Some(cookie_path) = choose_cookie_file(prompter, console, config, search_dir)? else {
        return Ok(None);
    };

    let items: Vec<String> = LYRICS_CHOICES.iter().map(|(_, l)| l.to_string()).collect();
    let Some(lyrics) = prompter
        .select("Lyrics", &items, 0)?
        .and_then(|i| LYRICS_CHOICES.get(i))
        .map(|(mode, _)| *mode)
    else {
        return Ok(None);
    };

    let settings = SessionSettings {
        format,
        convert,
        cookie_path,
        lyrics,
    };
    debug!(?settings, "session settings chosen");
    Ok(Some(settings))
}

fn choose_cookie_file(
    prompter: &mut dyn Prompter,
    console: &Console,
    config: &Config,
    search_dir: &Path,
) -> Result<Option<PathBuf>> {
    loop {
        let candidates = cookie_candidates(&config.cookie_path, search_dir);
        let mut items: Vec<String> = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        items.push(OTHER_PATH_ITEM.to_string());
        items.push(EXIT_ITEM.to_string());

        let Some(selected) = prompter.select("Cookie file", &items, 0)? else {
            return Ok(None);
        };

        let path = match selected {
            i if i < candidates.len() => candidates[i].clone(),
            i if i == candidates.len() => {
                let typed = prompter.input("Cookie file path")?;
                let typed = typed.trim();
                if typed.is_empty() {
                    continue;
                }
                PathBuf::from(typed)
            }
            _ => return Ok(None),
        };

        match locate_cookies(&path, &config.catalog_host) {
            Ok(cookies) => {
                console.success(&format!(
                    "Using cookies from {} ({} catalog cookies)",
                    cookies.path.display(),
                    cookies.catalog_cookie_count
                ));
                return Ok(Some(path));
            }
            Err(e) => {
                console.error(&e.to_string());
                console.info("Pick another file, or run with --setup to see how to export one");
            }
        }
    }
}

/// The configured cookie file (if present), then every `*.txt` in `dir`
pub fn cookie_candidates(configured: &Path, dir: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if configured.is_file() {
        candidates.push(configured.to_path_buf());
    }

    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
        })
        .collect();
    found.sort();

    for path in found {
        if !candidates.iter().any(|known| same_file(known, &path)) {
            candidates.push(path);
        }
    }
    candidates
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Ask for URLs and download each one until the user stops
///
/// An empty answer or `q` ends the loop, as does declining "Download more?".
///
/// # Errors
///
/// Prompt failures and the pipeline's fatal errors; unresolvable URLs are
/// recorded in the summary instead.
pub async fn download_loop(
    prompter: &mut dyn Prompter,
    console: &Console,
    pipeline: &Pipeline,
    cookies: &CookieFile,
    settings: &SessionSettings,
) -> Result<RunSummary> {
    let mut total = RunSummary::default();

    loop {
        let answer = prompter.input("Catalog URL (or 'q' to finish)")?;
        let url = answer.trim();
        if url.is_empty() || matches!(url.to_ascii_lowercase().as_str(), "q" | "quit" | "exit") {
            break;
        }

        let request = DownloadRequest::new(url, settings.format, settings.convert);
        let summary = pipeline.run(std::slice::from_ref(&request), cookies).await?;
        console.block(&console.render_summary(&summary));

        total.collections.extend(summary.collections);
        total.resolution_failures.extend(summary.resolution_failures);

        if !prompter.confirm("Download more?", true)? {
            break;
        }
    }

    info!(
        collections = total.collections.len(),
        tracks = total.total_tracks(),
        "interactive session finished"
    );
    Ok(total)
}

/// Offer to delete the cookie file; returns whether it was deleted
///
/// # Errors
///
/// [`Error::Io`] when the terminal cannot be read.
pub async fn offer_cookie_removal(
    prompter: &mut dyn Prompter,
    console: &Console,
    cookie_path: &Path,
) -> Result<bool> {
    if !cookie_path.is_file() {
        return Ok(false);
    }
    if !prompter.confirm(
        "Creating a fresh session each time is safer. Delete the cookie file?",
        false,
    )? {
        return Ok(false);
    }
    Ok(remove_cookie_file(console, cookie_path).await)
}

/// Run a complete interactive session and return the exit code
///
/// A session in which no URL was entered exits with 0; otherwise the code is
/// that of the combined run summary.
pub async fn run_session(
    prompter: &mut dyn Prompter,
    console: &Console,
    config: &Config,
    search_dir: &Path,
) -> u8 {
    let settings = match choose_settings(prompter, console, config, search_dir) {
        Ok(Some(settings)) => settings,
        Ok(None) => return 0,
        Err(e) => return report_error(console, &e),
    };

    let mut config = config.clone();
    settings.apply(&mut config);
    if let Err(e) = config.validate() {
        return report_error(console, &e);
    }

    let tools = match check_dependencies(&config.tools, settings.convert.is_some()).await {
        Ok(tools) => tools,
        Err(missing) => return report_error(console, &Error::from(missing)),
    };
    let cookies = match locate_cookies(&config.cookie_path, &config.catalog_host) {
        Ok(cookies) => cookies,
        Err(e) => return report_error(console, &Error::from(e)),
    };

    let pipeline = build_pipeline(console, &config, tools);

    let code = match download_loop(prompter, console, &pipeline, &cookies, &settings).await {
        Ok(summary) if summary.collections.is_empty() && summary.resolution_failures.is_empty() => 0,
        Ok(summary) => summary.exit_code(),
        Err(e) => report_error(console, &e),
    };

    if let Err(e) = offer_cookie_removal(prompter, console, &config.cookie_path).await {
        return report_error(console, &e);
    }
    code
}
