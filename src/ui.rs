//! Terminal presentation
//!
//! All user-facing text goes through [`Console`]. Rendering is split from
//! printing: the `render_*` methods build strings (plain when color is off) and
//! the printing methods write them out. Colors and progress bars come from
//! `kdam`.

use crate::config::Config;
use crate::deps::DependencyStatus;
use crate::pipeline::RunSummary;
use crate::types::{CollectionResult, TrackResult, TrackStatus};
use kdam::term::Colorizer;
use kdam::{Bar, BarExt};
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::Path;

/// Where the cookie export extension for Chromium browsers lives
const CHROME_EXTENSION: &str = "https://chromewebstore.google.com/detail/get-cookiestxt-locally/cclelndahbckbenkjhflpdbgdldlbecc";

/// Where the cookie export add-on for Firefox lives
const FIREFOX_ADDON: &str = "https://addons.mozilla.org/addon/export-cookies-txt";

/// Terminal writer with optional color and progress bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Console {
    color: bool,
    progress: bool,
}

impl Console {
    /// Console with explicit color and progress settings
    pub fn new(color: bool, progress: bool) -> Self {
        Self { color, progress }
    }

    /// Console without color or progress bars
    pub fn plain() -> Self {
        Self::new(false, false)
    }

    /// Color and progress when stdout is a terminal and `NO_COLOR` is unset
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal();
        let color = tty && std::env::var_os("NO_COLOR").is_none();
        if color {
            kdam::term::init(true);
        }
        Self::new(color, tty && std::io::stderr().is_terminal())
    }

    /// Whether output is colored
    pub fn colored(&self) -> bool {
        self.color
    }

    fn paint(&self, text: &str, style: &str) -> String {
        if self.color {
            text.colorize(style)
        } else {
            text.to_string()
        }
    }

    /// `✓ message`
    pub fn success(&self, message: &str) {
        println!("{} {}", self.paint("✓", "bold green"), message);
    }

    /// `✗ message`, on stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.paint("✗", "bold red"), message);
    }

    /// `ℹ message`
    pub fn info(&self, message: &str) {
        println!("{} {}", self.paint("ℹ", "bold blue"), message);
    }

    /// `⚠ message`
    pub fn warning(&self, message: &str) {
        println!("{} {}", self.paint("⚠", "bold yellow"), message);
    }

    /// Print a pre-rendered block
    pub fn block(&self, text: &str) {
        print!("{}", text);
    }

    /// Progress bar over `total` items, or None when progress is disabled
    pub fn progress_bar(&self, total: usize, description: &str) -> Option<Bar> {
        if !self.progress || total == 0 {
            return None;
        }
        let mut bar = kdam::tqdm!(
            total = total,
            desc = description.to_string(),
            unit = " tracks".to_string(),
            leave = false
        );
        // Drawing is cosmetic; a failed refresh is not worth reporting
        let _ = bar.refresh();
        Some(bar)
    }

    /// Advance a progress bar, if any
    pub fn advance(&self, bar: &mut Option<Bar>) {
        if let Some(bar) = bar {
            let _ = bar.update(1);
        }
    }

    /// Remove a progress bar from the terminal
    pub fn finish(&self, bar: Option<Bar>) {
        if let Some(mut bar) = bar {
            let _ = bar.clear();
        }
    }

    /// How to export the session cookies
    pub fn render_setup(&self, cookie_path: &Path, catalog_host: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}\n", self.paint("How to get your cookies", "bold cyan"));

        let _ = writeln!(out, "{}", self.paint("Safari (macOS)", "bold yellow"));
        let _ = writeln!(out, "   Safari doesn't support cookie extensions. Use one of these:");
        let _ = writeln!(out, "   Option A: Use Chrome/Firefox just for cookie export");
        let _ = writeln!(out, "   Option B: Install safari-cookies via Homebrew:");
        let _ = writeln!(out, "            brew install nickvdyck/tap/safari-cookies");
        let _ = writeln!(
            out,
            "            safari-cookies export --domain {} > cookies.txt\n",
            catalog_host
        );

        for (browser, style, extension, link) in [
            (
                "Chrome / Edge / Brave",
                "bold green",
                "Get cookies.txt LOCALLY",
                CHROME_EXTENSION,
            ),
            ("Firefox", "bold magenta", "Export Cookies", FIREFOX_ADDON),
        ] {
            let _ = writeln!(out, "{}", self.paint(browser, style));
            let _ = writeln!(out, "   1. Install: {} ({})", extension, link);
            let _ = writeln!(out, "   2. Go to {} and log in", catalog_host);
            let _ = writeln!(out, "   3. Click extension → Export → Save as cookies.txt\n");
        }

        let _ = writeln!(out, "Save cookies.txt as: {}\n", cookie_path.display());
        let _ = writeln!(
            out,
            "{}",
            self.paint("⚠ Your cookies stay local. Never share them!", "dim")
        );
        out
    }

    /// One line per dependency, for `--check`
    pub fn render_dependency_report(&self, report: &[DependencyStatus]) -> String {
        let mut out = String::new();
        for status in report {
            match &status.location {
                Some(location) => {
                    let _ = writeln!(
                        out,
                        "{} {} installed ({})",
                        self.paint("✓", "bold green"),
                        status.name,
                        location
                    );
                }
                None => {
                    let _ = writeln!(out, "{} {} not found", self.paint("✗", "bold red"), status.name);
                    let _ = writeln!(out, "{} {}", self.paint("ℹ", "bold blue"), status.hint);
                }
            }
        }
        out
    }

    /// Settings in effect for a run
    pub fn render_settings(&self, config: &Config, url_count: usize) -> String {
        let conversion = match config.conversion_target() {
            Some(target) if config.conversion.keep_original => {
                format!("{} (keeping originals)", target)
            }
            Some(target) => target.to_string(),
            None => "none".to_string(),
        };

        let rows = [
            ("URLs", url_count.to_string()),
            (
                "Format",
                format!("{} ({})", config.format, config.format.description()),
            ),
            ("Convert", conversion),
            ("Lyrics", format!("{:?}", config.lyrics).to_lowercase()),
            ("Output", config.output_root.display().to_string()),
            ("Cookies", config.cookie_path.display().to_string()),
        ];

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.paint("Settings", "bold cyan"));
        for (label, value) in rows {
            let _ = writeln!(out, "  {:<8} {}", label, value);
        }
        out
    }

    /// Outcome of a single track, as shown while a collection is processed
    pub fn render_track(&self, track: &TrackResult) -> String {
        let marker = match track.status {
            TrackStatus::Ok => self.paint("✓", "green"),
            TrackStatus::Converted => self.paint("✓", "bold green"),
            TrackStatus::Failed => self.paint("✗", "red"),
        };
        match (&track.status, &track.error_detail) {
            (TrackStatus::Failed, Some(detail)) => {
                format!("{} {:02} {}: {}", marker, track.index, track.title, detail)
            }
            _ => format!("{} {:02} {}", marker, track.index, track.title),
        }
    }

    /// Counts and failed tracks of one collection
    pub fn render_collection(&self, collection: &CollectionResult) -> String {
        let failed = collection.count(TrackStatus::Failed);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {} ok, {} failed, {} converted",
            self.paint(&collection.collection_name, "bold"),
            collection.count(TrackStatus::Ok),
            if failed > 0 {
                self.paint(&failed.to_string(), "bold red")
            } else {
                failed.to_string()
            },
            collection.count(TrackStatus::Converted),
        );
        if let Some(folder) = &collection.output_folder {
            let _ = writeln!(out, "  folder: {}", folder.display());
        }
        for track in collection.failures() {
            let _ = writeln!(
                out,
                "  {} {:02} {}: {}",
                self.paint("✗", "red"),
                track.index,
                track.title,
                track.error_detail.as_deref().unwrap_or("failed")
            );
        }
        out
    }

    /// Final report over every requested URL
    pub fn render_summary(&self, summary: &RunSummary) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", self.paint("Summary", "bold cyan"));
        for collection in &summary.collections {
            out.push_str(&self.render_collection(collection));
        }
        for (url, reason) in &summary.resolution_failures {
            let _ = writeln!(
                out,
                "{} {}: {}",
                self.paint("✗", "bold red"),
                url,
                reason
            );
        }
        out
    }
}
