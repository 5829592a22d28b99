//! Configuration types for catalog-dl
//!
//! A [`Config`] is built once at the command line boundary (defaults, then an
//! optional TOML file, then flags) and handed to the pipeline.

use crate::error::{Error, Result};
use crate::types::{AudioFormat, LyricsMode, TranscodeTarget};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// External tool locations
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to a `gamdl` executable (auto-detected if None)
    #[serde(default)]
    pub gamdl_path: Option<PathBuf>,

    /// Python interpreter used for `python -m gamdl` when no `gamdl` executable exists
    #[serde(default)]
    pub python_path: Option<PathBuf>,

    /// Path to the ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            gamdl_path: None,
            python_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Conversion settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Target format when conversion is enabled (default: FLAC)
    #[serde(default)]
    pub target: TranscodeTarget,

    /// FLAC compression level 0-12 (default: 8)
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,

    /// Keep the fetched file next to the converted one (default: false)
    #[serde(default)]
    pub keep_original: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target: TranscodeTarget::default(),
            compression_level: default_compression_level(),
            keep_original: false,
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory collections are written under (default: "./downloads")
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Exported session cookie file (default: "./cookies.txt")
    #[serde(default = "default_cookie_path")]
    pub cookie_path: PathBuf,

    /// Audio format requested from the downloader
    #[serde(default)]
    pub format: AudioFormat,

    /// Convert fetched tracks to `conversion.target` (FLAC unless configured otherwise)
    #[serde(default)]
    pub convert: bool,

    /// Conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Lyrics handling passed to the downloader
    #[serde(default)]
    pub lyrics: LyricsMode,

    /// Catalog web host URLs must point at (default: "music.apple.com")
    #[serde(default = "default_catalog_host")]
    pub catalog_host: String,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            cookie_path: default_cookie_path(),
            format: AudioFormat::default(),
            convert: false,
            conversion: ConversionConfig::default(),
            lyrics: LyricsMode::default(),
            catalog_host: default_catalog_host(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration file; missing keys take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            Error::Config { message, key } => Error::Config {
                message: format!("{}: {}", path.display(), message),
                key,
            },
            other => other,
        })
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
            message: e.message().to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.conversion.compression_level > 12 {
            return Err(Error::Config {
                message: format!(
                    "compression level {} is out of range 0-12",
                    self.conversion.compression_level
                ),
                key: Some("conversion.compression_level".to_string()),
            });
        }
        if self.catalog_host.trim().is_empty() || self.catalog_host.contains('/') {
            return Err(Error::Config {
                message: format!("invalid catalog host {:?}", self.catalog_host),
                key: Some("catalog_host".to_string()),
            });
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "output root must not be empty".to_string(),
                key: Some("output_root".to_string()),
            });
        }
        Ok(())
    }

    /// Conversion applied to fetched tracks, if enabled
    pub fn conversion_target(&self) -> Option<TranscodeTarget> {
        self.convert.then_some(self.conversion.target)
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_cookie_path() -> PathBuf {
    PathBuf::from("./cookies.txt")
}

fn default_catalog_host() -> String {
    "music.apple.com".to_string()
}

fn default_compression_level() -> u8 {
    8
}

fn default_true() -> bool {
    true
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conventional_paths() {
        let config = Config::default();
        assert_eq!(config.output_root, PathBuf::from("./downloads"));
        assert_eq!(config.cookie_path, PathBuf::from("./cookies.txt"));
        assert_eq!(config.format, AudioFormat::AacLegacy);
        assert!(!config.convert);
        assert_eq!(config.conversion.compression_level, 8);
        assert!(config.tools.search_path);
        assert!(config.conversion_target().is_none());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn toml_overrides_nested_sections() {
        let config = Config::from_toml_str(
            r#"
            output_root = "/music"
            format = "aac-he-legacy"
            convert = true
            lyrics = "lrc"

            [conversion]
            target = "opus"
            keep_original = true

            [tools]
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            search_path = false
            "#,
        )
        .unwrap();

        assert_eq!(config.output_root, PathBuf::from("/music"));
        assert_eq!(config.format, AudioFormat::AacHeLegacy);
        assert_eq!(config.lyrics, LyricsMode::Lrc);
        assert_eq!(config.conversion_target(), Some(TranscodeTarget::Opus));
        assert!(config.conversion.keep_original);
        assert_eq!(config.conversion.compression_level, 8);
        assert_eq!(
            config.tools.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert!(!config.tools.search_path);
    }

    #[test]
    fn unknown_format_is_a_config_error() {
        let result = Config::from_toml_str(r#"format = "mp5""#);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn compression_level_out_of_range_names_the_key() {
        let result = Config::from_toml_str("[conversion]\ncompression_level = 13\n");
        match result {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("conversion.compression_level"));
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn catalog_host_with_path_is_rejected() {
        let config = Config {
            catalog_host: "music.apple.com/us".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_toml_file(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::Config { key: None, .. })));
    }

    #[test]
    fn config_file_errors_mention_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog-dl.toml");
        std::fs::write(&path, "convert = \"yes\"").unwrap();
        match Config::from_toml_file(&path) {
            Err(Error::Config { message, .. }) => {
                assert!(message.contains("catalog-dl.toml"), "{}", message);
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
