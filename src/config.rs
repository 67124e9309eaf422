//! Configuration file parser for ~/.config/feedview/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::preferences::ShownEntries;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// View defaults read from the config file.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Values stored in the database's `user_preferences` table override these
/// (see `PreferenceManager`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entries rendered per page.
    pub entries_per_page: usize,

    /// Which entries non-intrinsic views show.
    pub shown_entries: ShownEntries,

    /// Mark entries read once they have been scrolled past.
    pub auto_mark_read: bool,

    /// Render entries collapsed to their headline.
    pub show_headlines_only: bool,

    /// Double-click toggles the read state instead of a single click.
    pub double_click_marks: bool,

    /// Prefix author lists with "by ".
    pub show_authors: bool,

    /// Open entry links in a new surface rather than in place.
    pub open_entries_in_tabs: bool,

    /// Keyboard selection is active. Turned on by the first explicit selection.
    pub key_nav_enabled: bool,

    /// Rows at the bottom of the viewport that do not count as read.
    pub read_margin: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entries_per_page: 20,
            shown_entries: ShownEntries::All,
            auto_mark_read: true,
            show_headlines_only: false,
            double_click_marks: false,
            show_authors: true,
            open_entries_in_tabs: true,
            key_nav_enabled: false,
            read_margin: 2,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "entries_per_page",
        "shown_entries",
        "auto_mark_read",
        "show_headlines_only",
        "double_click_marks",
        "show_authors",
        "open_entries_in_tabs",
        "key_nav_enabled",
        "read_margin",
    ];

    /// Default location: `$XDG_CONFIG_HOME/feedview/config.toml`, falling back
    /// to `~/.config/feedview/config.toml`.
    pub fn default_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
            return PathBuf::from(dir).join("feedview");
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedview")
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse TOML text. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            entries_per_page = config.entries_per_page,
            shown_entries = ?config.shown_entries,
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
