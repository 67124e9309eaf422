//! Preference manager that merges config.toml defaults with DB overrides.
//!
//! Config values serve as defaults; DB values (user_preferences table) override them.
//! Writes always go to the DB, never to the config file.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::Config;
use crate::storage::{Database, StoreError};

// ============================================================================
// View Preferences
// ============================================================================

/// Which entries a view without intrinsic flags shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShownEntries {
    Unread,
    Starred,
    Trashed,
    #[default]
    All,
}

impl ShownEntries {
    pub fn as_str(self) -> &'static str {
        match self {
            ShownEntries::Unread => "unread",
            ShownEntries::Starred => "starred",
            ShownEntries::Trashed => "trashed",
            ShownEntries::All => "all",
        }
    }
}

impl fmt::Display for ShownEntries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShownEntries {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(ShownEntries::Unread),
            "starred" => Ok(ShownEntries::Starred),
            "trashed" => Ok(ShownEntries::Trashed),
            "all" => Ok(ShownEntries::All),
            other => Err(format!("unknown shown_entries value: {}", other)),
        }
    }
}

/// Snapshot of the preferences a view reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPrefs {
    pub shown_entries: ShownEntries,
    pub entries_per_page: usize,
    pub auto_mark_read: bool,
    pub show_headlines_only: bool,
    pub double_click_marks: bool,
    pub show_authors: bool,
    pub open_entries_in_tabs: bool,
    pub key_nav_enabled: bool,
}

impl From<&Config> for ViewPrefs {
    fn from(config: &Config) -> Self {
        Self {
            shown_entries: config.shown_entries,
            entries_per_page: config.entries_per_page.max(1),
            auto_mark_read: config.auto_mark_read,
            show_headlines_only: config.show_headlines_only,
            double_click_marks: config.double_click_marks,
            show_authors: config.show_authors,
            open_entries_in_tabs: config.open_entries_in_tabs,
            key_nav_enabled: config.key_nav_enabled,
        }
    }
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Preferences as seen by a view.
///
/// Read on every use so changes made elsewhere take effect on the next
/// refresh. `key_nav_enabled` is the only value a view writes back.
pub trait PreferenceSource {
    fn view_prefs(&self) -> ViewPrefs;

    fn enable_key_nav(&mut self);
}

impl PreferenceSource for ViewPrefs {
    fn view_prefs(&self) -> ViewPrefs {
        *self
    }

    fn enable_key_nav(&mut self) {
        self.key_nav_enabled = true;
    }
}

// ============================================================================
// PreferenceManager
// ============================================================================

const KEY_ENTRIES_PER_PAGE: &str = "view.entries_per_page";
const KEY_SHOWN_ENTRIES: &str = "view.shown_entries";
const KEY_AUTO_MARK_READ: &str = "view.auto_mark_read";
const KEY_SHOW_HEADLINES_ONLY: &str = "view.show_headlines_only";
const KEY_DOUBLE_CLICK_MARKS: &str = "view.double_click_marks";
const KEY_SHOW_AUTHORS: &str = "view.show_authors";
const KEY_OPEN_ENTRIES_IN_TABS: &str = "view.open_entries_in_tabs";
const KEY_KEY_NAV_ENABLED: &str = "view.key_nav_enabled";

/// Merged preference store: config.toml defaults + DB overrides.
///
/// On load, config values are flattened into a `HashMap<String, String>`, then
/// all DB preferences are layered on top. Reads are in-memory. Writes made
/// through `PreferenceSource` are synchronous and queued until `flush`.
pub struct PreferenceManager {
    prefs: HashMap<String, String>,
    pending: Vec<(String, String)>,
}

impl PreferenceManager {
    /// Load preferences by merging config defaults with DB overrides.
    pub async fn load(config: &Config, db: &Database) -> Result<Self, StoreError> {
        let mut prefs = Self::flatten_config(config);

        for (key, value) in db.get_preferences_by_prefix("view.").await? {
            prefs.insert(key, value);
        }

        Ok(Self {
            prefs,
            pending: Vec::new(),
        })
    }

    /// Create from config only (no DB), e.g. in demo mode.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefs: Self::flatten_config(config),
            pending: Vec::new(),
        }
    }

    /// Get a preference value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.prefs.get(key).map(String::as_str)
    }

    /// Set a preference: writes to DB and updates in-memory map.
    pub async fn set(&mut self, db: &Database, key: &str, value: &str) -> Result<(), StoreError> {
        db.set_preference(key, value).await?;
        self.prefs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Change the shown entries filter. Persisted on the next `flush`.
    pub fn set_shown_entries(&mut self, shown: ShownEntries) {
        self.queue(KEY_SHOWN_ENTRIES, shown.as_str());
    }

    /// Whether writes are waiting for `flush`.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Persist queued writes.
    pub async fn flush(&mut self, db: &Database) -> Result<(), StoreError> {
        for (key, value) in std::mem::take(&mut self.pending) {
            db.set_preference(&key, &value).await?;
            tracing::debug!(key = %key, value = %value, "Preference persisted");
        }
        Ok(())
    }

    /// Drop queued writes without persisting them.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    fn queue(&mut self, key: &str, value: &str) {
        self.prefs.insert(key.to_string(), value.to_string());
        self.pending.retain(|(k, _)| k != key);
        self.pending.push((key.to_string(), value.to_string()));
    }

    // ========================================================================
    // Type-safe Accessors
    // ========================================================================

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    pub fn entries_per_page(&self) -> usize {
        self.get(KEY_ENTRIES_PER_PAGE)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(20)
    }

    pub fn shown_entries(&self) -> ShownEntries {
        self.get(KEY_SHOWN_ENTRIES)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Flatten Config struct into dotted key-value pairs.
    fn flatten_config(config: &Config) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            KEY_ENTRIES_PER_PAGE.to_string(),
            config.entries_per_page.to_string(),
        );
        map.insert(
            KEY_SHOWN_ENTRIES.to_string(),
            config.shown_entries.to_string(),
        );
        map.insert(
            KEY_AUTO_MARK_READ.to_string(),
            config.auto_mark_read.to_string(),
        );
        map.insert(
            KEY_SHOW_HEADLINES_ONLY.to_string(),
            config.show_headlines_only.to_string(),
        );
        map.insert(
            KEY_DOUBLE_CLICK_MARKS.to_string(),
            config.double_click_marks.to_string(),
        );
        map.insert(
            KEY_SHOW_AUTHORS.to_string(),
            config.show_authors.to_string(),
        );
        map.insert(
            KEY_OPEN_ENTRIES_IN_TABS.to_string(),
            config.open_entries_in_tabs.to_string(),
        );
        map.insert(
            KEY_KEY_NAV_ENABLED.to_string(),
            config.key_nav_enabled.to_string(),
        );

        map
    }
}

impl PreferenceSource for PreferenceManager {
    fn view_prefs(&self) -> ViewPrefs {
        let defaults = ViewPrefs::default();
        ViewPrefs {
            shown_entries: self.shown_entries(),
            entries_per_page: self.entries_per_page(),
            auto_mark_read: self.flag(KEY_AUTO_MARK_READ, defaults.auto_mark_read),
            show_headlines_only: self.flag(KEY_SHOW_HEADLINES_ONLY, defaults.show_headlines_only),
            double_click_marks: self.flag(KEY_DOUBLE_CLICK_MARKS, defaults.double_click_marks),
            show_authors: self.flag(KEY_SHOW_AUTHORS, defaults.show_authors),
            open_entries_in_tabs: self.flag(KEY_OPEN_ENTRIES_IN_TABS, defaults.open_entries_in_tabs),
            key_nav_enabled: self.flag(KEY_KEY_NAV_ENABLED, defaults.key_nav_enabled),
        }
    }

    fn enable_key_nav(&mut self) {
        if !self.flag(KEY_KEY_NAV_ENABLED, false) {
            self.queue(KEY_KEY_NAV_ENABLED, "true");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
