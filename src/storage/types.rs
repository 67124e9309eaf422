use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Store errors with user-friendly messages
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another instance of the application has locked the database
    #[error("Another instance of feedview appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StoreError::InstanceLocked;
        }

        StoreError::Other(err)
    }
}

// ============================================================================
// Identifiers and States
// ============================================================================

/// Store-assigned entry identifier.
pub type EntryId = i64;

/// Deletion state of an entry, also used as a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionState {
    /// Regular, visible entry.
    #[default]
    Normal,
    /// Moved to the trash, restorable.
    Trashed,
    /// Query filter only: matches both of the above.
    Any,
}

impl DeletionState {
    /// Column value for stored states. `Any` is never stored.
    pub(crate) fn as_column(self) -> Option<i64> {
        match self {
            DeletionState::Normal => Some(0),
            DeletionState::Trashed => Some(1),
            DeletionState::Any => None,
        }
    }

    pub(crate) fn matches(self, trashed: bool) -> bool {
        match self {
            DeletionState::Normal => !trashed,
            DeletionState::Trashed => trashed,
            DeletionState::Any => true,
        }
    }
}

// ============================================================================
// Internal Row Types
// ============================================================================

/// Internal row type for entry queries (used by sqlx FromRow)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryDbRow {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub authors: Option<String>,
    pub published: Option<i64>,
    pub read: bool,
    pub starred: bool,
    pub updated: bool,
}

impl EntryDbRow {
    pub(crate) fn into_entry(self) -> Entry {
        Entry {
            id: self.id,
            feed_id: self.feed_id,
            title: Arc::from(self.title),
            url: self.url.map(Arc::from),
            content: self.content.map(Arc::from),
            authors: self.authors,
            published: self.published,
            read: self.read,
            starred: self.starred,
            updated: self.updated,
        }
    }
}

/// Internal row type for feed queries
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedDbRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub html_url: Option<String>,
    pub image_url: Option<String>,
    pub image_title: Option<String>,
    pub subtitle: Option<String>,
    pub folder_id: Option<i64>,
}

impl FeedDbRow {
    pub(crate) fn into_feed(self) -> Feed {
        Feed {
            id: self.id,
            title: Arc::from(self.title),
            url: self.url,
            html_url: self.html_url,
            image_url: self.image_url,
            image_title: self.image_title,
            subtitle: self.subtitle,
            folder_id: self.folder_id,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Feed as seen by the view: its name and the optional single-feed header data.
///
/// `title` uses `Arc<str>` for cheap cloning into the per-view feed name cache.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: i64,
    pub title: Arc<str>,
    pub url: String,
    pub html_url: Option<String>,
    pub image_url: Option<String>,
    pub image_title: Option<String>,
    pub subtitle: Option<String>,
    pub folder_id: Option<i64>,
}

/// Entry owned by the store. The view only reads it and requests mutations.
///
/// String fields use `Arc<str>` for cheap cloning into rendered cards.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: EntryId,
    pub feed_id: i64,
    pub title: Arc<str>,
    pub url: Option<Arc<str>>,
    pub content: Option<Arc<str>>,
    /// Comma-separated author list as published by the feed.
    pub authors: Option<String>,
    /// Unix timestamp (seconds).
    pub published: Option<i64>,
    pub read: bool,
    pub starred: bool,
    /// The entry was revised upstream after it was first fetched.
    pub updated: bool,
}

/// Feed definition used when seeding a store.
#[derive(Debug, Clone, Default)]
pub struct NewFeed {
    pub title: String,
    pub url: String,
    pub html_url: Option<String>,
    pub image_url: Option<String>,
    pub image_title: Option<String>,
    pub subtitle: Option<String>,
    pub folder_id: Option<i64>,
}

/// Entry definition used when seeding a store.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub guid: String,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub authors: Option<String>,
    pub published: Option<i64>,
    pub updated: bool,
}
