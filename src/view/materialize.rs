//! Turning store entries into render-ready cards.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::preferences::ViewPrefs;
use crate::storage::{DeletionState, Entry, EntryId, Query};

/// Everything the surface needs to draw one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCard {
    pub id: EntryId,
    pub url: Option<Arc<str>>,
    pub title: Arc<str>,
    pub content: Option<Arc<str>>,
    /// Author list, already prefixed with "by ".
    pub authors: Option<String>,
    /// Relative date label, `None` for undated entries.
    pub date: Option<String>,
    pub read: bool,
    pub starred: bool,
    pub updated: bool,
    pub feed_name: Arc<str>,
    pub collapsed: bool,
}

impl EntryCard {
    pub fn new<Tz: TimeZone>(
        entry: &Entry,
        feed_name: Arc<str>,
        prefs: &ViewPrefs,
        now: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let authors = entry
            .authors
            .as_deref()
            .map(str::trim)
            .filter(|a| prefs.show_authors && !a.is_empty())
            .map(|a| format!("by {}", a));

        let date = entry
            .published
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .map(|utc| date_label(&utc.with_timezone(&now.timezone()), now));

        Self {
            id: entry.id,
            url: entry.url.clone(),
            title: Arc::clone(&entry.title),
            content: entry.content.clone(),
            authors,
            date,
            read: entry.read,
            starred: entry.starred,
            updated: entry.updated,
            feed_name,
            collapsed: prefs.show_headlines_only,
        }
    }
}

/// Date label relative to `now`, on calendar days of the given time zone.
///
/// Today and yesterday are named, the rest of the week uses the weekday,
/// older dates the day and month, plus the year when it differs.
pub fn date_label<Tz: TimeZone>(at: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let days = (now.date_naive() - at.date_naive()).num_days();
    match days {
        0 => format!("Today, {}", at.format("%H:%M")),
        1 => format!("Yesterday, {}", at.format("%H:%M")),
        2..=6 => at.format("%A, %H:%M").to_string(),
        _ if at.year() == now.year() => at.format("%-d %B, %H:%M").to_string(),
        _ => at.format("%-d %B %Y, %H:%M").to_string(),
    }
}

/// Why a page has no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    SearchEmpty,
    NoUnread,
    NoStarredGlobal,
    NoStarredInFeed,
    TrashEmpty,
    NoEntries,
}

impl EmptyReason {
    /// `intrinsic` tells whether the query flags were fixed at construction.
    pub fn for_query(query: &Query, intrinsic: bool) -> Self {
        if query.search_text().is_some() {
            EmptyReason::SearchEmpty
        } else if query.unread {
            EmptyReason::NoUnread
        } else if query.starred && intrinsic {
            EmptyReason::NoStarredGlobal
        } else if query.starred {
            EmptyReason::NoStarredInFeed
        } else if query.deleted == DeletionState::Trashed {
            EmptyReason::TrashEmpty
        } else {
            EmptyReason::NoEntries
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            EmptyReason::SearchEmpty => "No entries found.",
            EmptyReason::NoUnread => "No unread entries.",
            EmptyReason::NoStarredGlobal => "No starred entries.",
            EmptyReason::NoStarredInFeed => "No starred entries in this feed.",
            EmptyReason::TrashEmpty => "Trash is empty.",
            EmptyReason::NoEntries => "No entries.",
        }
    }
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
