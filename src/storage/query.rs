//! Entry selection descriptor.
//!
//! A `Query` selects a subset of entries. It never carries pagination: the
//! offset and limit of a page are passed next to it (see `EntryStore::entries`),
//! so `count` and `ids` always see the whole, unpaginated selection.
//! Results are always ordered by publication date, newest first, with the
//! entry id as a tie breaker.

use super::types::{DeletionState, Entry};

/// Filter state selecting entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Only read entries.
    pub read: bool,
    /// Only unread entries.
    pub unread: bool,
    /// Only starred entries.
    pub starred: bool,
    /// Only entries that are not starred.
    pub unstarred: bool,
    pub deleted: DeletionState,
    /// Restrict to feeds in these folders. `None` means no restriction.
    pub folders: Option<Vec<i64>>,
    /// Restrict to these feeds. `None` means no restriction.
    pub feeds: Option<Vec<i64>>,
    /// Case-insensitive substring searched in title and content.
    pub search: Option<String>,
}

impl Query {
    /// Query matching every non-deleted entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Query matching the entries of a single feed.
    pub fn feed(feed_id: i64) -> Self {
        Self {
            feeds: Some(vec![feed_id]),
            ..Self::default()
        }
    }

    /// Whether the flags of this query pin the view to a fixed subset, such as
    /// the special "Unread" or "Trash" views. Such views ignore the global
    /// shown-entries preference.
    pub fn has_intrinsic_flags(&self) -> bool {
        self.read
            || self.unread
            || self.starred
            || self.unstarred
            || self.deleted != DeletionState::Normal
    }

    /// The single feed this query is restricted to, if any.
    pub fn single_feed(&self) -> Option<i64> {
        match self.feeds.as_deref() {
            Some([feed_id]) => Some(*feed_id),
            _ => None,
        }
    }

    /// Search string, ignoring blank ones.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Evaluate the query against an entry.
    ///
    /// `folder_id` is the folder of the entry's feed and `trashed` its
    /// deletion state. Used by in-process stores; SQL stores translate the
    /// same rules into a WHERE clause.
    pub fn matches(&self, entry: &Entry, folder_id: Option<i64>, trashed: bool) -> bool {
        if self.read && !entry.read {
            return false;
        }
        if self.unread && entry.read {
            return false;
        }
        if self.starred && !entry.starred {
            return false;
        }
        if self.unstarred && entry.starred {
            return false;
        }
        if !self.deleted.matches(trashed) {
            return false;
        }
        if let Some(feeds) = &self.feeds {
            if !feeds.contains(&entry.feed_id) {
                return false;
            }
        }
        if let Some(folders) = &self.folders {
            match folder_id {
                Some(folder) if folders.contains(&folder) => {}
                _ => return false,
            }
        }
        if let Some(needle) = self.search_text() {
            let needle = needle.to_lowercase();
            let in_title = entry.title.to_lowercase().contains(&needle);
            let in_content = entry
                .content
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle));
            if !in_title && !in_content {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(read: bool, starred: bool) -> Entry {
        Entry {
            id: 1,
            feed_id: 7,
            title: Arc::from("Rust 2024 edition released"),
            url: None,
            content: Some(Arc::from("Async closures are stable")),
            authors: None,
            published: Some(1_700_000_000),
            read,
            starred,
            updated: false,
        }
    }

    #[test]
    fn test_intrinsic_flags() {
        assert!(!Query::all().has_intrinsic_flags());
        assert!(!Query::feed(3).has_intrinsic_flags());
        let unread = Query {
            unread: true,
            ..Query::default()
        };
        assert!(unread.has_intrinsic_flags());
        let trash = Query {
            deleted: DeletionState::Trashed,
            ..Query::default()
        };
        assert!(trash.has_intrinsic_flags());
    }

    #[test]
    fn test_single_feed() {
        assert_eq!(Query::feed(3).single_feed(), Some(3));
        let two = Query {
            feeds: Some(vec![1, 2]),
            ..Query::default()
        };
        assert_eq!(two.single_feed(), None);
        assert_eq!(Query::all().single_feed(), None);
    }

    #[test]
    fn test_blank_search_ignored() {
        let q = Query {
            search: Some("   ".to_string()),
            ..Query::default()
        };
        assert_eq!(q.search_text(), None);
        assert!(q.matches(&entry(false, false), None, false));
    }

    #[test]
    fn test_matches_flags() {
        let unread = Query {
            unread: true,
            ..Query::default()
        };
        assert!(unread.matches(&entry(false, false), None, false));
        assert!(!unread.matches(&entry(true, false), None, false));

        let starred = Query {
            starred: true,
            ..Query::default()
        };
        assert!(starred.matches(&entry(true, true), None, false));
        assert!(!starred.matches(&entry(true, false), None, false));
    }

    #[test]
    fn test_matches_deletion_state() {
        let normal = Query::all();
        assert!(!normal.matches(&entry(false, false), None, true));

        let trash = Query {
            deleted: DeletionState::Trashed,
            ..Query::default()
        };
        assert!(trash.matches(&entry(false, false), None, true));
        assert!(!trash.matches(&entry(false, false), None, false));

        let any = Query {
            deleted: DeletionState::Any,
            ..Query::default()
        };
        assert!(any.matches(&entry(false, false), None, true));
        assert!(any.matches(&entry(false, false), None, false));
    }

    #[test]
    fn test_matches_feeds_and_folders() {
        assert!(Query::feed(7).matches(&entry(false, false), None, false));
        assert!(!Query::feed(8).matches(&entry(false, false), None, false));

        let folder = Query {
            folders: Some(vec![2]),
            ..Query::default()
        };
        assert!(folder.matches(&entry(false, false), Some(2), false));
        assert!(!folder.matches(&entry(false, false), Some(3), false));
        assert!(!folder.matches(&entry(false, false), None, false));
    }

    #[test]
    fn test_matches_search_case_insensitive() {
        let title = Query {
            search: Some("EDITION".to_string()),
            ..Query::default()
        };
        assert!(title.matches(&entry(false, false), None, false));

        let content = Query {
            search: Some("closures".to_string()),
            ..Query::default()
        };
        assert!(content.matches(&entry(false, false), None, false));

        let miss = Query {
            search: Some("python".to_string()),
            ..Query::default()
        };
        assert!(!miss.matches(&entry(false, false), None, false));
    }
}
