//! In-process entry store.
//!
//! Cloning a `MemoryStore` yields another handle to the same data, so a test
//! or a background actor can mutate entries while a view holds its own
//! handle, exactly like two connections to the same database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::query::Query;
use super::store::EntryStore;
use super::types::{DeletionState, Entry, EntryId, Feed, NewEntry, NewFeed, StoreError};

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: Entry,
    trashed: bool,
}

#[derive(Debug, Default)]
struct Inner {
    feeds: HashMap<i64, Feed>,
    entries: Vec<StoredEntry>,
    next_feed_id: i64,
    next_entry_id: EntryId,
}

impl Inner {
    /// Matching entries in store order (newest first, id as tie breaker).
    fn select(&self, query: &Query) -> Vec<&Entry> {
        let mut matched: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|stored| {
                let folder = self
                    .feeds
                    .get(&stored.entry.feed_id)
                    .and_then(|f| f.folder_id);
                query.matches(&stored.entry, folder, stored.trashed)
            })
            .map(|stored| &stored.entry)
            .collect();
        matched.sort_by(|a, b| {
            b.published
                .unwrap_or(0)
                .cmp(&a.published.unwrap_or(0))
                .then(b.id.cmp(&a.id))
        });
        matched
    }

    fn for_each_id(&mut self, ids: &[EntryId], mut f: impl FnMut(&mut StoredEntry)) {
        for stored in self.entries.iter_mut() {
            if ids.contains(&stored.entry.id) {
                f(stored);
            }
        }
    }
}

/// Shared in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Mutations are single field writes, so poisoned data is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_feed(&self, feed: NewFeed) -> i64 {
        let mut inner = self.lock();
        inner.next_feed_id += 1;
        let id = inner.next_feed_id;
        inner.feeds.insert(
            id,
            Feed {
                id,
                title: Arc::from(feed.title),
                url: feed.url,
                html_url: feed.html_url,
                image_url: feed.image_url,
                image_title: feed.image_title,
                subtitle: feed.subtitle,
                folder_id: feed.folder_id,
            },
        );
        id
    }

    pub fn insert_entry(&self, feed_id: i64, entry: NewEntry) -> EntryId {
        let mut inner = self.lock();
        inner.next_entry_id += 1;
        let id = inner.next_entry_id;
        inner.entries.push(StoredEntry {
            entry: Entry {
                id,
                feed_id,
                title: Arc::from(entry.title),
                url: entry.url.map(Arc::from),
                content: entry.content.map(Arc::from),
                authors: entry.authors,
                published: entry.published,
                read: false,
                starred: false,
                updated: entry.updated,
            },
            trashed: false,
        });
        id
    }

    /// Permanently remove an entry, as a purge by another actor would.
    pub fn remove_entry(&self, id: EntryId) -> bool {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|stored| stored.entry.id != id);
        inner.entries.len() != before
    }

    /// Current state of an entry regardless of any filter.
    pub fn entry(&self, id: EntryId) -> Option<Entry> {
        self.lock()
            .entries
            .iter()
            .find(|stored| stored.entry.id == id)
            .map(|stored| stored.entry.clone())
    }

    pub fn is_trashed(&self, id: EntryId) -> bool {
        self.lock()
            .entries
            .iter()
            .any(|stored| stored.entry.id == id && stored.trashed)
    }
}

impl EntryStore for MemoryStore {
    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        Ok(self.lock().select(query).len())
    }

    async fn ids(&self, query: &Query) -> Result<Vec<EntryId>, StoreError> {
        Ok(self.lock().select(query).iter().map(|e| e.id).collect())
    }

    async fn entries(
        &self,
        query: &Query,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        Ok(self
            .lock()
            .select(query)
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, ids: &[EntryId], read: bool) -> Result<(), StoreError> {
        self.lock().for_each_id(ids, |stored| stored.entry.read = read);
        Ok(())
    }

    async fn star(&self, ids: &[EntryId], starred: bool) -> Result<(), StoreError> {
        self.lock()
            .for_each_id(ids, |stored| stored.entry.starred = starred);
        Ok(())
    }

    async fn set_deletion_state(
        &self,
        ids: &[EntryId],
        state: DeletionState,
    ) -> Result<(), StoreError> {
        let trashed = match state {
            DeletionState::Normal => false,
            DeletionState::Trashed => true,
            DeletionState::Any => return Ok(()),
        };
        self.lock().for_each_id(ids, |stored| stored.trashed = trashed);
        Ok(())
    }

    async fn feed(&self, feed_id: i64) -> Result<Option<Feed>, StoreError> {
        Ok(self.lock().feeds.get(&feed_id).cloned())
    }
}
