//! Keeping the rendered page consistent with the store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::preferences::{PreferenceSource, ViewPrefs};
use crate::storage::{DeletionState, Entry, EntryId, EntryStore, Query, StoreError};

use super::materialize::{EmptyReason, EntryCard};
use super::render::{FeedHeader, PageHeader, RenderInstruction, Renderer};
use super::selection::SelectPolicy;
use super::session::{PendingRemoval, RenderedEntry, COMPUTE_PAGES_DELAY, SETTLE_DELAY, SNAPSHOT_DELAY};
use super::ViewController;

impl<S, R, P> ViewController<S, R, P>
where
    S: EntryStore,
    R: Renderer,
    P: PreferenceSource,
{
    /// Check that the view shows the right entries and title, refreshing it
    /// when it does not.
    ///
    /// A single removal inside the current page is patched in place; any
    /// other change in the entry count rebuilds the page. A hidden view, or
    /// one still loading or settling, is treated as up to date.
    ///
    /// Returns `true` if the view was already up to date.
    pub async fn ensure(&mut self, force: bool) -> Result<bool, StoreError> {
        if force && self.force_refresh() {
            return Ok(false);
        }

        if !self.surface.is_presented() || self.session.loading || self.session.removal.is_some() {
            return Ok(true);
        }

        let query = self.query();
        let current_count = self.store.count(&query).await?;

        if self.session.snapshot.is_none() || current_count == 0 {
            tracing::debug!(current_count, "No snapshot or no entries, full refresh");
            self.refresh();
            return Ok(false);
        }

        let mut dirty = false;
        let known_count = self.session.pages.entries_count();

        if known_count.checked_sub(current_count) == Some(1) {
            let ids = self.store.ids(&query).await?;
            let Some((index, removed)) = self.find_removed(&ids) else {
                tracing::debug!("Count dropped by one without a removal, full refresh");
                self.refresh();
                return Ok(false);
            };

            let page = self.session.pages.current_page();
            if self.session.rendered.len() == 1 && page == self.session.pages.page_count() {
                tracing::debug!(page, "Last entry of the last page removed");
                if !self.set_current_page(page - 1) {
                    self.refresh();
                }
                return Ok(false);
            }

            let per_page = self.view_prefs_page_size();
            if !self.session.pages.index_range(per_page).contains(&index) {
                tracing::debug!(entry_id = removed, index, "Removed entry is off the page, full refresh");
                self.refresh();
                return Ok(false);
            }

            if !self.remove_incrementally(removed) {
                self.refresh();
                return Ok(false);
            }
            self.session.snapshot = Some(ids);
            dirty = true;
        } else if known_count != current_count {
            tracing::debug!(known_count, current_count, "Entry count changed, full refresh");
            self.refresh();
            return Ok(false);
        }

        let title = self.session.display_title().to_string();
        if self.session.rendered_title.as_deref() != Some(title.as_str()) {
            self.surface.apply(RenderInstruction::Title(title.clone()));
            self.session.rendered_title = Some(title);
            dirty = true;
        }

        Ok(!dirty)
    }

    /// First snapshot entry missing from `ids`, with its snapshot index.
    fn find_removed(&self, ids: &[EntryId]) -> Option<(usize, EntryId)> {
        let current: HashSet<EntryId> = ids.iter().copied().collect();
        self.session
            .snapshot
            .as_deref()?
            .iter()
            .enumerate()
            .find(|(_, id)| !current.contains(id))
            .map(|(index, id)| (index, *id))
    }

    fn view_prefs_page_size(&self) -> usize {
        self.prefs.view_prefs().entries_per_page.max(1)
    }

    /// Refresh if presented. Returns whether it did.
    pub(super) fn force_refresh(&mut self) -> bool {
        if !self.surface.is_presented() {
            return false;
        }
        self.refresh();
        true
    }

    /// Rebuild the page from scratch. The build itself runs when the surface
    /// reports `Loaded`.
    pub(super) fn refresh(&mut self) {
        tracing::debug!(
            session = self.session.id,
            page = self.session.pages.current_page(),
            "Full refresh"
        );
        let session = &mut self.session;
        session.loading = true;
        session.selection.await_render();
        session.auto_read.cancel();
        session.settle_timer.cancel();
        session.removal = None;
        session.compute_pages_timer.cancel();
        session.rendered.clear();
        session.rendered_title = None;
        session.snapshot_timer.schedule(SNAPSHOT_DELAY);
        self.surface.apply(RenderInstruction::Reset);
    }

    pub(super) async fn capture_snapshot(&mut self) -> Result<(), StoreError> {
        let ids = self.store.ids(&self.query()).await?;
        tracing::debug!(count = ids.len(), "Snapshot captured");
        self.session.snapshot = Some(ids);
        Ok(())
    }

    /// Start removing one rendered entry. Returns false if it is not rendered.
    fn remove_incrementally(&mut self, removed: EntryId) -> bool {
        let Some(index) = self.session.position(removed) else {
            return false;
        };
        let was_selected = self.selected() == Some(removed);
        let (next, previous) = if was_selected {
            let rendered = &self.session.rendered;
            (
                rendered.get(index + 1).map(|e| e.id),
                index.checked_sub(1).and_then(|i| rendered.get(i)).map(|e| e.id),
            )
        } else {
            (None, None)
        };

        if was_selected {
            self.select_entry(None, false, false);
        }

        tracing::debug!(entry_id = removed, was_selected, "Incremental removal");
        self.surface.apply(RenderInstruction::Remove {
            id: removed,
            animated: true,
        });
        self.session.rendered.remove(index);
        self.session.removal = Some(PendingRemoval {
            removed,
            was_selected,
            next,
            previous,
        });
        self.session.settle_timer.schedule(SETTLE_DELAY);
        true
    }

    /// Backfill the page once the removal animation is over.
    pub(super) async fn finish_removal(&mut self) -> Result<(), StoreError> {
        let Some(removal) = self.session.removal.take() else {
            return Ok(());
        };
        self.compute_pages().await?;

        let stale = self
            .session
            .snapshot
            .as_ref()
            .is_some_and(|ids| ids.len() != self.session.pages.entries_count());
        if stale {
            tracing::debug!(entry_id = removal.removed, "Store changed while settling, full refresh");
            self.refresh();
            return Ok(());
        }

        let prefs = self.prefs.view_prefs();
        let query = self.query();
        let offset = self.session.pages.backfill_offset(prefs.entries_per_page);
        let fetched = self.store.entries(&query, offset, 1).await?;

        let mut appended = None;
        if let Some(entry) = fetched.first() {
            if self.append_entry(entry, &prefs, &Local::now()).await? {
                appended = Some(entry.id);
            }
        }

        if self.session.rendered.is_empty() {
            self.show_empty(&query);
        }

        if removal.was_selected {
            let on_page = |id: &EntryId| self.session.is_rendered(*id);
            let target = removal
                .next
                .filter(on_page)
                .or(appended)
                .or(removal.previous.filter(on_page));
            self.select_entry(target, false, false);
        }
        Ok(())
    }

    /// Recount entries and republish the page indicator.
    pub(super) async fn compute_pages(&mut self) -> Result<(), StoreError> {
        let per_page = self.view_prefs_page_size();
        let count = self.store.count(&self.query()).await?;
        self.session.pages.recompute(count, per_page);
        tracing::debug!(
            entries = count,
            pages = self.session.pages.page_count(),
            page = self.session.pages.current_page(),
            "Pages computed"
        );
        self.surface
            .apply(RenderInstruction::Pagination(self.session.pages.indicator()));
        Ok(())
    }

    /// Build the page after the surface loaded.
    pub(super) async fn build(&mut self) -> Result<(), StoreError> {
        let prefs = self.prefs.view_prefs();
        let query = self.query();

        let feed = match query.single_feed() {
            Some(feed_id) => self.store.feed(feed_id).await?,
            None => None,
        };
        let feed_header = feed
            .as_ref()
            .filter(|_| query.search_text().is_none())
            .map(|f| FeedHeader {
                link: f.html_url.clone().unwrap_or_else(|| f.url.clone()),
                image_url: f.image_url.clone(),
                image_title: f.image_title.clone(),
                subtitle: f.subtitle.clone(),
            });
        if let Some(feed) = &feed {
            self.session
                .feed_names
                .insert(feed.id, Arc::clone(&feed.title));
        }

        let title = self.session.display_title().to_string();
        self.surface.apply(RenderInstruction::Header(PageHeader {
            title: title.clone(),
            feed: feed_header,
            trash: query.deleted == DeletionState::Trashed,
            show_feed_names: feed.is_none(),
            headlines_only: prefs.show_headlines_only,
            double_click_marks: prefs.double_click_marks,
        }));
        self.session.rendered_title = Some(title);

        let (offset, limit) = self.session.pages.window(prefs.entries_per_page);
        let mut entries = self.store.entries(&query, offset, limit).await?;
        if entries.is_empty() {
            // The page may be past the end after entries went away.
            self.compute_pages().await?;
            let (offset, limit) = self.session.pages.window(prefs.entries_per_page);
            entries = self.store.entries(&query, offset, limit).await?;
        } else {
            self.session.compute_pages_timer.schedule(COMPUTE_PAGES_DELAY);
        }

        let now = Local::now();
        for entry in &entries {
            self.append_entry(entry, &prefs, &now).await?;
        }
        if self.session.rendered.is_empty() {
            self.show_empty(&query);
        }

        let policy = self.session.selection.finish_render();
        if prefs.key_nav_enabled {
            let first = self.session.rendered.first().map(|e| e.id);
            match policy {
                SelectPolicy::Preserve(id) if self.session.is_rendered(id) => {
                    self.select_entry(Some(id), true, false)
                }
                SelectPolicy::Last => {
                    let last = self.session.rendered.last().map(|e| e.id);
                    self.select_entry(last, true, false);
                }
                _ => self.select_entry(first, false, false),
            }
        } else {
            self.session.selection.set_selected(None);
        }

        tracing::debug!(
            page = self.session.pages.current_page(),
            entries = self.session.rendered.len(),
            "View built"
        );
        self.on_scrolled();
        Ok(())
    }

    /// Append a card unless the entry is already on the page.
    async fn append_entry(
        &mut self,
        entry: &Entry,
        prefs: &ViewPrefs,
        now: &DateTime<Local>,
    ) -> Result<bool, StoreError> {
        if self.session.is_rendered(entry.id) {
            return Ok(false);
        }
        let feed_name = self.feed_name(entry.feed_id).await?;
        let card = EntryCard::new(entry, feed_name, prefs, now);
        self.session.rendered.push(RenderedEntry {
            id: card.id,
            url: card.url.clone(),
            read: card.read,
            starred: card.starred,
            collapsed: card.collapsed,
        });
        self.surface.apply(RenderInstruction::Append(Box::new(card)));
        Ok(true)
    }

    async fn feed_name(&mut self, feed_id: i64) -> Result<Arc<str>, StoreError> {
        if let Some(name) = self.session.feed_names.get(&feed_id) {
            return Ok(Arc::clone(name));
        }
        let name = match self.store.feed(feed_id).await? {
            Some(feed) => feed.title,
            None => Arc::from(""),
        };
        self.session.feed_names.insert(feed_id, Arc::clone(&name));
        Ok(name)
    }

    fn show_empty(&mut self, query: &Query) {
        let reason = EmptyReason::for_query(query, self.session.flags_intrinsic);
        self.surface.apply(RenderInstruction::Empty(reason));
    }
}
