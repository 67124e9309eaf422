//! Marking entries read once they have been on screen.

use std::collections::HashSet;

use crate::preferences::ViewPrefs;
use crate::storage::{EntryId, Query};

use super::render::{EntryGeometry, Viewport};
use super::session::{Deferred, AUTO_READ_DEBOUNCE};

/// Debounced visibility scan.
#[derive(Debug)]
pub struct AutoReadScheduler {
    /// Entries the user marked unread in this view instance.
    marked_unread: HashSet<EntryId>,
    debounce: Deferred,
}

impl AutoReadScheduler {
    pub(crate) fn new(debounce: Deferred) -> Self {
        Self {
            marked_unread: HashSet::new(),
            debounce,
        }
    }

    /// Auto-read is off in unread-only views, where marking an entry would
    /// remove it from under the reader.
    pub fn enabled(prefs: &ViewPrefs, query: &Query) -> bool {
        prefs.auto_mark_read && !prefs.show_headlines_only && !query.unread
    }

    /// (Re)start the debounce. Returns whether a scan is now pending.
    pub(crate) fn trigger(&mut self, prefs: &ViewPrefs, query: &Query) -> bool {
        if !Self::enabled(prefs, query) {
            return false;
        }
        self.debounce.schedule(AUTO_READ_DEBOUNCE);
        true
    }

    pub(crate) fn cancel(&mut self) {
        self.debounce.cancel();
    }

    pub(crate) fn remember_unread(&mut self, id: EntryId) {
        self.marked_unread.insert(id);
    }

    pub fn was_marked_unread(&self, id: EntryId) -> bool {
        self.marked_unread.contains(&id)
    }

    pub(crate) fn debounce_mut(&mut self) -> &mut Deferred {
        &mut self.debounce
    }
}

/// A rendered entry as seen by the visibility scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: EntryId,
    pub geometry: Option<EntryGeometry>,
}

/// Entries whose top lies in `[offset, bottom - margin)`, excluding the ones
/// the user marked unread. Keeps the rendered order.
///
/// Entries already shown as read are included: their flag may be stale when
/// another actor marked them unread without changing the entry count.
pub fn visible_entries(
    candidates: impl IntoIterator<Item = Candidate>,
    viewport: Viewport,
    margin: i64,
    scheduler: &AutoReadScheduler,
) -> Vec<EntryId> {
    let top = viewport.offset;
    let bottom = viewport.bottom() - margin;
    candidates
        .into_iter()
        .filter(|c| !scheduler.was_marked_unread(c.id))
        .filter(|c| {
            c.geometry
                .is_some_and(|g| g.top >= top && g.top < bottom)
        })
        .map(|c| c.id)
        .collect()
}
