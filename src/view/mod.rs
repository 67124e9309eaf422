//! Paginated entry list view.
//!
//! [`ViewController`] owns one [`session::ViewSession`] per navigation and
//! keeps the rendered page consistent with the store through
//! [`ViewController::ensure`]. Everything runs on the caller's task: store
//! calls are awaited in order, and deferred work comes back as
//! [`TimerFired`] values the host feeds to [`ViewController::on_timer`].

pub mod auto_read;
pub mod command;
pub mod materialize;
pub mod page;
mod reconcile;
pub mod render;
pub mod selection;
pub mod session;

use tokio::sync::mpsc;

use crate::preferences::{PreferenceSource, ShownEntries, ViewPrefs};
use crate::storage::{DeletionState, EntryId, EntryStore, Query, StoreError};

use auto_read::{visible_entries, AutoReadScheduler, Candidate};
use selection::{scroll_target, ScrollAnimation, ScrollStep};
use session::{TimerKind, TimerSender, ViewSession};

pub use command::{ClickTarget, PointerButton, ViewCommand};
pub use materialize::{EmptyReason, EntryCard};
pub use render::{
    EntryGeometry, FeedHeader, PageHeader, PageIndicator, RenderInstruction, Renderer, Viewport,
};
pub use selection::{SelectPolicy, SelectionPhase};
pub use session::TimerFired;

/// Per-surface tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Strip at the bottom of the viewport, in surface units, whose entries
    /// are not yet considered seen.
    pub read_margin: i64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self { read_margin: 50 }
    }
}

/// Controller of the entry list view.
pub struct ViewController<S, R, P> {
    store: S,
    surface: R,
    prefs: P,
    options: ViewOptions,
    timer_tx: TimerSender,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    next_session: u64,
    session: ViewSession,
}

impl<S, R, P> ViewController<S, R, P>
where
    S: EntryStore,
    R: Renderer,
    P: PreferenceSource,
{
    /// Create the controller and request the first render.
    pub fn new(
        title: impl Into<String>,
        query: Query,
        store: S,
        surface: R,
        prefs: P,
        options: ViewOptions,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let session = ViewSession::new(1, title.into(), query, &timer_tx);
        let mut controller = Self {
            store,
            surface,
            prefs,
            options,
            timer_tx,
            timer_rx,
            next_session: 2,
            session,
        };
        tracing::info!(title = %controller.session.title, "View created");
        controller.refresh();
        controller
    }

    /// Replace the current view instance. Every timer of the old instance is
    /// cancelled before the new one arms any.
    pub fn navigate(&mut self, title: impl Into<String>, query: Query) {
        let id = self.next_session;
        self.next_session += 1;
        self.session = ViewSession::new(id, title.into(), query, &self.timer_tx);
        tracing::info!(session = id, title = %self.session.title, "Navigated");
        self.refresh();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The effective query. Views without intrinsic flags take read, starred
    /// and deletion filters from the shown-entries preference.
    pub fn query(&self) -> Query {
        let mut query = self.session.base_query.clone();
        if !self.session.flags_intrinsic {
            let shown = self.prefs.view_prefs().shown_entries;
            query.unread = shown == ShownEntries::Unread;
            query.starred = shown == ShownEntries::Starred;
            query.deleted = if shown == ShownEntries::Trashed {
                DeletionState::Trashed
            } else {
                DeletionState::Normal
            };
        }
        query
    }

    pub fn flags_intrinsic(&self) -> bool {
        self.session.flags_intrinsic
    }

    pub fn title(&self) -> &str {
        self.session.display_title()
    }

    pub fn current_page(&self) -> usize {
        self.session.pages.current_page()
    }

    pub fn page_count(&self) -> usize {
        self.session.pages.page_count()
    }

    pub fn entries_count(&self) -> usize {
        self.session.pages.entries_count()
    }

    pub fn selected(&self) -> Option<EntryId> {
        self.session.selection.selected()
    }

    pub fn selection_phase(&self) -> SelectionPhase {
        self.session.selection.phase()
    }

    pub fn is_selection_suppressed(&self) -> bool {
        self.session.selection_suppressed()
    }

    pub fn rendered_ids(&self) -> Vec<EntryId> {
        self.session.rendered.iter().map(|e| e.id).collect()
    }

    pub fn snapshot(&self) -> Option<&[EntryId]> {
        self.session.snapshot.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.session.loading
    }

    /// Whether an incremental removal is waiting for its animation to settle.
    pub fn is_settling(&self) -> bool {
        self.session.removal.is_some()
    }

    pub fn session_id(&self) -> u64 {
        self.session.id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut P {
        &mut self.prefs
    }

    fn view_prefs(&self) -> ViewPrefs {
        self.prefs.view_prefs()
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Wait for the next timer delivery.
    pub async fn next_timer(&mut self) -> Option<TimerFired> {
        self.timer_rx.recv().await
    }

    pub fn try_next_timer(&mut self) -> Option<TimerFired> {
        self.timer_rx.try_recv().ok()
    }

    /// Run the work of a fired timer. Deliveries of replaced sessions or
    /// cancelled timers are dropped.
    pub async fn on_timer(&mut self, fired: TimerFired) -> Result<(), StoreError> {
        if fired.session != self.session.id {
            tracing::debug!(
                session = fired.session,
                current = self.session.id,
                kind = ?fired.kind,
                "Dropping timer of replaced view"
            );
            return Ok(());
        }

        let session = &mut self.session;
        let accepted = match fired.kind {
            TimerKind::Snapshot => session.snapshot_timer.accept(&fired),
            TimerKind::Settle => session.settle_timer.accept(&fired),
            TimerKind::AutoRead => session.auto_read.debounce_mut().accept(&fired),
            TimerKind::ScrollTick => session.selection.ticker_mut().accept(&fired),
            TimerKind::ComputePages => session.compute_pages_timer.accept(&fired),
        };
        if !accepted {
            tracing::debug!(kind = ?fired.kind, generation = fired.generation, "Dropping cancelled timer");
            return Ok(());
        }

        match fired.kind {
            TimerKind::Snapshot => self.capture_snapshot().await,
            TimerKind::Settle => self.finish_removal().await,
            TimerKind::AutoRead => self.mark_visible_as_read().await,
            TimerKind::ScrollTick => {
                self.scroll_tick();
                Ok(())
            }
            TimerKind::ComputePages => self.compute_pages().await,
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Apply an inbound command. Store mutations are followed by a
    /// non-forced `ensure`.
    pub async fn handle(&mut self, command: ViewCommand) -> Result<(), StoreError> {
        match command {
            ViewCommand::Loaded => {
                if !self.session.loading {
                    tracing::debug!("Ignoring load without a pending reset");
                    return Ok(());
                }
                self.session.loading = false;
                if self.surface.is_presented() {
                    self.build().await?;
                }
            }
            ViewCommand::Scrolled => self.on_scrolled(),
            ViewCommand::SetRead { id, read } => {
                self.store.mark_read(&[id], read).await?;
                if !read {
                    self.session.auto_read.remember_unread(id);
                }
                self.update_flags(id, Some(read), None);
                self.ensure(false).await?;
            }
            ViewCommand::SetStarred { id, starred } => {
                self.store.star(&[id], starred).await?;
                self.update_flags(id, None, Some(starred));
                self.ensure(false).await?;
            }
            ViewCommand::Delete { id } => {
                self.store
                    .set_deletion_state(&[id], DeletionState::Trashed)
                    .await?;
                self.ensure(false).await?;
            }
            ViewCommand::Restore { id } => {
                self.store
                    .set_deletion_state(&[id], DeletionState::Normal)
                    .await?;
                self.ensure(false).await?;
            }
            ViewCommand::CollapseToggled { id, collapsed } => {
                self.on_collapse_toggled(id, collapsed).await?;
            }
            ViewCommand::Click { id, target, button } => {
                self.on_click(id, target, button).await?;
            }
            ViewCommand::SelectNext => self.select_next(),
            ViewCommand::SelectPrev => self.select_prev(),
            ViewCommand::NextPage => {
                self.next_page();
            }
            ViewCommand::PrevPage => {
                self.prev_page();
            }
        }
        Ok(())
    }

    async fn on_collapse_toggled(&mut self, id: EntryId, collapsed: bool) -> Result<(), StoreError> {
        let Some(entry) = self.session.rendered_mut(id) else {
            return Ok(());
        };
        entry.collapsed = collapsed;
        let already_read = entry.read;

        // Expanding a headline counts as reading it.
        let prefs = self.view_prefs();
        if prefs.auto_mark_read
            && prefs.show_headlines_only
            && !self.query().unread
            && !collapsed
            && !already_read
        {
            self.store.mark_read(&[id], true).await?;
            self.update_flags(id, Some(true), None);
            self.ensure(false).await?;
        }
        Ok(())
    }

    async fn on_click(
        &mut self,
        id: EntryId,
        target: ClickTarget,
        button: PointerButton,
    ) -> Result<(), StoreError> {
        if !self.session.is_rendered(id) {
            return Ok(());
        }
        let prefs = self.view_prefs();
        if prefs.key_nav_enabled {
            self.select_entry(Some(id), false, false);
        }
        if target == ClickTarget::TitleLink {
            let new_surface = match button {
                PointerButton::Primary => prefs.open_entries_in_tabs,
                PointerButton::Auxiliary => true,
            };
            self.open_link(id, new_surface).await?;
        }
        Ok(())
    }

    /// Open the link of an entry and mark it read.
    pub async fn open_link(&mut self, id: EntryId, new_surface: bool) -> Result<(), StoreError> {
        let Some(entry) = self.session.rendered.iter().find(|e| e.id == id) else {
            return Ok(());
        };
        let Some(url) = entry.url.clone() else {
            return Ok(());
        };
        let was_read = entry.read;

        self.surface
            .apply(RenderInstruction::OpenLink { url, new_surface });
        if !was_read {
            self.store.mark_read(&[id], true).await?;
            self.update_flags(id, Some(true), None);
            self.ensure(false).await?;
        }
        Ok(())
    }

    fn update_flags(&mut self, id: EntryId, read: Option<bool>, starred: Option<bool>) {
        let Some(entry) = self.session.rendered_mut(id) else {
            return;
        };
        if let Some(read) = read {
            entry.read = read;
        }
        if let Some(starred) = starred {
            entry.starred = starred;
        }
        let instruction = RenderInstruction::UpdateFlags {
            id,
            read: entry.read,
            starred: entry.starred,
        };
        self.surface.apply(instruction);
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Switch page. Invalid or unchanged pages are ignored; a change forces a
    /// full refresh. Returns whether the page changed.
    pub fn set_current_page(&mut self, page: usize) -> bool {
        if !self.session.pages.go_to(page) {
            return false;
        }
        tracing::debug!(page, "Page changed");
        self.force_refresh();
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_current_page(self.current_page() + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.set_current_page(self.current_page().saturating_sub(1))
    }

    /// Show a temporary title, e.g. the search text, in place of the view's
    /// own. Picked up by the next `ensure`.
    pub fn set_title_override(&mut self, title: Option<String>) {
        self.session.title_override = title;
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select an entry (or nothing). Ids not on the page count as nothing.
    pub fn select_entry(&mut self, id: Option<EntryId>, scroll: bool, smooth: bool) {
        if !self.surface.is_presented() {
            return;
        }
        let id = id.filter(|id| self.session.is_rendered(*id));
        self.session.selection.set_selected(id);
        self.surface.apply(RenderInstruction::Select(id));

        if let Some(id) = id {
            if !self.prefs.view_prefs().key_nav_enabled {
                self.prefs.enable_key_nav();
            }
            if scroll {
                self.scroll_to_entry(id, smooth);
            }
        }
    }

    fn selected_index(&self) -> Option<usize> {
        self.selected().and_then(|id| self.session.position(id))
    }

    /// Select the entry after the current one, or the first entry of the
    /// next page when the current one is last.
    pub fn select_next(&mut self) {
        if self.session.selection_suppressed() || !self.surface.is_presented() {
            return;
        }
        let next = match self.selected_index() {
            Some(index) => self.session.rendered.get(index + 1),
            None => self.session.rendered.first(),
        }
        .map(|e| e.id);

        match next {
            Some(id) => self.select_entry(Some(id), true, true),
            None => {
                self.next_page();
            }
        }
    }

    /// Select the entry before the current one, or the last entry of the
    /// previous page when the current one is first.
    pub fn select_prev(&mut self) {
        if self.session.selection_suppressed() || !self.surface.is_presented() {
            return;
        }
        let prev = match self.selected_index() {
            Some(index) => index
                .checked_sub(1)
                .and_then(|i| self.session.rendered.get(i)),
            None => self.session.rendered.first(),
        }
        .map(|e| e.id);

        match prev {
            Some(id) => self.select_entry(Some(id), true, true),
            None if self.current_page() > 1 => {
                self.session.selection.request_last();
                self.set_current_page(self.current_page() - 1);
            }
            None => {}
        }
    }

    /// Bring an entry into view, animated when `smooth`.
    pub fn scroll_to_entry(&mut self, id: EntryId, smooth: bool) {
        let Some(geometry) = self.surface.geometry(id) else {
            return;
        };
        let viewport = self.surface.viewport();
        let target = scroll_target(geometry, viewport);
        if target == viewport.offset {
            return;
        }
        if smooth {
            let animation = ScrollAnimation::start(viewport.offset, target);
            tracing::debug!(from = viewport.offset, target, step = animation.step(), "Smooth scroll");
            self.session.selection.start_animation(animation);
        } else {
            self.surface.scroll_to(target);
            self.on_scrolled();
        }
    }

    fn scroll_tick(&mut self) {
        let SelectionPhase::Animating(animation) = self.session.selection.phase() else {
            self.session.selection.stop_animation();
            return;
        };
        let before = self.surface.viewport().offset;
        match animation.advance(before) {
            ScrollStep::Move(next) => {
                self.surface.scroll_to(next);
                // The surface clamps; stop if the content shrank under us.
                if self.surface.viewport().offset == before {
                    self.session.selection.stop_animation();
                }
            }
            ScrollStep::Finish(target) => {
                self.surface.scroll_to(target);
                self.session.selection.stop_animation();
            }
        }
        self.on_scrolled();
    }

    // ========================================================================
    // Auto-read
    // ========================================================================

    fn on_scrolled(&mut self) {
        let prefs = self.view_prefs();
        let query = self.query();
        self.session.auto_read.trigger(&prefs, &query);
    }

    async fn mark_visible_as_read(&mut self) -> Result<(), StoreError> {
        let prefs = self.view_prefs();
        if !AutoReadScheduler::enabled(&prefs, &self.query())
            || !self.surface.is_presented()
        {
            return Ok(());
        }

        let candidates: Vec<Candidate> = self
            .session
            .rendered
            .iter()
            .map(|e| Candidate {
                id: e.id,
                geometry: self.surface.geometry(e.id),
            })
            .collect();
        let ids = visible_entries(
            candidates,
            self.surface.viewport(),
            self.options.read_margin,
            &self.session.auto_read,
        );
        if ids.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = ids.len(), "Marking visible entries read");
        self.store.mark_read(&ids, true).await?;
        for id in ids {
            self.update_flags(id, Some(true), None);
        }
        self.ensure(false).await?;
        Ok(())
    }
}
