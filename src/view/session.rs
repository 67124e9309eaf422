//! Per-navigation view state and its deferred work.
//!
//! Every piece of scheduled work of a view instance is a [`Deferred`] owned
//! (directly or through a component) by its [`ViewSession`]. Dropping the
//! session aborts all of them, and the session id carried by each
//! [`TimerFired`] lets the controller discard deliveries that were already
//! queued when the session was replaced.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::storage::{EntryId, Query};

use super::auto_read::AutoReadScheduler;
use super::page::PageState;
use super::selection::SelectionController;

// ============================================================================
// Timing
// ============================================================================

/// Delay before the id snapshot is captured after a full refresh.
pub const SNAPSHOT_DELAY: Duration = Duration::from_millis(500);

/// Time the removal animation of an entry gets before the page is backfilled.
pub const SETTLE_DELAY: Duration = Duration::from_millis(310);

/// Quiet period after the last scroll before visible entries are marked read.
pub const AUTO_READ_DEBOUNCE: Duration = Duration::from_millis(500);

/// Smooth scroll tick period.
pub const SCROLL_TICK: Duration = Duration::from_millis(7);

/// Page recomputation runs right after the build that scheduled it.
pub const COMPUTE_PAGES_DELAY: Duration = Duration::ZERO;

// ============================================================================
// Timer Delivery
// ============================================================================

/// What a fired timer asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Snapshot,
    Settle,
    AutoRead,
    ScrollTick,
    ComputePages,
}

/// A timer delivery. Stale deliveries (old session or old generation) are
/// dropped by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub session: u64,
    pub kind: TimerKind,
    pub generation: u64,
}

pub(crate) type TimerSender = mpsc::UnboundedSender<TimerFired>;

// ============================================================================
// Deferred
// ============================================================================

/// A cancellable, re-armable deferred action.
///
/// `schedule` and `repeat` cancel whatever was armed before, so calling
/// `schedule` on every trigger is a debounce. Cancelling bumps the generation,
/// which invalidates deliveries already sitting in the channel.
#[derive(Debug)]
pub struct Deferred {
    kind: TimerKind,
    session: u64,
    tx: TimerSender,
    generation: u64,
    armed: bool,
    repeating: bool,
    handle: Option<JoinHandle<()>>,
}

impl Deferred {
    pub(crate) fn new(session: u64, kind: TimerKind, tx: TimerSender) -> Self {
        Self {
            kind,
            session,
            tx,
            generation: 0,
            armed: false,
            repeating: false,
            handle: None,
        }
    }

    fn arm(&mut self, repeating: bool) -> TimerFired {
        self.cancel();
        self.armed = true;
        self.repeating = repeating;
        TimerFired {
            session: self.session,
            kind: self.kind,
            generation: self.generation,
        }
    }

    /// Fire once after `delay`.
    pub fn schedule(&mut self, delay: Duration) {
        let fired = self.arm(false);
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(fired);
        }));
    }

    /// Fire every `period`, starting one period from now, until cancelled.
    pub fn repeat(&mut self, period: Duration) {
        let fired = self.arm(true);
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(fired).is_err() {
                    break;
                }
            }
        }));
    }

    /// Idempotent.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether a delivery belongs to the current arming. A one-shot timer
    /// accepts exactly one delivery.
    pub fn accept(&mut self, fired: &TimerFired) -> bool {
        if !self.armed || fired.kind != self.kind || fired.generation != self.generation {
            return false;
        }
        if !self.repeating {
            self.armed = false;
            self.handle = None;
        }
        true
    }
}

impl Drop for Deferred {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// ViewSession
// ============================================================================

/// An entry as currently rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedEntry {
    pub id: EntryId,
    pub url: Option<Arc<str>>,
    pub read: bool,
    pub starred: bool,
    pub collapsed: bool,
}

/// Bookkeeping of an incremental removal waiting for its animation to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingRemoval {
    pub removed: EntryId,
    pub was_selected: bool,
    pub next: Option<EntryId>,
    pub previous: Option<EntryId>,
}

/// State of one view instance. Replaced wholesale on navigation.
pub(crate) struct ViewSession {
    pub id: u64,
    pub title: String,
    pub title_override: Option<String>,
    /// Query as constructed; see `ViewController::query` for the effective one.
    pub base_query: Query,
    pub flags_intrinsic: bool,

    pub pages: PageState,
    pub snapshot: Option<Vec<EntryId>>,
    pub rendered: Vec<RenderedEntry>,
    pub rendered_title: Option<String>,
    pub loading: bool,
    pub removal: Option<PendingRemoval>,
    pub feed_names: HashMap<i64, Arc<str>>,

    pub selection: SelectionController,
    pub auto_read: AutoReadScheduler,

    pub snapshot_timer: Deferred,
    pub settle_timer: Deferred,
    pub compute_pages_timer: Deferred,
}

impl ViewSession {
    pub fn new(id: u64, title: String, query: Query, tx: &TimerSender) -> Self {
        let flags_intrinsic = query.has_intrinsic_flags();
        Self {
            id,
            title,
            title_override: None,
            base_query: query,
            flags_intrinsic,
            pages: PageState::default(),
            snapshot: None,
            rendered: Vec::new(),
            rendered_title: None,
            loading: false,
            removal: None,
            feed_names: HashMap::new(),
            selection: SelectionController::new(Deferred::new(id, TimerKind::ScrollTick, tx.clone())),
            auto_read: AutoReadScheduler::new(Deferred::new(id, TimerKind::AutoRead, tx.clone())),
            snapshot_timer: Deferred::new(id, TimerKind::Snapshot, tx.clone()),
            settle_timer: Deferred::new(id, TimerKind::Settle, tx.clone()),
            compute_pages_timer: Deferred::new(id, TimerKind::ComputePages, tx.clone()),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title_override
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.rendered.iter().position(|e| e.id == id)
    }

    pub fn is_rendered(&self, id: EntryId) -> bool {
        self.position(id).is_some()
    }

    pub fn rendered_mut(&mut self, id: EntryId) -> Option<&mut RenderedEntry> {
        self.rendered.iter_mut().find(|e| e.id == id)
    }

    /// Selection commands are ignored while a render or animation is in
    /// flight, or while the removal of the selected entry settles.
    pub fn selection_suppressed(&self) -> bool {
        !self.selection.is_idle() || self.removal.is_some_and(|r| r.was_selected)
    }
}
