//! Selection state and animated scrolling.

use crate::storage::EntryId;

use super::render::{EntryGeometry, Viewport};
use super::session::{Deferred, SCROLL_TICK};

/// Which entry to select once a pending render has been built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPolicy {
    First,
    Last,
    /// Reselect this entry; falls back to `First` when it is not on the page.
    Preserve(EntryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Animating(ScrollAnimation),
    AwaitingRender(SelectPolicy),
}

/// Fixed-step scroll toward a target offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollAnimation {
    target: i64,
    step: i64,
}

/// Result of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    Move(i64),
    Finish(i64),
}

impl ScrollAnimation {
    /// Step is a tenth of the distance with halves rounded up, at least one
    /// unit toward the target.
    pub fn start(from: i64, target: i64) -> Self {
        let delta = target - from;
        let mut step = (delta as f64 / 10.0 + 0.5).floor() as i64;
        if step == 0 {
            step = if delta > 0 { 1 } else { -1 };
        }
        Self { target, step }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Next offset from `current`. Snaps to the target once within one step.
    pub fn advance(&self, current: i64) -> ScrollStep {
        if (self.target - current).abs() <= self.step.abs() {
            ScrollStep::Finish(self.target)
        } else {
            ScrollStep::Move(current + self.step)
        }
    }
}

/// Offset that brings an entry into view: its top when it does not fit,
/// otherwise centred. Clamped to the scrollable range.
pub fn scroll_target(entry: EntryGeometry, viewport: Viewport) -> i64 {
    let target = if entry.height >= viewport.height {
        entry.top
    } else {
        entry.top - (viewport.height - entry.height) / 2
    };
    target.clamp(0, viewport.max_offset.max(0))
}

/// Selected entry, phase and the scroll ticker.
#[derive(Debug)]
pub struct SelectionController {
    selected: Option<EntryId>,
    phase: SelectionPhase,
    ticker: Deferred,
}

impl SelectionController {
    pub(crate) fn new(ticker: Deferred) -> Self {
        Self {
            selected: None,
            phase: SelectionPhase::Idle,
            ticker,
        }
    }

    pub fn selected(&self) -> Option<EntryId> {
        self.selected
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SelectionPhase::Idle
    }

    pub(crate) fn set_selected(&mut self, id: Option<EntryId>) {
        self.selected = id;
    }

    /// Enter `AwaitingRender` for a full refresh, stopping any animation.
    /// A pending `Last` request survives; otherwise the current selection is
    /// preserved when there is one.
    pub(crate) fn await_render(&mut self) {
        self.ticker.cancel();
        let policy = match (self.phase, self.selected) {
            (SelectionPhase::AwaitingRender(SelectPolicy::Last), _) => SelectPolicy::Last,
            (_, Some(id)) => SelectPolicy::Preserve(id),
            (_, None) => SelectPolicy::First,
        };
        self.phase = SelectionPhase::AwaitingRender(policy);
    }

    /// Ask the next build to select the last entry.
    pub(crate) fn request_last(&mut self) {
        self.ticker.cancel();
        self.phase = SelectionPhase::AwaitingRender(SelectPolicy::Last);
    }

    /// Leave `AwaitingRender`, returning the policy to apply.
    pub(crate) fn finish_render(&mut self) -> SelectPolicy {
        let policy = match self.phase {
            SelectionPhase::AwaitingRender(policy) => policy,
            _ => self
                .selected
                .map(SelectPolicy::Preserve)
                .unwrap_or(SelectPolicy::First),
        };
        self.ticker.cancel();
        self.phase = SelectionPhase::Idle;
        policy
    }

    pub(crate) fn start_animation(&mut self, animation: ScrollAnimation) {
        self.phase = SelectionPhase::Animating(animation);
        self.ticker.repeat(SCROLL_TICK);
    }

    pub(crate) fn stop_animation(&mut self) {
        self.ticker.cancel();
        if matches!(self.phase, SelectionPhase::Animating(_)) {
            self.phase = SelectionPhase::Idle;
        }
    }

    pub(crate) fn ticker_mut(&mut self) -> &mut Deferred {
        &mut self.ticker
    }
}
