//! Boundary between the view controller and whatever draws it.

use std::sync::Arc;

use crate::storage::EntryId;

use super::materialize::{EmptyReason, EntryCard};

/// Header of a view showing exactly one feed without a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedHeader {
    /// Website link, falling back to the feed URL.
    pub link: String,
    pub image_url: Option<String>,
    pub image_title: Option<String>,
    pub subtitle: Option<String>,
}

/// Page-wide presentation flags sent at the start of every build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub title: String,
    pub feed: Option<FeedHeader>,
    /// The trash is shown: entries offer restore instead of delete.
    pub trash: bool,
    /// Entries come from several feeds and show their feed name.
    pub show_feed_names: bool,
    pub headlines_only: bool,
    pub double_click_marks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageIndicator {
    pub current: usize,
    pub count: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

/// Outbound drawing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    /// Drop everything and start loading a fresh page. The surface answers
    /// with `ViewCommand::Loaded` once it is ready to be built.
    Reset,
    Header(PageHeader),
    Title(String),
    Append(Box<EntryCard>),
    Remove { id: EntryId, animated: bool },
    Empty(EmptyReason),
    Pagination(PageIndicator),
    Select(Option<EntryId>),
    UpdateFlags { id: EntryId, read: bool, starred: bool },
    OpenLink { url: Arc<str>, new_surface: bool },
}

/// Position of a rendered entry in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryGeometry {
    pub top: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub offset: i64,
    pub height: i64,
    pub max_offset: i64,
}

impl Viewport {
    pub fn bottom(&self) -> i64 {
        self.offset + self.height
    }
}

/// Drawing surface of a view.
pub trait Renderer {
    /// Whether the view is the one currently displayed. A hidden view
    /// considers itself up to date.
    fn is_presented(&self) -> bool;

    fn apply(&mut self, instruction: RenderInstruction);

    /// Geometry of a rendered entry, `None` if it is not on the surface.
    fn geometry(&self, id: EntryId) -> Option<EntryGeometry>;

    fn viewport(&self) -> Viewport;

    /// Jump to an offset. Implementations clamp to `[0, max_offset]`.
    fn scroll_to(&mut self, offset: i64);
}
