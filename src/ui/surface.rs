//! Terminal implementation of the view's drawing surface.
//!
//! Entries are laid out top to bottom in terminal rows. Each card takes a
//! title row, a meta row, its wrapped content unless collapsed, and a blank
//! separator row. Geometry and the viewport are expressed in those rows.

use crate::storage::EntryId;
use crate::util::{strip_control_chars, strip_markup, validate_link, wrap_to_width};
use crate::view::{
    EmptyReason, EntryCard, EntryGeometry, PageHeader, PageIndicator, RenderInstruction, Renderer,
    Viewport,
};

/// Rows every card takes besides its content.
const CARD_CHROME_ROWS: i64 = 3;

/// Content indent in columns.
pub(super) const BODY_INDENT: u16 = 2;

/// A rendered card plus its content wrapped to the current width.
#[derive(Debug, Clone)]
pub struct CardView {
    pub card: EntryCard,
    pub body: Vec<String>,
}

impl CardView {
    fn new(card: EntryCard, width: u16) -> Self {
        let body = wrap_body(&card, width);
        Self { card, body }
    }

    pub fn height(&self) -> i64 {
        let body = if self.card.collapsed {
            0
        } else {
            self.body.len() as i64
        };
        CARD_CHROME_ROWS + body
    }
}

fn wrap_body(card: &EntryCard, width: u16) -> Vec<String> {
    let Some(content) = card.content.as_deref() else {
        return Vec::new();
    };
    let text = strip_markup(content);
    let text = strip_control_chars(&text);
    wrap_to_width(&text, width.saturating_sub(BODY_INDENT * 2).max(10) as usize)
}

/// Surface drawn with ratatui. Holds what the controller told it to show.
#[derive(Debug)]
pub struct TerminalSurface {
    header: Option<PageHeader>,
    title: String,
    cards: Vec<CardView>,
    empty: Option<EmptyReason>,
    pagination: Option<PageIndicator>,
    selected: Option<EntryId>,
    offset: i64,
    width: u16,
    height: u16,
    presented: bool,
    pending_load: bool,
    needs_redraw: bool,
    launch_links: bool,
    status: Option<String>,
}

impl TerminalSurface {
    /// `width` and `height` are the size of the entry area in cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            header: None,
            title: String::new(),
            cards: Vec::new(),
            empty: None,
            pagination: None,
            selected: None,
            offset: 0,
            width,
            height,
            presented: true,
            pending_load: false,
            needs_redraw: true,
            launch_links: true,
            status: None,
        }
    }

    /// Whether `OpenLink` starts the system opener. Off, links are only
    /// validated and reported in the status line.
    pub fn set_launch_links(&mut self, launch: bool) {
        self.launch_links = launch;
    }

    pub fn set_presented(&mut self, presented: bool) {
        self.presented = presented;
        self.needs_redraw = true;
    }

    /// Returns true once after each `Reset`; the host answers with
    /// `ViewCommand::Loaded`.
    pub fn take_pending_load(&mut self) -> bool {
        std::mem::take(&mut self.pending_load)
    }

    pub fn take_needs_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if width != self.width {
            for view in &mut self.cards {
                view.body = wrap_body(&view.card, width);
            }
        }
        self.width = width;
        self.height = height;
        self.offset = self.offset.clamp(0, self.max_offset());
        self.needs_redraw = true;
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.scroll_to(self.offset + delta);
    }

    /// Flip the collapsed state of a card. Returns the new state.
    pub fn toggle_collapsed(&mut self, id: EntryId) -> Option<bool> {
        let view = self.cards.iter_mut().find(|v| v.card.id == id)?;
        view.card.collapsed = !view.card.collapsed;
        let collapsed = view.card.collapsed;
        self.offset = self.offset.clamp(0, self.max_offset());
        self.needs_redraw = true;
        Some(collapsed)
    }

    /// Entry keyboard actions apply to: the selection, else the first card
    /// starting inside the viewport, else the first card.
    pub fn focused_entry(&self) -> Option<EntryId> {
        if self.selected.is_some() {
            return self.selected;
        }
        let mut top = 0;
        for view in &self.cards {
            if top >= self.offset {
                return Some(view.card.id);
            }
            top += view.height();
        }
        self.cards.first().map(|v| v.card.id)
    }

    pub fn card(&self, id: EntryId) -> Option<&EntryCard> {
        self.cards.iter().find(|v| v.card.id == id).map(|v| &v.card)
    }

    pub fn cards(&self) -> &[CardView] {
        &self.cards
    }

    pub fn header(&self) -> Option<&PageHeader> {
        self.header.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether activating an entry toggles its read state rather than its
    /// collapsed state.
    pub fn activation_marks_read(&self) -> bool {
        self.header.as_ref().is_some_and(|h| h.double_click_marks)
    }

    pub fn is_trash(&self) -> bool {
        self.header.as_ref().is_some_and(|h| h.trash)
    }

    pub fn empty(&self) -> Option<EmptyReason> {
        self.empty
    }

    pub fn pagination(&self) -> Option<PageIndicator> {
        self.pagination
    }

    pub fn selected(&self) -> Option<EntryId> {
        self.selected
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
        self.needs_redraw = true;
    }

    pub fn clear_status(&mut self) {
        if self.status.take().is_some() {
            self.needs_redraw = true;
        }
    }

    fn content_height(&self) -> i64 {
        self.cards.iter().map(CardView::height).sum()
    }

    fn max_offset(&self) -> i64 {
        (self.content_height() - i64::from(self.height)).max(0)
    }

    fn open_link(&mut self, url: &str, new_surface: bool) {
        let url = match validate_link(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Refusing to open link");
                self.set_status(format!("Cannot open link: {}", e));
                return;
            }
        };
        tracing::debug!(url = %url, new_surface, "Opening link");
        if !self.launch_links {
            self.set_status(format!("Link: {}", url));
            return;
        }
        match open::that_detached(url.as_str()) {
            Ok(()) => self.set_status(format!("Opened {}", url)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to open link");
                self.set_status(format!("Failed to open browser: {}", e));
            }
        }
    }
}

impl Renderer for TerminalSurface {
    fn is_presented(&self) -> bool {
        self.presented
    }

    fn apply(&mut self, instruction: RenderInstruction) {
        self.needs_redraw = true;
        match instruction {
            RenderInstruction::Reset => {
                self.header = None;
                self.cards.clear();
                self.empty = None;
                self.selected = None;
                self.offset = 0;
                self.pending_load = true;
            }
            RenderInstruction::Header(header) => {
                self.title = header.title.clone();
                self.header = Some(header);
            }
            RenderInstruction::Title(title) => self.title = title,
            RenderInstruction::Append(card) => {
                self.empty = None;
                self.cards.push(CardView::new(*card, self.width));
            }
            // No animation in a terminal; the row goes away at once.
            RenderInstruction::Remove { id, .. } => {
                self.cards.retain(|v| v.card.id != id);
                if self.selected == Some(id) {
                    self.selected = None;
                }
                self.offset = self.offset.clamp(0, self.max_offset());
            }
            RenderInstruction::Empty(reason) => self.empty = Some(reason),
            RenderInstruction::Pagination(indicator) => self.pagination = Some(indicator),
            RenderInstruction::Select(id) => self.selected = id,
            RenderInstruction::UpdateFlags { id, read, starred } => {
                if let Some(view) = self.cards.iter_mut().find(|v| v.card.id == id) {
                    view.card.read = read;
                    view.card.starred = starred;
                }
            }
            RenderInstruction::OpenLink { url, new_surface } => self.open_link(&url, new_surface),
        }
    }

    fn geometry(&self, id: EntryId) -> Option<EntryGeometry> {
        let mut top = 0;
        for view in &self.cards {
            let height = view.height();
            if view.card.id == id {
                return Some(EntryGeometry { top, height });
            }
            top += height;
        }
        None
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            offset: self.offset,
            height: i64::from(self.height),
            max_offset: self.max_offset(),
        }
    }

    fn scroll_to(&mut self, offset: i64) {
        let offset = offset.clamp(0, self.max_offset());
        if offset != self.offset {
            self.offset = offset;
            self.needs_redraw = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn card(id: EntryId, content: Option<&str>) -> Box<EntryCard> {
        Box::new(EntryCard {
            id,
            url: Some(Arc::from(format!("https://example.com/{}", id))),
            title: Arc::from(format!("Entry {}", id)),
            content: content.map(Arc::from),
            authors: None,
            date: None,
            read: false,
            starred: false,
            updated: false,
            feed_name: Arc::from("Feed"),
            collapsed: false,
        })
    }

    fn surface_with(cards: &[(EntryId, Option<&str>)]) -> TerminalSurface {
        let mut surface = TerminalSurface::new(80, 10);
        surface.set_launch_links(false);
        surface.apply(RenderInstruction::Reset);
        for (id, content) in cards {
            surface.apply(RenderInstruction::Append(card(*id, *content)));
        }
        surface
    }

    #[test]
    fn test_reset_requests_load_once() {
        let mut surface = surface_with(&[]);
        assert!(surface.take_pending_load());
        assert!(!surface.take_pending_load());
    }

    #[test]
    fn test_hidden_surface_is_not_presented() {
        let mut surface = surface_with(&[]);
        assert!(surface.is_presented());
        surface.set_presented(false);
        assert!(!surface.is_presented());
        assert!(surface.take_needs_redraw());
    }

    #[test]
    fn test_geometry_stacks_cards() {
        let surface = surface_with(&[(1, Some("one line")), (2, None), (3, Some("a\n\nb"))]);
        assert_eq!(surface.geometry(1), Some(EntryGeometry { top: 0, height: 4 }));
        assert_eq!(surface.geometry(2), Some(EntryGeometry { top: 4, height: 3 }));
        assert_eq!(surface.geometry(3), Some(EntryGeometry { top: 7, height: 6 }));
        assert_eq!(surface.geometry(4), None);
        assert_eq!(surface.viewport().max_offset, 3);
    }

    #[test]
    fn test_collapse_shrinks_card() {
        let mut surface = surface_with(&[(1, Some("one line"))]);
        assert_eq!(surface.toggle_collapsed(1), Some(true));
        assert_eq!(surface.geometry(1).map(|g| g.height), Some(3));
        assert_eq!(surface.toggle_collapsed(1), Some(false));
        assert_eq!(surface.toggle_collapsed(9), None);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let ids: Vec<(EntryId, Option<&str>)> = (1..=10).map(|id| (id, None)).collect();
        let mut surface = surface_with(&ids);
        // 10 cards of 3 rows in a 10 row viewport.
        surface.scroll_to(500);
        assert_eq!(surface.offset(), 20);
        surface.scroll_by(-100);
        assert_eq!(surface.offset(), 0);
    }

    #[test]
    fn test_remove_clears_selection_and_clamps() {
        let ids: Vec<(EntryId, Option<&str>)> = (1..=5).map(|id| (id, None)).collect();
        let mut surface = surface_with(&ids);
        surface.apply(RenderInstruction::Select(Some(5)));
        surface.scroll_to(5);
        surface.apply(RenderInstruction::Remove { id: 5, animated: true });
        assert_eq!(surface.selected(), None);
        assert_eq!(surface.offset(), 2);
        assert!(surface.card(5).is_none());
    }

    #[test]
    fn test_focused_entry_prefers_selection() {
        let ids: Vec<(EntryId, Option<&str>)> = (1..=5).map(|id| (id, None)).collect();
        let mut surface = surface_with(&ids);
        assert_eq!(surface.focused_entry(), Some(1));
        surface.scroll_to(4);
        assert_eq!(surface.focused_entry(), Some(3));
        surface.apply(RenderInstruction::Select(Some(2)));
        assert_eq!(surface.focused_entry(), Some(2));
    }

    #[test]
    fn test_open_link_validates() {
        let mut surface = surface_with(&[]);
        surface.apply(RenderInstruction::OpenLink {
            url: Arc::from("javascript:alert(1)"),
            new_surface: false,
        });
        assert!(surface.status().is_some_and(|s| s.starts_with("Cannot open link")));

        surface.apply(RenderInstruction::OpenLink {
            url: Arc::from("https://example.com/a"),
            new_surface: true,
        });
        assert_eq!(surface.status(), Some("Link: https://example.com/a"));
    }
}
