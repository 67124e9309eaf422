//! Drawing the terminal surface with ratatui.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::util::{strip_control_chars, truncate_to_width};

use super::surface::{CardView, TerminalSurface, BODY_INDENT};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 8;

/// Rows taken by the header (two) and the status bar (one).
pub(super) const CHROME_ROWS: u16 = 3;

const HINTS: &str = "[j/k]select [m]read [s]tar [d]elete [c]ollapse [o]pen [1-4]filter [q]uit";

/// Size of the entry area for a terminal of the given size.
pub(super) fn body_size(width: u16, height: u16) -> (u16, u16) {
    (width, height.saturating_sub(CHROME_ROWS))
}

pub(super) fn render(f: &mut Frame, surface: &TerminalSurface) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = Paragraph::new(format!(
            "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
            MIN_WIDTH, MIN_HEIGHT, area.width, area.height
        ))
        .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(CHROME_ROWS - 1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, surface, chunks[0]);
    render_entries(f, surface, chunks[1]);
    render_status(f, surface, chunks[2]);
}

fn render_header(f: &mut Frame, surface: &TerminalSurface, area: Rect) {
    let width = area.width as usize;
    let mut title = strip_control_chars(surface.title()).into_owned();
    if surface.is_trash() {
        title.push_str(" [trash]");
    }

    let detail = surface
        .header()
        .and_then(|h| h.feed.as_ref())
        .map(|feed| match feed.subtitle.as_deref().filter(|s| !s.is_empty()) {
            Some(subtitle) => format!("{} | {}", subtitle, feed.link),
            None => feed.link.clone(),
        })
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(
            truncate_to_width(&title, width).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            truncate_to_width(&strip_control_chars(&detail), width).into_owned(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_entries(f: &mut Frame, surface: &TerminalSurface, area: Rect) {
    if let Some(reason) = surface.empty() {
        let msg = Paragraph::new(reason.message())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(msg, area);
        return;
    }

    let show_feed_names = surface.header().is_some_and(|h| h.show_feed_names);
    let first_row = surface.offset().max(0) as usize;
    let lines: Vec<Line> = surface
        .cards()
        .iter()
        .flat_map(|view| card_lines(view, surface.selected() == Some(view.card.id), show_feed_names, area.width))
        .skip(first_row)
        .take(area.height as usize)
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

/// Rows of one card. Must produce exactly `CardView::height` lines.
fn card_lines(view: &CardView, selected: bool, show_feed_name: bool, width: u16) -> Vec<Line<'static>> {
    let card = &view.card;
    let width = width as usize;

    let marker = if selected { "> " } else { "  " };
    let star = if card.starred { "* " } else { "  " };
    let mut title_style = if card.read {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    if selected {
        title_style = title_style.add_modifier(Modifier::REVERSED);
    }
    let mut title = strip_control_chars(&card.title).into_owned();
    if card.updated {
        title.push_str(" (updated)");
    }
    let title_width = width.saturating_sub(marker.len() + star.len());

    let mut meta: Vec<String> = Vec::new();
    if show_feed_name && !card.feed_name.is_empty() {
        meta.push(strip_control_chars(&card.feed_name).into_owned());
    }
    if let Some(date) = &card.date {
        meta.push(date.clone());
    }
    if let Some(authors) = &card.authors {
        meta.push(strip_control_chars(authors).into_owned());
    }
    let indent = " ".repeat(BODY_INDENT as usize);
    let meta = format!("{}{}", indent, meta.join(" | "));

    let mut lines = Vec::with_capacity(view.height() as usize);
    lines.push(Line::from(vec![
        Span::raw(marker),
        Span::styled(star, Style::default().fg(Color::Yellow)),
        Span::styled(truncate_to_width(&title, title_width).into_owned(), title_style),
    ]));
    lines.push(Line::from(Span::styled(
        truncate_to_width(&meta, width).into_owned(),
        Style::default().fg(Color::DarkGray),
    )));
    if !card.collapsed {
        for body in &view.body {
            lines.push(Line::from(format!("{}{}", indent, body)));
        }
    }
    lines.push(Line::default());
    lines
}

fn render_status(f: &mut Frame, surface: &TerminalSurface, area: Rect) {
    let pages = surface
        .pagination()
        .map(|p| {
            let prev = if p.prev_enabled { "[p]rev " } else { "" };
            let next = if p.next_enabled { " [n]ext" } else { "" };
            format!("{}Page {}/{}{}", prev, p.current, p.count, next)
        })
        .unwrap_or_default();
    let left = surface.status().unwrap_or(HINTS);
    let room = (area.width as usize).saturating_sub(pages.len() + 1);
    let text = format!(
        "{:<room$} {}",
        truncate_to_width(left, room),
        pages,
        room = room
    );

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{EntryCard, RenderInstruction, Renderer};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn card(id: i64, collapsed: bool) -> EntryCard {
        EntryCard {
            id,
            url: None,
            title: Arc::from(format!("Entry {}", id)),
            content: Some(Arc::from("<p>first paragraph</p><p>second</p>")),
            authors: Some("by Ann".to_string()),
            date: Some("Today, 09:00".to_string()),
            read: false,
            starred: true,
            updated: false,
            feed_name: Arc::from("Feed"),
            collapsed,
        }
    }

    #[test]
    fn test_card_lines_match_height() {
        let mut surface = TerminalSurface::new(60, 20);
        surface.apply(RenderInstruction::Append(Box::new(card(1, false))));
        surface.apply(RenderInstruction::Append(Box::new(card(2, true))));
        for view in surface.cards() {
            let lines = card_lines(view, false, true, 60);
            assert_eq!(lines.len() as i64, view.height());
        }
    }

    #[test]
    fn test_render_shows_entries_and_pages() {
        let mut surface = TerminalSurface::new(60, 17);
        surface.apply(RenderInstruction::Title("All entries".to_string()));
        surface.apply(RenderInstruction::Append(Box::new(card(1, false))));
        surface.apply(RenderInstruction::Pagination(crate::view::PageIndicator {
            current: 1,
            count: 2,
            prev_enabled: false,
            next_enabled: true,
        }));

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| render(f, &surface)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("All entries"));
        assert!(text.contains("Entry 1"));
        assert!(text.contains("first paragraph"));
        assert!(text.contains("Page 1/2 [n]ext"));
    }

    #[test]
    fn test_body_size_leaves_room_for_chrome() {
        assert_eq!(body_size(80, 24), (80, 21));
        assert_eq!(body_size(80, 2), (80, 0));
    }
}
