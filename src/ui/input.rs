//! Keyboard input for the entry view.
//!
//! Keys map to a [`UiAction`], which is then dispatched to the controller
//! or, for pure scrolling, to the surface followed by a `Scrolled` command.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::preferences::{PreferenceManager, ShownEntries};
use crate::storage::{EntryStore, StoreError};
use crate::view::{ClickTarget, PointerButton, Renderer, ViewCommand, ViewController};

use super::surface::TerminalSurface;
use super::Action;

/// The view as driven by the terminal.
pub type TerminalView<S> = ViewController<S, TerminalSurface, PreferenceManager>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UiAction {
    Quit,
    SelectNext,
    SelectPrev,
    NextPage,
    PrevPage,
    ScrollLines(i64),
    ScrollPages(i64),
    ToggleRead,
    ToggleStar,
    DeleteOrRestore,
    ToggleCollapsed,
    Activate,
    OpenLink { auxiliary: bool },
    Show(ShownEntries),
    Refresh,
}

pub(super) fn action_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<UiAction> {
    let action = match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => UiAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => UiAction::Quit,
        KeyCode::Char('j') => UiAction::SelectNext,
        KeyCode::Char('k') => UiAction::SelectPrev,
        KeyCode::Char('n') | KeyCode::Right => UiAction::NextPage,
        KeyCode::Char('p') | KeyCode::Left => UiAction::PrevPage,
        KeyCode::Down => UiAction::ScrollLines(1),
        KeyCode::Up => UiAction::ScrollLines(-1),
        KeyCode::Char(' ') | KeyCode::PageDown => UiAction::ScrollPages(1),
        KeyCode::PageUp => UiAction::ScrollPages(-1),
        KeyCode::Char('m') => UiAction::ToggleRead,
        KeyCode::Char('s') => UiAction::ToggleStar,
        KeyCode::Char('d') => UiAction::DeleteOrRestore,
        KeyCode::Char('c') => UiAction::ToggleCollapsed,
        KeyCode::Enter => UiAction::Activate,
        KeyCode::Char('o') => UiAction::OpenLink { auxiliary: false },
        KeyCode::Char('O') => UiAction::OpenLink { auxiliary: true },
        KeyCode::Char('1') => UiAction::Show(ShownEntries::All),
        KeyCode::Char('2') => UiAction::Show(ShownEntries::Unread),
        KeyCode::Char('3') => UiAction::Show(ShownEntries::Starred),
        KeyCode::Char('4') => UiAction::Show(ShownEntries::Trashed),
        KeyCode::Char('r') => UiAction::Refresh,
        _ => return None,
    };
    Some(action)
}

pub(super) async fn handle_input<S: EntryStore>(
    view: &mut TerminalView<S>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<Action, StoreError> {
    let Some(action) = action_for_key(code, modifiers) else {
        return Ok(Action::Continue);
    };
    view.surface_mut().clear_status();

    match action {
        UiAction::Quit => return Ok(Action::Quit),
        UiAction::SelectNext => view.handle(ViewCommand::SelectNext).await?,
        UiAction::SelectPrev => view.handle(ViewCommand::SelectPrev).await?,
        UiAction::NextPage => view.handle(ViewCommand::NextPage).await?,
        UiAction::PrevPage => view.handle(ViewCommand::PrevPage).await?,
        UiAction::ScrollLines(lines) => scroll(view, lines).await?,
        UiAction::ScrollPages(pages) => {
            let page = view.surface().viewport().height.max(1);
            scroll(view, pages * page).await?;
        }
        UiAction::ToggleRead => toggle_read(view).await?,
        UiAction::ToggleStar => {
            if let Some((id, _, starred)) = focused(view) {
                view.handle(ViewCommand::SetStarred {
                    id,
                    starred: !starred,
                })
                .await?;
            }
        }
        UiAction::DeleteOrRestore => {
            if let Some((id, _, _)) = focused(view) {
                let command = if view.surface().is_trash() {
                    ViewCommand::Restore { id }
                } else {
                    ViewCommand::Delete { id }
                };
                view.handle(command).await?;
            }
        }
        UiAction::ToggleCollapsed => toggle_collapsed(view).await?,
        // Enter stands in for the double-click.
        UiAction::Activate => {
            if view.surface().activation_marks_read() {
                toggle_read(view).await?;
            } else {
                toggle_collapsed(view).await?;
            }
        }
        UiAction::OpenLink { auxiliary } => {
            if let Some((id, _, _)) = focused(view) {
                let button = if auxiliary {
                    PointerButton::Auxiliary
                } else {
                    PointerButton::Primary
                };
                view.handle(ViewCommand::Click {
                    id,
                    target: ClickTarget::TitleLink,
                    button,
                })
                .await?;
            }
        }
        UiAction::Show(shown) => {
            if view.flags_intrinsic() {
                view.surface_mut()
                    .set_status("This view always shows the same entries");
            } else {
                tracing::debug!(shown = %shown, "Shown entries changed");
                view.prefs_mut().set_shown_entries(shown);
                view.ensure(true).await?;
            }
        }
        UiAction::Refresh => {
            view.ensure(true).await?;
        }
    }
    Ok(Action::Continue)
}

/// Id, read and starred flags of the entry keyboard actions apply to.
fn focused<S: EntryStore>(view: &TerminalView<S>) -> Option<(i64, bool, bool)> {
    let surface = view.surface();
    let id = surface.focused_entry()?;
    surface.card(id).map(|card| (id, card.read, card.starred))
}

async fn toggle_read<S: EntryStore>(view: &mut TerminalView<S>) -> Result<(), StoreError> {
    if let Some((id, read, _)) = focused(view) {
        view.handle(ViewCommand::SetRead { id, read: !read }).await?;
    }
    Ok(())
}

async fn toggle_collapsed<S: EntryStore>(view: &mut TerminalView<S>) -> Result<(), StoreError> {
    if let Some((id, _, _)) = focused(view) {
        if let Some(collapsed) = view.surface_mut().toggle_collapsed(id) {
            view.handle(ViewCommand::CollapseToggled { id, collapsed })
                .await?;
        }
    }
    Ok(())
}

async fn scroll<S: EntryStore>(view: &mut TerminalView<S>, rows: i64) -> Result<(), StoreError> {
    view.surface_mut().scroll_by(rows);
    view.handle(ViewCommand::Scrolled).await
}
