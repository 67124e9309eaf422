//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, the view's timer deliveries and a periodic
//! consistency check on the current task, so the controller is never shared.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use crate::storage::{Database, EntryStore, StoreError};
use crate::view::ViewCommand;

use super::draw::{body_size, render};
use super::input::{handle_input, TerminalView};

/// Period of the background `ensure`, which picks up changes made to the
/// store by other processes.
const CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Result of handling a key press event.
pub enum Action {
    Continue,
    Quit,
}

/// Run the view until the user quits.
///
/// Preference writes queued by the view (key navigation, shown entries) are
/// persisted to `db` after every event; without a database they only live in
/// memory.
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
pub async fn run<S: EntryStore>(view: &mut TerminalView<S>, db: Option<&Database>) -> Result<()> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let size = terminal.size()?;
    let (width, height) = body_size(size.width, size.height);
    view.surface_mut().resize(width, height);

    let mut event_stream = crossterm::event::EventStream::new();
    let mut check_interval = tokio::time::interval(CHECK_INTERVAL);

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        if view.surface_mut().take_pending_load() {
            let result = view.handle(ViewCommand::Loaded).await;
            report(view, result);
        }

        persist_preferences(view, db).await;

        if view.surface_mut().take_needs_redraw() {
            terminal.draw(|f| render(f, view.surface()))?;
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match handle_input(view, key.code, key.modifiers).await {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => report(view, Err(e)),
                        }
                    }
                    Some(Ok(Event::FocusLost)) => view.surface_mut().set_presented(false),
                    Some(Ok(Event::FocusGained)) => {
                        // Changes made while in the background are picked up here.
                        view.surface_mut().set_presented(true);
                        let result = view.ensure(true).await.map(|_| ());
                        report(view, result);
                    }
                    Some(Ok(Event::Resize(cols, rows))) => {
                        let (width, height) = body_size(cols, rows);
                        view.surface_mut().resize(width, height);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal input error");
                    }
                    None => break,
                }
            }

            Some(fired) = view.next_timer() => {
                let result = view.on_timer(fired).await;
                report(view, result);
            }

            _ = check_interval.tick() => {
                let result = view.ensure(false).await.map(|_| ());
                report(view, result);
            }
        }
    }

    persist_preferences(view, db).await;
    restore_terminal(terminal)?;
    Ok(())
}

/// Show a store failure in the status bar. The view keeps running.
fn report<S: EntryStore>(view: &mut TerminalView<S>, result: Result<(), StoreError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Store operation failed");
        view.surface_mut().set_status(format!("Error: {}", e));
    }
}

async fn persist_preferences<S: EntryStore>(view: &mut TerminalView<S>, db: Option<&Database>) {
    if !view.prefs().has_pending() {
        return;
    }
    match db {
        Some(db) => {
            if let Err(e) = view.prefs_mut().flush(db).await {
                tracing::warn!(error = %e, "Failed to persist preferences");
            }
        }
        None => view.prefs_mut().discard_pending(),
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
