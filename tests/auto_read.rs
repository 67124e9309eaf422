//! Marking entries read after they have been on screen for a while.

mod common;

use std::time::Duration;

use common::{prefs, run_for, seed, settle, view, FakeSurface, TestView};
use feedview::preferences::{ShownEntries, ViewPrefs};
use feedview::storage::{EntryId, EntryStore, MemoryStore, Query};
use feedview::view::{RenderInstruction, Renderer, ViewCommand, ViewController, ViewOptions};
use pretty_assertions::assert_eq;

fn read_ids(store: &MemoryStore, ids: &[EntryId]) -> Vec<EntryId> {
    ids.iter()
        .copied()
        .filter(|id| store.entry(*id).is_some_and(|e| e.read))
        .collect()
}

/// A settled view with auto-read switched on afterwards, so the first scan
/// only starts with the next scroll.
async fn settled_view(store: &MemoryStore) -> TestView {
    let mut view = view(store, Query::all(), prefs());
    settle(&mut view).await;
    view.prefs_mut().auto_mark_read = true;
    view
}

#[tokio::test(start_paused = true)]
async fn test_visible_entries_read_after_debounce() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = settled_view(&store).await;
    view.surface_mut().clear_log();

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(450)).await;
    assert!(read_ids(&store, &ids).is_empty());

    run_for(&mut view, Duration::from_millis(100)).await;
    // Viewport 0..100 minus the 50 unit margin: rows starting at 0..40.
    assert_eq!(read_ids(&store, &ids), ids[..5].to_vec());
    let updates = view
        .surface()
        .log
        .iter()
        .filter(|i| matches!(i, RenderInstruction::UpdateFlags { read: true, .. }))
        .count();
    assert_eq!(updates, 5);
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_restarts_debounce() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = settled_view(&store).await;

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(300)).await;
    view.surface_mut().scroll_to(50);
    view.handle(ViewCommand::Scrolled).await.unwrap();

    run_for(&mut view, Duration::from_millis(300)).await;
    assert!(read_ids(&store, &ids).is_empty());

    run_for(&mut view, Duration::from_millis(300)).await;
    assert_eq!(read_ids(&store, &ids), ids[5..10].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_replaces_pending_scan() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = settled_view(&store).await;

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(300)).await;
    view.ensure(true).await.unwrap();

    // Past the scroll's deadline: only the rebuilt page's scan is pending.
    run_for(&mut view, Duration::from_millis(400)).await;
    assert!(read_ids(&store, &ids).is_empty());

    run_for(&mut view, Duration::from_millis(300)).await;
    assert_eq!(read_ids(&store, &ids), ids[..5].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_entries_marked_unread_are_skipped() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = settled_view(&store).await;

    view.handle(ViewCommand::SetRead { id: ids[0], read: true })
        .await
        .unwrap();
    view.handle(ViewCommand::SetRead { id: ids[0], read: false })
        .await
        .unwrap();
    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(600)).await;

    assert_eq!(read_ids(&store, &ids), ids[1..5].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_first_page_is_read_after_build() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let prefs = ViewPrefs {
        auto_mark_read: true,
        ..prefs()
    };
    let mut view = view(&store, Query::all(), prefs);

    run_for(&mut view, Duration::from_millis(1200)).await;

    assert_eq!(read_ids(&store, &ids), ids[..5].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_unread_view_never_auto_reads() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let prefs = ViewPrefs {
        auto_mark_read: true,
        shown_entries: ShownEntries::Unread,
        ..prefs()
    };
    let mut view = view(&store, Query::all(), prefs);
    settle(&mut view).await;

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(1000)).await;

    assert!(read_ids(&store, &ids).is_empty());
    assert_eq!(view.rendered_ids(), ids[..20].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_hidden_view_does_not_auto_read() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = settled_view(&store).await;

    view.surface_mut().presented = false;
    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(600)).await;

    assert!(read_ids(&store, &ids).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_read_margin_is_configurable() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = ViewController::new(
        "All entries",
        Query::all(),
        store.clone(),
        FakeSurface::new(10, 100),
        prefs(),
        ViewOptions { read_margin: 0 },
    );
    settle(&mut view).await;
    view.prefs_mut().auto_mark_read = true;

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(600)).await;

    assert_eq!(read_ids(&store, &ids), ids[..10].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_entry_unread_elsewhere_is_read_again() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = settled_view(&store).await;

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(600)).await;
    assert_eq!(read_ids(&store, &ids), ids[..5].to_vec());

    // Another client marks it unread; the count is unchanged so the page
    // still shows it as read.
    store.mark_read(&ids[..1], false).await.unwrap();
    assert!(view.ensure(false).await.unwrap());

    view.handle(ViewCommand::Scrolled).await.unwrap();
    run_for(&mut view, Duration::from_millis(600)).await;
    assert_eq!(read_ids(&store, &ids), ids[..5].to_vec());
}
