//! Page switching, page bookkeeping and the shown-entries filter.

mod common;

use common::{prefs, seed, settle, view};
use feedview::preferences::{ShownEntries, ViewPrefs};
use feedview::storage::{EntryStore, MemoryStore, Query};
use feedview::view::{EmptyReason, PageIndicator, RenderInstruction};
use pretty_assertions::assert_eq;

fn last_indicator(log: &[RenderInstruction]) -> Option<PageIndicator> {
    log.iter().rev().find_map(|i| match i {
        RenderInstruction::Pagination(indicator) => Some(*indicator),
        _ => None,
    })
}

#[tokio::test(start_paused = true)]
async fn test_indicator_published_after_build() {
    let store = MemoryStore::new();
    seed(&store, 21);
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;

    assert_eq!(
        last_indicator(&view.surface().log),
        Some(PageIndicator {
            current: 1,
            count: 2,
            prev_enabled: false,
            next_enabled: true,
        })
    );

    view.next_page();
    settle(&mut view).await;
    assert_eq!(
        last_indicator(&view.surface().log),
        Some(PageIndicator {
            current: 2,
            count: 2,
            prev_enabled: true,
            next_enabled: false,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalid_pages_are_ignored() {
    let store = MemoryStore::new();
    seed(&store, 30);
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;
    let resets = view.surface().resets();

    assert!(!view.set_current_page(0));
    assert!(!view.set_current_page(1));
    assert!(!view.set_current_page(3));
    assert!(!view.prev_page());

    assert_eq!(view.current_page(), 1);
    assert_eq!(view.surface().resets(), resets);
}

#[tokio::test(start_paused = true)]
async fn test_page_window() {
    let store = MemoryStore::new();
    let ids = seed(&store, 50);
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;
    assert_eq!(view.page_count(), 3);

    assert!(view.set_current_page(3));
    settle(&mut view).await;
    assert_eq!(view.rendered_ids(), ids[40..].to_vec());
    assert_eq!(view.surface().rows, ids[40..].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_stale_page_falls_back_to_last_page() {
    let store = MemoryStore::new();
    let ids = seed(&store, 45);
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;
    view.set_current_page(3);
    settle(&mut view).await;
    assert_eq!(view.rendered_ids(), ids[40..].to_vec());

    for id in &ids[40..] {
        store.remove_entry(*id);
    }
    assert!(!view.ensure(true).await.unwrap());
    settle(&mut view).await;

    assert_eq!(view.current_page(), 2);
    assert_eq!(view.page_count(), 2);
    assert_eq!(view.rendered_ids(), ids[20..40].to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_page_size_change_applies_on_refresh() {
    let store = MemoryStore::new();
    let ids = seed(&store, 25);
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;

    view.prefs_mut().entries_per_page = 10;
    assert!(!view.ensure(true).await.unwrap());
    settle(&mut view).await;

    assert_eq!(view.rendered_ids(), ids[..10].to_vec());
    assert_eq!(view.page_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shown_entries_filter_applies_on_refresh() {
    let store = MemoryStore::new();
    let ids = seed(&store, 6);
    store.mark_read(&ids[..4], true).await.unwrap();
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;
    assert_eq!(view.rendered_ids(), ids);

    view.prefs_mut().shown_entries = ShownEntries::Unread;
    assert!(view.query().unread);
    assert!(!view.ensure(true).await.unwrap());
    settle(&mut view).await;
    assert_eq!(view.rendered_ids(), ids[4..].to_vec());

    view.prefs_mut().shown_entries = ShownEntries::Starred;
    view.ensure(true).await.unwrap();
    settle(&mut view).await;
    assert!(view.rendered_ids().is_empty());
    assert!(view
        .surface()
        .log
        .contains(&RenderInstruction::Empty(EmptyReason::NoStarredInFeed)));
}

#[tokio::test(start_paused = true)]
async fn test_intrinsic_view_ignores_shown_entries() {
    let store = MemoryStore::new();
    let ids = seed(&store, 6);
    store.mark_read(&ids[..4], true).await.unwrap();
    let prefs = ViewPrefs {
        shown_entries: ShownEntries::Starred,
        ..prefs()
    };
    let unread = Query {
        unread: true,
        ..Query::default()
    };
    let mut view = view(&store, unread, prefs);
    settle(&mut view).await;

    assert!(view.flags_intrinsic());
    assert_eq!(view.rendered_ids(), ids[4..].to_vec());

    store.mark_read(&ids[4..], true).await.unwrap();
    view.ensure(false).await.unwrap();
    settle(&mut view).await;
    assert!(view
        .surface()
        .log
        .contains(&RenderInstruction::Empty(EmptyReason::NoUnread)));
}

#[tokio::test(start_paused = true)]
async fn test_single_feed_view_sends_feed_header() {
    let store = MemoryStore::new();
    seed(&store, 2);
    let mut view = view(&store, Query::feed(1), prefs());
    settle(&mut view).await;

    let header = view.surface().log.iter().find_map(|i| match i {
        RenderInstruction::Header(header) => Some(header.clone()),
        _ => None,
    });
    let header = header.unwrap();
    assert!(!header.show_feed_names);
    assert_eq!(
        header.feed.map(|f| f.link),
        Some("https://example.com".to_string())
    );

    // A search hides the feed header.
    let mut search = Query::feed(1);
    search.search = Some("Entry".to_string());
    view.navigate("Search", search);
    settle(&mut view).await;
    let header = view.surface().log.iter().rev().find_map(|i| match i {
        RenderInstruction::Header(header) => Some(header.clone()),
        _ => None,
    });
    assert_eq!(header.unwrap().feed, None);
}

#[tokio::test(start_paused = true)]
async fn test_cards_carry_feed_name_and_date() {
    let store = MemoryStore::new();
    seed(&store, 1);
    let mut view = view(&store, Query::all(), prefs());
    settle(&mut view).await;

    let card = view.surface().log.iter().find_map(|i| match i {
        RenderInstruction::Append(card) => Some(card.clone()),
        _ => None,
    });
    let card = card.unwrap();
    assert_eq!(&*card.feed_name, "Example Feed");
    assert_eq!(&*card.title, "Entry 0");
    assert!(card.date.is_some());
    assert!(!card.read);
}
