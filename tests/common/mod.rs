#![allow(dead_code)]

use std::time::Duration;

use feedview::preferences::ViewPrefs;
use feedview::storage::{EntryId, EntryStore, MemoryStore, NewEntry, NewFeed, Query};
use feedview::view::{
    EntryGeometry, RenderInstruction, Renderer, ViewCommand, ViewController, ViewOptions, Viewport,
};
use tokio::time::Instant;

pub type TestViewOf<S> = ViewController<S, FakeSurface, ViewPrefs>;
pub type TestView = TestViewOf<MemoryStore>;

/// Surface that records instructions and lays entries out in fixed-height rows.
#[derive(Debug)]
pub struct FakeSurface {
    pub log: Vec<RenderInstruction>,
    pub presented: bool,
    pub rows: Vec<EntryId>,
    pub row_height: i64,
    pub height: i64,
    pub offset: i64,
    pub selected: Option<EntryId>,
    pending_load: bool,
}

impl FakeSurface {
    pub fn new(row_height: i64, height: i64) -> Self {
        Self {
            log: Vec::new(),
            presented: true,
            rows: Vec::new(),
            row_height,
            height,
            offset: 0,
            selected: None,
            pending_load: false,
        }
    }

    pub fn take_pending_load(&mut self) -> bool {
        std::mem::take(&mut self.pending_load)
    }

    pub fn resets(&self) -> usize {
        self.log
            .iter()
            .filter(|i| matches!(i, RenderInstruction::Reset))
            .count()
    }

    pub fn removals(&self) -> Vec<(EntryId, bool)> {
        self.log
            .iter()
            .filter_map(|i| match i {
                RenderInstruction::Remove { id, animated } => Some((*id, *animated)),
                _ => None,
            })
            .collect()
    }

    pub fn opened_links(&self) -> Vec<(String, bool)> {
        self.log
            .iter()
            .filter_map(|i| match i {
                RenderInstruction::OpenLink { url, new_surface } => {
                    Some((url.to_string(), *new_surface))
                }
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn max_offset(&self) -> i64 {
        (self.rows.len() as i64 * self.row_height - self.height).max(0)
    }
}

impl Renderer for FakeSurface {
    fn is_presented(&self) -> bool {
        self.presented
    }

    fn apply(&mut self, instruction: RenderInstruction) {
        match &instruction {
            RenderInstruction::Reset => {
                self.rows.clear();
                self.offset = 0;
                self.selected = None;
                self.pending_load = true;
            }
            RenderInstruction::Append(card) => self.rows.push(card.id),
            RenderInstruction::Remove { id, .. } => self.rows.retain(|r| r != id),
            RenderInstruction::Select(id) => self.selected = *id,
            _ => {}
        }
        self.log.push(instruction);
    }

    fn geometry(&self, id: EntryId) -> Option<EntryGeometry> {
        let index = self.rows.iter().position(|r| *r == id)?;
        Some(EntryGeometry {
            top: index as i64 * self.row_height,
            height: self.row_height,
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            offset: self.offset,
            height: self.height,
            max_offset: self.max_offset(),
        }
    }

    fn scroll_to(&mut self, offset: i64) {
        self.offset = offset.clamp(0, self.max_offset());
    }
}

/// Prefs with auto-read off so tests opt into it explicitly.
pub fn prefs() -> ViewPrefs {
    ViewPrefs {
        entries_per_page: 20,
        auto_mark_read: false,
        ..ViewPrefs::default()
    }
}

/// One feed with `count` entries, newest first in insertion order.
/// Returns the ids in view order.
pub fn seed(store: &MemoryStore, count: usize) -> Vec<EntryId> {
    let feed_id = store.insert_feed(NewFeed {
        title: "Example Feed".to_string(),
        url: "https://example.com/feed.xml".to_string(),
        html_url: Some("https://example.com".to_string()),
        ..NewFeed::default()
    });
    seed_feed(store, feed_id, count, 1_700_000_000)
}

pub fn seed_feed(store: &MemoryStore, feed_id: i64, count: usize, newest: i64) -> Vec<EntryId> {
    (0..count)
        .map(|n| {
            store.insert_entry(
                feed_id,
                NewEntry {
                    guid: format!("{}-{}", feed_id, n),
                    title: format!("Entry {}", n),
                    url: Some(format!("https://example.com/entries/{}/{}", feed_id, n)),
                    content: Some(format!("<p>Body {}</p>", n)),
                    authors: None,
                    published: Some(newest - n as i64 * 60),
                    updated: false,
                },
            )
        })
        .collect()
}

pub fn view_with(store: &MemoryStore, query: Query, prefs: ViewPrefs, surface: FakeSurface) -> TestView {
    ViewController::new("All entries", query, store.clone(), surface, prefs, ViewOptions::default())
}

/// Ten-unit rows in a 100-unit viewport.
pub fn view(store: &MemoryStore, query: Query, prefs: ViewPrefs) -> TestView {
    view_with(store, query, prefs, FakeSurface::new(10, 100))
}

/// Answer pending loads and run delivered timers until nothing is left to do.
pub async fn pump<S: EntryStore>(view: &mut TestViewOf<S>) {
    loop {
        let mut progressed = false;
        if view.surface_mut().take_pending_load() {
            view.handle(ViewCommand::Loaded).await.unwrap();
            progressed = true;
        }
        tokio::task::yield_now().await;
        while let Some(fired) = view.try_next_timer() {
            view.on_timer(fired).await.unwrap();
            progressed = true;
        }
        if !progressed {
            break;
        }
    }
}

/// Let `duration` of (paused) time pass in 1 ms steps, pumping the view.
pub async fn run_for<S: EntryStore>(view: &mut TestViewOf<S>, duration: Duration) {
    let deadline = Instant::now() + duration;
    pump(view).await;
    while Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(1)).await;
        pump(view).await;
    }
}

/// Build the first page and let the snapshot be captured.
pub async fn settle<S: EntryStore>(view: &mut TestViewOf<S>) {
    run_for(view, Duration::from_millis(600)).await;
}
