use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};

use feedview::config::Config;
use feedview::preferences::PreferenceManager;
use feedview::storage::{Database, DeletionState, EntryStore, MemoryStore, NewEntry, NewFeed, Query, StoreError};
use feedview::ui::{self, TerminalSurface};
use feedview::view::{ViewController, ViewOptions};

/// Views whose flags are fixed regardless of the shown-entries preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SpecialView {
    Unread,
    Starred,
    Trash,
}

#[derive(Parser, Debug)]
#[command(name = "feedview", about = "Paginated terminal view of feed entries")]
struct Args {
    /// SQLite database to read entries from (default: <config dir>/feeds.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Use an in-memory store filled with sample entries
    #[arg(long, conflicts_with = "db")]
    demo: bool,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show a special view instead of the shown-entries preference
    #[arg(long, value_enum)]
    view: Option<SpecialView>,

    /// Restrict to a feed id (repeatable)
    #[arg(long = "feed", value_name = "ID")]
    feeds: Vec<i64>,

    /// Restrict to a folder id (repeatable)
    #[arg(long = "folder", value_name = "ID")]
    folders: Vec<i64>,

    /// Only entries whose title or content contain this text
    #[arg(long)]
    search: Option<String>,

    /// View title
    #[arg(long)]
    title: Option<String>,
}

impl Args {
    fn query(&self) -> Query {
        let mut query = Query::all();
        match self.view {
            Some(SpecialView::Unread) => query.unread = true,
            Some(SpecialView::Starred) => query.starred = true,
            Some(SpecialView::Trash) => query.deleted = DeletionState::Trashed,
            None => {}
        }
        if !self.feeds.is_empty() {
            query.feeds = Some(self.feeds.clone());
        }
        if !self.folders.is_empty() {
            query.folders = Some(self.folders.clone());
        }
        query.search = self.search.clone().filter(|s| !s.trim().is_empty());
        query
    }

    fn title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        match self.view {
            Some(SpecialView::Unread) => "Unread".to_string(),
            Some(SpecialView::Starred) => "Starred".to_string(),
            Some(SpecialView::Trash) => "Trash".to_string(),
            None => "All entries".to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The terminal owns stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = Config::default_dir();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let options = ViewOptions {
        read_margin: config.read_margin,
    };

    if args.demo {
        let store = MemoryStore::new();
        seed_demo(&store);
        let prefs = PreferenceManager::from_config(&config);
        return run_view(&args, store, prefs, options, None).await;
    }

    let db_path = match &args.db {
        Some(path) => path.clone(),
        None => {
            std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
            config_dir.join("feeds.db")
        }
    };
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(StoreError::InstanceLocked) => {
            eprintln!("Error: the database is locked by another process. Close it and try again.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };
    let prefs = PreferenceManager::load(&config, &db)
        .await
        .context("Failed to load preferences")?;

    run_view(&args, db.clone(), prefs, options, Some(&db)).await
}

async fn run_view<S: EntryStore>(
    args: &Args,
    store: S,
    prefs: PreferenceManager,
    options: ViewOptions,
    db: Option<&Database>,
) -> Result<()> {
    // Resized to the real terminal once the loop starts.
    let surface = TerminalSurface::new(80, 21);
    let mut view = ViewController::new(args.title(), args.query(), store, surface, prefs, options);
    if let Some(search) = &args.search {
        view.set_title_override(Some(format!("Search: {}", search)));
    }
    ui::run(&mut view, db).await
}

/// Fill the in-memory store with a few feeds spread over several pages.
fn seed_demo(store: &MemoryStore) {
    let now = Utc::now().timestamp();
    let feeds = [
        ("Rust Blog", "https://blog.rust-lang.org/feed.xml", "https://blog.rust-lang.org"),
        ("This Week in Rust", "https://this-week-in-rust.org/rss.xml", "https://this-week-in-rust.org"),
        ("Example News", "https://news.example.com/atom.xml", "https://news.example.com"),
    ];

    for (index, (title, url, site)) in feeds.iter().enumerate() {
        let feed_id = store.insert_feed(NewFeed {
            title: title.to_string(),
            url: url.to_string(),
            html_url: Some(site.to_string()),
            subtitle: Some(format!("Sample entries from {}", title)),
            ..NewFeed::default()
        });
        for n in 0..15 {
            let published = now - (n * 3 + index as i64) * 7_200;
            store.insert_entry(
                feed_id,
                NewEntry {
                    guid: format!("{}-{}", feed_id, n),
                    title: format!("{} post #{}", title, 15 - n),
                    url: Some(format!("{}/posts/{}", site, 15 - n)),
                    content: Some(format!(
                        "<p>Entry {} of {}.</p><p>Scroll past it to mark it read, or press \
                         <b>m</b> to toggle. <b>d</b> moves it to the trash.</p>",
                        15 - n,
                        title
                    )),
                    authors: (n % 3 == 0).then(|| "Ferris".to_string()),
                    published: Some(published),
                    updated: false,
                },
            );
        }
    }
}
