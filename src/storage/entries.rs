use sqlx::{QueryBuilder, Sqlite};

use super::query::Query;
use super::schema::Database;
use super::store::EntryStore;
use super::types::{
    DeletionState, Entry, EntryDbRow, EntryId, Feed, FeedDbRow, NewEntry, NewFeed, StoreError,
};

/// Ids per UPDATE statement, well under SQLite's bound parameter limit.
const BATCH_SIZE: usize = 500;

const ENTRY_COLUMNS: &str = "e.id, e.feed_id, e.title, e.url, e.content, e.authors, \
                             e.published, e.read, e.starred, e.updated";

/// Escape LIKE wildcards so user search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append the WHERE clause equivalent of `Query::matches`.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &Query) {
    builder.push(" WHERE 1 = 1");
    if query.read {
        builder.push(" AND e.read = 1");
    }
    if query.unread {
        builder.push(" AND e.read = 0");
    }
    if query.starred {
        builder.push(" AND e.starred = 1");
    }
    if query.unstarred {
        builder.push(" AND e.starred = 0");
    }
    if let Some(deleted) = query.deleted.as_column() {
        builder.push(" AND e.deleted = ");
        builder.push_bind(deleted);
    }
    if let Some(feeds) = &query.feeds {
        push_in_list(builder, " AND e.feed_id IN (", feeds);
    }
    if let Some(folders) = &query.folders {
        push_in_list(builder, " AND f.folder_id IN (", folders);
    }
    if let Some(needle) = query.search_text() {
        let pattern = format!("%{}%", escape_like(needle));
        builder.push(" AND (e.title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR e.content LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

fn push_in_list(builder: &mut QueryBuilder<'_, Sqlite>, prefix: &str, values: &[i64]) {
    if values.is_empty() {
        // `IN ()` is a syntax error; an empty restriction matches nothing.
        builder.push(" AND 0");
        return;
    }
    builder.push(prefix);
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(*value);
    }
    separated.push_unseparated(")");
}

impl Database {
    // ========================================================================
    // Seeding
    // ========================================================================

    /// Insert a feed, or refresh the metadata of the feed with the same URL.
    pub async fn insert_feed(&self, feed: &NewFeed) -> Result<i64, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO feeds (title, url, html_url, image_url, image_title, subtitle, folder_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                html_url = excluded.html_url,
                image_url = excluded.image_url,
                image_title = excluded.image_title,
                subtitle = excluded.subtitle,
                folder_id = excluded.folder_id
            RETURNING id
        "#,
        )
        .bind(&feed.title)
        .bind(&feed.url)
        .bind(&feed.html_url)
        .bind(&feed.image_url)
        .bind(&feed.image_title)
        .bind(&feed.subtitle)
        .bind(feed.folder_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert an entry. An entry with the same guid in the same feed is
    /// revised in place and flagged as updated; read and starred state is kept.
    pub async fn insert_entry(&self, feed_id: i64, entry: &NewEntry) -> Result<EntryId, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO entries (feed_id, guid, title, url, content, authors, published, updated, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(feed_id, guid) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                content = excluded.content,
                authors = excluded.authors,
                published = excluded.published,
                updated = 1
            RETURNING id
        "#,
        )
        .bind(feed_id)
        .bind(&entry.guid)
        .bind(&entry.title)
        .bind(&entry.url)
        .bind(&entry.content)
        .bind(&entry.authors)
        .bind(entry.published)
        .bind(entry.updated)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Permanently delete entries, bypassing the trash.
    pub async fn purge_entries(&self, ids: &[EntryId]) -> Result<u64, StoreError> {
        let mut removed = 0;
        for chunk in ids.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("DELETE FROM entries WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
            removed += builder.build().execute(&self.pool).await?.rows_affected();
        }
        Ok(removed)
    }

    /// Set one integer column on a set of entries.
    async fn update_column(
        &self,
        column: &'static str,
        value: i64,
        ids: &[EntryId],
    ) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for chunk in ids.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE entries SET ");
            builder.push(column);
            builder.push(" = ");
            builder.push_bind(value);
            builder.push(" WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        tracing::debug!(column, value, count = ids.len(), "Updated entries");
        Ok(())
    }
}

impl EntryStore for Database {
    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) FROM entries e JOIN feeds f ON f.id = e.feed_id",
        );
        push_filters(&mut builder, query);
        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn ids(&self, query: &Query) -> Result<Vec<EntryId>, StoreError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT e.id FROM entries e JOIN feeds f ON f.id = e.feed_id");
        push_filters(&mut builder, query);
        builder.push(" ORDER BY COALESCE(e.published, 0) DESC, e.id DESC");
        let rows: Vec<(i64,)> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn entries(
        &self,
        query: &Query,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(ENTRY_COLUMNS);
        builder.push(" FROM entries e JOIN feeds f ON f.id = e.feed_id");
        push_filters(&mut builder, query);
        builder.push(" ORDER BY COALESCE(e.published, 0) DESC, e.id DESC LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows: Vec<EntryDbRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(EntryDbRow::into_entry).collect())
    }

    async fn mark_read(&self, ids: &[EntryId], read: bool) -> Result<(), StoreError> {
        self.update_column("read", i64::from(read), ids).await
    }

    async fn star(&self, ids: &[EntryId], starred: bool) -> Result<(), StoreError> {
        self.update_column("starred", i64::from(starred), ids).await
    }

    async fn set_deletion_state(
        &self,
        ids: &[EntryId],
        state: DeletionState,
    ) -> Result<(), StoreError> {
        match state.as_column() {
            Some(value) => self.update_column("deleted", value, ids).await,
            None => Ok(()),
        }
    }

    async fn feed(&self, feed_id: i64) -> Result<Option<Feed>, StoreError> {
        let row = sqlx::query_as::<_, FeedDbRow>(
            r#"
            SELECT id, title, url, html_url, image_url, image_title, subtitle, folder_id
            FROM feeds
            WHERE id = ?
        "#,
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FeedDbRow::into_feed))
    }
}
