use super::query::Query;
use super::types::{DeletionState, Entry, EntryId, Feed, StoreError};

/// Backing store consumed by the view.
///
/// The store is shared and may be mutated by other actors at any time; the
/// view never assumes it is the sole writer and re-derives its own state
/// through `ViewController::ensure` instead. Every call is awaited in order on
/// the view's task, so implementations see the calls of one view strictly
/// sequentially.
#[allow(async_fn_in_trait)]
pub trait EntryStore {
    /// Number of entries matching the query (unpaginated).
    async fn count(&self, query: &Query) -> Result<usize, StoreError>;

    /// Ids of all entries matching the query, in store order.
    async fn ids(&self, query: &Query) -> Result<Vec<EntryId>, StoreError>;

    /// One page of matching entries, in store order.
    async fn entries(
        &self,
        query: &Query,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError>;

    async fn mark_read(&self, ids: &[EntryId], read: bool) -> Result<(), StoreError>;

    async fn star(&self, ids: &[EntryId], starred: bool) -> Result<(), StoreError>;

    /// Move entries to or from the trash. `DeletionState::Any` is not a
    /// storable state and leaves the entries untouched.
    async fn set_deletion_state(
        &self,
        ids: &[EntryId],
        state: DeletionState,
    ) -> Result<(), StoreError>;

    async fn feed(&self, feed_id: i64) -> Result<Option<Feed>, StoreError>;
}
