mod entries;
mod memory;
mod preferences;
mod query;
mod schema;
mod store;
mod types;

pub use memory::MemoryStore;
pub use query::Query;
pub use schema::Database;
pub use store::EntryStore;
pub use types::{DeletionState, Entry, EntryId, Feed, NewEntry, NewFeed, StoreError};
