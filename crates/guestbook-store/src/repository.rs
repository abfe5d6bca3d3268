//! Storage capability trait.

use crate::entry::{Entry, NewEntry};
use crate::Result;

/// Abstract storage backend for guestbook entries.
///
/// The HTTP layer holds an `Arc<dyn EntryRepository>` and never keeps entries
/// between requests, so every call goes straight to the backing store.
///
/// No locking or ordering is imposed beyond what the store provides itself.
#[async_trait::async_trait]
pub trait EntryRepository: Send + Sync {
    /// All entries, newest `created_at` first.
    ///
    /// Entries sharing a timestamp are ordered by descending id.
    async fn find_all_order_by_created_at_desc(&self) -> Result<Vec<Entry>>;

    /// Persist a new entry and return it with its assigned id.
    async fn save(&self, entry: NewEntry) -> Result<Entry>;

    async fn exists_by_id(&self, id: i64) -> Result<bool>;

    /// Remove an entry. Does nothing if `id` is unknown.
    async fn delete_by_id(&self, id: i64) -> Result<()>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Entry>>;

    /// Liveness check backing `/actuator/health`.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
