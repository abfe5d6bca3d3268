//! In-process storage implementation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;

use crate::entry::{Entry, NewEntry};
use crate::repository::EntryRepository;
use crate::Result;

/// Entries held in memory. Ids start at 1 and are never reused.
pub struct MemoryRepository {
    entries: RwLock<BTreeMap<i64, Entry>>,
    next_id: AtomicI64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntryRepository for MemoryRepository {
    async fn find_all_order_by_created_at_desc(&self) -> Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    async fn save(&self, entry: NewEntry) -> Result<Entry> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entry = entry.into_entry(id, Utc::now());
        self.entries.write().insert(id, entry.clone());
        Ok(entry)
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.entries.read().contains_key(&id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.entries.write().remove(&id);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Entry>> {
        Ok(self.entries.read().get(&id).cloned())
    }
}
