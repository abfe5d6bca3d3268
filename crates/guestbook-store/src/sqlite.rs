//! SQLite storage implementation.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::entry::{Entry, NewEntry};
use crate::error::StoreError;
use crate::migrations::run_migrations;
use crate::repository::EntryRepository;
use crate::Result;

/// Raw `guestbook_entries` row: id, name, content, created_at (epoch micros).
type EntryRow = (i64, String, String, i64);

const SELECT_COLUMNS: &str = "SELECT id, name, content, created_at FROM guestbook_entries";

/// Entries stored in a single SQLite table.
///
/// Timestamps are kept as microseconds since the Unix epoch, so anything
/// finer is truncated on save and the returned entry reflects that.
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;
        tracing::info!("Opened guestbook database at {:?}", path.as_ref());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await?
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode((id, name, content, micros): EntryRow) -> Result<Entry> {
    let created_at =
        DateTime::from_timestamp_micros(micros).ok_or_else(|| StoreError::Corrupt {
            id,
            reason: format!("created_at out of range: {}", micros),
        })?;

    Ok(Entry {
        id,
        name,
        content,
        created_at,
    })
}

#[async_trait::async_trait]
impl EntryRepository for SqliteRepository {
    async fn find_all_order_by_created_at_desc(&self) -> Result<Vec<Entry>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY created_at DESC, id DESC",
                SELECT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(decode).collect()
        })
        .await
    }

    async fn save(&self, entry: NewEntry) -> Result<Entry> {
        let mut entry = entry.into_entry(0, Utc::now());
        entry.created_at = entry.created_at.trunc_subsecs(6);

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO guestbook_entries (name, content, created_at) VALUES (?1, ?2, ?3)",
                params![entry.name, entry.content, entry.created_at.timestamp_micros()],
            )?;
            entry.id = conn.last_insert_rowid();
            tracing::debug!("Inserted guestbook entry {}", entry.id);
            Ok(entry)
        })
        .await
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        self.with_connection(move |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM guestbook_entries WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.with_connection(move |conn| {
            let removed = conn.execute("DELETE FROM guestbook_entries WHERE id = ?1", [id])?;
            tracing::debug!("Deleted {} guestbook entries with id {}", removed, id);
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Entry>> {
        self.with_connection(move |conn| {
            let row = conn
                .query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], read_row)
                .optional()?;
            row.map(decode).transpose()
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let alice = repo.save(NewEntry::new("Alice", "Hi")).await.unwrap();
        let bob = repo.save(NewEntry::new("Bob", "Yo")).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(alice.name, "Alice");
        assert_eq!(bob.content, "Yo");
    }

    #[tokio::test]
    async fn test_save_then_find_returns_same_entry() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let saved = repo.save(NewEntry::new("Alice", "Hi")).await.unwrap();
        let found = repo.find_by_id(saved.id).await.unwrap();

        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        assert_eq!(repo.find_by_id(42).await.unwrap(), None);
        assert!(!repo.exists_by_id(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at_desc() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        for hour in [5, 1, 9, 3] {
            repo.save(NewEntry::new("n", "c").with_created_at(at(hour)))
                .await
                .unwrap();
        }

        let hours: Vec<_> = repo
            .find_all_order_by_created_at_desc()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.created_at)
            .collect();
        assert_eq!(hours, vec![at(9), at(5), at(3), at(1)]);
    }

    #[tokio::test]
    async fn test_list_breaks_ties_by_id_desc() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let first = repo
            .save(NewEntry::new("a", "a").with_created_at(at(1)))
            .await
            .unwrap();
        let second = repo
            .save(NewEntry::new("b", "b").with_created_at(at(1)))
            .await
            .unwrap();

        let ids: Vec<_> = repo
            .find_all_order_by_created_at_desc()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        assert!(repo
            .find_all_order_by_created_at_desc()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_entry_and_ignores_missing() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let saved = repo.save(NewEntry::new("Alice", "Hi")).await.unwrap();

        repo.delete_by_id(saved.id).await.unwrap();
        assert!(!repo.exists_by_id(saved.id).await.unwrap());

        // Second delete is a no-op
        repo.delete_by_id(saved.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_deleted_ids_are_not_reused() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let first = repo.save(NewEntry::new("a", "a")).await.unwrap();
        repo.delete_by_id(first.id).await.unwrap();

        let next = repo.save(NewEntry::new("b", "b")).await.unwrap();
        assert!(next.id > first.id);
    }

    #[tokio::test]
    async fn test_timestamp_truncated_to_micros() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let precise = at(2) + Duration::nanoseconds(1_234_567);

        let saved = repo
            .save(NewEntry::new("a", "a").with_created_at(precise))
            .await
            .unwrap();
        assert_eq!(saved.created_at, at(2) + Duration::microseconds(1_234));

        let found = repo.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(found.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn test_entries_persist_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("guestbook.db");

        let saved = {
            let repo = SqliteRepository::open(&path).unwrap();
            repo.save(NewEntry::new("Alice", "Hi")).await.unwrap()
        };

        let repo = SqliteRepository::open(&path).unwrap();
        assert_eq!(repo.find_by_id(saved.id).await.unwrap(), Some(saved));
        repo.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_range_timestamp_is_corrupt() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let id = {
            let conn = repo.conn.lock();
            conn.execute(
                "INSERT INTO guestbook_entries (name, content, created_at) VALUES ('a', 'b', ?1)",
                [i64::MAX],
            )
            .unwrap();
            conn.last_insert_rowid()
        };

        let result = repo.find_by_id(id).await;
        assert!(
            matches!(result, Err(StoreError::Corrupt { id: bad, .. }) if bad == id),
            "unexpected result: {:?}",
            result
        );
        assert!(matches!(
            repo.find_all_order_by_created_at_desc().await,
            Err(StoreError::Corrupt { .. })
        ));

        // The row is still there, only undecodable
        assert!(repo.exists_by_id(id).await.unwrap());
    }
}
