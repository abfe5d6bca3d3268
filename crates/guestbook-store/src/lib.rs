//! Persistence for guestbook entries.
//!
//! The service talks to storage only through [`EntryRepository`], so the
//! backing store can be swapped without touching the HTTP layer.
//!
//! Implementations:
//! - [`SqliteRepository`]: relational table in a SQLite database file
//! - [`MemoryRepository`]: in-process map, nothing survives a restart

mod entry;
mod error;
mod memory;
mod migrations;
mod repository;
mod sqlite;

pub use entry::{Entry, NewEntry};
pub use error::StoreError;
pub use memory::MemoryRepository;
pub use repository::EntryRepository;
pub use sqlite::SqliteRepository;

pub type Result<T> = std::result::Result<T, StoreError>;
