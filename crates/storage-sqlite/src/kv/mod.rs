//! Key-value persistence over a single SQLite table.

mod repository;

pub use repository::SqliteKvStore;
