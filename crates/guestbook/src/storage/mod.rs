//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `guestbook_core::storage`. Storage is always SQLite through `sqlx`.

pub mod sqlite;

pub use sqlite::{SqliteDatabase, SqliteRepository};
