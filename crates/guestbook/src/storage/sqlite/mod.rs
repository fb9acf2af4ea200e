//! SQLite storage backend.
//!
//! Generic [`Repository`](guestbook_core::storage::Repository) over `sqlx`
//! pools, with a primary/replica split and slow-query warnings.

mod conversions;
mod database;
mod error;
mod executor;
mod repository;
mod schema;
mod transaction;

pub use database::SqliteDatabase;
pub use repository::SqliteRepository;
