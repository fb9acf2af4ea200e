//! Maps `sqlx::Error` to `RepositoryError`.

use guestbook_core::storage::RepositoryError;

/// Maps a sqlx error to a RepositoryError.
///
/// - `RowNotFound` → `NotFound`
/// - UNIQUE / PRIMARY KEY violations → `AlreadyExists`
/// - FOREIGN KEY violations → `InvalidData`
/// - pool and I/O failures → `ConnectionFailed`
/// - decode failures → `Serialization`
/// - everything else → `QueryFailed`
pub fn map_sqlx_error(err: sqlx::Error, entity_type: &'static str) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound { entity_type },
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            RepositoryError::AlreadyExists { entity_type }
        }
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            RepositoryError::InvalidData(format!(
                "Foreign key constraint violation for {entity_type}"
            ))
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => RepositoryError::ConnectionFailed(err.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_) => RepositoryError::Serialization(err.to_string()),
        other => RepositoryError::QueryFailed(other.to_string()),
    }
}
