//! SQLite schema definitions.

/// Statements run by `guestbook migrate`, in order.
pub const MIGRATIONS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS guests (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT,
    created_at INTEGER NOT NULL,
    created_by TEXT NOT NULL,
    updated_at INTEGER,
    updated_by TEXT,
    deleted_at INTEGER,
    deleted_by TEXT
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_guests_deleted_at ON guests(deleted_at)",
    "CREATE INDEX IF NOT EXISTS idx_guests_name ON guests(name)",
];
