//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use interiors_core::{Error, Result};
use rusqlite::Connection;

/// V1: interior records.
const V1_INTERIORS: &str = r#"
CREATE TABLE interiors (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL CHECK (length(name) > 0),
    image_path TEXT,
    width      INTEGER,
    height     INTEGER,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_interiors_name ON interiors(name);
"#;

/// V2: key/value state per browser session.
const V2_SESSION_DATA: &str = r#"
CREATE TABLE session_data (
    session_key TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (session_key, key)
);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INTERIORS), (2, V2_SESSION_DATA)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit()
            .map_err(|e| Error::database(e.to_string()))?;

        tracing::debug!("Applied migration V{version}");
    }

    Ok(())
}
