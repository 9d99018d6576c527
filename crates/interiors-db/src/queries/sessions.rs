//! Per-session key/value operations.
//!
//! `updated_at` is written as RFC 3339 UTC with whole seconds, so string
//! comparison orders timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use interiors_core::{Error, Result, SessionKey};
use rusqlite::{Connection, TransactionBehavior};

/// Format a timestamp the way `session_data.updated_at` stores it.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read one value stored for a session.
pub fn get_value(conn: &Connection, session: SessionKey, key: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM session_data WHERE session_key = ?1 AND key = ?2",
        rusqlite::params![session.to_string(), key],
        |row| row.get(0),
    );
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Insert or overwrite one value for a session.
pub fn set_value(conn: &Connection, session: SessionKey, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO session_data (session_key, key, value, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(session_key, key) DO UPDATE SET
             value = excluded.value,
             updated_at = excluded.updated_at",
        rusqlite::params![session.to_string(), key, value, timestamp(Utc::now())],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Remove one value and return what was stored.
pub fn take_value(conn: &Connection, session: SessionKey, key: &str) -> Result<Option<String>> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let value = get_value(&tx, session, key)?;
    if value.is_some() {
        tx.execute(
            "DELETE FROM session_data WHERE session_key = ?1 AND key = ?2",
            rusqlite::params![session.to_string(), key],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(value)
}

/// Replace one value with `f(current)` inside a single write transaction.
///
/// The row is locked for the whole read-modify-write, so concurrent updates
/// of the same key are applied one after another.
pub fn update_value<F>(conn: &mut Connection, session: SessionKey, key: &str, f: F) -> Result<()>
where
    F: FnOnce(Option<String>) -> Result<String>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let current = get_value(&tx, session, key)?;
    let value = f(current)?;
    set_value(&tx, session, key, &value)?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Delete every session whose most recent write is older than `cutoff`.
///
/// `cutoff` must be formatted with [`timestamp`]. Returns the number of rows
/// removed.
pub fn delete_expired_sessions(conn: &Connection, cutoff: &str) -> Result<usize> {
    let n = conn
        .execute(
            "DELETE FROM session_data WHERE session_key IN (
                 SELECT session_key FROM session_data
                 GROUP BY session_key
                 HAVING MAX(updated_at) < ?1
             )",
            [cutoff],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n)
}
