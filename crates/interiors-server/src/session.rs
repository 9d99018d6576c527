//! Per-session key/value state and the changelist view-mode preference.
//!
//! Handlers never touch ambient state: they receive the caller's
//! [`SessionKey`] from the session middleware and read or write through the
//! [`SessionStore`] held by the application context.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use interiors_core::config::SessionBackend;
use interiors_core::{Error, Result, SessionKey};
use interiors_db::pool::{get_conn, DbPool};
use interiors_db::queries::sessions;

/// Session key under which the changelist view mode is kept.
pub const VIEW_MODE_KEY: &str = "view_mode";

/// View mode used when neither the query nor the session names one.
pub const DEFAULT_VIEW_MODE: &str = "list";

/// Key/value storage scoped by session.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, session: SessionKey, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, session: SessionKey, key: &str, value: &str) -> Result<()>;

    /// Remove and return the value stored under `key`.
    fn take(&self, session: SessionKey, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key` with `f(current)` as one atomic step.
    fn update(
        &self,
        session: SessionKey,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()>;

    /// Drop every session with no write in the last `max_age`.
    ///
    /// Returns the number of stored values removed.
    fn purge_expired(&self, max_age: Duration) -> Result<usize>;
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: DashMap<(SessionKey, String), (String, Instant)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session: SessionKey, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .get(&(session, key.to_string()))
            .map(|v| v.value().0.clone()))
    }

    fn set(&self, session: SessionKey, key: &str, value: &str) -> Result<()> {
        self.values
            .insert((session, key.to_string()), (value.to_string(), Instant::now()));
        Ok(())
    }

    fn take(&self, session: SessionKey, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .remove(&(session, key.to_string()))
            .map(|(_, (v, _))| v))
    }

    fn update(
        &self,
        session: SessionKey,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        // The entry holds the shard lock until it is dropped.
        match self.values.entry((session, key.to_string())) {
            Entry::Occupied(mut entry) => {
                let value = f(Some(entry.get().0.clone()))?;
                entry.insert((value, Instant::now()));
            }
            Entry::Vacant(entry) => {
                let value = f(None)?;
                entry.insert((value, Instant::now()));
            }
        }
        Ok(())
    }

    fn purge_expired(&self, max_age: Duration) -> Result<usize> {
        let mut last_write: HashMap<SessionKey, Instant> = HashMap::new();
        for item in self.values.iter() {
            let (session, _) = item.key();
            let written = item.value().1;
            last_write
                .entry(*session)
                .and_modify(|t| *t = (*t).max(written))
                .or_insert(written);
        }

        let expired: Vec<SessionKey> = last_write
            .into_iter()
            .filter(|(_, written)| written.elapsed() >= max_age)
            .map(|(session, _)| session)
            .collect();
        if expired.is_empty() {
            return Ok(0);
        }

        let before = self.values.len();
        // Values written since the scan are kept.
        self.values.retain(|(session, _), (_, written)| {
            !expired.contains(session) || written.elapsed() < max_age
        });
        Ok(before.saturating_sub(self.values.len()))
    }
}

/// Store backed by the `session_data` table.
#[derive(Clone)]
pub struct DbSessionStore {
    db: DbPool,
}

impl DbSessionStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl SessionStore for DbSessionStore {
    fn get(&self, session: SessionKey, key: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.db)?;
        sessions::get_value(&conn, session, key)
    }

    fn set(&self, session: SessionKey, key: &str, value: &str) -> Result<()> {
        let conn = get_conn(&self.db)?;
        sessions::set_value(&conn, session, key, value)
    }

    fn take(&self, session: SessionKey, key: &str) -> Result<Option<String>> {
        let conn = get_conn(&self.db)?;
        sessions::take_value(&conn, session, key)
    }

    fn update(
        &self,
        session: SessionKey,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let mut conn = get_conn(&self.db)?;
        sessions::update_value(&mut conn, session, key, |current| f(current))
    }

    fn purge_expired(&self, max_age: Duration) -> Result<usize> {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| Error::Internal(format!("Invalid session lifetime: {e}")))?;
        let cutoff = sessions::timestamp(Utc::now() - max_age);
        let conn = get_conn(&self.db)?;
        sessions::delete_expired_sessions(&conn, &cutoff)
    }
}

/// Build the store selected by configuration.
pub fn build_store(backend: SessionBackend, db: &DbPool) -> std::sync::Arc<dyn SessionStore> {
    match backend {
        SessionBackend::Memory => std::sync::Arc::new(MemorySessionStore::new()),
        SessionBackend::Database => std::sync::Arc::new(DbSessionStore::new(db.clone())),
    }
}

/// Resolve the changelist view mode for this request.
///
/// A `view` query value wins and is remembered for the session; without one
/// the remembered value is used, falling back to `"list"`.
pub fn resolve_view_mode(
    store: &dyn SessionStore,
    session: SessionKey,
    requested: Option<&str>,
) -> Result<String> {
    let view_mode = match requested {
        Some(mode) => {
            store.set(session, VIEW_MODE_KEY, mode)?;
            mode.to_string()
        }
        None => store
            .get(session, VIEW_MODE_KEY)?
            .unwrap_or_else(|| DEFAULT_VIEW_MODE.to_string()),
    };

    tracing::debug!(%session, view_mode = %view_mode, "Resolved view mode");
    Ok(view_mode)
}
