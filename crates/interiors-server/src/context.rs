//! Application context shared by all route handlers via Axum state.

use std::sync::Arc;

use interiors_core::config::Config;
use interiors_db::pool::DbPool;

use crate::importer::BulkImporter;
use crate::session::{build_store, SessionStore};
use crate::storage::ImageStorage;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s and the pool.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Uploaded image storage.
    pub storage: Arc<ImageStorage>,
    /// Per-session key/value state.
    pub sessions: Arc<dyn SessionStore>,
}

impl AppContext {
    /// Assemble the context from configuration and an initialized pool.
    pub fn new(config: Config, db: DbPool) -> Self {
        let storage = Arc::new(ImageStorage::new(
            config.media.root.clone(),
            config.media.url_prefix.clone(),
        ));
        let sessions = build_store(config.sessions.backend, &db);

        Self {
            db,
            config: Arc::new(config),
            storage,
            sessions,
        }
    }

    /// An importer writing through this context's storage and database.
    pub fn importer(&self) -> BulkImporter {
        BulkImporter::new(self.storage.clone(), self.db.clone())
    }
}
