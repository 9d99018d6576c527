//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, media storage, uploads and sessions. Every
//! section defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub uploads: UploadConfig,
    pub sessions: SessionConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration from a file that must exist and parse.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if !self.media.url_prefix.starts_with('/') {
            warnings.push(format!(
                "media.url_prefix '{}' should start with '/'",
                self.media.url_prefix
            ));
        }

        if self.uploads.max_body_bytes == 0 {
            warnings.push("uploads.max_body_bytes is 0; every upload will be rejected".into());
        }

        if self.sessions.backend == SessionBackend::Memory {
            warnings.push(
                "sessions.backend is 'memory'; view preferences are lost on restart".into(),
            );
        }

        if self.sessions.ttl_secs == 0 {
            warnings.push("sessions.ttl_secs is 0; sessions are never cleaned up".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            db_path: PathBuf::from("./data/interiors.db"),
        }
    }
}

/// Where uploaded images live on disk and how they are addressed by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub url_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/media"),
            url_prefix: "/media".into(),
        }
    }
}

/// Limits applied to the bulk upload form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum size of a whole multipart request body.
    pub max_body_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Which store keeps per-session state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Process-local map; cleared on restart.
    Memory,
    /// `session_data` table in the application database.
    #[default]
    Database,
}

/// Session cookie and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    /// Add the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    /// Seconds a session survives without a write. `0` keeps sessions forever.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            cookie_secure: false,
            ttl_secs: 14 * 24 * 60 * 60,
        }
    }
}

impl SessionConfig {
    /// Idle lifetime of a session, or `None` when sessions never expire.
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}
