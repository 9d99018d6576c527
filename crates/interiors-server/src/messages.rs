//! One-shot notifications shown on the next rendered page.
//!
//! Messages are queued as a JSON array in the session and drained when a
//! page displays them.

use interiors_core::{Error, Result, SessionKey};
use serde::{Deserialize, Serialize};

use crate::session::SessionStore;

/// Session key holding the pending message queue.
const MESSAGES_KEY: &str = "_messages";

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    /// CSS class used when rendering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }
}

/// A queued notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

/// Append messages to the session's queue, preserving order.
///
/// The read and the write happen in one store update, so concurrent pushes
/// to the same session all land in the queue.
pub fn push(store: &dyn SessionStore, session: SessionKey, new: Vec<FlashMessage>) -> Result<()> {
    if new.is_empty() {
        return Ok(());
    }

    store.update(session, MESSAGES_KEY, &mut |current| {
        let mut queue = read_queue(current);
        queue.extend(new.iter().cloned());
        serde_json::to_string(&queue)
            .map_err(|e| Error::Internal(format!("Failed to encode messages: {e}")))
    })
}

/// Remove and return every queued message.
pub fn drain(store: &dyn SessionStore, session: SessionKey) -> Result<Vec<FlashMessage>> {
    Ok(read_queue(store.take(session, MESSAGES_KEY)?))
}

fn read_queue(raw: Option<String>) -> Vec<FlashMessage> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Discarding unreadable message queue: {e}");
        Vec::new()
    })
}
