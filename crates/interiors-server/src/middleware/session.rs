//! Session cookie middleware.
//!
//! Resolves the caller's [`SessionKey`] from the `interiors_session` cookie,
//! issuing a fresh one when the cookie is missing or malformed, and injects
//! it into request extensions as [`Session`].

use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use interiors_core::SessionKey;

use crate::context::AppContext;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "interiors_session";

/// The session a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session(pub SessionKey);

impl Session {
    pub fn key(&self) -> SessionKey {
        self.0
    }
}

/// Find the session key in a `Cookie` header value.
pub fn session_from_cookie_header(cookies: &str) -> Option<SessionKey> {
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .and_then(|value| value.parse().ok())
    })
}

/// Build the `Set-Cookie` value for a newly issued session.
///
/// With a lifetime the cookie expires together with the stored session.
pub fn session_cookie(key: SessionKey, secure: bool, max_age: Option<Duration>) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={key}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session middleware. Applied to the admin pages.
pub async fn session_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let existing = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_from_cookie_header);

    let (key, issued) = match existing {
        Some(key) => (key, false),
        None => (SessionKey::new(), true),
    };

    request.extensions_mut().insert(Session(key));
    let mut response = next.run(request).await;

    if issued {
        tracing::debug!(session = %key, "Issued new session");
        let sessions = &ctx.config.sessions;
        let cookie = session_cookie(key, sessions.cookie_secure, sessions.ttl());
        if let Ok(val) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, val);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_session_among_other_cookies() {
        let key = SessionKey::new();
        let header = format!("theme=dark; {SESSION_COOKIE}={key}; lang=fr");
        assert_eq!(session_from_cookie_header(&header), Some(key));
    }

    #[test]
    fn malformed_session_is_ignored() {
        assert_eq!(
            session_from_cookie_header(&format!("{SESSION_COOKIE}=garbage")),
            None
        );
        assert_eq!(session_from_cookie_header("other=1"), None);
    }

    #[test]
    fn similarly_named_cookie_is_ignored() {
        let key = SessionKey::new();
        let header = format!("{SESSION_COOKIE}_old={key}");
        assert_eq!(session_from_cookie_header(&header), None);
    }

    #[test]
    fn cookie_attributes() {
        let key = SessionKey::new();
        let plain = session_cookie(key, false, None);
        assert!(plain.starts_with(&format!("{SESSION_COOKIE}={key};")));
        assert!(plain.contains("HttpOnly"));
        assert!(!plain.contains("Secure"));
        assert!(!plain.contains("Max-Age"));
        assert!(session_cookie(key, true, None).ends_with("; Secure"));
    }

    #[test]
    fn cookie_max_age_follows_session_lifetime() {
        let key = SessionKey::new();
        let cookie = session_cookie(key, true, Some(Duration::from_secs(3600)));
        assert!(cookie.contains("; Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));
    }
}
