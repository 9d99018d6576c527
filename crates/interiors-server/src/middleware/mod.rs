//! HTTP middleware: request ID and session cookie.

pub mod request_id;
pub mod session;
