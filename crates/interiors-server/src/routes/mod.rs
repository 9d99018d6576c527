//! Route handlers: admin pages, JSON API, health.

pub mod admin;
pub mod health;
pub mod interiors;
