//! Database query modules.

pub mod interiors;
pub mod sessions;
