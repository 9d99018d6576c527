//! interiors-core: shared types, IDs, errors, configuration, and naming rules.
//!
//! This crate is the foundational dependency for the other interiors-*
//! crates, providing type-safe identifiers, a unified error type, the
//! application configuration, and the filename to display-name derivation
//! used by the bulk importer.

pub mod config;
pub mod error;
pub mod ids;
pub mod naming;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
