//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use interiors_core::InteriorId;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Interior
// ---------------------------------------------------------------------------

/// A named interior photograph managed through the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interior {
    pub id: InteriorId,
    pub name: String,
    /// Path of the stored image relative to the media root, if any.
    pub image_path: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub created_at: String,
}

impl Interior {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let id: i64 = row.get(0)?;
        Ok(Self {
            id: InteriorId::from(id),
            name: row.get(1)?,
            image_path: row.get(2)?,
            width: row.get(3)?,
            height: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
