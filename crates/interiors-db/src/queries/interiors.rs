//! Interior record operations.

use chrono::Utc;
use interiors_core::{Error, InteriorId, Result};
use rusqlite::Connection;

use crate::models::Interior;

const COLS: &str = "id, name, image_path, width, height, created_at";

/// Create a new interior record. The store assigns the id.
pub fn create_interior(
    conn: &Connection,
    name: &str,
    image_path: Option<&str>,
    width: Option<i64>,
    height: Option<i64>,
) -> Result<Interior> {
    if name.is_empty() {
        return Err(Error::Validation("display name is empty".into()));
    }

    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO interiors (name, image_path, width, height, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![name, image_path, width, height, created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Interior {
        id: InteriorId::from(conn.last_insert_rowid()),
        name: name.to_string(),
        image_path: image_path.map(String::from),
        width,
        height,
        created_at,
    })
}

/// Get an interior by ID.
pub fn get_interior(conn: &Connection, id: InteriorId) -> Result<Option<Interior>> {
    let q = format!("SELECT {COLS} FROM interiors WHERE id = ?1");
    let result = conn.query_row(&q, [id.get()], Interior::from_row);
    match result {
        Ok(i) => Ok(Some(i)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List interiors ordered by id then name.
///
/// When `search` is given, only names containing it (ASCII case-insensitive)
/// are returned.
pub fn list_interiors(conn: &Connection, search: Option<&str>) -> Result<Vec<Interior>> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());

    let rows = match search {
        Some(term) => {
            let q = format!(
                "SELECT {COLS} FROM interiors
                 WHERE name LIKE '%' || ?1 || '%' ESCAPE '\\'
                 ORDER BY id, name"
            );
            let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map([escape_like(term)], Interior::from_row)
                .map_err(|e| Error::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::database(e.to_string()))?;
            rows
        }
        None => {
            let q = format!("SELECT {COLS} FROM interiors ORDER BY id, name");
            let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
            let rows = stmt
                .query_map([], Interior::from_row)
                .map_err(|e| Error::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::database(e.to_string()))?;
            rows
        }
    };

    Ok(rows)
}

/// Count all interiors.
pub fn count_interiors(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM interiors", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

/// Escape `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
