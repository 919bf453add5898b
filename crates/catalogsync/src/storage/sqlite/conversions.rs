//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and index entries.
//! These are testable in isolation without database access.

use catalogsync_core::index::IndexEntry;
use catalogsync_core::storage::RepositoryError;
use chrono::{DateTime, Utc};
use rusqlite::Row;

/// Convert a SQLite row to an IndexEntry.
///
/// Expected columns: product_id, store_id, product_data, is_dirty, created_at, updated_at,
/// dirty_version
pub fn row_to_index_entry(row: &Row) -> rusqlite::Result<IndexEntry> {
    let product_id: i64 = row.get(0)?;
    let store_id: i64 = row.get(1)?;
    let product_data: Option<String> = row.get(2)?;
    let is_dirty: bool = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    let dirty_version: i64 = row.get(6)?;

    Ok(IndexEntry {
        product_id: parse_id(product_id, 0)?,
        store_id: parse_id(store_id, 1)?,
        product_data,
        is_dirty,
        dirty_version: parse_id(dirty_version, 6)?,
        created_at: parse_datetime(&created_at, 4)?,
        updated_at: parse_datetime(&updated_at, 5)?,
    })
}

/// Converts a platform ID to the signed integer SQLite stores.
pub fn id_to_sql(id: u64) -> Result<i64, RepositoryError> {
    i64::try_from(id).map_err(|_| RepositoryError::InvalidData(format!("ID out of range: {id}")))
}

/// Format a DateTime<Utc> for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ============================================================================
// Helper functions
// ============================================================================

fn parse_id(value: i64, column: usize) -> rusqlite::Result<u64> {
    u64::try_from(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Integer, Box::new(e))
    })
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(s: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}
