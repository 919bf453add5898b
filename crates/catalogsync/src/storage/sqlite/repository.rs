//! SQLite repository implementation.
//!
//! Implements `IndexRepository` from `catalogsync_core::storage` using SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use catalogsync_core::index::IndexEntry;
use catalogsync_core::product::ProductKey;
use catalogsync_core::storage::{IndexRepository, RepositoryError, Result};

use super::conversions::{format_datetime, id_to_sql, row_to_index_entry};
use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based index repository.
///
/// `tokio_rusqlite` serializes all calls on one background connection and
/// each write runs in its own transaction, so `save` is atomic with respect
/// to `find_one`.
pub struct SqliteIndexRepository {
    conn: Connection,
}

impl SqliteIndexRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Data is lost when the connection is dropped.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

#[async_trait]
impl IndexRepository for SqliteIndexRepository {
    async fn find_one(&self, product_id: u64, store_id: u64) -> Result<Option<IndexEntry>> {
        let key = ProductKey::new(product_id, store_id);
        let product_id = id_to_sql(product_id)?;
        let store_id = id_to_sql(store_id)?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_ENTRY).map_err(wrap_err)?;
                let entry = stmt
                    .query_row([product_id, store_id], row_to_index_entry)
                    .optional()
                    .map_err(wrap_err)?;
                Ok(entry)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, key.to_string()))
    }

    async fn create_dirty(&self, product_id: u64, store_id: u64) -> Result<IndexEntry> {
        let key = ProductKey::new(product_id, store_id);
        let product_id = id_to_sql(product_id)?;
        let store_id = id_to_sql(store_id)?;
        let now = format_datetime(&Utc::now());

        // Insert-or-ignore followed by a read in one transaction: concurrent
        // creators all read back the single surviving row.
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::INSERT_DIRTY_ENTRY,
                    rusqlite::params![product_id, store_id, now],
                )
                .map_err(wrap_err)?;
                let entry = tx
                    .query_row(
                        schema::SELECT_ENTRY,
                        [product_id, store_id],
                        row_to_index_entry,
                    )
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(entry)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, key.to_string()))
    }

    async fn save(&self, entry: &IndexEntry) -> Result<IndexEntry> {
        entry
            .validate()
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        let key = entry.key();
        let product_id = id_to_sql(entry.product_id)?;
        let store_id = id_to_sql(entry.store_id)?;
        let product_data = entry.product_data.clone();
        let is_dirty = entry.is_dirty;
        let dirty_version = id_to_sql(entry.dirty_version)?;
        let now = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::SAVE_ENTRY,
                    rusqlite::params![product_id, store_id, product_data, is_dirty, dirty_version, now],
                )
                .map_err(wrap_err)?;
                let stored = tx
                    .query_row(
                        schema::SELECT_ENTRY,
                        [product_id, store_id],
                        row_to_index_entry,
                    )
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(stored)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, key.to_string()))
    }

    async fn mark_dirty(&self, product_id: u64, store_id: u64) -> Result<bool> {
        let key = ProductKey::new(product_id, store_id);
        let product_id = id_to_sql(product_id)?;
        let store_id = id_to_sql(store_id)?;

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::MARK_DIRTY, [product_id, store_id])
                    .map_err(wrap_err)?;
                Ok(rows > 0)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, key.to_string()))
    }

    async fn mark_store_dirty(&self, store_id: u64) -> Result<u64> {
        let store_key = format!("store:{store_id}");
        let store_id = id_to_sql(store_id)?;

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::MARK_STORE_DIRTY, [store_id])
                    .map_err(wrap_err)?;
                Ok(rows as u64)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, store_key))
    }

    async fn find_dirty(&self, store_id: u64, limit: usize) -> Result<Vec<IndexEntry>> {
        let store_key = format!("store:{store_id}");
        let store_id = id_to_sql(store_id)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_DIRTY_BY_STORE)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([store_id, limit], row_to_index_entry)
                    .map_err(wrap_err)?;

                let mut entries = Vec::new();
                for row_result in rows {
                    entries.push(row_result.map_err(wrap_err)?);
                }
                Ok(entries)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, store_key))
    }
}
