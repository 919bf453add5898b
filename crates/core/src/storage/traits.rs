use async_trait::async_trait;

use crate::index::IndexEntry;

use super::Result;

/// Persistent storage of per-(product, store) index entries.
///
/// Implementations must make `save` atomic with respect to `find_one` and
/// must never produce two rows for the same key, even when several callers
/// race on `create_dirty`.
#[async_trait]
pub trait IndexRepository: Send + Sync {
    /// Gets the entry for a product in a store.
    async fn find_one(&self, product_id: u64, store_id: u64) -> Result<Option<IndexEntry>>;

    /// Creates a dirty placeholder, or returns the existing entry unchanged.
    async fn create_dirty(&self, product_id: u64, store_id: u64) -> Result<IndexEntry>;

    /// Persists the entry's data and dirty flag, stamping `updated_at`.
    ///
    /// When the stored `dirty_version` differs from the entry's, the key was
    /// invalidated after the entry was read: the data is written but the
    /// stored entry stays dirty. Returns the entry as stored.
    async fn save(&self, entry: &IndexEntry) -> Result<IndexEntry>;

    /// Flags an entry as stale, keeping its data, and bumps its `dirty_version`.
    ///
    /// Returns `false` when no entry exists for the key.
    async fn mark_dirty(&self, product_id: u64, store_id: u64) -> Result<bool>;

    /// Flags every entry of a store as stale, bumping each `dirty_version`.
    ///
    /// Returns the number of entries touched.
    async fn mark_store_dirty(&self, store_id: u64) -> Result<u64>;

    /// Gets up to `limit` dirty entries of a store, ordered by product ID.
    async fn find_dirty(&self, store_id: u64, limit: usize) -> Result<Vec<IndexEntry>>;
}
