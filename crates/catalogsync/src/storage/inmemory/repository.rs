//! In-memory index repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use catalogsync_core::index::IndexEntry;
use catalogsync_core::product::ProductKey;
use catalogsync_core::storage::{IndexRepository, RepositoryError, Result};

/// In-memory index storage.
///
/// Every operation runs under a single lock acquisition, which gives the
/// atomicity the repository contract asks for: `create_dirty` cannot insert
/// twice for one key and `find_one` never sees a half-applied `save`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndexRepository {
    entries: Arc<RwLock<HashMap<ProductKey, IndexEntry>>>,
}

impl InMemoryIndexRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no entry is stored.
    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Replaces an entry verbatim, bypassing validation (useful for testing).
    #[cfg(test)]
    pub async fn insert_raw(&self, entry: IndexEntry) {
        self.entries.write().await.insert(entry.key(), entry);
    }
}

#[async_trait]
impl IndexRepository for InMemoryIndexRepository {
    async fn find_one(&self, product_id: u64, store_id: u64) -> Result<Option<IndexEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&ProductKey::new(product_id, store_id)).cloned())
    }

    async fn create_dirty(&self, product_id: u64, store_id: u64) -> Result<IndexEntry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(ProductKey::new(product_id, store_id))
            .or_insert_with(|| IndexEntry::dirty(product_id, store_id));
        Ok(entry.clone())
    }

    async fn save(&self, entry: &IndexEntry) -> Result<IndexEntry> {
        entry
            .validate()
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let stored = match entries.get(&entry.key()) {
            Some(existing) => IndexEntry {
                is_dirty: entry.is_dirty || existing.dirty_version != entry.dirty_version,
                dirty_version: existing.dirty_version,
                created_at: existing.created_at,
                updated_at: now,
                ..entry.clone()
            },
            None => IndexEntry {
                created_at: now,
                updated_at: now,
                ..entry.clone()
            },
        };
        entries.insert(stored.key(), stored.clone());
        Ok(stored)
    }

    async fn mark_dirty(&self, product_id: u64, store_id: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&ProductKey::new(product_id, store_id)) {
            Some(entry) => {
                entry.is_dirty = true;
                entry.dirty_version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_store_dirty(&self, store_id: u64) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let mut touched = 0;
        for entry in entries.values_mut().filter(|e| e.store_id == store_id) {
            entry.is_dirty = true;
            entry.dirty_version += 1;
            touched += 1;
        }
        Ok(touched)
    }

    async fn find_dirty(&self, store_id: u64, limit: usize) -> Result<Vec<IndexEntry>> {
        let entries = self.entries.read().await;
        let mut dirty: Vec<IndexEntry> = entries
            .values()
            .filter(|e| e.store_id == store_id && e.is_dirty)
            .cloned()
            .collect();
        dirty.sort_by_key(|e| e.product_id);
        dirty.truncate(limit);
        Ok(dirty)
    }
}
