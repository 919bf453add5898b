use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::product::ProductKey;

/// Violations of the index entry invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidEntry {
    #[error("clean index entry {0} has no product data")]
    CleanWithoutData(ProductKey),
}

/// One cached product representation for a (product, store) pair.
///
/// A clean entry (`is_dirty == false`) always carries `product_data`. A dirty
/// entry may have stale data or none at all (fresh placeholder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub product_id: u64,
    pub store_id: u64,
    /// Serialized product, `None` until the first rebuild.
    pub product_data: Option<String>,
    pub is_dirty: bool,
    /// Bumped by every invalidation. A `save` only clears `is_dirty` when
    /// the stored generation still matches the one the rebuild started from.
    #[serde(default)]
    pub dirty_version: u64,
    pub created_at: DateTime<Utc>,
    /// Time of the last rebuild, or of creation for placeholders.
    pub updated_at: DateTime<Utc>,
}

impl IndexEntry {
    /// Creates a dirty placeholder with no product data.
    pub fn dirty(product_id: u64, store_id: u64) -> Self {
        let now = Utc::now();
        Self {
            product_id,
            store_id,
            product_data: None,
            is_dirty: true,
            dirty_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the composite key of this entry.
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.product_id, self.store_id)
    }

    /// Returns a clean copy holding the freshly built `product_data`.
    pub fn rebuilt(&self, product_data: String) -> Self {
        Self {
            product_data: Some(product_data),
            is_dirty: false,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Sets a specific creation timestamp (useful for testing).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets a specific update timestamp (useful for testing).
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Checks that a clean entry carries product data.
    pub fn validate(&self) -> Result<(), InvalidEntry> {
        if !self.is_dirty && self.product_data.is_none() {
            return Err(InvalidEntry::CleanWithoutData(self.key()));
        }
        Ok(())
    }
}
