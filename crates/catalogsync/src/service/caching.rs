//! Get-or-build facade over the product index.
//!
//! A lookup walks four steps:
//!
//! 1. find the entry for `(product_id, store_id)`;
//! 2. if there is none, create it dirty and read it back;
//! 3. if it is dirty, rebuild it from the live catalog;
//! 4. decode the stored payload.
//!
//! Any failure along the way ends the lookup. [`CachingProductService::get_product`]
//! logs it once and reports the product as unavailable.

use std::sync::Arc;

use catalogsync_core::product::{Product, ProductKey};
use catalogsync_core::serializer::{deserialize_product, SerializationError};
use catalogsync_core::service::Result;
use catalogsync_core::storage::{IndexRepository, RepositoryError};

use super::IndexService;

pub struct CachingProductService {
    repository: Arc<dyn IndexRepository>,
    index: Arc<IndexService>,
}

impl CachingProductService {
    pub fn new(repository: Arc<dyn IndexRepository>, index: Arc<IndexService>) -> Self {
        Self { repository, index }
    }

    /// Returns the product for the key, or `None` if it cannot be produced.
    ///
    /// Errors are logged here and never reach the caller.
    pub async fn get_product(&self, product_id: u64, store_id: u64) -> Option<Product> {
        match self.try_get_product(product_id, store_id).await {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::error!(
                    product_id,
                    store_id,
                    kind = e.kind(),
                    error = %e,
                    "Failed to get indexed product"
                );
                None
            }
        }
    }

    /// Same lookup as [`get_product`](Self::get_product) with the error kept.
    pub async fn try_get_product(&self, product_id: u64, store_id: u64) -> Result<Product> {
        let key = ProductKey::new(product_id, store_id);

        let entry = match self.repository.find_one(product_id, store_id).await? {
            Some(entry) => {
                tracing::trace!(product_id, store_id, dirty = entry.is_dirty, "Index hit");
                entry
            }
            None => {
                tracing::trace!(product_id, store_id, "Index miss, creating dirty entry");
                self.repository.create_dirty(product_id, store_id).await?;
                self.repository
                    .find_one(product_id, store_id)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound {
                        entity_type: "IndexEntry",
                        id: key.to_string(),
                    })?
            }
        };

        let entry = if entry.is_dirty {
            self.index.rebuild(&entry).await?
        } else {
            entry
        };

        let data = entry.product_data.as_deref().ok_or_else(|| {
            SerializationError::DeserializeFailed(format!("no product data stored for {key}"))
        })?;

        Ok(deserialize_product(data)?)
    }

    /// Flags the entry for rebuild on its next read.
    ///
    /// Returns false when no entry exists or the store failed.
    pub async fn mark_dirty(&self, product_id: u64, store_id: u64) -> bool {
        match self.repository.mark_dirty(product_id, store_id).await {
            Ok(marked) => marked,
            Err(e) => {
                tracing::error!(product_id, store_id, error = %e, "Failed to mark entry dirty");
                false
            }
        }
    }
}
