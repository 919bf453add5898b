//! Runtime side of product-change notifications.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use catalogsync_core::observer::{invalidation_keys, ProductChange};
use catalogsync_core::product::ProductKey;

use crate::service::IndexService;

/// Marks index entries dirty when the platform saves a product.
pub struct ProductObserver {
    index: Arc<IndexService>,
    managed_stores: Option<HashSet<u64>>,
}

impl ProductObserver {
    /// `managed_stores` of `None` invalidates every store a product is in.
    pub fn new(index: Arc<IndexService>, managed_stores: Option<HashSet<u64>>) -> Self {
        Self {
            index,
            managed_stores,
        }
    }

    /// Handles a product save, using the platform's local clock.
    pub async fn on_product_saved(&self, change: &ProductChange) -> Vec<ProductKey> {
        self.on_product_saved_at(change, Local::now().naive_local())
            .await
    }

    /// Invalidates every key `change` affects as of `now`.
    ///
    /// Returns the keys that were marked. A store failure for one key is
    /// logged and the remaining keys are still processed.
    pub async fn on_product_saved_at(
        &self,
        change: &ProductChange,
        now: NaiveDateTime,
    ) -> Vec<ProductKey> {
        let keys = invalidation_keys(change, self.managed_stores.as_ref(), now);
        if keys.is_empty() {
            tracing::debug!(
                product_id = change.product_id,
                "Product change invalidates nothing"
            );
        }

        let mut invalidated = Vec::with_capacity(keys.len());
        for key in keys {
            match self
                .index
                .update_or_create_dirty(key.product_id, key.store_id)
                .await
            {
                Ok(()) => invalidated.push(key),
                Err(e) => {
                    tracing::warn!(
                        product_id = key.product_id,
                        store_id = key.store_id,
                        error = %e,
                        "Failed to invalidate index entry"
                    );
                }
            }
        }

        invalidated
    }
}
