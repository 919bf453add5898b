//! Rebuild engine: turns dirty index entries back into clean ones.

use std::sync::Arc;

use serde::Serialize;

use catalogsync_core::index::IndexEntry;
use catalogsync_core::serializer::serialize_product;
use catalogsync_core::service::Result;
use catalogsync_core::snapshot::SnapshotBuilder;
use catalogsync_core::storage::IndexRepository;

/// Outcome of a batch rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub rebuilt: usize,
    pub failed: usize,
}

/// Rebuilds index entries from live catalog state.
pub struct IndexService {
    repository: Arc<dyn IndexRepository>,
    builder: Arc<dyn SnapshotBuilder>,
}

impl IndexService {
    pub fn new(repository: Arc<dyn IndexRepository>, builder: Arc<dyn SnapshotBuilder>) -> Self {
        Self {
            repository,
            builder,
        }
    }

    /// Recomputes the product for `entry` and persists it as clean.
    ///
    /// On failure nothing is written, so the stored entry stays dirty. It also
    /// stays dirty when the key was invalidated while the product was built.
    pub async fn rebuild(&self, entry: &IndexEntry) -> Result<IndexEntry> {
        let key = entry.key();

        let product = self.builder.build(key).await?;
        let data = serialize_product(&product)?;
        let saved = self.repository.save(&entry.rebuilt(data)).await?;

        tracing::debug!(
            product_id = key.product_id,
            store_id = key.store_id,
            dirty = saved.is_dirty,
            "Rebuilt index entry"
        );

        Ok(saved)
    }

    /// Guarantees a dirty entry exists for the key, creating one if needed.
    ///
    /// An entry that is already dirty is marked again so a rebuild running
    /// from the previous generation cannot clear it.
    pub async fn update_or_create_dirty(&self, product_id: u64, store_id: u64) -> Result<()> {
        self.repository.create_dirty(product_id, store_id).await?;
        self.repository.mark_dirty(product_id, store_id).await?;

        tracing::trace!(product_id, store_id, "Index entry marked dirty");
        Ok(())
    }

    /// Rebuilds up to `limit` dirty entries of a store, one at a time.
    ///
    /// A failing entry is logged, counted and left dirty; the batch goes on.
    pub async fn rebuild_dirty(&self, store_id: u64, limit: usize) -> Result<RebuildReport> {
        let entries = self.repository.find_dirty(store_id, limit).await?;
        let mut report = RebuildReport::default();

        for entry in &entries {
            match self.rebuild(entry).await {
                Ok(_) => report.rebuilt += 1,
                Err(e) => {
                    tracing::warn!(
                        product_id = entry.product_id,
                        store_id,
                        kind = e.kind(),
                        error = %e,
                        "Failed to rebuild index entry"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            store_id,
            rebuilt = report.rebuilt,
            failed = report.failed,
            "Dirty index entries processed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use catalogsync_core::product::ProductKey;
    use catalogsync_core::serializer::deserialize_product;
    use catalogsync_core::service::ProductCacheError;

    use crate::service::testing::{
        sample_product, FlakyRepository, GatedSnapshotBuilder, MockSnapshotBuilder,
    };
    use crate::storage::InMemoryIndexRepository;

    fn service(
        repository: Arc<dyn IndexRepository>,
        builder: Arc<MockSnapshotBuilder>,
    ) -> IndexService {
        IndexService::new(repository, builder)
    }

    #[tokio::test]
    async fn test_rebuild_stores_clean_entry() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let builder = Arc::new(MockSnapshotBuilder::new());
        builder.insert(ProductKey::new(42, 1), sample_product(42)).await;
        let service = service(repo.clone(), builder.clone());

        let entry = repo.create_dirty(42, 1).await.unwrap();
        let saved = service.rebuild(&entry).await.unwrap();

        assert!(!saved.is_dirty);
        let stored = repo.find_one(42, 1).await.unwrap().unwrap();
        assert!(!stored.is_dirty);
        let product = deserialize_product(stored.product_data.as_deref().unwrap()).unwrap();
        assert_eq!(product, sample_product(42));
        assert_eq!(builder.build_calls(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_failure_leaves_entry_dirty() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let builder = Arc::new(MockSnapshotBuilder::new());
        let service = service(repo.clone(), builder.clone());

        let entry = repo.create_dirty(42, 1).await.unwrap();
        let result = service.rebuild(&entry).await;

        assert!(matches!(result, Err(ProductCacheError::RebuildFailure(_))));
        let stored = repo.find_one(42, 1).await.unwrap().unwrap();
        assert!(stored.is_dirty);
        assert!(stored.product_data.is_none());
    }

    #[tokio::test]
    async fn test_rebuild_save_failure_is_store_unavailable() {
        let repo = Arc::new(FlakyRepository::new());
        let builder = Arc::new(MockSnapshotBuilder::new());
        builder.insert(ProductKey::new(42, 1), sample_product(42)).await;
        let service = service(repo.clone(), builder.clone());

        let entry = repo.create_dirty(42, 1).await.unwrap();
        repo.fail_writes.store(true, Ordering::SeqCst);
        let result = service.rebuild(&entry).await;

        assert!(matches!(result, Err(ProductCacheError::StoreUnavailable(_))));
        assert!(repo.inner.find_one(42, 1).await.unwrap().unwrap().is_dirty);
    }

    #[tokio::test]
    async fn test_update_or_create_dirty_creates_missing_entry() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let service = service(repo.clone(), Arc::new(MockSnapshotBuilder::new()));

        service.update_or_create_dirty(42, 1).await.unwrap();

        let stored = repo.find_one(42, 1).await.unwrap().unwrap();
        assert!(stored.is_dirty);
        assert!(stored.product_data.is_none());
    }

    #[tokio::test]
    async fn test_update_or_create_dirty_marks_clean_entry() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let builder = Arc::new(MockSnapshotBuilder::new());
        builder.insert(ProductKey::new(42, 1), sample_product(42)).await;
        let service = service(repo.clone(), builder);

        let entry = repo.create_dirty(42, 1).await.unwrap();
        service.rebuild(&entry).await.unwrap();
        service.update_or_create_dirty(42, 1).await.unwrap();

        let stored = repo.find_one(42, 1).await.unwrap().unwrap();
        assert!(stored.is_dirty);
        // The last good payload is kept until the next rebuild.
        assert!(stored.product_data.is_some());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_or_create_dirty_bumps_version_of_dirty_entry() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let service = service(repo.clone(), Arc::new(MockSnapshotBuilder::new()));
        let read = repo.create_dirty(42, 1).await.unwrap();

        service.update_or_create_dirty(42, 1).await.unwrap();
        let saved = repo.save(&read.rebuilt("{}".to_string())).await.unwrap();

        assert!(saved.is_dirty);
    }

    #[tokio::test]
    async fn test_invalidation_during_build_keeps_entry_dirty() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let builder = Arc::new(GatedSnapshotBuilder::new());
        builder.inner.insert(ProductKey::new(42, 1), sample_product(42)).await;
        let service = Arc::new(IndexService::new(repo.clone(), builder.clone()));
        let entry = repo.create_dirty(42, 1).await.unwrap();

        let rebuild = tokio::spawn({
            let service = service.clone();
            async move { service.rebuild(&entry).await }
        });
        builder.started.notified().await;
        service.update_or_create_dirty(42, 1).await.unwrap();
        builder.release.notify_one();

        let saved = rebuild.await.unwrap().unwrap();
        assert!(saved.is_dirty);
        assert!(repo.find_one(42, 1).await.unwrap().unwrap().is_dirty);
        assert_eq!(repo.find_dirty(1, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_dirty_counts_failures_and_continues() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let builder = Arc::new(MockSnapshotBuilder::new());
        builder.insert(ProductKey::new(1, 1), sample_product(1)).await;
        builder.insert(ProductKey::new(3, 1), sample_product(3)).await;
        let service = service(repo.clone(), builder.clone());

        for product_id in 1..=3 {
            repo.create_dirty(product_id, 1).await.unwrap();
        }
        repo.create_dirty(1, 2).await.unwrap();

        let report = service.rebuild_dirty(1, 10).await.unwrap();

        assert_eq!(report, RebuildReport { rebuilt: 2, failed: 1 });
        assert!(repo.find_one(2, 1).await.unwrap().unwrap().is_dirty);
        assert!(!repo.find_one(3, 1).await.unwrap().unwrap().is_dirty);
        // Other stores are untouched.
        assert!(repo.find_one(1, 2).await.unwrap().unwrap().is_dirty);
    }

    #[tokio::test]
    async fn test_rebuild_dirty_respects_limit() {
        let repo = Arc::new(InMemoryIndexRepository::new());
        let builder = Arc::new(MockSnapshotBuilder::new());
        for product_id in 1..=5 {
            builder
                .insert(ProductKey::new(product_id, 1), sample_product(product_id))
                .await;
            repo.create_dirty(product_id, 1).await.unwrap();
        }
        let service = service(repo.clone(), builder.clone());

        let report = service.rebuild_dirty(1, 2).await.unwrap();

        assert_eq!(report.rebuilt, 2);
        assert_eq!(
            builder.built_keys(),
            vec![ProductKey::new(1, 1), ProductKey::new(2, 1)]
        );
        assert_eq!(repo.find_dirty(1, 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rebuild_dirty_propagates_listing_failure() {
        let repo = Arc::new(FlakyRepository::new());
        repo.fail_reads.store(true, Ordering::SeqCst);
        let service = service(repo, Arc::new(MockSnapshotBuilder::new()));

        let result = service.rebuild_dirty(1, 10).await;

        assert!(matches!(result, Err(ProductCacheError::StoreUnavailable(_))));
    }
}
