//! Test doubles shared by the service and observer tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use catalogsync_core::index::IndexEntry;
use catalogsync_core::product::{Product, ProductKey};
use catalogsync_core::snapshot::{Result as SnapshotResult, SnapshotBuilder, SnapshotError};
use catalogsync_core::storage::{IndexRepository, RepositoryError, Result};

use crate::storage::InMemoryIndexRepository;

/// Snapshot builder serving products from a map and counting calls.
#[derive(Default)]
pub struct MockSnapshotBuilder {
    products: RwLock<HashMap<ProductKey, Product>>,
    calls: Mutex<Vec<ProductKey>>,
}

impl MockSnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: ProductKey, product: Product) {
        self.products.write().await.insert(key, product);
    }

    pub async fn remove(&self, key: ProductKey) {
        self.products.write().await.remove(&key);
    }

    pub fn build_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn built_keys(&self) -> Vec<ProductKey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotBuilder for MockSnapshotBuilder {
    async fn build(&self, key: ProductKey) -> SnapshotResult<Product> {
        self.calls.lock().unwrap().push(key);
        self.products
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(SnapshotError::ProductNotFound {
                product_id: key.product_id,
            })
    }
}

/// Snapshot builder that pauses its first build after reading the product.
///
/// The build signals `started` once it holds its snapshot, then waits for
/// `release`. Later builds run straight through.
pub struct GatedSnapshotBuilder {
    pub inner: MockSnapshotBuilder,
    armed: AtomicBool,
    pub started: Notify,
    pub release: Notify,
}

impl GatedSnapshotBuilder {
    pub fn new() -> Self {
        Self {
            inner: MockSnapshotBuilder::new(),
            armed: AtomicBool::new(true),
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl SnapshotBuilder for GatedSnapshotBuilder {
    async fn build(&self, key: ProductKey) -> SnapshotResult<Product> {
        let product = self.inner.build(key).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.started.notify_one();
            self.release.notified().await;
        }
        product
    }
}

/// In-memory repository with switchable failures.
#[derive(Default)]
pub struct FlakyRepository {
    pub inner: InMemoryIndexRepository,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// `create_dirty` reports success without storing anything.
    pub drop_creates: AtomicBool,
    pub saves: AtomicUsize,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed(
                "database is locked".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IndexRepository for FlakyRepository {
    async fn find_one(&self, product_id: u64, store_id: u64) -> Result<Option<IndexEntry>> {
        Self::check(&self.fail_reads)?;
        self.inner.find_one(product_id, store_id).await
    }

    async fn create_dirty(&self, product_id: u64, store_id: u64) -> Result<IndexEntry> {
        Self::check(&self.fail_writes)?;
        if self.drop_creates.load(Ordering::SeqCst) {
            return Ok(IndexEntry::dirty(product_id, store_id));
        }
        self.inner.create_dirty(product_id, store_id).await
    }

    async fn save(&self, entry: &IndexEntry) -> Result<IndexEntry> {
        Self::check(&self.fail_writes)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(entry).await
    }

    async fn mark_dirty(&self, product_id: u64, store_id: u64) -> Result<bool> {
        Self::check(&self.fail_writes)?;
        self.inner.mark_dirty(product_id, store_id).await
    }

    async fn mark_store_dirty(&self, store_id: u64) -> Result<u64> {
        Self::check(&self.fail_writes)?;
        self.inner.mark_store_dirty(store_id).await
    }

    async fn find_dirty(&self, store_id: u64, limit: usize) -> Result<Vec<IndexEntry>> {
        Self::check(&self.fail_reads)?;
        self.inner.find_dirty(store_id, limit).await
    }
}

/// Log output captured from a scoped `tracing` subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Installs a subscriber writing into this buffer for the current thread.
    ///
    /// `#[tokio::test]` runs on a current-thread runtime, so every event of
    /// the test body reaches it while the guard is alive.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let logs = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || logs.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A fully populated product used across tests.
pub fn sample_product(product_id: u64) -> Product {
    Product::new(
        product_id.to_string(),
        format!("Product {product_id}"),
        format!("https://shop.test/products/{product_id}"),
        4990,
        "EUR",
    )
    .with_category("/Men/Shirts")
    .with_custom_field("material", "linen")
}
