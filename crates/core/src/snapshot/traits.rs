use async_trait::async_trait;

use crate::product::{Product, ProductKey};

use super::Result;

/// Builds the store-specific representation of a product from live data.
#[async_trait]
pub trait SnapshotBuilder: Send + Sync {
    /// Builds the product for the given key.
    async fn build(&self, key: ProductKey) -> Result<Product>;
}
