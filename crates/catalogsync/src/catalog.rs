//! Snapshot builder backed by a JSON catalog file.
//!
//! The file is re-read on every build, so edits to it are what the index sees
//! as live catalog changes.
//!
//! ```json
//! {
//!   "products": [
//!     {
//!       "id": 42,
//!       "name": "Linen Shirt",
//!       "url": "https://shop.test/linen-shirt",
//!       "price_cents": 4990,
//!       "currency_code": "EUR",
//!       "store_ids": [1, 2],
//!       "store_overrides": { "2": { "name": "Leinenhemd" } }
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use catalogsync_core::product::{Availability, Product, ProductKey};
use catalogsync_core::snapshot::{Result, SnapshotBuilder, SnapshotError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    pub id: u64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub list_price_cents: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub store_ids: Vec<u64>,
    #[serde(default)]
    pub store_overrides: BTreeMap<u64, StoreOverride>,
}

/// Store-scoped attribute values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreOverride {
    pub name: Option<String>,
    pub url: Option<String>,
    pub price_cents: Option<i64>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Catalog {
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|e| SnapshotError::Source(format!("invalid catalog JSON: {e}")))
    }

    /// Resolves the store view of a product.
    pub fn product_for(&self, key: ProductKey) -> Result<Product> {
        let item = self
            .products
            .iter()
            .find(|p| p.id == key.product_id)
            .ok_or(SnapshotError::ProductNotFound {
                product_id: key.product_id,
            })?;

        if !item.store_ids.contains(&key.store_id) {
            return Err(SnapshotError::NotInStore {
                product_id: key.product_id,
                store_id: key.store_id,
            });
        }

        Ok(item.to_product(item.store_overrides.get(&key.store_id)))
    }
}

impl CatalogProduct {
    fn to_product(&self, overrides: Option<&StoreOverride>) -> Product {
        let overrides = overrides.cloned().unwrap_or_default();

        Product {
            product_id: self.id.to_string(),
            name: overrides.name.unwrap_or_else(|| self.name.clone()),
            url: overrides.url.unwrap_or_else(|| self.url.clone()),
            image_url: self.image_url.clone(),
            price_cents: overrides.price_cents.unwrap_or(self.price_cents),
            list_price_cents: self.list_price_cents,
            currency_code: self.currency_code.clone(),
            availability: self.availability,
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            description: self.description.clone(),
            brand: self.brand.clone(),
            custom_fields: self.custom_fields.clone(),
        }
    }
}

/// Builds products from the catalog file at `path`.
#[derive(Debug, Clone)]
pub struct CatalogSnapshotBuilder {
    path: PathBuf,
}

impl CatalogSnapshotBuilder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn load(&self) -> Result<Catalog> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SnapshotError::Source(format!("cannot read {}: {e}", self.path.display()))
        })?;
        Catalog::from_json(&data)
    }
}

#[async_trait]
impl SnapshotBuilder for CatalogSnapshotBuilder {
    async fn build(&self, key: ProductKey) -> Result<Product> {
        let catalog = self.load().await?;
        catalog.product_for(key)
    }
}
