use thiserror::Error;

/// Errors raised while building a product snapshot from the live catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: u64 },
    #[error("Product {product_id} is not assigned to store {store_id}")]
    NotInStore { product_id: u64, store_id: u64 },
    #[error("Catalog source unavailable: {0}")]
    Source(String),
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
