use thiserror::Error;

use crate::serializer::SerializationError;
use crate::snapshot::SnapshotError;
use crate::storage::RepositoryError;

/// Failures of a single product cache lookup or rebuild.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProductCacheError {
    /// The index store failed, or an entry vanished right after creation.
    #[error("Index store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),
    /// The stored payload could not be decoded.
    #[error("Corrupt product data: {0}")]
    Deserialization(#[from] SerializationError),
    /// The live product could not be rebuilt.
    #[error("Rebuild failed: {0}")]
    RebuildFailure(#[from] SnapshotError),
}

impl ProductCacheError {
    /// Short machine-readable label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProductCacheError::StoreUnavailable(_) => "store_unavailable",
            ProductCacheError::Deserialization(_) => "deserialization",
            ProductCacheError::RebuildFailure(_) => "rebuild_failure",
        }
    }
}

/// Result type for product cache operations.
pub type Result<T> = std::result::Result<T, ProductCacheError>;
