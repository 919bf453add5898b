//! Pure functions for converting products to and from the stored index payload.
//!
//! The payload is JSON, which keeps index rows readable when inspecting the
//! database by hand. Its shape is private to this module and the rebuild flow.

use thiserror::Error;

use crate::product::Product;

/// Errors that can occur while encoding or decoding a stored product.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to serialize a product.
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    /// The stored payload is not a valid product.
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serializes a product into its stored string form.
pub fn serialize_product(product: &Product) -> Result<String> {
    serde_json::to_string(product).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes a stored payload back into a product.
pub fn deserialize_product(data: &str) -> Result<Product> {
    serde_json::from_str(data).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}
