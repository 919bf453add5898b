mod error;

pub use error::{ProductCacheError, Result};
