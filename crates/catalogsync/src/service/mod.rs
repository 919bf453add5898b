//! Product cache services.
//!
//! [`IndexService`] rebuilds dirty entries; [`CachingProductService`] is the
//! read path callers use.

mod caching;
mod rebuild;

#[cfg(test)]
pub(crate) mod testing;

pub use caching::CachingProductService;
pub use rebuild::{IndexService, RebuildReport};
