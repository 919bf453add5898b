//! Contract for recomputing a product's representation from live catalog state.

mod error;
mod traits;

pub use error::{Result, SnapshotError};
pub use traits::SnapshotBuilder;
