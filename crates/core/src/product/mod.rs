mod types;

pub use types::{Availability, Product, ProductKey};
