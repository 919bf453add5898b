//! Domain types and contracts for the indexed product cache.
//!
//! This crate holds the functional core: product and index entry types, the
//! payload serializer, the repository and snapshot builder traits, and the
//! pure rules applied to product-change notifications. It performs no I/O.

pub mod index;
pub mod observer;
pub mod product;
pub mod serializer;
pub mod service;
pub mod snapshot;
pub mod storage;
