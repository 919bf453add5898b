//! In-memory index storage backend.
//!
//! Stores entries in a HashMap wrapped in `Arc<RwLock<_>>`. Nothing is
//! persisted; useful for tests and for one-shot CLI runs with `--in-memory`.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalogsync::storage::inmemory::InMemoryIndexRepository;
//!
//! let repo = InMemoryIndexRepository::new();
//! let entry = repo.create_dirty(42, 1).await?;
//! ```

mod repository;

pub use repository::InMemoryIndexRepository;
