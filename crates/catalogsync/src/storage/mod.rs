//! Index storage backend implementations.
//!
//! This module provides concrete implementations of the `IndexRepository`
//! trait defined in `catalogsync_core::storage`.
//!
//! # Feature Flags
//!
//! - `sqlite` (default): SQLite storage backend using `rusqlite` and `tokio-rusqlite`
//!
//! The in-memory backend is always available; it backs the test suite and
//! the `--in-memory` CLI flag.
//!
//! # Examples
//!
//! Build without SQLite:
//! ```bash
//! cargo build -p catalogsync --no-default-features
//! ```

pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::InMemoryIndexRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIndexRepository;
