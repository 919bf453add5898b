use std::{collections::HashSet, env};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file (default: "catalogsync.db")
    pub sqlite_path: String,
    /// Path to the JSON catalog products are built from (default: "catalog.json")
    pub catalog_path: String,
    /// Maximum number of dirty entries rebuilt per reindex run (default: 500)
    pub reindex_batch_size: usize,
    /// Stores the observer keeps indexed. Empty means every store.
    pub indexed_stores: HashSet<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - SQLite database path (default: "catalogsync.db")
    /// - `CATALOG_PATH` - JSON catalog path (default: "catalog.json")
    /// - `REINDEX_BATCH_SIZE` - Entries rebuilt per reindex run (default: 500)
    /// - `INDEXED_STORES` - Comma separated store IDs (default: all stores)
    pub fn from_env() -> Self {
        Self {
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "catalogsync.db".to_string()),
            catalog_path: env::var("CATALOG_PATH").unwrap_or_else(|_| "catalog.json".to_string()),
            reindex_batch_size: env::var("REINDEX_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(500),
            indexed_stores: env::var("INDEXED_STORES")
                .map(|v| parse_store_ids(&v))
                .unwrap_or_default(),
        }
    }

    /// Stores to restrict invalidation to, or `None` when all are indexed.
    pub fn managed_stores(&self) -> Option<&HashSet<u64>> {
        (!self.indexed_stores.is_empty()).then_some(&self.indexed_stores)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parses a comma separated list of store IDs, skipping invalid items.
fn parse_store_ids(value: &str) -> HashSet<u64> {
    value
        .split(',')
        .filter_map(|item| item.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(indexed_stores: HashSet<u64>) -> Config {
        Config {
            sqlite_path: "test.db".to_string(),
            catalog_path: "catalog.json".to_string(),
            reindex_batch_size: 500,
            indexed_stores,
        }
    }

    #[test]
    fn test_parse_store_ids() {
        assert_eq!(parse_store_ids("1, 2,3"), HashSet::from([1, 2, 3]));
        assert_eq!(parse_store_ids("1,abc,,4"), HashSet::from([1, 4]));
        assert!(parse_store_ids("").is_empty());
    }

    #[test]
    fn test_managed_stores_empty_means_all() {
        assert!(config(HashSet::new()).managed_stores().is_none());

        let restricted = config(HashSet::from([2]));
        assert_eq!(restricted.managed_stores(), Some(&HashSet::from([2])));
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        env::remove_var("SQLITE_PATH");
        env::remove_var("CATALOG_PATH");
        env::remove_var("REINDEX_BATCH_SIZE");
        env::remove_var("INDEXED_STORES");

        let config = Config::from_env();

        assert_eq!(config.sqlite_path, "catalogsync.db");
        assert_eq!(config.catalog_path, "catalog.json");
        assert_eq!(config.reindex_batch_size, 500);
        assert!(config.indexed_stores.is_empty());
    }
}
