//! SQLite schema definitions and SQL query constants.
//!
//! This module contains all SQL statements used by the SQLite repository,
//! following the Functional Core pattern - pure data, no I/O.

/// SQL statement to create all tables.
///
/// The composite primary key is what keeps concurrent first-access races
/// down to a single row per (product, store).
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS product_index (
    product_id INTEGER NOT NULL,
    store_id INTEGER NOT NULL,
    product_data TEXT,
    is_dirty INTEGER NOT NULL DEFAULT 1,
    dirty_version INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (product_id, store_id),
    CHECK (is_dirty = 1 OR product_data IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_product_index_store_dirty ON product_index(store_id, is_dirty);
"#;

pub const SELECT_ENTRY: &str = r#"
SELECT product_id, store_id, product_data, is_dirty, created_at, updated_at, dirty_version
FROM product_index
WHERE product_id = ?1 AND store_id = ?2
"#;

pub const INSERT_DIRTY_ENTRY: &str = r#"
INSERT INTO product_index (product_id, store_id, product_data, is_dirty, created_at, updated_at)
VALUES (?1, ?2, NULL, 1, ?3, ?3)
ON CONFLICT (product_id, store_id) DO NOTHING
"#;

/// Upsert of a rebuilt entry. A single statement, so readers see either the
/// old row or the new one. The dirty flag is only taken from the entry when
/// no invalidation bumped `dirty_version` since it was read.
pub const SAVE_ENTRY: &str = r#"
INSERT INTO product_index (product_id, store_id, product_data, is_dirty, dirty_version, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
ON CONFLICT (product_id, store_id) DO UPDATE SET
    product_data = excluded.product_data,
    is_dirty = CASE
        WHEN product_index.dirty_version = excluded.dirty_version THEN excluded.is_dirty
        ELSE 1
    END,
    updated_at = excluded.updated_at
"#;

pub const MARK_DIRTY: &str = r#"
UPDATE product_index
SET is_dirty = 1, dirty_version = dirty_version + 1
WHERE product_id = ?1 AND store_id = ?2
"#;

pub const MARK_STORE_DIRTY: &str = r#"
UPDATE product_index
SET is_dirty = 1, dirty_version = dirty_version + 1
WHERE store_id = ?1
"#;

pub const SELECT_DIRTY_BY_STORE: &str = r#"
SELECT product_id, store_id, product_data, is_dirty, created_at, updated_at, dirty_version
FROM product_index
WHERE store_id = ?1 AND is_dirty = 1
ORDER BY product_id ASC
LIMIT ?2
"#;
