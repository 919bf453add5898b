//! Pure decision functions for product-change notifications.
//!
//! A product save on the platform arrives as a [`ProductChange`]. These
//! functions decide which index keys the change invalidates; the runtime
//! observer only performs the resulting `mark_dirty` calls.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::product::ProductKey;

/// Timestamp format the platform uses for scheduling attributes.
pub const PLATFORM_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A saved product as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductChange {
    pub product_id: u64,
    /// Configurable parents of this product, if it is a child variant.
    #[serde(default)]
    pub parent_ids: Vec<u64>,
    /// Store views the product is assigned to.
    #[serde(default)]
    pub store_ids: Vec<u64>,
    pub news_from_date: Option<NaiveDateTime>,
    pub news_to_date: Option<NaiveDateTime>,
}

impl ProductChange {
    /// Creates a change for a product assigned to the given stores.
    pub fn new(product_id: u64, store_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            product_id,
            store_ids: store_ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_ids.push(parent_id);
        self
    }

    pub fn with_news_from_date(mut self, date: NaiveDateTime) -> Self {
        self.news_from_date = Some(date);
        self
    }

    pub fn with_news_to_date(mut self, date: NaiveDateTime) -> Self {
        self.news_to_date = Some(date);
        self
    }
}

/// Parses a platform scheduling timestamp (`YYYY-MM-DD HH:MM:SS`).
pub fn parse_platform_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), PLATFORM_DATETIME_FORMAT).ok()
}

/// Returns whether the product is the live version rather than a scheduled one.
///
/// Without a `news_from_date` the product is present. A `news_from_date` in
/// the future means a staged update. Once it has passed, a `news_to_date`
/// still ahead of `now` also marks the product as not present.
pub fn product_present(change: &ProductChange, now: NaiveDateTime) -> bool {
    let Some(from) = change.news_from_date else {
        return true;
    };
    if now <= from {
        return false;
    }
    !change.news_to_date.is_some_and(|to| to > now)
}

/// Returns the product whose cache entries a change invalidates.
///
/// Variants are cached at the level of their first configurable parent.
pub fn target_product_id(change: &ProductChange) -> u64 {
    change
        .parent_ids
        .first()
        .copied()
        .unwrap_or(change.product_id)
}

/// Returns the index keys a change invalidates, in store order.
///
/// `managed_stores` restricts the result to stores this index serves;
/// `None` means every store is managed.
pub fn invalidation_keys(
    change: &ProductChange,
    managed_stores: Option<&HashSet<u64>>,
    now: NaiveDateTime,
) -> Vec<ProductKey> {
    if !product_present(change, now) {
        return Vec::new();
    }
    let product_id = target_product_id(change);
    let mut store_ids: Vec<u64> = change
        .store_ids
        .iter()
        .copied()
        .filter(|store_id| managed_stores.is_none_or(|stores| stores.contains(store_id)))
        .collect();
    store_ids.sort_unstable();
    store_ids.dedup();
    store_ids
        .into_iter()
        .map(|store_id| ProductKey::new(product_id, store_id))
        .collect()
}
