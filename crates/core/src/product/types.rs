use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Composite identity of a cached product: one platform product in one store view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductKey {
    pub product_id: u64,
    pub store_id: u64,
}

impl ProductKey {
    pub fn new(product_id: u64, store_id: u64) -> Self {
        Self {
            product_id,
            store_id,
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product:{}:store:{}", self.product_id, self.store_id)
    }
}

/// Stock status reported to the personalization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    InStock,
    OutOfStock,
}

impl Availability {
    /// Returns true if the product can currently be bought.
    pub fn is_in_stock(&self) -> bool {
        matches!(self, Availability::InStock)
    }
}

/// Store-specific product representation sent to the personalization service.
///
/// Prices are kept in minor currency units so two snapshots of the same
/// product compare equal after a serialization round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub price_cents: i64,
    /// Price before discounts, when it differs from `price_cents`.
    pub list_price_cents: Option<i64>,
    pub currency_code: String,
    pub availability: Availability,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

impl Product {
    /// Creates an in-stock product with the required fields set.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        price_cents: i64,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            url: url.into(),
            image_url: None,
            price_cents,
            list_price_cents: None,
            currency_code: currency_code.into(),
            availability: Availability::InStock,
            categories: Vec::new(),
            tags: Vec::new(),
            description: None,
            brand: None,
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_list_price_cents(mut self, list_price_cents: i64) -> Self {
        self.list_price_cents = Some(list_price_cents);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_custom_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    /// Returns true if a list price above the selling price is set.
    pub fn is_discounted(&self) -> bool {
        self.list_price_cents
            .is_some_and(|list_price| list_price > self.price_cents)
    }
}
