//! Catalog records, write payloads and read-time views
//!
//! Records (`Store`, `Product`) mirror table rows. Write payloads carry only
//! caller-supplied attributes: identity fields (`id`, and `store_id` /
//! `product_id` after creation) are never part of an update payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CatalogError, Result};

pub const STORE_ID_MAX_LEN: usize = 50;
pub const STORE_NAME_MAX_LEN: usize = 100;
pub const LOCATION_MAX_LEN: usize = 200;
pub const PRODUCT_ID_MAX_LEN: usize = 50;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;
pub const CATEGORY_MAX_LEN: usize = 50;
pub const UNIT_MAX_LEN: usize = 20;

/// A seller of products
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Store {
    pub id: i64,
    pub store_id: String,
    pub store_name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// An item sold by exactly one store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub unit: String,
    /// Internal id of the owning store
    pub store_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Store summary embedded in product responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRef {
    pub id: i64,
    pub store_id: String,
    pub store_name: String,
    pub location: Option<String>,
}

impl From<&Store> for StoreRef {
    fn from(store: &Store) -> Self {
        StoreRef {
            id: store.id,
            store_id: store.store_id.clone(),
            store_name: store.store_name.clone(),
            location: store.location.clone(),
        }
    }
}

/// Product joined with its owning store at read time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductWithStore {
    #[serde(flatten)]
    pub product: Product,
    pub store: StoreRef,
}

/// Store joined with the products it owns at read time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreWithProducts {
    #[serde(flatten)]
    pub store: Store,
    pub products: Vec<Product>,
}

/// Payload for creating a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStore {
    pub store_id: String,
    pub store_name: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl NewStore {
    pub fn new(store_id: impl Into<String>, store_name: impl Into<String>) -> Self {
        NewStore {
            store_id: store_id.into(),
            store_name: store_name.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_required("store_id", &self.store_id, STORE_ID_MAX_LEN)?;
        check_required("store_name", &self.store_name, STORE_NAME_MAX_LEN)?;
        if let Some(location) = &self.location {
            check_max_len("location", location, LOCATION_MAX_LEN)?;
        }
        Ok(())
    }
}

/// Partial update for a store
///
/// `None` means "leave unchanged". `location` is tri-state: absent,
/// explicitly cleared (`Some(None)`, JSON `null`) or set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoreUpdate {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
}

impl StoreUpdate {
    pub fn is_empty(&self) -> bool {
        self.store_name.is_none() && self.location.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.store_name {
            check_required("store_name", name, STORE_NAME_MAX_LEN)?;
        }
        if let Some(Some(location)) = &self.location {
            check_max_len("location", location, LOCATION_MAX_LEN)?;
        }
        Ok(())
    }

    /// Copy every present field onto `store`
    pub fn apply(&self, store: &mut Store) {
        if let Some(name) = &self.store_name {
            store.store_name = name.clone();
        }
        if let Some(location) = &self.location {
            store.location = location.clone();
        }
    }
}

/// Payload for creating a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub unit: String,
}

impl NewProduct {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        NewProduct {
            product_id: product_id.into(),
            name: name.into(),
            price,
            category: category.into(),
            unit: unit.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_required("product_id", &self.product_id, PRODUCT_ID_MAX_LEN)?;
        check_required("name", &self.name, PRODUCT_NAME_MAX_LEN)?;
        check_price(self.price)?;
        check_required("category", &self.category, CATEGORY_MAX_LEN)?;
        check_required("unit", &self.unit, UNIT_MAX_LEN)
    }
}

/// Partial update for a product; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ProductUpdate {
    pub fn price(price: f64) -> Self {
        ProductUpdate {
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.category.is_none() && self.unit.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_required("name", name, PRODUCT_NAME_MAX_LEN)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(category) = &self.category {
            check_required("category", category, CATEGORY_MAX_LEN)?;
        }
        if let Some(unit) = &self.unit {
            check_required("unit", unit, UNIT_MAX_LEN)?;
        }
        Ok(())
    }

    /// Copy every present field onto `product`
    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(unit) = &self.unit {
            product.unit = unit.clone();
        }
    }
}

/// Deserialize a field that was present in the payload, even as `null`
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn check_required(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::invalid(field, "must not be empty"));
    }
    check_max_len(field, value, max_len)
}

fn check_max_len(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    if value.chars().count() > max_len {
        return Err(CatalogError::invalid(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(CatalogError::invalid(
            "price",
            format!("must be greater than zero, got {}", price),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
