//! Catalog service facade
//!
//! Composes the catalog store, search and price comparison into the
//! operations the HTTP layer calls. Holds the shared connection behind a
//! mutex; each call takes the lock for the duration of one operation.

use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::comparison::compare_prices;
use crate::database;
use crate::error::{CatalogError, Entity, Result};
use crate::models::{
    NewProduct, NewStore, Product, ProductUpdate, ProductWithStore, Store, StoreUpdate,
    StoreWithProducts,
};
use crate::query;

/// Search response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ProductWithStore>,
    pub total_results: usize,
}

/// Price comparison response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceComparisonResponse {
    pub product_name: String,
    pub products: Vec<ProductWithStore>,
    pub cheapest_store: String,
    pub most_expensive_store: String,
    pub price_difference: f64,
}

/// Entry point for every catalog operation
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<Mutex<Connection>>,
}

impl CatalogService {
    /// Wrap an already initialized connection
    pub fn new(conn: Connection) -> Self {
        Self::from_shared(Arc::new(Mutex::new(conn)))
    }

    pub fn from_shared(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    /// Open (or create) a catalog database file
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(database::open_in_memory()?))
    }

    /// Lock the connection
    ///
    /// A poisoned lock is recovered: writes are transactional, so a panic
    /// mid-operation leaves nothing half-applied.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Stores ─────────────────────────────────────────────────────────────

    pub fn create_store(&self, new_store: &NewStore) -> Result<Store> {
        database::create_store(&mut self.conn(), new_store)
    }

    /// Get a store with its products embedded
    pub fn get_store(&self, id: i64) -> Result<StoreWithProducts> {
        database::get_store_with_products(&self.conn(), id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Store, id))
    }

    pub fn get_store_by_external_id(&self, store_id: &str) -> Result<Store> {
        database::get_store_by_external_id(&self.conn(), store_id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Store, store_id))
    }

    pub fn list_stores(&self, offset: usize, limit: usize) -> Result<Vec<Store>> {
        database::list_stores(&self.conn(), offset, limit)
    }

    pub fn update_store(&self, id: i64, update: &StoreUpdate) -> Result<Store> {
        database::update_store(&mut self.conn(), id, update)
    }

    pub fn delete_store(&self, id: i64) -> Result<()> {
        database::delete_store(&mut self.conn(), id).map(|_| ())
    }

    // ── Products ───────────────────────────────────────────────────────────

    /// Create a product for an existing store
    ///
    /// The store is looked up first so that an unknown store (`NotFound`)
    /// and a taken `product_id` (`DuplicateKey`) stay distinguishable.
    pub fn create_product_for_store(
        &self,
        store_id: i64,
        new_product: &NewProduct,
    ) -> Result<Product> {
        let mut conn = self.conn();
        if database::get_store(&conn, store_id)?.is_none() {
            log::warn!(
                "Rejected product {}: store {} does not exist",
                new_product.product_id,
                store_id
            );
            return Err(CatalogError::not_found(Entity::Store, store_id));
        }
        database::create_product(&mut conn, store_id, new_product)
    }

    /// Get a product with its store embedded
    pub fn get_product(&self, id: i64) -> Result<ProductWithStore> {
        database::get_product_with_store(&self.conn(), id)?
            .ok_or_else(|| CatalogError::not_found(Entity::Product, id))
    }

    pub fn list_products(&self, offset: usize, limit: usize) -> Result<Vec<ProductWithStore>> {
        database::list_products_with_store(&self.conn(), offset, limit)
    }

    /// List a store's products; `NotFound` if the store does not exist
    pub fn list_products_by_store(
        &self,
        store_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ProductWithStore>> {
        let conn = self.conn();
        if database::get_store(&conn, store_id)?.is_none() {
            return Err(CatalogError::not_found(Entity::Store, store_id));
        }
        database::list_products_by_store_with_store(&conn, store_id, offset, limit)
    }

    pub fn update_product(&self, id: i64, update: &ProductUpdate) -> Result<Product> {
        database::update_product(&mut self.conn(), id, update)
    }

    pub fn delete_product(&self, id: i64) -> Result<()> {
        database::delete_product(&mut self.conn(), id)
    }

    // ── Queries ────────────────────────────────────────────────────────────

    /// Search products by name or category; never fails for lack of matches
    pub fn search_products(
        &self,
        query_text: &str,
        offset: usize,
        limit: usize,
    ) -> Result<SearchResponse> {
        let results = query::search_products(&self.conn(), query_text, offset, limit)?;
        Ok(SearchResponse {
            query: query_text.to_string(),
            total_results: results.len(),
            results,
        })
    }

    /// Compare prices of a product across all stores
    ///
    /// A name that matches nothing is reported as `NotFound`.
    pub fn compare_product_prices(&self, product_name: &str) -> Result<PriceComparisonResponse> {
        let products = query::find_product_across_stores(&self.conn(), product_name)?;
        if products.is_empty() {
            return Err(CatalogError::not_found(Entity::Product, product_name));
        }

        let comparison = compare_prices(&products)?;
        let cheapest_store = comparison.cheapest.store.store_name.clone();
        let most_expensive_store = comparison.most_expensive.store.store_name.clone();
        let price_difference = comparison.price_difference;

        log::info!(
            "Compared '{}' across {} offering(s): cheapest at {}, spread {:.2}",
            product_name,
            products.len(),
            cheapest_store,
            price_difference
        );

        Ok(PriceComparisonResponse {
            product_name: product_name.to_string(),
            products,
            cheapest_store,
            most_expensive_store,
            price_difference,
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
