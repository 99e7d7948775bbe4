//! Bulk seed-data loading
//!
//! Seed files are JSON documents of the form:
//!
//! ```json
//! { "stores": [ { "store_id": "S1", "store_name": "Market", "location": "Main St",
//!                 "products": [ { "product_id": "P1", "name": "Milk", "price": 2.5,
//!                                 "category": "Dairy", "unit": "l" } ] } ] }
//! ```
//!
//! Loading only happens into an empty catalog and is all-or-nothing: one bad
//! record rolls back the whole file.

use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use std::path::Path;

use crate::database::{insert_product_tx, insert_store_tx, store_count};
use crate::error::Result;
use crate::models::{NewProduct, NewStore};

/// Full seed file structure
#[derive(Debug, Deserialize)]
pub struct SeedData {
    pub stores: Vec<SeedStore>,
}

/// A store and the products it sells
#[derive(Debug, Deserialize)]
pub struct SeedStore {
    #[serde(flatten)]
    pub store: NewStore,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// Result of a seed load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The catalog already had stores; nothing was written
    Skipped { existing_stores: i64 },
    Loaded { stores: usize, products: usize },
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Read a seed file and load it
pub fn load_seed_file(conn: &mut Connection, path: &Path) -> Result<SeedOutcome> {
    log::info!("Loading seed data from {}", path.display());
    let json = std::fs::read_to_string(path)?;
    let data = SeedData::from_json(&json)?;
    load_seed(conn, &data)
}

/// Load seed data into an empty catalog in a single transaction
pub fn load_seed(conn: &mut Connection, data: &SeedData) -> Result<SeedOutcome> {
    let existing_stores = store_count(conn)?;
    if existing_stores > 0 {
        log::info!(
            "Catalog already has {} store(s), skipping seed load",
            existing_stores
        );
        return Ok(SeedOutcome::Skipped { existing_stores });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut products = 0;
    for entry in &data.stores {
        entry.store.validate()?;
        let store = insert_store_tx(&tx, &entry.store)?;
        log::debug!("Seeded store {}", store.store_name);

        for product in &entry.products {
            product.validate()?;
            insert_product_tx(&tx, store.id, product)?;
            products += 1;
        }
    }
    tx.commit()?;

    log::info!(
        "Seed data loaded: {} store(s), {} product(s)",
        data.stores.len(),
        products
    );
    Ok(SeedOutcome::Loaded {
        stores: data.stores.len(),
        products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{open_in_memory, product_count};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "stores": [
            {
                "store_id": "S1",
                "store_name": "Fresh Market",
                "location": "Main Street",
                "products": [
                    {"product_id": "P1", "name": "Milk", "price": 2.5, "category": "Dairy", "unit": "l"},
                    {"product_id": "P2", "name": "Bread", "price": 1.8, "category": "Bakery", "unit": "each"}
                ]
            },
            {
                "store_id": "S2",
                "store_name": "Corner Shop",
                "products": [
                    {"product_id": "P1", "name": "Milk", "price": 3.0, "category": "Dairy", "unit": "l"}
                ]
            }
        ]
    }"#;

    #[test]
    fn seed_data_parses_optional_location() {
        let data = SeedData::from_json(SAMPLE).unwrap();
        assert_eq!(data.stores.len(), 2);
        assert_eq!(data.stores[0].store.location.as_deref(), Some("Main Street"));
        assert!(data.stores[1].store.location.is_none());
        assert_eq!(data.stores[0].products.len(), 2);
    }

    #[test]
    fn load_seed_into_empty_catalog() {
        let mut conn = open_in_memory().unwrap();
        let data = SeedData::from_json(SAMPLE).unwrap();

        let outcome = load_seed(&mut conn, &data).unwrap();
        assert_eq!(
            outcome,
            SeedOutcome::Loaded {
                stores: 2,
                products: 3
            }
        );
        assert_eq!(store_count(&conn).unwrap(), 2);
        assert_eq!(product_count(&conn).unwrap(), 3);
    }

    #[test]
    fn load_seed_skips_populated_catalog() {
        let mut conn = open_in_memory().unwrap();
        let data = SeedData::from_json(SAMPLE).unwrap();
        load_seed(&mut conn, &data).unwrap();

        let outcome = load_seed(&mut conn, &data).unwrap();
        assert_eq!(outcome, SeedOutcome::Skipped { existing_stores: 2 });
        assert_eq!(product_count(&conn).unwrap(), 3);
    }

    #[test]
    fn load_seed_is_all_or_nothing() {
        let mut conn = open_in_memory().unwrap();
        let data = SeedData::from_json(
            r#"{"stores": [
                {"store_id": "S1", "store_name": "Market", "products": [
                    {"product_id": "P1", "name": "Milk", "price": 2.5, "category": "Dairy", "unit": "l"},
                    {"product_id": "P1", "name": "Milk", "price": 2.6, "category": "Dairy", "unit": "l"}
                ]}
            ]}"#,
        )
        .unwrap();

        let err = load_seed(&mut conn, &data).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store_count(&conn).unwrap(), 0);
        assert_eq!(product_count(&conn).unwrap(), 0);
    }

    #[test]
    fn load_seed_rejects_invalid_price() {
        let mut conn = open_in_memory().unwrap();
        let data = SeedData::from_json(
            r#"{"stores": [
                {"store_id": "S1", "store_name": "Market", "products": [
                    {"product_id": "P1", "name": "Milk", "price": -1, "category": "Dairy", "unit": "l"}
                ]}
            ]}"#,
        )
        .unwrap();

        assert!(load_seed(&mut conn, &data).unwrap_err().is_invalid());
        assert_eq!(store_count(&conn).unwrap(), 0);
    }

    #[test]
    fn load_seed_file_reads_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let mut conn = open_in_memory().unwrap();
        let outcome = load_seed_file(&mut conn, file.path()).unwrap();
        assert!(matches!(outcome, SeedOutcome::Loaded { stores: 2, .. }));
    }

    #[test]
    fn load_seed_file_missing_is_io_error() {
        let mut conn = open_in_memory().unwrap();
        let err = load_seed_file(&mut conn, Path::new("/nonexistent/seed.json")).unwrap_err();
        assert!(matches!(err, crate::error::CatalogError::Io(_)));
    }
}
