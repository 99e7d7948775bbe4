//! Catalog store: SQLite persistence for stores and products
//!
//! Uses parameterized queries exclusively (no SQL string concatenation of
//! caller input). Every write runs in an IMMEDIATE transaction so that a
//! create, update or delete either fully applies or not at all, and so that
//! concurrent writers on other connections queue on the write lock instead of
//! failing mid-transaction.
//!
//! Integrity rules are enforced by the schema (unique `store_id`, unique
//! `(product_id, store_id)`, foreign key with cascade, positive price) and
//! re-checked here so callers get a typed error instead of a raw SQLite code.

use chrono::Utc;
use rusqlite::functions::FunctionFlags;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::ffi::c_int;
use std::path::Path;
use std::time::Duration;

use crate::error::{CatalogError, Entity, Result};
use crate::models::{
    NewProduct, NewStore, Product, ProductUpdate, ProductWithStore, Store, StoreRef, StoreUpdate,
    StoreWithProducts,
};

/// How long a connection waits for another writer before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS stores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        store_id TEXT NOT NULL UNIQUE,
        store_name TEXT NOT NULL,
        location TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );

    -- product_id is unique per store, not globally
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id TEXT NOT NULL,
        name TEXT NOT NULL,
        price REAL NOT NULL CHECK (price > 0),
        category TEXT NOT NULL,
        unit TEXT NOT NULL,
        store_id INTEGER NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT,
        UNIQUE (product_id, store_id)
    );

    CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
    CREATE INDEX IF NOT EXISTS idx_products_store ON products(store_id);
";

const STORE_SELECT: &str =
    "SELECT id, store_id, store_name, location, created_at, updated_at FROM stores";

const PRODUCT_SELECT: &str = "SELECT id, product_id, name, price, category, unit, store_id,
            created_at, updated_at
     FROM products";

/// Products joined with their owning store; columns 0..=8 are the product,
/// 9..=12 the store reference
pub(crate) const PRODUCT_WITH_STORE_SELECT: &str =
    "SELECT p.id, p.product_id, p.name, p.price, p.category, p.unit, p.store_id,
            p.created_at, p.updated_at,
            s.id, s.store_id, s.store_name, s.location
     FROM products p
     JOIN stores s ON s.id = p.store_id";

/// Open (or create) a catalog database file and initialize the schema
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    log::debug!("Opened catalog database: {}", path.display());
    Ok(conn)
}

/// Open a private in-memory catalog (tests, dry runs)
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Prepare a connection for catalog use
///
/// Enables foreign keys, registers the `casefold` SQL function used by
/// product search and creates the tables if they don't exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: String = ctx.get(0)?;
            Ok(text.to_lowercase())
        },
    )?;
    conn.execute_batch(SCHEMA_SQL)?;

    log::info!("Catalog schema initialized");
    Ok(())
}

/// Drop all catalog tables and recreate them empty
pub fn reset_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS products;
         DROP TABLE IF EXISTS stores;",
    )?;
    log::warn!("Catalog tables dropped");
    init_schema(conn)
}

fn begin_write(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// SQLite reports constraint failures through extended result codes
fn is_constraint(err: &rusqlite::Error, extended: c_int) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == extended
    )
}

/// Clamp a caller-supplied offset/limit to SQLite's integer range
pub(crate) fn to_sql_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        store_id: row.get(1)?,
        store_name: row.get(2)?,
        location: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        product_id: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        unit: row.get(5)?,
        store_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub(crate) fn product_with_store_from_row(row: &Row<'_>) -> rusqlite::Result<ProductWithStore> {
    Ok(ProductWithStore {
        product: product_from_row(row)?,
        store: StoreRef {
            id: row.get(9)?,
            store_id: row.get(10)?,
            store_name: row.get(11)?,
            location: row.get(12)?,
        },
    })
}

// ── Stores ─────────────────────────────────────────────────────────────────

/// Create a store; fails with `DuplicateKey` if `store_id` is taken
pub fn create_store(conn: &mut Connection, new_store: &NewStore) -> Result<Store> {
    new_store.validate()?;
    let tx = begin_write(conn)?;
    let store = insert_store_tx(&tx, new_store)?;
    tx.commit()?;

    log::info!("Created store {} (id {})", store.store_id, store.id);
    Ok(store)
}

pub(crate) fn insert_store_tx(tx: &Transaction<'_>, new_store: &NewStore) -> Result<Store> {
    tx.execute(
        "INSERT INTO stores (store_id, store_name, location, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            &new_store.store_id,
            &new_store.store_name,
            &new_store.location,
            Utc::now(),
        ],
    )
    .map_err(|e| {
        if is_constraint(&e, ffi::SQLITE_CONSTRAINT_UNIQUE) {
            CatalogError::duplicate(Entity::Store, &new_store.store_id)
        } else {
            CatalogError::from(e)
        }
    })?;

    let id = tx.last_insert_rowid();
    get_store(tx, id)?.ok_or_else(|| CatalogError::not_found(Entity::Store, id))
}

/// Get a store by internal id
pub fn get_store(conn: &Connection, id: i64) -> Result<Option<Store>> {
    let mut stmt = conn.prepare_cached(&format!("{} WHERE id = ?1", STORE_SELECT))?;
    let store = stmt.query_row(params![id], store_from_row).optional()?;
    Ok(store)
}

/// Get a store by its caller-assigned `store_id`
pub fn get_store_by_external_id(conn: &Connection, store_id: &str) -> Result<Option<Store>> {
    let mut stmt = conn.prepare_cached(&format!("{} WHERE store_id = ?1", STORE_SELECT))?;
    let store = stmt.query_row(params![store_id], store_from_row).optional()?;
    Ok(store)
}

/// Get a store together with every product it owns
pub fn get_store_with_products(conn: &Connection, id: i64) -> Result<Option<StoreWithProducts>> {
    let Some(store) = get_store(conn, id)? else {
        return Ok(None);
    };
    let products = list_products_by_store(conn, id, 0, usize::MAX)?;
    Ok(Some(StoreWithProducts { store, products }))
}

/// List stores in creation order (internal id ascending)
pub fn list_stores(conn: &Connection, offset: usize, limit: usize) -> Result<Vec<Store>> {
    let mut stmt =
        conn.prepare_cached(&format!("{} ORDER BY id LIMIT ?1 OFFSET ?2", STORE_SELECT))?;
    let stores = stmt
        .query_map(
            params![to_sql_bound(limit), to_sql_bound(offset)],
            store_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(stores)
}

/// Apply a partial update to a store
///
/// Only fields present in `update` change. An update with no fields present
/// returns the current record and leaves `updated_at` untouched.
pub fn update_store(conn: &mut Connection, id: i64, update: &StoreUpdate) -> Result<Store> {
    update.validate()?;
    let tx = begin_write(conn)?;
    let mut store = get_store(&tx, id)?.ok_or_else(|| CatalogError::not_found(Entity::Store, id))?;
    if update.is_empty() {
        return Ok(store);
    }

    update.apply(&mut store);
    store.updated_at = Some(Utc::now());
    tx.execute(
        "UPDATE stores SET store_name = ?1, location = ?2, updated_at = ?3 WHERE id = ?4",
        params![&store.store_name, &store.location, store.updated_at, id],
    )?;
    tx.commit()?;

    log::info!("Updated store {} (id {})", store.store_id, id);
    Ok(store)
}

/// Delete a store and every product it owns in one transaction
///
/// Returns the number of products removed with the store.
pub fn delete_store(conn: &mut Connection, id: i64) -> Result<usize> {
    let tx = begin_write(conn)?;
    if get_store(&tx, id)?.is_none() {
        return Err(CatalogError::not_found(Entity::Store, id));
    }
    // Explicit so the cascade holds even on a connection without foreign keys
    let removed = tx.execute("DELETE FROM products WHERE store_id = ?1", params![id])?;
    tx.execute("DELETE FROM stores WHERE id = ?1", params![id])?;
    tx.commit()?;

    log::info!("Deleted store {} and {} product(s)", id, removed);
    Ok(removed)
}

/// Get total count of stores in database
pub fn store_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM stores", [], |row| row.get(0))?)
}

// ── Products ───────────────────────────────────────────────────────────────

/// Create a product owned by the store with internal id `store_id`
///
/// Fails with `NotFound` if the store does not exist and with `DuplicateKey`
/// if the store already sells a product with the same `product_id`.
pub fn create_product(
    conn: &mut Connection,
    store_id: i64,
    new_product: &NewProduct,
) -> Result<Product> {
    new_product.validate()?;
    let tx = begin_write(conn)?;
    let product = insert_product_tx(&tx, store_id, new_product)?;
    tx.commit()?;

    log::info!(
        "Created product {} (id {}) in store {}",
        product.product_id,
        product.id,
        store_id
    );
    Ok(product)
}

pub(crate) fn insert_product_tx(
    tx: &Transaction<'_>,
    store_id: i64,
    new_product: &NewProduct,
) -> Result<Product> {
    if get_store(tx, store_id)?.is_none() {
        return Err(CatalogError::not_found(Entity::Store, store_id));
    }

    tx.execute(
        "INSERT INTO products (product_id, name, price, category, unit, store_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &new_product.product_id,
            &new_product.name,
            new_product.price,
            &new_product.category,
            &new_product.unit,
            store_id,
            Utc::now(),
        ],
    )
    .map_err(|e| {
        if is_constraint(&e, ffi::SQLITE_CONSTRAINT_UNIQUE) {
            CatalogError::duplicate(
                Entity::Product,
                format!("{} in store {}", new_product.product_id, store_id),
            )
        } else if is_constraint(&e, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
            CatalogError::not_found(Entity::Store, store_id)
        } else if is_constraint(&e, ffi::SQLITE_CONSTRAINT_CHECK) {
            CatalogError::invalid("price", "must be greater than zero")
        } else {
            CatalogError::from(e)
        }
    })?;

    let id = tx.last_insert_rowid();
    get_product(tx, id)?.ok_or_else(|| CatalogError::not_found(Entity::Product, id))
}

/// Get a product by internal id
pub fn get_product(conn: &Connection, id: i64) -> Result<Option<Product>> {
    let mut stmt = conn.prepare_cached(&format!("{} WHERE id = ?1", PRODUCT_SELECT))?;
    let product = stmt.query_row(params![id], product_from_row).optional()?;
    Ok(product)
}

/// Get a product with its owning store embedded
pub fn get_product_with_store(conn: &Connection, id: i64) -> Result<Option<ProductWithStore>> {
    let mut stmt = conn.prepare_cached(&format!("{} WHERE p.id = ?1", PRODUCT_WITH_STORE_SELECT))?;
    let product = stmt
        .query_row(params![id], product_with_store_from_row)
        .optional()?;
    Ok(product)
}

/// List products in creation order (internal id ascending)
pub fn list_products(conn: &Connection, offset: usize, limit: usize) -> Result<Vec<Product>> {
    let mut stmt =
        conn.prepare_cached(&format!("{} ORDER BY id LIMIT ?1 OFFSET ?2", PRODUCT_SELECT))?;
    let products = stmt
        .query_map(
            params![to_sql_bound(limit), to_sql_bound(offset)],
            product_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

/// List products with their stores embedded, in creation order
pub fn list_products_with_store(
    conn: &Connection,
    offset: usize,
    limit: usize,
) -> Result<Vec<ProductWithStore>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} ORDER BY p.id LIMIT ?1 OFFSET ?2",
        PRODUCT_WITH_STORE_SELECT
    ))?;
    let products = stmt
        .query_map(
            params![to_sql_bound(limit), to_sql_bound(offset)],
            product_with_store_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

/// List the products of one store in creation order
///
/// An unknown store simply has no products; existence checks belong to the
/// caller.
pub fn list_products_by_store(
    conn: &Connection,
    store_id: i64,
    offset: usize,
    limit: usize,
) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE store_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        PRODUCT_SELECT
    ))?;
    let products = stmt
        .query_map(
            params![store_id, to_sql_bound(limit), to_sql_bound(offset)],
            product_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

/// Same as [`list_products_by_store`] with the store embedded in each row
pub fn list_products_by_store_with_store(
    conn: &Connection,
    store_id: i64,
    offset: usize,
    limit: usize,
) -> Result<Vec<ProductWithStore>> {
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE p.store_id = ?1 ORDER BY p.id LIMIT ?2 OFFSET ?3",
        PRODUCT_WITH_STORE_SELECT
    ))?;
    let products = stmt
        .query_map(
            params![store_id, to_sql_bound(limit), to_sql_bound(offset)],
            product_with_store_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(products)
}

/// Apply a partial update to a product
///
/// Only fields present in `update` change; the product never moves to
/// another store and keeps its `product_id`.
pub fn update_product(conn: &mut Connection, id: i64, update: &ProductUpdate) -> Result<Product> {
    update.validate()?;
    let tx = begin_write(conn)?;
    let mut product =
        get_product(&tx, id)?.ok_or_else(|| CatalogError::not_found(Entity::Product, id))?;
    if update.is_empty() {
        return Ok(product);
    }

    update.apply(&mut product);
    product.updated_at = Some(Utc::now());
    tx.execute(
        "UPDATE products
         SET name = ?1, price = ?2, category = ?3, unit = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            &product.name,
            product.price,
            &product.category,
            &product.unit,
            product.updated_at,
            id,
        ],
    )?;
    tx.commit()?;

    log::info!("Updated product {} (id {})", product.product_id, id);
    Ok(product)
}

/// Delete a single product
pub fn delete_product(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = begin_write(conn)?;
    let deleted = tx.execute("DELETE FROM products WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(CatalogError::not_found(Entity::Product, id));
    }
    tx.commit()?;

    log::info!("Deleted product {}", id);
    Ok(())
}

/// Get total count of products in database
pub fn product_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?)
}
