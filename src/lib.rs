//! Grocery Catalog - stores, products and cross-store price comparison
//!
//! Keeps a catalog of grocery stores and the products each one sells in
//! SQLite, answers case-insensitive searches and compares the price of a
//! product across every store that carries it. An optional HTTP API exposes
//! the same operations.

pub mod comparison;
pub mod database;
pub mod error;
pub mod models;
pub mod query;
pub mod seed;
pub mod service;
pub mod web;

pub use comparison::{compare_prices, PriceComparison, Priced};
pub use error::{CatalogError, Entity, Result};
pub use models::{
    NewProduct, NewStore, Product, ProductUpdate, ProductWithStore, Store, StoreRef, StoreUpdate,
    StoreWithProducts,
};
pub use seed::{load_seed, load_seed_file, SeedData, SeedOutcome};
pub use service::{CatalogService, PriceComparisonResponse, SearchResponse};
