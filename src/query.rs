//! Free-text product discovery
//!
//! Matching is case-insensitive substring containment (no tokenizing, no
//! fuzzy matching). Case folding uses the `casefold` SQL function registered
//! by [`init_schema`](crate::database::init_schema), so non-ASCII names fold
//! the same way Rust's `str::to_lowercase` does. Results come back in
//! internal id order.
//!
//! An empty pattern matches every product. Rejecting blank queries is the
//! job of the caller-facing layer, not of this module.

use rusqlite::{params, Connection};

use crate::database::{self, product_with_store_from_row, to_sql_bound, PRODUCT_WITH_STORE_SELECT};
use crate::error::Result;
use crate::models::ProductWithStore;

/// Products whose name OR category contains `query`, case-insensitively
pub fn search_products(
    conn: &Connection,
    query: &str,
    offset: usize,
    limit: usize,
) -> Result<Vec<ProductWithStore>> {
    if query.is_empty() {
        return database::list_products_with_store(conn, offset, limit);
    }

    let needle = query.to_lowercase();
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE instr(casefold(p.name), ?1) > 0 OR instr(casefold(p.category), ?1) > 0
         ORDER BY p.id
         LIMIT ?2 OFFSET ?3",
        PRODUCT_WITH_STORE_SELECT
    ))?;
    let results = stmt
        .query_map(
            params![needle, to_sql_bound(limit), to_sql_bound(offset)],
            product_with_store_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    log::debug!("Search '{}' matched {} product(s)", query, results.len());
    Ok(results)
}

/// Every product, across all stores, whose name contains `product_name`
///
/// Unbounded: this is the input to price comparison. An empty result is not
/// an error here.
pub fn find_product_across_stores(
    conn: &Connection,
    product_name: &str,
) -> Result<Vec<ProductWithStore>> {
    if product_name.is_empty() {
        return database::list_products_with_store(conn, 0, usize::MAX);
    }

    let needle = product_name.to_lowercase();
    let mut stmt = conn.prepare_cached(&format!(
        "{} WHERE instr(casefold(p.name), ?1) > 0 ORDER BY p.id",
        PRODUCT_WITH_STORE_SELECT
    ))?;
    let matches = stmt
        .query_map(params![needle], product_with_store_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    log::debug!(
        "'{}' is sold as {} product(s) across stores",
        product_name,
        matches.len()
    );
    Ok(matches)
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
