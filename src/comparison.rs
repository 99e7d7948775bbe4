//! Price comparison across offerings of the same product
//!
//! Ties on price are broken by the lowest internal id, for both the cheapest
//! and the most expensive offering, so the result never depends on the order
//! the offerings were passed in.

use std::cmp::Ordering;

use crate::error::{CatalogError, Result};
use crate::models::{Product, ProductWithStore};

/// Anything with an identity and a price can be compared
pub trait Priced {
    fn id(&self) -> i64;
    fn price(&self) -> f64;
}

impl Priced for Product {
    fn id(&self) -> i64 {
        self.id
    }

    fn price(&self) -> f64 {
        self.price
    }
}

impl Priced for ProductWithStore {
    fn id(&self) -> i64 {
        self.product.id
    }

    fn price(&self) -> f64 {
        self.product.price
    }
}

/// Cheapest and most expensive offering plus the spread between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceComparison<'a, T> {
    pub cheapest: &'a T,
    pub most_expensive: &'a T,
    /// `most_expensive.price - cheapest.price`, never negative
    pub price_difference: f64,
}

/// Compare prices of a non-empty set of offerings
///
/// Returns `EmptyInput` when `offerings` is empty.
pub fn compare_prices<T: Priced>(offerings: &[T]) -> Result<PriceComparison<'_, T>> {
    let cheapest = offerings
        .iter()
        .min_by(|a, b| by_price_then_id(*a, *b))
        .ok_or(CatalogError::EmptyInput)?;
    let most_expensive = offerings
        .iter()
        .min_by(|a, b| b.price().total_cmp(&a.price()).then(a.id().cmp(&b.id())))
        .ok_or(CatalogError::EmptyInput)?;

    Ok(PriceComparison {
        cheapest,
        most_expensive,
        price_difference: most_expensive.price() - cheapest.price(),
    })
}

fn by_price_then_id<T: Priced>(a: &T, b: &T) -> Ordering {
    a.price()
        .total_cmp(&b.price())
        .then(a.id().cmp(&b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Offer {
        id: i64,
        price: f64,
    }

    impl Priced for Offer {
        fn id(&self) -> i64 {
            self.id
        }

        fn price(&self) -> f64 {
            self.price
        }
    }

    fn offers(prices: &[(i64, f64)]) -> Vec<Offer> {
        prices
            .iter()
            .map(|&(id, price)| Offer { id, price })
            .collect()
    }

    #[test]
    fn empty_input_is_rejected() {
        let empty: Vec<Offer> = Vec::new();
        assert!(matches!(
            compare_prices(&empty),
            Err(CatalogError::EmptyInput)
        ));
    }

    #[test]
    fn single_offer_has_zero_difference() {
        let list = offers(&[(1, 2.5)]);
        let result = compare_prices(&list).unwrap();
        assert_eq!(result.cheapest.id, 1);
        assert_eq!(result.most_expensive.id, 1);
        assert_eq!(result.price_difference, 0.0);
    }

    #[test]
    fn two_stores_milk_scenario() {
        let list = offers(&[(1, 2.50), (2, 3.00)]);
        let result = compare_prices(&list).unwrap();
        assert_eq!(result.cheapest.id, 1);
        assert_eq!(result.most_expensive.id, 2);
        assert!((result.price_difference - 0.50).abs() < 1e-9);
    }

    #[test]
    fn min_max_and_spread_match_prices() {
        let list = offers(&[(4, 3.1), (2, 0.99), (9, 7.25), (3, 4.0), (5, 0.99)]);
        let result = compare_prices(&list).unwrap();

        let min = list.iter().map(|o| o.price).fold(f64::INFINITY, f64::min);
        let max = list.iter().map(|o| o.price).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.cheapest.price, min);
        assert_eq!(result.most_expensive.price, max);
        assert!((result.price_difference - (max - min)).abs() < 1e-9);
    }

    #[test]
    fn ties_break_on_lowest_id_regardless_of_order() {
        let forward = offers(&[(3, 1.0), (1, 1.0), (2, 5.0), (7, 5.0)]);
        let backward = offers(&[(7, 5.0), (2, 5.0), (1, 1.0), (3, 1.0)]);

        for list in [&forward, &backward] {
            let result = compare_prices(list).unwrap();
            assert_eq!(result.cheapest.id, 1);
            assert_eq!(result.most_expensive.id, 2);
        }
    }

    #[test]
    fn equal_prices_give_zero_difference() {
        let list = offers(&[(5, 2.0), (3, 2.0), (8, 2.0)]);
        let result = compare_prices(&list).unwrap();
        assert_eq!(result.price_difference, 0.0);
        assert_eq!(result.cheapest.id, 3);
        assert_eq!(result.most_expensive.id, 3);
    }
}
