//! Tests for catalog payload validation and partial updates

use super::*;

fn sample_store() -> Store {
    Store {
        id: 1,
        store_id: "S1".to_string(),
        store_name: "Market".to_string(),
        location: Some("Main Street".to_string()),
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn sample_product() -> Product {
    Product {
        id: 7,
        product_id: "P1".to_string(),
        name: "Milk".to_string(),
        price: 2.5,
        category: "Dairy".to_string(),
        unit: "l".to_string(),
        store_id: 1,
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[test]
fn new_store_accepts_valid_payload() {
    let store = NewStore::new("S1", "Market").with_location("Main Street");
    assert!(store.validate().is_ok());
}

#[test]
fn new_store_rejects_blank_name() {
    let err = NewStore::new("S1", "   ").validate().unwrap_err();
    assert!(matches!(
        err,
        CatalogError::InvalidValue {
            field: "store_name",
            ..
        }
    ));
}

#[test]
fn new_store_rejects_long_store_id() {
    let err = NewStore::new("S".repeat(51), "Market")
        .validate()
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::InvalidValue {
            field: "store_id",
            ..
        }
    ));
}

#[test]
fn new_product_rejects_zero_and_negative_price() {
    for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = NewProduct::new("P1", "Milk", price, "Dairy", "l")
            .validate()
            .unwrap_err();
        assert!(
            matches!(err, CatalogError::InvalidValue { field: "price", .. }),
            "price {} should be rejected",
            price
        );
    }
}

#[test]
fn new_product_name_length_bound() {
    let ok = NewProduct::new("P1", "x".repeat(200), 1.0, "Dairy", "l");
    assert!(ok.validate().is_ok());

    let too_long = NewProduct::new("P1", "x".repeat(201), 1.0, "Dairy", "l");
    assert!(too_long.validate().unwrap_err().is_invalid());
}

#[test]
fn product_update_applies_only_present_fields() {
    let mut product = sample_product();
    ProductUpdate::price(4.5).apply(&mut product);

    assert_eq!(product.price, 4.5);
    assert_eq!(product.name, "Milk");
    assert_eq!(product.category, "Dairy");
    assert_eq!(product.unit, "l");
}

#[test]
fn product_update_rejects_non_positive_price() {
    assert!(ProductUpdate::price(0.0).validate().unwrap_err().is_invalid());
    assert!(ProductUpdate::price(-3.0).validate().unwrap_err().is_invalid());
}

#[test]
fn product_update_empty_detection() {
    assert!(ProductUpdate::default().is_empty());
    assert!(!ProductUpdate::price(1.0).is_empty());
}

#[test]
fn store_update_absent_location_is_left_alone() {
    let update: StoreUpdate = serde_json::from_str(r#"{"store_name": "Corner Shop"}"#).unwrap();
    assert_eq!(update.location, None);

    let mut store = sample_store();
    update.apply(&mut store);
    assert_eq!(store.store_name, "Corner Shop");
    assert_eq!(store.location.as_deref(), Some("Main Street"));
}

#[test]
fn store_update_null_location_clears_it() {
    let update: StoreUpdate = serde_json::from_str(r#"{"location": null}"#).unwrap();
    assert_eq!(update.location, Some(None));
    assert!(!update.is_empty());

    let mut store = sample_store();
    update.apply(&mut store);
    assert_eq!(store.location, None);
    assert_eq!(store.store_name, "Market");
}

#[test]
fn store_update_empty_object_is_empty() {
    let update: StoreUpdate = serde_json::from_str("{}").unwrap();
    assert!(update.is_empty());
}

#[test]
fn product_with_store_serializes_flat() {
    let store = sample_store();
    let view = ProductWithStore {
        product: sample_product(),
        store: StoreRef::from(&store),
    };

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["name"], "Milk");
    assert_eq!(json["store"]["store_name"], "Market");
    assert!(json.get("product").is_none());
}
