//! Cart lifecycle over the data path: server payloads in, totals out.
//!
//! Walks the snapshot sequence a shopper produces - add, change quantity,
//! remove - through normalization and selection, asserting the derived
//! totals at every step.

use inkberry_core::CartLineId;
use inkberry_storefront::cart::Selection;
use inkberry_storefront::commerce::normalize::normalize;
use inkberry_storefront::commerce::types::{Cart, CartEnvelope};
use rust_decimal::{Decimal, dec};

fn snapshot(json: &str) -> Cart {
    let envelope: CartEnvelope =
        serde_json::from_str(json).expect("server payload should deserialize");
    normalize(envelope.into_raw())
}

#[test]
fn add_update_remove_lifecycle() {
    // Add 2 units of book A at price 100
    let cart = snapshot(
        r#"{"cart": {"id": 1, "items": [
            {"id": 11, "book_id": 7, "sku": "BK-A", "quantity": 2, "unit_price": "100"}
        ]}}"#,
    );
    assert_eq!(cart.subtotal(), dec!(200));
    assert_eq!(cart.total_quantity(), 2);

    let mut selection = Selection::default();
    selection.reconcile(cart.lines.iter().map(|line| line.id));
    assert_eq!(selection.selected_total(&cart), dec!(200));

    // Update quantity to 5 (bare-cart envelope this time)
    let cart = snapshot(
        r#"{"id": 1, "items": [
            {"id": 11, "book_id": 7, "sku": "BK-A", "quantity": 5, "unit_price": "100"}
        ]}"#,
    );
    selection.reconcile(cart.lines.iter().map(|line| line.id));
    assert_eq!(cart.subtotal(), dec!(500));
    assert_eq!(selection.selected_total(&cart), dec!(500));

    // Remove the line
    let cart = snapshot(r#"{"cart": {"id": 1, "items": []}}"#);
    selection.reconcile(cart.lines.iter().map(|line| line.id));
    assert!(cart.is_empty());
    assert_eq!(cart.subtotal(), Decimal::ZERO);
    assert_eq!(selection.selected_total(&cart), Decimal::ZERO);
    assert!(!selection.is_selected(CartLineId::new(11)));
}

#[test]
fn client_keys_stay_stable_across_snapshots() {
    let first = snapshot(
        r#"{"cart": {"items": [
            {"id": 11, "book_id": 7, "sku": "BK-A", "quantity": 2, "unit_price": "100"},
            {"id": 12, "book_id": 8, "quantity": 1, "unit_price": "50"}
        ]}}"#,
    );
    let second = snapshot(
        r#"{"cart": {"items": [
            {"id": 11, "book_id": 7, "sku": "BK-A", "quantity": 9, "unit_price": "100"},
            {"id": 12, "book_id": 8, "quantity": 1, "unit_price": "50"}
        ]}}"#,
    );

    let keys = |cart: &Cart| {
        cart.lines
            .iter()
            .map(|line| line.client_key.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(keys(&first), vec!["BK-A".to_string(), "server_12".to_string()]);
}
