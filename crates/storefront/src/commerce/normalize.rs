//! Cart normalization: raw API payloads into canonical snapshots.
//!
//! Every cart returned by a [`CommerceClient`](super::CommerceClient)
//! operation passes through [`normalize`], so callers always see a cart with
//! a present (possibly empty) line vector and a resolved client key per line.

use super::types::{Cart, CartLine, RawCart, RawCartLine};

/// Resolve the stable client-side identity for a cart line.
///
/// Prefers the book SKU, then the variation SKU, then a key derived from the
/// server line id. Total: every server line carries an id, so this never
/// fails. The key is used only for local list-rendering identity and is
/// never sent back to the server.
#[must_use]
pub fn client_key(line: &RawCartLine) -> String {
    line.sku
        .clone()
        .or_else(|| line.variant_sku.clone())
        .unwrap_or_else(|| format!("server_{}", line.id))
}

/// Normalize a raw cart payload into the canonical [`Cart`] shape.
///
/// Guarantees `lines` is always a vector even when the raw `items` field is
/// missing or null. Idempotent: keys are deterministic, so normalizing the
/// same payload twice yields the same cart.
#[must_use]
pub fn normalize(raw: RawCart) -> Cart {
    let lines = raw
        .items
        .unwrap_or_default()
        .into_iter()
        .map(|item| {
            let client_key = client_key(&item);
            CartLine {
                id: item.id,
                book_id: item.book_id,
                variation_id: item.variation_id,
                title: item.title,
                quantity: item.quantity,
                unit_price: item.unit_price,
                client_key,
            }
        })
        .collect();

    Cart {
        id: raw.id,
        lines,
        updated_at: raw.updated_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkberry_core::{BookId, CartId, CartLineId};
    use rust_decimal::dec;

    fn raw_line(id: i64) -> RawCartLine {
        RawCartLine {
            id: CartLineId::new(id),
            book_id: BookId::new(100 + id),
            variation_id: None,
            sku: None,
            variant_sku: None,
            title: None,
            quantity: 1,
            unit_price: dec!(1000),
        }
    }

    #[test]
    fn test_client_key_prefers_sku() {
        let line = RawCartLine {
            sku: Some("BK-001".to_string()),
            variant_sku: Some("BK-001-HC".to_string()),
            ..raw_line(1)
        };
        assert_eq!(client_key(&line), "BK-001");
    }

    #[test]
    fn test_client_key_falls_back_to_variant_sku() {
        let line = RawCartLine {
            variant_sku: Some("BK-001-HC".to_string()),
            ..raw_line(1)
        };
        assert_eq!(client_key(&line), "BK-001-HC");
    }

    #[test]
    fn test_client_key_falls_back_to_server_id() {
        assert_eq!(client_key(&raw_line(42)), "server_42");
    }

    #[test]
    fn test_client_key_is_deterministic() {
        let line = RawCartLine {
            sku: Some("BK-777".to_string()),
            ..raw_line(7)
        };
        assert_eq!(client_key(&line), client_key(&line));
    }

    #[test]
    fn test_normalize_missing_items_yields_empty_lines() {
        let raw: RawCart = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        let cart = normalize(raw);
        assert_eq!(cart.id, Some(CartId::new(3)));
        assert!(cart.lines.is_empty());
    }

    #[test]
    fn test_normalize_null_items_yields_empty_lines() {
        let raw: RawCart = serde_json::from_str(r#"{"id": 3, "items": null}"#).unwrap();
        assert!(normalize(raw).lines.is_empty());
    }

    #[test]
    fn test_normalize_resolves_keys_per_line() {
        let raw = RawCart {
            id: None,
            items: Some(vec![
                RawCartLine {
                    sku: Some("BK-100".to_string()),
                    ..raw_line(1)
                },
                raw_line(2),
            ]),
            updated_at: None,
        };
        let cart = normalize(raw);
        let keys: Vec<_> = cart.lines.iter().map(|l| l.client_key.as_str()).collect();
        assert_eq!(keys, vec!["BK-100", "server_2"]);
    }
}
