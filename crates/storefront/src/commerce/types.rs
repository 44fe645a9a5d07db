//! Domain types for the Inkberry Commerce API.
//!
//! Raw payload types mirror what the API sends over the wire; domain types
//! are the normalized shapes the rest of the storefront works with. The API
//! historically returns carts either bare or wrapped in a `{"cart": ...}`
//! envelope, so deserialization accepts both.

use chrono::{DateTime, Utc};
use inkberry_core::{BookId, CartId, CartLineId, CouponId, VariationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Raw Cart Payloads
// =============================================================================

/// A cart line exactly as the Commerce API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCartLine {
    /// Server-assigned line identity.
    pub id: CartLineId,
    /// Book this line refers to.
    pub book_id: BookId,
    /// Specific variation (edition, format), if any.
    #[serde(default)]
    pub variation_id: Option<VariationId>,
    /// SKU of the book.
    #[serde(default)]
    pub sku: Option<String>,
    /// SKU of the selected variation.
    #[serde(default)]
    pub variant_sku: Option<String>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Quantity (positive; the server validates).
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Decimal,
}

/// A cart exactly as the Commerce API returns it.
///
/// `items` may be missing or null on some responses; normalization turns
/// that into an empty vector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default)]
    pub items: Option<Vec<RawCartLine>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Defensive unwrap for cart responses.
///
/// The API returns either `{"cart": {...}}` or a bare cart object depending
/// on the endpoint; `Wrapped` must be tried first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CartEnvelope {
    Wrapped { cart: RawCart },
    Bare(RawCart),
}

impl CartEnvelope {
    /// Extract the raw cart regardless of envelope shape.
    #[must_use]
    pub fn into_raw(self) -> RawCart {
        match self {
            Self::Wrapped { cart } | Self::Bare(cart) => cart,
        }
    }
}

// =============================================================================
// Normalized Cart Types
// =============================================================================

/// A line item in the cart, with its resolved client key.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    /// Server-assigned line identity.
    pub id: CartLineId,
    /// Book this line refers to.
    pub book_id: BookId,
    /// Specific variation, if any.
    pub variation_id: Option<VariationId>,
    /// Display title.
    pub title: Option<String>,
    /// Quantity.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Stable local identity for list rendering; never sent to the server.
    pub client_key: String,
}

impl CartLine {
    /// Line subtotal (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A normalized shopping cart snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Cart {
    /// Server-assigned cart identity, when the API includes it.
    pub id: Option<CartId>,
    /// Cart lines (always present, possibly empty).
    pub lines: Vec<CartLine>,
    /// Server-side last-update timestamp, when included.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Sum of all line totals. Order-independent.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find a line by its server identity.
    #[must_use]
    pub fn line(&self, id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }
}

// =============================================================================
// Mutation Request Payloads
// =============================================================================

/// Body for `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
pub struct AddItemRequest {
    pub book_id: BookId,
    pub quantity: u32,
    pub variation_id: Option<VariationId>,
}

/// Body for `PUT /cart/items/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Body for the bulk delete endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<CartLineId>,
}

/// A cart line accumulated by an anonymous session before login.
///
/// Guest lines key off either `book_id` or a generic `id` depending on where
/// the frontend produced them; `quantity` and `variation_id` may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestLine {
    #[serde(default)]
    pub book_id: Option<BookId>,
    #[serde(default)]
    pub id: Option<BookId>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub variation_id: Option<VariationId>,
}

/// One item in the `POST /cart/merge` batch.
///
/// `variation_id` serializes as an explicit `null` when absent; the merge
/// endpoint expects the field to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeItem {
    pub book_id: BookId,
    pub quantity: u32,
    pub variation_id: Option<VariationId>,
}

/// Body for `POST /cart/merge`.
#[derive(Debug, Clone, Serialize)]
pub struct MergeCartRequest {
    pub items: Vec<MergeItem>,
}

// =============================================================================
// Coupon Types
// =============================================================================

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    /// `value` is a percentage of the order amount.
    Percentage,
    /// `value` is a fixed amount off.
    Fixed,
}

/// A coupon as returned by the Commerce API. Immutable once fetched; the
/// storefront only reads it to gate eligibility and to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(default)]
    pub id: Option<CouponId>,
    /// The code customers enter.
    pub code: String,
    /// Discount interpretation of `value`.
    #[serde(rename = "type")]
    pub kind: CouponKind,
    /// Percentage (0-100) or fixed amount, per `kind`.
    pub value: Decimal,
    /// Minimum order amount for eligibility, when the coupon has one.
    #[serde(default)]
    pub minimum_amount: Option<Decimal>,
    /// Cap on the discount for percentage coupons.
    #[serde(default)]
    pub maximum_discount: Option<Decimal>,
    /// Marketing description for display.
    #[serde(default)]
    pub description: Option<String>,
}

impl Coupon {
    /// Display-only discount estimate.
    ///
    /// The authoritative `discount_amount` always comes from the server's
    /// validation response; this is used solely to preview a discount next
    /// to a listed coupon before it is applied.
    #[must_use]
    pub fn estimate_discount(&self, order_amount: Decimal) -> Decimal {
        let raw = match self.kind {
            CouponKind::Percentage => order_amount * self.value / Decimal::ONE_HUNDRED,
            CouponKind::Fixed => self.value,
        };
        let capped = self
            .maximum_discount
            .map_or(raw, |maximum| raw.min(maximum));
        capped.min(order_amount)
    }
}

/// Defensive unwrap for the coupon list response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CouponsEnvelope {
    Wrapped { coupons: Vec<Coupon> },
    Bare(Vec<Coupon>),
}

impl CouponsEnvelope {
    /// Extract the coupon list regardless of envelope shape.
    #[must_use]
    pub fn into_coupons(self) -> Vec<Coupon> {
        match self {
            Self::Wrapped { coupons } | Self::Bare(coupons) => coupons,
        }
    }
}

/// Body for `POST /coupons/validate`.
///
/// The validation endpoint predates the snake_case convention and expects
/// `orderAmount`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    #[serde(rename = "orderAmount")]
    pub order_amount: Decimal,
}

/// Successful validation payload: the server's authoritative amounts.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponValidation {
    pub coupon: Coupon,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Response shape of `POST /coupons/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateCouponResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<CouponValidation>,
}

// =============================================================================
// Structured Rejections
// =============================================================================

/// Machine-readable rejection codes for business-rule failures.
///
/// Localized messages are produced from these, never from substring matching
/// on server message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    /// Order amount is below the coupon's minimum.
    MinAmount,
    /// The code does not exist.
    InvalidCode,
    /// The coupon is past its validity window.
    Expired,
    /// The coupon's redemption limit has been reached.
    UsageLimit,
    /// Unrecognized code from a newer API revision.
    #[serde(other)]
    Other,
}

/// A business-rule rejection from the Commerce API.
///
/// These are expected outcomes of user actions, not faults; they are
/// surfaced as user-facing text and never logged as errors.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponRejection {
    pub code: RejectionCode,
    /// Minimum order amount, present when `code` is `MIN_AMOUNT`.
    #[serde(default)]
    pub minimum: Option<Decimal>,
    /// Server-supplied message, used as fallback display text.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_cart_envelope_wrapped() {
        let json = r#"{"cart": {"id": 5, "items": []}}"#;
        let envelope: CartEnvelope = serde_json::from_str(json).unwrap();
        let raw = envelope.into_raw();
        assert_eq!(raw.id, Some(CartId::new(5)));
        assert_eq!(raw.items.unwrap().len(), 0);
    }

    #[test]
    fn test_cart_envelope_bare() {
        let json = r#"{"id": 7, "items": [{"id": 1, "book_id": 2, "quantity": 3, "unit_price": "100"}]}"#;
        let envelope: CartEnvelope = serde_json::from_str(json).unwrap();
        let raw = envelope.into_raw();
        assert_eq!(raw.id, Some(CartId::new(7)));
        assert_eq!(raw.items.unwrap().len(), 1);
    }

    #[test]
    fn test_cart_envelope_null_items() {
        let json = r#"{"cart": {"id": 5, "items": null}}"#;
        let envelope: CartEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.into_raw().items.is_none());
    }

    #[test]
    fn test_cart_subtotal_is_order_independent() {
        let line = |id: i64, price: Decimal| CartLine {
            id: CartLineId::new(id),
            book_id: BookId::new(id),
            variation_id: None,
            title: None,
            quantity: 2,
            unit_price: price,
            client_key: format!("server_{id}"),
        };
        let forward = Cart {
            id: None,
            lines: vec![line(1, dec!(100)), line(2, dec!(50))],
            updated_at: None,
        };
        let reversed = Cart {
            id: None,
            lines: vec![line(2, dec!(50)), line(1, dec!(100))],
            updated_at: None,
        };
        assert_eq!(forward.subtotal(), dec!(300));
        assert_eq!(forward.subtotal(), reversed.subtotal());
    }

    #[test]
    fn test_estimate_discount_percentage_with_cap() {
        let coupon = Coupon {
            id: None,
            code: "SUMMER10".to_string(),
            kind: CouponKind::Percentage,
            value: dec!(10),
            minimum_amount: None,
            maximum_discount: Some(dec!(20000)),
            description: None,
        };
        assert_eq!(coupon.estimate_discount(dec!(100000)), dec!(10000));
        assert_eq!(coupon.estimate_discount(dec!(500000)), dec!(20000));
    }

    #[test]
    fn test_estimate_discount_fixed_never_exceeds_order() {
        let coupon = Coupon {
            id: None,
            code: "FLAT50K".to_string(),
            kind: CouponKind::Fixed,
            value: dec!(50000),
            minimum_amount: None,
            maximum_discount: None,
            description: None,
        };
        assert_eq!(coupon.estimate_discount(dec!(30000)), dec!(30000));
        assert_eq!(coupon.estimate_discount(dec!(80000)), dec!(50000));
    }

    #[test]
    fn test_rejection_code_unknown_falls_back_to_other() {
        let rejection: CouponRejection =
            serde_json::from_str(r#"{"code": "SOMETHING_NEW", "message": "nope"}"#).unwrap();
        assert_eq!(rejection.code, RejectionCode::Other);
        assert_eq!(rejection.message, "nope");
    }

    #[test]
    fn test_merge_item_serializes_null_variation() {
        let item = MergeItem {
            book_id: BookId::new(9),
            quantity: 1,
            variation_id: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["variation_id"], serde_json::Value::Null);
    }

    #[test]
    fn test_validate_request_uses_camel_case_amount() {
        let request = ValidateCouponRequest {
            code: "WELCOME".to_string(),
            order_amount: dec!(150000),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("orderAmount").is_some());
        assert!(json.get("order_amount").is_none());
    }
}
