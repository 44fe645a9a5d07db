//! User-facing coupon messages.
//!
//! Every message is produced from structured rejection data; server message
//! text is only ever used verbatim as a last-resort fallback, never parsed.

use inkberry_core::{CurrencyCode, Money};
use rust_decimal::Decimal;

use crate::commerce::types::{CouponRejection, RejectionCode};

/// Message for an order below a coupon's minimum amount.
///
/// Embeds both the required minimum and the current order amount so the
/// shopper can see how far they are from eligibility.
#[must_use]
pub fn minimum_not_met(minimum: Decimal, order_amount: Decimal, currency: CurrencyCode) -> String {
    format!(
        "This coupon requires a minimum order of {}; your current order total is {}.",
        Money::new(minimum, currency),
        Money::new(order_amount, currency),
    )
}

/// Localize a structured rejection.
#[must_use]
pub fn rejection(
    rejection: &CouponRejection,
    order_amount: Decimal,
    currency: CurrencyCode,
) -> String {
    match rejection.code {
        RejectionCode::MinAmount => rejection.minimum.map_or_else(
            || fallback(rejection),
            |minimum| minimum_not_met(minimum, order_amount, currency),
        ),
        RejectionCode::InvalidCode => "That coupon code is not valid.".to_string(),
        RejectionCode::Expired => "That coupon has expired.".to_string(),
        RejectionCode::UsageLimit => {
            "That coupon has reached its redemption limit.".to_string()
        }
        RejectionCode::Other => fallback(rejection),
    }
}

/// Message shown when an applied coupon no longer passes validation after
/// the order amount changed.
#[must_use]
pub fn dropped_after_amount_change(code: &str) -> String {
    format!("The coupon {code} no longer applies to your order and was removed.")
}

fn fallback(rejection: &CouponRejection) -> String {
    if rejection.message.is_empty() {
        "That coupon cannot be applied to this order.".to_string()
    } else {
        rejection.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_minimum_message_embeds_both_amounts() {
        let message = minimum_not_met(dec!(9999), dec!(5000), CurrencyCode::VND);
        assert!(message.contains("9999"));
        assert!(message.contains("5000"));
    }

    #[test]
    fn test_min_amount_rejection_uses_structured_minimum() {
        let rejection_payload = CouponRejection {
            code: RejectionCode::MinAmount,
            minimum: Some(dec!(200000)),
            message: "order amount too low".to_string(),
        };
        let message = rejection(&rejection_payload, dec!(150000), CurrencyCode::VND);
        assert!(message.contains("200000"));
        assert!(message.contains("150000"));
    }

    #[test]
    fn test_min_amount_without_minimum_falls_back_to_server_text() {
        let rejection_payload = CouponRejection {
            code: RejectionCode::MinAmount,
            minimum: None,
            message: "order amount too low".to_string(),
        };
        assert_eq!(
            rejection(&rejection_payload, dec!(1000), CurrencyCode::VND),
            "order amount too low"
        );
    }

    #[test]
    fn test_unknown_code_with_empty_message_has_generic_text() {
        let rejection_payload = CouponRejection {
            code: RejectionCode::Other,
            minimum: None,
            message: String::new(),
        };
        let message = rejection(&rejection_payload, dec!(1000), CurrencyCode::VND);
        assert!(!message.is_empty());
    }
}
