//! Coupon route handlers.
//!
//! Two apply paths mirror the two entry widgets: `apply_listed` for coupons
//! chosen from the published list (local minimum pre-check, no round trip
//! for obviously ineligible orders) and `apply` for free-text codes (always
//! validated remotely).

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::commerce::types::{Coupon, CouponKind};
use crate::error::{AppError, Result};
use crate::state::AppState;

use super::cart::{CartView, build_view};

// =============================================================================
// View Types
// =============================================================================

/// A listed coupon with its eligibility against the current checkout total.
#[derive(Debug, Clone, Serialize)]
pub struct CouponListItemView {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub value: Decimal,
    pub minimum_amount: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub description: Option<String>,
    /// Whether the current checkout total meets the minimum.
    pub eligible: bool,
    /// Display-only estimate; the server's validation amount is
    /// authoritative once applied.
    pub estimated_discount: Decimal,
}

impl CouponListItemView {
    fn from_coupon(coupon: Coupon, order_amount: Decimal) -> Self {
        let eligible = coupon
            .minimum_amount
            .is_none_or(|minimum| order_amount >= minimum);
        let estimated_discount = coupon.estimate_discount(order_amount);
        Self {
            code: coupon.code,
            kind: coupon.kind,
            value: coupon.value,
            minimum_amount: coupon.minimum_amount,
            maximum_discount: coupon.maximum_discount,
            description: coupon.description,
            eligible,
            estimated_discount,
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Coupon code request body.
#[derive(Debug, Deserialize)]
pub struct CouponCodeForm {
    pub code: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// List the published coupons with eligibility for the current total.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CouponListItemView>>> {
    let order_amount = state.cart().selected_total();
    let coupons = state.commerce().list_coupons().await?;
    Ok(Json(
        coupons
            .into_iter()
            .map(|coupon| CouponListItemView::from_coupon(coupon, order_amount))
            .collect(),
    ))
}

/// Apply a free-text coupon code.
///
/// Always validated remotely; rejection is carried in the view, not as an
/// error status.
#[instrument(skip(state), fields(code = %form.code))]
pub async fn apply(
    State(state): State<AppState>,
    Json(form): Json<CouponCodeForm>,
) -> Result<Json<CartView>> {
    let code = form.code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("coupon code is required".to_string()));
    }

    let order_amount = state.cart().selected_total();
    state.coupons().apply_code(code, order_amount).await?;
    Ok(Json(build_view(&state)))
}

/// Apply a coupon chosen from the published list.
///
/// The minimum is known up front, so ineligible orders are rejected locally
/// without a validation round trip.
#[instrument(skip(state), fields(code = %form.code))]
pub async fn apply_listed(
    State(state): State<AppState>,
    Json(form): Json<CouponCodeForm>,
) -> Result<Json<CartView>> {
    let Some(coupon) = state.commerce().find_listed_coupon(&form.code).await? else {
        return Err(AppError::NotFound(format!("coupon {}", form.code)));
    };

    let order_amount = state.cart().selected_total();
    state.coupons().apply_listed(&coupon, order_amount).await?;
    Ok(Json(build_view(&state)))
}

/// Remove the applied coupon.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>) -> Json<CartView> {
    state.coupons().remove();
    Json(build_view(&state))
}
