//! Cart route handlers.
//!
//! Each handler is one UI event: it delegates to the cart store, lets the
//! coupon gate react to the new checkout total, and responds with the full
//! cart view so the frontend re-renders from one consistent payload.

use std::collections::HashSet;

use axum::{Json, extract::Path, extract::State};
use inkberry_core::{BookId, CartLineId, CurrencyCode, Money, VariationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::commerce::types::{Cart, GuestLine};
use crate::coupon::CouponState;
use crate::error::{AppError, Result};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: CartLineId,
    /// Stable local identity for list rendering.
    pub client_key: String,
    pub book_id: BookId,
    pub variation_id: Option<VariationId>,
    pub title: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// Whether this line participates in the checkout total.
    pub selected: bool,
}

/// Applied-coupon display data.
#[derive(Debug, Clone, Serialize)]
pub struct CouponView {
    /// One of `none`, `validating`, `applied`, `rejected`.
    pub status: &'static str,
    pub code: Option<String>,
    pub discount_amount: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub message: Option<String>,
}

/// Cart display data: the one payload every cart mutation responds with.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: Decimal,
    /// Total over the selected lines; the checkout order amount.
    pub selected_subtotal: Decimal,
    /// Amount payable after the applied discount, if any.
    pub payable_total: Decimal,
    pub currency: CurrencyCode,
    /// Formatted payable total for display.
    pub payable_display: String,
    pub coupon: CouponView,
}

impl From<&CouponState> for CouponView {
    fn from(state: &CouponState) -> Self {
        match state {
            CouponState::Idle => Self {
                status: "none",
                code: None,
                discount_amount: None,
                final_amount: None,
                message: None,
            },
            CouponState::Validating => Self {
                status: "validating",
                code: None,
                discount_amount: None,
                final_amount: None,
                message: None,
            },
            CouponState::Applied(applied) => Self {
                status: "applied",
                code: Some(applied.code.clone()),
                discount_amount: Some(applied.discount_amount),
                final_amount: Some(applied.final_amount),
                message: None,
            },
            CouponState::Rejected(message) => Self {
                status: "rejected",
                code: None,
                discount_amount: None,
                final_amount: None,
                message: Some(message.clone()),
            },
        }
    }
}

/// Build the cart view from one consistent read of cart, selection, and
/// coupon state.
pub(crate) fn build_view(state: &AppState) -> CartView {
    let (cart, selected_ids) = state.cart().view();
    let coupon_state = state.coupons().state();
    assemble_view(&cart, &selected_ids, &coupon_state, state.currency())
}

fn assemble_view(
    cart: &Cart,
    selected_ids: &[CartLineId],
    coupon_state: &CouponState,
    currency: CurrencyCode,
) -> CartView {
    let selected: HashSet<CartLineId> = selected_ids.iter().copied().collect();

    let items: Vec<CartItemView> = cart
        .lines
        .iter()
        .map(|line| CartItemView {
            id: line.id,
            client_key: line.client_key.clone(),
            book_id: line.book_id,
            variation_id: line.variation_id,
            title: line.title.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
            selected: selected.contains(&line.id),
        })
        .collect();

    let selected_subtotal: Decimal = items
        .iter()
        .filter(|item| item.selected)
        .map(|item| item.line_total)
        .sum();

    let payable_total = coupon_state
        .applied()
        .map_or(selected_subtotal, |applied| applied.final_amount);

    CartView {
        item_count: cart.total_quantity(),
        subtotal: cart.subtotal(),
        selected_subtotal,
        payable_total,
        currency,
        payable_display: Money::new(payable_total, currency).to_string(),
        coupon: CouponView::from(coupon_state),
        items,
    }
}

/// Let the coupon gate react to the checkout total after a cart change.
///
/// Re-validation failures drop the coupon inside the gate; the cart
/// mutation itself already succeeded, so this never fails the request.
async fn reconcile_coupon(state: &AppState) {
    let total = state.cart().selected_total();
    if let Err(err) = state.coupons().order_amount_changed(total).await {
        tracing::warn!(error = %err, "coupon re-validation failed after cart change");
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub book_id: BookId,
    pub quantity: Option<u32>,
    pub variation_id: Option<VariationId>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemForm {
    pub quantity: u32,
}

/// Merge request body: the anonymous session's accumulated lines.
#[derive(Debug, Deserialize)]
pub struct MergeForm {
    pub items: Vec<GuestLine>,
}

/// Per-line selection request body.
#[derive(Debug, Deserialize)]
pub struct SelectForm {
    pub line_id: CartLineId,
    pub selected: bool,
}

/// Select-all request body.
#[derive(Debug, Deserialize)]
pub struct SelectAllForm {
    pub selected: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Fetch the cart and render it.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<CartView>> {
    state.cart().refresh().await?;
    Ok(Json(build_view(&state)))
}

/// Add a book to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(form): Json<AddItemForm>,
) -> Result<Json<CartView>> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be positive".to_string()));
    }

    state
        .cart()
        .add_item(form.book_id, quantity, form.variation_id)
        .await?;
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Set one line's absolute quantity. Zero removes the line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(line_id): Path<CartLineId>,
    Json(form): Json<UpdateItemForm>,
) -> Result<Json<CartView>> {
    state.cart().set_quantity(line_id, form.quantity).await?;
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Remove one line.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(line_id): Path<CartLineId>,
) -> Result<Json<CartView>> {
    state.cart().remove_item(line_id).await?;
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Remove every selected line.
#[instrument(skip(state))]
pub async fn remove_selected(State(state): State<AppState>) -> Result<Json<CartView>> {
    state.cart().remove_selected().await?;
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Merge guest lines into the server-side cart at login reconciliation.
#[instrument(skip(state, form), fields(count = form.items.len()))]
pub async fn merge(
    State(state): State<AppState>,
    Json(form): Json<MergeForm>,
) -> Result<Json<CartView>> {
    state.cart().merge_guest(form.items).await?;
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Json<CartView>> {
    state.cart().clear().await?;
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Set one line's selection membership.
#[instrument(skip(state))]
pub async fn select(
    State(state): State<AppState>,
    Json(form): Json<SelectForm>,
) -> Result<Json<CartView>> {
    state.cart().set_selected(form.line_id, form.selected);
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}

/// Select or deselect every line.
#[instrument(skip(state))]
pub async fn select_all(
    State(state): State<AppState>,
    Json(form): Json<SelectAllForm>,
) -> Result<Json<CartView>> {
    state.cart().set_all_selected(form.selected);
    reconcile_coupon(&state).await;
    Ok(Json(build_view(&state)))
}
