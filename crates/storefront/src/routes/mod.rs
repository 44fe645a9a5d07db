//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (Commerce API reachable)
//!
//! # Cart
//! GET    /cart                      - Fetch and render the cart
//! POST   /cart/items                - Add a book
//! PUT    /cart/items/{id}           - Set a line's quantity (0 removes)
//! DELETE /cart/items/{id}           - Remove a line
//! POST   /cart/items/remove-selected - Remove every selected line
//! POST   /cart/merge                - Merge guest lines at login
//! POST   /cart/clear                - Empty the cart
//! POST   /cart/selection            - Set one line's selection
//! POST   /cart/selection/all        - Select or deselect every line
//!
//! # Coupons
//! GET    /coupons                   - Published coupons with eligibility
//! POST   /coupons/apply             - Apply a free-text code
//! POST   /coupons/apply-listed      - Apply a listed coupon (local pre-check)
//! DELETE /coupons                   - Remove the applied coupon
//! ```
//!
//! Every cart and coupon mutation responds with the full [`cart::CartView`]
//! so the frontend re-renders from one consistent payload.

pub mod cart;
pub mod coupons;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
        .route("/items/remove-selected", post(cart::remove_selected))
        .route("/merge", post(cart::merge))
        .route("/clear", post(cart::clear))
        .route("/selection", post(cart::select))
        .route("/selection/all", post(cart::select_all))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index).delete(coupons::remove))
        .route("/apply", post(coupons::apply))
        .route("/apply-listed", post(coupons::apply_listed))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/coupons", coupon_routes())
}
