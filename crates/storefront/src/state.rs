//! Application state shared across handlers.

use std::sync::Arc;

use inkberry_core::CurrencyCode;

use crate::cart::CartStore;
use crate::commerce::{CommerceClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::coupon::CouponGate;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources: the Commerce API client, the cart store that owns the single
/// in-memory cart snapshot, and the coupon gate.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    cart: CartStore,
    coupons: CouponGate,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Commerce API client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, CommerceError> {
        let commerce = CommerceClient::new(&config.commerce)?;
        let cart = CartStore::new(commerce.clone());
        let coupons = CouponGate::new(commerce.clone(), config.currency);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                cart,
                coupons,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the coupon gate.
    #[must_use]
    pub fn coupons(&self) -> &CouponGate {
        &self.inner.coupons
    }

    /// Display currency for formatted amounts.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }
}
