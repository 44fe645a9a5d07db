//! The coupon gate: per-widget state machine for coupon entry.
//!
//! States: `Idle` -> `Validating` -> `Applied` or `Rejected`; `Applied`
//! returns to `Idle` on explicit removal. Two entry paths exist:
//!
//! - [`CouponGate::apply_listed`] for coupons picked from the published
//!   list, whose minimum is known up front. An order below the minimum is
//!   rejected locally, without a round trip, with a message embedding both
//!   amounts.
//! - [`CouponGate::apply_code`] for free-text codes, which always asks the
//!   remote validator and localizes its structured rejection payload.
//!
//! The server's `discount_amount` and `final_amount` are authoritative; the
//! gate never substitutes a client-side estimate for them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use inkberry_core::CurrencyCode;
use rust_decimal::Decimal;
use tracing::debug;

use crate::commerce::types::Coupon;
use crate::commerce::{CommerceClient, CommerceError};

use super::messages;

/// A successfully applied coupon with the server's authoritative amounts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AppliedCoupon {
    /// The applied code.
    pub code: String,
    /// The coupon definition, as validated.
    pub coupon: Coupon,
    /// Server-computed discount.
    pub discount_amount: Decimal,
    /// Server-computed payable amount.
    pub final_amount: Decimal,
    /// The order amount this validation was computed against.
    pub order_amount: Decimal,
}

/// Current state of the coupon entry widget.
#[derive(Debug, Clone, Default)]
pub enum CouponState {
    /// No coupon entered.
    #[default]
    Idle,
    /// A validation request is in flight.
    Validating,
    /// A coupon is applied.
    Applied(AppliedCoupon),
    /// The last attempt was rejected; holds the user-facing message.
    Rejected(String),
}

impl CouponState {
    /// The applied coupon, if any.
    #[must_use]
    pub const fn applied(&self) -> Option<&AppliedCoupon> {
        match self {
            Self::Applied(applied) => Some(applied),
            _ => None,
        }
    }
}

/// Drives coupon entry against the Commerce API.
pub struct CouponGate {
    client: CommerceClient,
    currency: CurrencyCode,
    state: Mutex<CouponState>,
}

impl CouponGate {
    /// Create a gate that validates through the given client.
    #[must_use]
    pub fn new(client: CommerceClient, currency: CurrencyCode) -> Self {
        Self {
            client,
            currency,
            state: Mutex::new(CouponState::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CouponState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current widget state.
    #[must_use]
    pub fn state(&self) -> CouponState {
        self.lock().clone()
    }

    /// Explicitly remove the applied coupon (or clear a rejection message).
    pub fn remove(&self) {
        *self.lock() = CouponState::Idle;
    }

    /// Apply a coupon picked from the published list.
    ///
    /// The minimum is known up front, so ineligible orders are rejected
    /// locally without a network round trip.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; business-rule rejections are
    /// a state, not an error.
    pub async fn apply_listed(
        &self,
        coupon: &Coupon,
        order_amount: Decimal,
    ) -> Result<CouponState, CommerceError> {
        if let Some(minimum) = coupon.minimum_amount
            && order_amount < minimum
        {
            debug!(code = %coupon.code, %minimum, %order_amount, "coupon below minimum, rejected locally");
            let state =
                CouponState::Rejected(messages::minimum_not_met(minimum, order_amount, self.currency));
            *self.lock() = state.clone();
            return Ok(state);
        }

        self.apply_code(&coupon.code, order_amount).await
    }

    /// Apply a free-text coupon code via the remote validator.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; business-rule rejections are
    /// a state, not an error.
    pub async fn apply_code(
        &self,
        code: &str,
        order_amount: Decimal,
    ) -> Result<CouponState, CommerceError> {
        *self.lock() = CouponState::Validating;

        let state = match self.client.validate_coupon(code, order_amount).await {
            Ok(validation) => CouponState::Applied(AppliedCoupon {
                code: validation.coupon.code.clone(),
                coupon: validation.coupon,
                discount_amount: validation.discount_amount,
                final_amount: validation.final_amount,
                order_amount,
            }),
            Err(CommerceError::Rejected(rejection)) => CouponState::Rejected(messages::rejection(
                &rejection,
                order_amount,
                self.currency,
            )),
            Err(err) => {
                // Transport failure: drop back to Idle and let the caller
                // decide what the user sees.
                *self.lock() = CouponState::Idle;
                return Err(err);
            }
        };

        *self.lock() = state.clone();
        Ok(state)
    }

    /// React to a change in the order amount.
    ///
    /// An applied coupon is re-validated against the new amount so a stale
    /// discount can never survive; on rejection, or on transport failure
    /// during re-validation, the coupon is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if re-validation fails on transport. The coupon is
    /// removed in that case as well; the discount is gone either way.
    pub async fn order_amount_changed(
        &self,
        order_amount: Decimal,
    ) -> Result<CouponState, CommerceError> {
        let applied = match &*self.lock() {
            CouponState::Applied(applied) if applied.order_amount != order_amount => {
                applied.clone()
            }
            state => return Ok(state.clone()),
        };

        debug!(code = %applied.code, %order_amount, "re-validating applied coupon after amount change");
        match self.apply_code(&applied.code, order_amount).await {
            Ok(CouponState::Rejected(_)) => {
                let state =
                    CouponState::Rejected(messages::dropped_after_amount_change(&applied.code));
                *self.lock() = state.clone();
                Ok(state)
            }
            Ok(state) => Ok(state),
            Err(err) => {
                *self.lock() = CouponState::Idle;
                Err(err)
            }
        }
    }
}
