//! Coupon operations against the Commerce API.

use reqwest::Method;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::types::{
    Coupon, CouponValidation, CouponsEnvelope, ValidateCouponRequest, ValidateCouponResponse,
};
use super::{CommerceClient, CommerceError};

/// Single cache slot for the available-coupon list.
const COUPON_CACHE_KEY: &str = "coupons";

impl CommerceClient {
    /// List the coupons available to the storefront, with their minimums.
    ///
    /// Cached for five minutes; coupons are immutable once fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_coupons(&self) -> Result<Vec<Coupon>, CommerceError> {
        if let Some(coupons) = self.inner.coupon_cache.get(COUPON_CACHE_KEY).await {
            debug!("Cache hit for coupons");
            return Ok(coupons);
        }

        let envelope: CouponsEnvelope = self.get("/coupons").await?;
        let coupons = envelope.into_coupons();

        self.inner
            .coupon_cache
            .insert(COUPON_CACHE_KEY, coupons.clone())
            .await;

        Ok(coupons)
    }

    /// Look up a listed coupon by its code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon list cannot be fetched.
    pub async fn find_listed_coupon(&self, code: &str) -> Result<Option<Coupon>, CommerceError> {
        let coupons = self.list_coupons().await?;
        Ok(coupons
            .into_iter()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code)))
    }

    /// Validate a coupon code against an order amount.
    ///
    /// The returned `discount_amount` and `final_amount` are authoritative;
    /// client-side estimates must never replace them.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Rejected`] when the server rejects the code
    /// for a business rule, or another variant for transport failures.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        order_amount: Decimal,
    ) -> Result<CouponValidation, CommerceError> {
        let body = serde_json::to_value(ValidateCouponRequest {
            code: code.to_string(),
            order_amount,
        })?;
        let response: ValidateCouponResponse = self
            .execute(Method::POST, "/coupons/validate", Some(body))
            .await?;

        match response.data {
            Some(validation) if response.success => Ok(validation),
            _ => Err(CommerceError::Api {
                status: 200,
                message: "coupon validation response carried no data".to_string(),
            }),
        }
    }

    /// Drop the cached coupon list.
    pub async fn invalidate_coupons(&self) {
        self.inner.coupon_cache.invalidate(COUPON_CACHE_KEY).await;
    }
}
