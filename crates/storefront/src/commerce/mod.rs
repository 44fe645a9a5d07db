//! Inkberry Commerce API client.
//!
//! # Architecture
//!
//! - REST over `reqwest` 0.13; the Commerce API is the source of truth
//! - Every cart mutation returns a fresh snapshot, normalized before use
//! - Available coupons are cached via `moka` (5-minute TTL); cart state is
//!   never cached (mutable)
//!
//! # Error policy
//!
//! Failed requests pass through one uniform unwrap step that extracts the
//! status, body, and message for diagnostics and then surfaces the original
//! failure unchanged - the unwrap never alters control flow. Business-rule
//! rejections (coupon below minimum, invalid code) are expected outcomes:
//! they carry a structured payload and are not logged as errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use inkberry_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce)?;
//!
//! let cart = client.add_item(BookId::new(12), 2, None).await?;
//! let cart = client.update_item(cart.lines[0].id, 5).await?;
//! ```

mod cart;
mod coupons;
pub mod normalize;
pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::CommerceApiConfig;

/// Cache TTL for the available-coupon list.
const COUPON_CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when talking to the Commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed (connection, timeout, protocol).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status without a business rejection.
    #[error("Commerce API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API rejected the request for a business rule. Expected outcome;
    /// surfaced to the user, never logged as an error.
    #[error("rejected: {}", .0.message)]
    Rejected(CouponRejection),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CommerceError {
    /// Whether this error is an expected business-rule rejection.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Structured error body the Commerce API attaches to failures.
#[derive(Debug, Default, serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<RejectionCode>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    minimum: Option<rust_decimal::Decimal>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the Inkberry Commerce API.
///
/// Cheaply cloneable; all clones share the underlying HTTP connection pool
/// and coupon cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    coupon_cache: Cache<&'static str, Vec<Coupon>>,
}

impl CommerceClient {
    /// Create a new Commerce API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CommerceApiConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let coupon_cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(COUPON_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                access_token: config.access_token.expose_secret().to_string(),
                coupon_cache,
            }),
        })
    }

    /// Execute one API request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, CommerceError> {
        let url = format!("{}{path}", self.inner.base_url);

        let mut request = self
            .inner
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.inner.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(unwrap_failure(
                &method,
                path,
                status.as_u16(),
                &response_text,
            ));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            error!(
                error = %e,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    /// `GET` convenience wrapper.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CommerceError> {
        self.execute(Method::GET, path, None).await
    }
}

/// Uniform unwrap step for failed requests.
///
/// Extracts the status, structured body, and message, logs the failure, and
/// returns the classified error. Business-rule rejections carry their
/// structured payload and are logged at debug only.
fn unwrap_failure(method: &Method, path: &str, status: u16, body_text: &str) -> CommerceError {
    let body: ApiErrorBody = serde_json::from_str(body_text).unwrap_or_default();
    let message = body.message.clone().unwrap_or_else(|| {
        let truncated: String = body_text.chars().take(200).collect();
        if truncated.is_empty() {
            format!("HTTP {status}")
        } else {
            truncated
        }
    });

    if let Some(code) = body.code {
        debug!(
            %method,
            path = %path,
            status = status,
            code = ?code,
            "Commerce API rejected request"
        );
        return CommerceError::Rejected(CouponRejection {
            code,
            minimum: body.minimum,
            message,
        });
    }

    error!(
        %method,
        path = %path,
        status = status,
        message = %message,
        data = ?body.data,
        "Commerce API request failed"
    );
    CommerceError::Api { status, message }
}
