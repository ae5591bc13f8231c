//! Shopify Admin REST client for price rules and discount codes.
//!
//! # API Reference
//!
//! - Base URL: `https://{store}/admin/api/{version}`
//! - Authentication: `X-Shopify-Access-Token: <token>`
//! - `POST /price_rules.json`
//! - `POST /price_rules/{id}/discount_codes.json`
//!
//! Every request is bounded by the configured timeout. Nothing is retried: a
//! retried price rule creation would leave a second rule behind.

mod types;

pub use types::*;

use std::sync::Arc;

use async_trait::async_trait;
use peachtree_core::{DiscountCodeId, PriceRuleId};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use thiserror::Error;

use crate::config::ShopifyAdminConfig;
use crate::provision::{DiscountCodeCreated, DiscountPlatform, PriceRuleCreated};

/// Errors that can occur when calling the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("API error: {status}")]
    Api {
        status: u16,
        body: serde_json::Value,
    },

    /// A success response without the created resource's id.
    #[error("response has no {resource}.id")]
    MissingId {
        resource: &'static str,
        body: serde_json::Value,
    },

    /// Failed to parse a response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ShopifyError {
    /// Whether the request hit the client timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// What Shopify (or the transport) said, for the caller's diagnostics.
    #[must_use]
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::Http(e) if e.is_timeout() => json!({"error": "request timed out"}),
            Self::Http(e) => json!({"error": e.to_string()}),
            Self::Api { status, body } => json!({"status": status, "body": body}),
            Self::MissingId { resource, body } => {
                json!({"error": format!("missing {resource}.id"), "body": body})
            }
            Self::Parse(message) => json!({"error": message}),
        }
    }
}

/// Shopify Admin REST client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ShopifyClient {
    /// Create a client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &ShopifyAdminConfig) -> Result<Self, ShopifyError> {
        Self::with_base_url(config, config.base_url())
    }

    /// Create a client that talks to `base_url` instead of the store's
    /// Admin API, e.g. a local fake.
    ///
    /// # Errors
    ///
    /// Same as [`ShopifyClient::new`].
    pub fn with_base_url(
        config: &ShopifyAdminConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();

        let mut token = HeaderValue::from_str(config.access_token.expose_secret())
            .map_err(|e| ShopifyError::Parse(format!("Invalid access token format: {e}")))?;
        token.set_sensitive(true);
        headers.insert("X-Shopify-Access-Token", token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// The API root requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// POST a JSON body and return the JSON response.
    async fn post<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, ShopifyError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self.inner.client.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response(
        response: reqwest::Response,
    ) -> Result<serde_json::Value, ShopifyError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ShopifyError::Parse(format!("Failed to parse response: {e}")));
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        tracing::warn!(status = status.as_u16(), %body, "Shopify API error");

        Err(ShopifyError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DiscountPlatform for ShopifyClient {
    #[tracing::instrument(skip(self, rule), fields(title = %rule.title))]
    async fn create_price_rule(
        &self,
        rule: &NewPriceRule,
    ) -> Result<PriceRuleCreated, ShopifyError> {
        let body = self
            .post("/price_rules.json", &PriceRuleEnvelope { price_rule: rule })
            .await?;

        let id = resource_id(&body, "price_rule").ok_or(ShopifyError::MissingId {
            resource: "price_rule",
            body,
        })?;

        Ok(PriceRuleCreated {
            price_rule_id: PriceRuleId::new(id),
        })
    }

    #[tracing::instrument(skip(self, code), fields(code = %code.code))]
    async fn create_discount_code(
        &self,
        price_rule_id: PriceRuleId,
        code: &NewDiscountCode,
    ) -> Result<DiscountCodeCreated, ShopifyError> {
        let body = self
            .post(
                &format!("/price_rules/{price_rule_id}/discount_codes.json"),
                &DiscountCodeEnvelope {
                    discount_code: code,
                },
            )
            .await?;

        Ok(DiscountCodeCreated {
            id: resource_id(&body, "discount_code").map(DiscountCodeId::new),
            code: code.code.clone(),
        })
    }
}
