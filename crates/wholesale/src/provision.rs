//! Two-step discount provisioning against the commerce platform.
//!
//! ```text
//! create_price_rule ──► PriceRuleCreated ──► create_discount_code ──► Provisioned
//!        │                                          │
//!        ▼                                          ▼
//!  PriceRule error                     DiscountCode error (rule orphaned)
//! ```
//!
//! The second step needs the rule id from the first, so the steps run
//! strictly in order. A rule whose code could not be created is left on the
//! platform; its id is carried in the error and logged for manual cleanup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use peachtree_core::{DiscountCodeId, Email, Money, PriceRuleId};
use serde_json::json;
use thiserror::Error;

use crate::shopify::{NewDiscountCode, NewPriceRule, ShopifyError};

/// Result of the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRuleCreated {
    pub price_rule_id: PriceRuleId,
}

/// Result of the second step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountCodeCreated {
    /// Platform id of the code, when the platform echoes one back.
    pub id: Option<DiscountCodeId>,
    pub code: String,
}

/// The operations provisioning needs from the commerce platform.
#[async_trait]
pub trait DiscountPlatform: Send + Sync {
    async fn create_price_rule(&self, rule: &NewPriceRule)
    -> Result<PriceRuleCreated, ShopifyError>;

    async fn create_discount_code(
        &self,
        price_rule_id: PriceRuleId,
        code: &NewDiscountCode,
    ) -> Result<DiscountCodeCreated, ShopifyError>;
}

/// Provisioning failed; says which step and what the platform returned.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("failed to create price rule: {source}")]
    PriceRule { source: ShopifyError },

    #[error("failed to create discount code for price rule {price_rule_id}: {source}")]
    DiscountCode {
        price_rule_id: PriceRuleId,
        source: ShopifyError,
    },
}

impl ProvisioningError {
    /// The price rule left without a code, if any.
    #[must_use]
    pub const fn orphaned_price_rule(&self) -> Option<PriceRuleId> {
        match self {
            Self::PriceRule { .. } => None,
            Self::DiscountCode { price_rule_id, .. } => Some(*price_rule_id),
        }
    }

    /// Diagnostic payload returned to the caller.
    #[must_use]
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::PriceRule { source } => json!({
                "step": "create_price_rule",
                "upstream": source.details(),
            }),
            Self::DiscountCode {
                price_rule_id,
                source,
            } => json!({
                "step": "create_discount_code",
                "priceRuleId": price_rule_id,
                "upstream": source.details(),
            }),
        }
    }
}

/// What to provision.
#[derive(Debug, Clone)]
pub struct DiscountRequest<'a> {
    pub email: &'a Email,
    pub code: &'a str,
    pub amount: Money,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// A discount that exists on the platform and can be redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub price_rule_id: PriceRuleId,
    pub code: String,
}

/// Create a single-use fixed-amount price rule and bind `request.code` to it.
///
/// # Errors
///
/// Returns `ProvisioningError::PriceRule` if the rule cannot be created, or
/// `ProvisioningError::DiscountCode` (carrying the orphaned rule id) if the
/// code cannot be bound to it.
pub async fn provision(
    platform: &dyn DiscountPlatform,
    request: &DiscountRequest<'_>,
) -> Result<Provisioned, ProvisioningError> {
    let rule = NewPriceRule::single_use_fixed_amount(
        format!("Wholesale Discount - {}", request.email),
        request.amount,
        request.starts_at,
        request.ends_at,
    );

    let PriceRuleCreated { price_rule_id } = platform
        .create_price_rule(&rule)
        .await
        .map_err(|source| {
            tracing::error!(error = %source, code = request.code, "Price rule creation failed");
            ProvisioningError::PriceRule { source }
        })?;

    tracing::info!(%price_rule_id, amount = %request.amount, "Price rule created");

    let created = platform
        .create_discount_code(price_rule_id, &NewDiscountCode::new(request.code))
        .await
        .map_err(|source| {
            tracing::error!(
                %price_rule_id,
                error = %source,
                code = request.code,
                "Discount code creation failed, price rule left orphaned"
            );
            ProvisioningError::DiscountCode {
                price_rule_id,
                source,
            }
        })?;

    tracing::info!(%price_rule_id, code = %created.code, "Discount code created");

    Ok(Provisioned {
        price_rule_id,
        code: created.code,
    })
}
