//! Wholesale checkout orchestration.
//!
//! ```text
//! START → AUTHORIZED → RECONCILED ─┬─► PASSTHROUGH
//!                                  └─► PROVISIONING ─┬─► ISSUED
//!                                                    └─► FAILED
//! ```
//!
//! A checkout either ends with a complete directive or an error; a discount
//! directive is only produced once the code exists on the platform.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use peachtree_core::{Email, Money, PriceRuleId, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;
use url::form_urlencoded;

use crate::code::{Clock, CodeGenerator};
use crate::config::DiscountPolicy;
use crate::directory::{DirectoryError, WholesaleDirectory, authorize};
use crate::pricing::{CartError, CartItem, Reconciliation, reconcile};
use crate::provision::{DiscountPlatform, DiscountRequest, ProvisioningError, provision};

/// Why a checkout could not be processed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The identity is not a registered wholesale customer (or not an email
    /// at all).
    #[error("{0} is not a wholesale customer")]
    NotAuthorized(String),

    #[error("invalid cart: {0}")]
    InvalidCart(#[from] CartError),

    #[error("discount provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// A discount that was created and can be redeemed at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedDiscount {
    pub code: String,
    pub amount: Money,
    pub wholesale_total: Money,
    pub checkout_url: String,
    pub price_rule_id: PriceRuleId,
    pub expires_at: DateTime<Utc>,
}

/// Where the storefront should send the customer next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutDirective {
    /// Checkout at regular pricing.
    Passthrough { checkout_url: String },
    /// Checkout with the issued discount applied.
    Discount(IssuedDiscount),
}

impl CheckoutDirective {
    #[must_use]
    pub fn checkout_url(&self) -> &str {
        match self {
            Self::Passthrough { checkout_url } => checkout_url,
            Self::Discount(discount) => &discount.checkout_url,
        }
    }
}

/// Runs wholesale checkouts against a directory and a discount platform.
pub struct CheckoutService {
    directory: Arc<dyn WholesaleDirectory>,
    platform: Arc<dyn DiscountPlatform>,
    codes: CodeGenerator,
    policy: DiscountPolicy,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("codes", &self.codes)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn WholesaleDirectory>,
        platform: Arc<dyn DiscountPlatform>,
        clock: Arc<dyn Clock>,
        policy: DiscountPolicy,
    ) -> Self {
        Self {
            directory,
            platform,
            codes: CodeGenerator::new(policy.code_prefix.clone(), clock),
            policy,
        }
    }

    /// Process one checkout.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` if `identity` is not a registered wholesale customer;
    ///   nothing is looked up or created in that case.
    /// - `InvalidCart` for an empty cart or a zero quantity.
    /// - `Provisioning` if the platform rejects either step.
    /// - `Directory` if a directory lookup fails.
    #[tracing::instrument(skip(self, items), fields(items = items.len(), %cart_total))]
    pub async fn process(
        &self,
        identity: &str,
        items: &[CartItem],
        cart_total: Decimal,
    ) -> Result<CheckoutDirective, CheckoutError> {
        let customer = match Email::parse(identity) {
            Ok(email) => authorize(self.directory.as_ref(), &email).await?,
            Err(_) => None,
        };
        let Some(customer) = customer else {
            tracing::info!(identity, "Checkout refused, not a wholesale customer");
            return Err(CheckoutError::NotAuthorized(identity.to_string()));
        };

        let product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id.clone()).collect();
        let prices = self.directory.prices_for(&product_ids).await?;

        let (amount, wholesale_total) = match reconcile(&customer, items, cart_total, &prices)? {
            Reconciliation::NoDiscountNeeded(reason) => {
                tracing::info!(?reason, "No wholesale discount needed");
                return Ok(CheckoutDirective::Passthrough {
                    checkout_url: self.policy.checkout_path.clone(),
                });
            }
            Reconciliation::DiscountRequired {
                amount,
                wholesale_total,
            } => (amount, wholesale_total),
        };

        let code = self.codes.generate(customer.email(), amount);
        let starts_at = self.codes.clock().now();
        let expires_at = starts_at + self.policy.validity;

        let provisioned = provision(
            self.platform.as_ref(),
            &DiscountRequest {
                email: customer.email(),
                code: &code,
                amount,
                starts_at,
                ends_at: expires_at,
            },
        )
        .await?;

        tracing::info!(
            code = %provisioned.code,
            %amount,
            %wholesale_total,
            "Wholesale discount issued"
        );

        Ok(CheckoutDirective::Discount(IssuedDiscount {
            checkout_url: self.discount_url(&provisioned.code),
            code: provisioned.code,
            amount,
            wholesale_total,
            price_rule_id: provisioned.price_rule_id,
            expires_at,
        }))
    }

    fn discount_url(&self, code: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(code.as_bytes()).collect();
        format!("{}?discount={encoded}", self.policy.checkout_path)
    }
}
