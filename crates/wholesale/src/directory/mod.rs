//! Wholesale directory: who is a wholesale customer and what products cost them.
//!
//! The directory is injected into the application state as
//! `Arc<dyn WholesaleDirectory>`, so the checkout flow never touches
//! process-global collections.
//!
//! # Backends
//!
//! - [`InMemoryDirectory`] - `RwLock`-guarded maps; the default when no
//!   database URL is configured. Contents are lost on restart.
//! - [`PgDirectory`] - `PostgreSQL` tables in the `wholesale` schema.
//!
//! # Consistency
//!
//! Both backends are single-writer/many-reader with last-write-wins
//! semantics: a write is visible to every read that starts after it returns.
//! There is no multi-key transaction; a checkout may observe a price set
//! between two of its own lookups.

mod memory;
mod postgres;

pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use peachtree_core::{Email, Money, ProductId};
use thiserror::Error;

/// Errors that can occur during directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A lock guarding the in-memory store was poisoned by a panicking writer.
    #[error("directory lock poisoned")]
    Poisoned,
}

/// Proof that an email passed the wholesale membership check.
///
/// Only [`authorize`] constructs this, so code that takes an
/// `&AuthorizedCustomer` cannot run for a non-member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedCustomer {
    email: Email,
}

impl AuthorizedCustomer {
    /// The customer's email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

/// Check membership and, if the customer is registered, return the proof.
///
/// # Errors
///
/// Returns `DirectoryError` if the membership lookup itself fails.
pub async fn authorize(
    directory: &dyn WholesaleDirectory,
    email: &Email,
) -> Result<Option<AuthorizedCustomer>, DirectoryError> {
    if directory.is_wholesale_customer(email).await? {
        Ok(Some(AuthorizedCustomer {
            email: email.clone(),
        }))
    } else {
        Ok(None)
    }
}

/// Customer membership and product price lookups.
#[async_trait]
pub trait WholesaleDirectory: Send + Sync {
    /// Register a wholesale customer. Returns `true` if the customer was not
    /// already registered.
    async fn add_customer(&self, email: &Email) -> Result<bool, DirectoryError>;

    /// Remove a wholesale customer. Returns `true` if the customer existed.
    async fn remove_customer(&self, email: &Email) -> Result<bool, DirectoryError>;

    /// Whether `email` is a registered wholesale customer (exact match).
    async fn is_wholesale_customer(&self, email: &Email) -> Result<bool, DirectoryError>;

    /// All registered customers, sorted.
    async fn list_customers(&self) -> Result<Vec<Email>, DirectoryError>;

    /// Set (or overwrite) the wholesale price of a product.
    async fn set_price(&self, product_id: &ProductId, price: Money) -> Result<(), DirectoryError>;

    /// Remove a product's wholesale price. Returns `true` if one was set.
    async fn remove_price(&self, product_id: &ProductId) -> Result<bool, DirectoryError>;

    /// The wholesale price of a product, if one is configured.
    async fn wholesale_price_of(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Money>, DirectoryError>;

    /// All configured wholesale prices, keyed by product.
    async fn list_prices(&self) -> Result<BTreeMap<ProductId, Money>, DirectoryError>;

    /// Wholesale prices for a batch of products. Products without a price are
    /// absent from the result.
    ///
    /// The default implementation performs one lookup per distinct product.
    async fn prices_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Money>, DirectoryError> {
        let mut prices = HashMap::with_capacity(product_ids.len());
        for product_id in product_ids {
            if prices.contains_key(product_id) {
                continue;
            }
            if let Some(price) = self.wholesale_price_of(product_id).await? {
                prices.insert(product_id.clone(), price);
            }
        }
        Ok(prices)
    }

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}
