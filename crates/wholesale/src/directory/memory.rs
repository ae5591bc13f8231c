//! In-memory directory backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use peachtree_core::{Email, Money, ProductId};

use super::{DirectoryError, WholesaleDirectory};

/// Directory kept in process memory.
///
/// Intended for development, tests, and single-instance deployments that can
/// afford to re-enter customers and prices after a restart.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    customers: RwLock<BTreeSet<Email>>,
    prices: RwLock<BTreeMap<ProductId, Money>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WholesaleDirectory for InMemoryDirectory {
    async fn add_customer(&self, email: &Email) -> Result<bool, DirectoryError> {
        let mut customers = self
            .customers
            .write()
            .map_err(|_| DirectoryError::Poisoned)?;
        Ok(customers.insert(email.clone()))
    }

    async fn remove_customer(&self, email: &Email) -> Result<bool, DirectoryError> {
        let mut customers = self
            .customers
            .write()
            .map_err(|_| DirectoryError::Poisoned)?;
        Ok(customers.remove(email))
    }

    async fn is_wholesale_customer(&self, email: &Email) -> Result<bool, DirectoryError> {
        let customers = self.customers.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(customers.contains(email))
    }

    async fn list_customers(&self) -> Result<Vec<Email>, DirectoryError> {
        let customers = self.customers.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(customers.iter().cloned().collect())
    }

    async fn set_price(&self, product_id: &ProductId, price: Money) -> Result<(), DirectoryError> {
        let mut prices = self.prices.write().map_err(|_| DirectoryError::Poisoned)?;
        prices.insert(product_id.clone(), price);
        Ok(())
    }

    async fn remove_price(&self, product_id: &ProductId) -> Result<bool, DirectoryError> {
        let mut prices = self.prices.write().map_err(|_| DirectoryError::Poisoned)?;
        Ok(prices.remove(product_id).is_some())
    }

    async fn wholesale_price_of(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Money>, DirectoryError> {
        let prices = self.prices.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(prices.get(product_id).copied())
    }

    async fn list_prices(&self) -> Result<BTreeMap<ProductId, Money>, DirectoryError> {
        let prices = self.prices.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(prices.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn product(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_customer_is_idempotent() {
        let dir = InMemoryDirectory::new();
        assert!(dir.add_customer(&email("a@b.com")).await.unwrap());
        assert!(!dir.add_customer(&email("a@b.com")).await.unwrap());
        assert_eq!(dir.list_customers().await.unwrap(), vec![email("a@b.com")]);
    }

    #[tokio::test]
    async fn test_membership_is_case_sensitive() {
        let dir = InMemoryDirectory::new();
        dir.add_customer(&email("Buyer@Shop.com")).await.unwrap();
        assert!(dir.is_wholesale_customer(&email("Buyer@Shop.com")).await.unwrap());
        assert!(!dir.is_wholesale_customer(&email("buyer@shop.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_customer() {
        let dir = InMemoryDirectory::new();
        dir.add_customer(&email("a@b.com")).await.unwrap();
        assert!(dir.remove_customer(&email("a@b.com")).await.unwrap());
        assert!(!dir.remove_customer(&email("a@b.com")).await.unwrap());
        assert!(!dir.is_wholesale_customer(&email("a@b.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_price_last_write_wins() {
        let dir = InMemoryDirectory::new();
        dir.set_price(&product("P1"), Money::from_cents(1000)).await.unwrap();
        dir.set_price(&product("P1"), Money::from_cents(900)).await.unwrap();
        assert_eq!(
            dir.wholesale_price_of(&product("P1")).await.unwrap(),
            Some(Money::from_cents(900))
        );
        assert_eq!(dir.list_prices().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_price_is_present() {
        let dir = InMemoryDirectory::new();
        dir.set_price(&product("FREEBIE"), Money::ZERO).await.unwrap();
        assert_eq!(
            dir.wholesale_price_of(&product("FREEBIE")).await.unwrap(),
            Some(Money::ZERO)
        );
    }

    #[tokio::test]
    async fn test_prices_for_skips_unpriced_and_duplicates() {
        let dir = InMemoryDirectory::new();
        dir.set_price(&product("P1"), Money::from_cents(1000)).await.unwrap();

        let prices = dir
            .prices_for(&[product("P1"), product("P2"), product("P1")])
            .await
            .unwrap();

        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(&product("P1")), Some(&Money::from_cents(1000)));
    }

    #[tokio::test]
    async fn test_remove_price() {
        let dir = InMemoryDirectory::new();
        dir.set_price(&product("P1"), Money::from_cents(1000)).await.unwrap();
        assert!(dir.remove_price(&product("P1")).await.unwrap());
        assert!(!dir.remove_price(&product("P1")).await.unwrap());
        assert_eq!(dir.wholesale_price_of(&product("P1")).await.unwrap(), None);
    }
}
