//! `PostgreSQL` directory backend.
//!
//! # Tables
//!
//! - `wholesale.customer` - one row per registered email
//! - `wholesale.price` - one row per product with a wholesale price
//!
//! # Migrations
//!
//! Migrations are stored in `crates/wholesale/migrations/` and run via:
//! ```bash
//! cargo run -p peachtree-cli -- migrate
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use peachtree_core::{Email, Money, ProductId};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{DirectoryError, WholesaleDirectory};

/// Embedded migrations for the directory schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Directory backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with sensible pool defaults.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Database` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, DirectoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }

    /// Run pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns the migration error if any migration fails to apply.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WholesaleDirectory for PgDirectory {
    async fn add_customer(&self, email: &Email) -> Result<bool, DirectoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO wholesale.customer (email)
            VALUES ($1)
            ON CONFLICT (email) DO NOTHING
            ",
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_customer(&self, email: &Email) -> Result<bool, DirectoryError> {
        let result = sqlx::query("DELETE FROM wholesale.customer WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_wholesale_customer(&self, email: &Email) -> Result<bool, DirectoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM wholesale.customer WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_customers(&self) -> Result<Vec<Email>, DirectoryError> {
        let customers: Vec<Email> =
            sqlx::query_scalar("SELECT email FROM wholesale.customer ORDER BY email")
                .fetch_all(&self.pool)
                .await?;

        Ok(customers)
    }

    async fn set_price(&self, product_id: &ProductId, price: Money) -> Result<(), DirectoryError> {
        sqlx::query(
            r"
            INSERT INTO wholesale.price (product_id, price)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE SET price = $2, updated_at = NOW()
            ",
        )
        .bind(product_id)
        .bind(price)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_price(&self, product_id: &ProductId) -> Result<bool, DirectoryError> {
        let result = sqlx::query("DELETE FROM wholesale.price WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn wholesale_price_of(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<Money>, DirectoryError> {
        let price: Option<Money> =
            sqlx::query_scalar("SELECT price FROM wholesale.price WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(price)
    }

    async fn list_prices(&self) -> Result<BTreeMap<ProductId, Money>, DirectoryError> {
        let rows: Vec<(ProductId, Money)> =
            sqlx::query_as("SELECT product_id, price FROM wholesale.price")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    async fn prices_for(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Money>, DirectoryError> {
        let ids: Vec<String> = product_ids.iter().map(ToString::to_string).collect();
        let rows: Vec<(ProductId, Money)> = sqlx::query_as(
            "SELECT product_id, price FROM wholesale.price WHERE product_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
