//! CLI command implementations.

pub mod customer;
pub mod migrate;
pub mod price;

use peachtree_core::{EmailError, ProductIdError};
use peachtree_wholesale::directory::{DirectoryError, PgDirectory};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Directory operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid product ID.
    #[error("Invalid product ID: {0}")]
    InvalidProductId(#[from] ProductIdError),

    /// Invalid price.
    #[error("Invalid price {0:?}: {1}")]
    InvalidPrice(String, String),

    /// Tried to remove something that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Connect to the wholesale database named by the environment.
async fn connect() -> Result<PgDirectory, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("WHOLESALE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("WHOLESALE_DATABASE_URL"))?;

    tracing::info!("Connecting to wholesale database...");
    Ok(PgDirectory::connect(&SecretString::from(database_url)).await?)
}
