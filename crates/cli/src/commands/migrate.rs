//! Database migration command.
//!
//! Migrations live in `crates/wholesale/migrations/` and are embedded in the
//! wholesale crate, so this binary and the server always agree on the schema.

use super::{CliError, connect};

/// Run pending wholesale migrations.
pub async fn run() -> Result<(), CliError> {
    let directory = connect().await?;

    tracing::info!("Running wholesale migrations...");
    directory.migrate().await?;

    tracing::info!("Wholesale migrations complete!");
    Ok(())
}
