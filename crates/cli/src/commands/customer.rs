//! Wholesale customer commands.

use peachtree_core::Email;
use peachtree_wholesale::directory::WholesaleDirectory;

use super::{CliError, connect};

/// Register a wholesale customer.
pub async fn add(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let directory = connect().await?;

    if directory.add_customer(&email).await? {
        tracing::info!("Added wholesale customer {email}");
    } else {
        tracing::info!("{email} is already a wholesale customer");
    }
    Ok(())
}

/// Remove a wholesale customer.
pub async fn remove(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let directory = connect().await?;

    if !directory.remove_customer(&email).await? {
        return Err(CliError::NotFound(format!("customer {email}")));
    }
    tracing::info!("Removed wholesale customer {email}");
    Ok(())
}

/// Print all wholesale customers, one per line.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CliError> {
    let directory = connect().await?;
    let customers = directory.list_customers().await?;

    for email in &customers {
        println!("{email}");
    }
    tracing::info!("{} wholesale customer(s)", customers.len());
    Ok(())
}
