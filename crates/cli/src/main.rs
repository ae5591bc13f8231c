//! PeachTree CLI - database migrations and wholesale directory management.
//!
//! # Usage
//!
//! ```bash
//! # Run wholesale database migrations
//! pt-cli migrate
//!
//! # Manage wholesale customers
//! pt-cli customer add buyer@example.com
//! pt-cli customer remove buyer@example.com
//! pt-cli customer list
//!
//! # Manage wholesale prices
//! pt-cli price set 8123456789 10.00
//! pt-cli price remove 8123456789
//! pt-cli price list
//! ```
//!
//! # Environment Variables
//!
//! - `WHOLESALE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "pt-cli")]
#[command(author, version, about = "PeachTree wholesale CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run wholesale database migrations
    Migrate,
    /// Manage wholesale customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Manage wholesale prices
    Price {
        #[command(subcommand)]
        action: PriceAction,
    },
}

#[derive(Debug, Subcommand)]
enum CustomerAction {
    /// Register a wholesale customer
    Add {
        /// Customer email address (matched exactly, case-sensitive)
        email: String,
    },
    /// Remove a wholesale customer
    Remove { email: String },
    /// List wholesale customers
    List,
}

#[derive(Debug, Subcommand)]
enum PriceAction {
    /// Set a product's wholesale price
    Set {
        /// Storefront product ID
        product_id: String,
        /// Wholesale unit price, e.g. 10.00
        price: String,
    },
    /// Remove a product's wholesale price
    Remove { product_id: String },
    /// List wholesale prices
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Customer { action } => match action {
            CustomerAction::Add { email } => commands::customer::add(&email).await?,
            CustomerAction::Remove { email } => commands::customer::remove(&email).await?,
            CustomerAction::List => commands::customer::list().await?,
        },
        Commands::Price { action } => match action {
            PriceAction::Set { product_id, price } => {
                commands::price::set(&product_id, &price).await?;
            }
            PriceAction::Remove { product_id } => commands::price::remove(&product_id).await?,
            PriceAction::List => commands::price::list().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_price_set() {
        let cli = Cli::try_parse_from(["pt-cli", "price", "set", "P1", "10.00"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Price {
                action: PriceAction::Set { .. }
            })
        ));
    }

    #[test]
    fn test_customer_add_requires_email() {
        assert!(Cli::try_parse_from(["pt-cli", "customer", "add"]).is_err());
    }
}
