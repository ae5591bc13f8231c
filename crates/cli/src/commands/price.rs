//! Wholesale price commands.

use std::str::FromStr;

use peachtree_core::{Money, ProductId};
use peachtree_wholesale::directory::WholesaleDirectory;
use rust_decimal::Decimal;

use super::{CliError, connect};

/// Parse a price argument such as `10`, `10.5` or `10.00`.
fn parse_price(raw: &str) -> Result<Money, CliError> {
    let amount = Decimal::from_str(raw.trim().trim_start_matches('$'))
        .map_err(|e| CliError::InvalidPrice(raw.to_string(), e.to_string()))?;
    Money::round(amount).map_err(|e| CliError::InvalidPrice(raw.to_string(), e.to_string()))
}

/// Set (or overwrite) a product's wholesale price.
pub async fn set(product_id: &str, price: &str) -> Result<(), CliError> {
    let product_id = ProductId::parse(product_id)?;
    let price = parse_price(price)?;
    let directory = connect().await?;

    directory.set_price(&product_id, price).await?;
    tracing::info!("Set wholesale price of {product_id} to {price}");
    Ok(())
}

/// Remove a product's wholesale price.
pub async fn remove(product_id: &str) -> Result<(), CliError> {
    let product_id = ProductId::parse(product_id)?;
    let directory = connect().await?;

    if !directory.remove_price(&product_id).await? {
        return Err(CliError::NotFound(format!("price for product {product_id}")));
    }
    tracing::info!("Removed wholesale price of {product_id}");
    Ok(())
}

/// Print all wholesale prices as `product<TAB>price`.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CliError> {
    let directory = connect().await?;
    let prices = directory.list_prices().await?;

    for (product_id, price) in &prices {
        println!("{product_id}\t{price}");
    }
    tracing::info!("{} wholesale price(s)", prices.len());
    Ok(())
}
