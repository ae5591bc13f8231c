//! Wholesale price reconciliation.
//!
//! Given a cart priced by the storefront's regular pricing and the total the
//! storefront is about to charge, work out what the same cart costs at
//! wholesale and whether a fixed-amount discount has to bridge the gap.
//!
//! Reconciliation is a pure function of the cart, the declared total, and the
//! wholesale prices looked up for the cart's products; it performs no I/O.
//!
//! # Rounding
//!
//! Regular prices and the declared total are taken at the precision the
//! storefront sends; wholesale prices are stored at cents. Line totals are
//! summed exactly. The discount (`cart_total - wholesale_total`) is rounded
//! once to cents, half away from zero, and the reported wholesale total is
//! derived from it: `wholesale_total == cart_total - amount` exactly whenever
//! the declared total is at cent precision, and within half a cent otherwise.

use std::collections::HashMap;

use peachtree_core::{Money, ProductId, non_negative_decimal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::AuthorizedCustomer;

/// One line of the storefront cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Storefront product identifier.
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    /// Number of units; must be positive.
    pub quantity: u32,
    /// Regular unit price the storefront charges, unrounded.
    #[serde(
        alias = "unitPrice",
        alias = "unit_price",
        deserialize_with = "non_negative_decimal"
    )]
    pub price: Decimal,
}

/// Why a cart cannot be reconciled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The cart has no lines.
    #[error("cart is empty")]
    Empty,
    /// A line has a quantity of zero.
    #[error("quantity for product {0} must be positive")]
    ZeroQuantity(ProductId),
    /// The cart total does not fit in a decimal.
    #[error("cart total is too large")]
    Overflow,
}

/// Why no discount is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDiscountReason {
    /// None of the cart's products has a wholesale price.
    NoWholesaleItems,
    /// Wholesale pricing is not cheaper than what the storefront charges.
    WholesaleNotCheaper,
}

/// Outcome of reconciling a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Checkout proceeds at regular pricing.
    NoDiscountNeeded(NoDiscountReason),
    /// A fixed-amount discount brings the cart down to wholesale pricing.
    DiscountRequired {
        /// Discount value; always strictly positive.
        amount: Money,
        /// What the cart costs after the discount.
        wholesale_total: Money,
    },
}

impl Reconciliation {
    /// Whether a discount has to be issued.
    #[must_use]
    pub const fn requires_discount(&self) -> bool {
        matches!(self, Self::DiscountRequired { .. })
    }
}

/// Reconcile `items` against wholesale `prices`.
///
/// Products missing from `prices` are charged at their regular line price.
/// A price of zero in `prices` is a real wholesale price.
///
/// # Errors
///
/// Returns `CartError` if the cart is empty, a quantity is zero, or the
/// arithmetic overflows.
pub fn reconcile(
    customer: &AuthorizedCustomer,
    items: &[CartItem],
    cart_total: Decimal,
    prices: &HashMap<ProductId, Money>,
) -> Result<Reconciliation, CartError> {
    if items.is_empty() {
        return Err(CartError::Empty);
    }

    let mut wholesale_total = Decimal::ZERO;
    let mut has_wholesale_items = false;

    for item in items {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity(item.product_id.clone()));
        }

        let unit = match prices.get(&item.product_id) {
            Some(wholesale) => {
                has_wholesale_items = true;
                tracing::debug!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    regular = %item.price,
                    wholesale = %wholesale,
                    "Wholesale price applies"
                );
                wholesale.amount()
            }
            None => {
                tracing::debug!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    regular = %item.price,
                    "No wholesale price, using regular"
                );
                item.price
            }
        };

        let line = unit
            .checked_mul(Decimal::from(item.quantity))
            .ok_or(CartError::Overflow)?;
        wholesale_total = wholesale_total
            .checked_add(line)
            .ok_or(CartError::Overflow)?;
    }

    tracing::debug!(
        customer = %customer.email(),
        %cart_total,
        %wholesale_total,
        has_wholesale_items,
        "Cart reconciled"
    );

    if !has_wholesale_items {
        return Ok(Reconciliation::NoDiscountNeeded(
            NoDiscountReason::NoWholesaleItems,
        ));
    }

    let gap = cart_total
        .checked_sub(wholesale_total)
        .ok_or(CartError::Overflow)?;

    // A negative gap means wholesale is dearer than the declared total.
    let Ok(amount) = Money::round(gap) else {
        return Ok(Reconciliation::NoDiscountNeeded(
            NoDiscountReason::WholesaleNotCheaper,
        ));
    };
    if amount.is_zero() {
        return Ok(Reconciliation::NoDiscountNeeded(
            NoDiscountReason::WholesaleNotCheaper,
        ));
    }

    // A sub-cent total can round up past itself (0.005 -> 0.01); clamp at zero.
    let wholesale_total = Money::round(cart_total - amount.amount()).unwrap_or(Money::ZERO);

    Ok(Reconciliation::DiscountRequired {
        amount,
        wholesale_total,
    })
}
