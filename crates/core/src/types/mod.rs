//! Core types for PeachTree.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod product;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError, non_negative_decimal};
pub use product::{ProductId, ProductIdError};
