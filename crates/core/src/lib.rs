//! PeachTree Core - Shared types library.
//!
//! This crate provides common types used across all PeachTree components:
//! - `wholesale` - Wholesale pricing service (admin page, theme API, checkout)
//! - `cli` - Command-line tools for migrations and directory management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for customer emails, product IDs, Shopify IDs, and money

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
