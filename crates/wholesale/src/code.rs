//! Discount code generation.
//!
//! Codes look like `WS-BUYERSHO-1500-1735689600000-1A`:
//!
//! ```text
//! {PREFIX}-{IDENT}-{AMOUNT}-{MILLIS}-{SEQ}
//! ```
//!
//! `IDENT` is the customer's email reduced to ASCII alphanumerics, uppercased
//! and cut to eight characters. `AMOUNT` is the discount in cents. `SEQ` is a
//! per-generator counter in base 36, so two codes from the same generator
//! never collide even within one millisecond.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use peachtree_core::{Email, Money};

/// Length of the identity segment.
const IDENT_LEN: usize = 8;

/// Used when an email has no alphanumeric characters at all.
const FALLBACK_IDENT: &str = "CUSTOMER";

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces unique discount codes.
pub struct CodeGenerator {
    prefix: String,
    sequence: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("prefix", &self.prefix)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl CodeGenerator {
    /// Create a generator with the given prefix and clock.
    #[must_use]
    pub fn new(prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            prefix: prefix.into(),
            sequence: AtomicU64::new(0),
            clock,
        }
    }

    /// The clock codes are stamped with.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Generate the next code for `email` and `amount`.
    pub fn generate(&self, email: &Email, amount: Money) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let millis = self.clock.now().timestamp_millis();

        format!(
            "{}-{}-{}-{}-{}",
            self.prefix,
            identity_segment(email),
            amount.digits(),
            millis,
            to_base36(seq)
        )
    }
}

fn identity_segment(email: &Email) -> String {
    let ident: String = email
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(IDENT_LEN)
        .collect();

    if ident.is_empty() {
        FALLBACK_IDENT.to_string()
    } else {
        ident
    }
}

fn to_base36(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        let digit = u32::try_from(n % 36)
            .ok()
            .and_then(|d| char::from_digit(d, 36))
            .unwrap_or('0');
        digits.push(digit.to_ascii_uppercase());
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}
