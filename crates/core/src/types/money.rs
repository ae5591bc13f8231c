//! Non-negative currency amounts at cent precision.
//!
//! Every amount that crosses a boundary (admin price input, cart lines, cart
//! totals, discount values sent to Shopify) is normalized to two decimal
//! places with [`RoundingStrategy::MidpointAwayFromZero`], so `0.125` becomes
//! `0.13`. Arithmetic in between is done on the raw [`Decimal`] and rounded
//! once at the end with [`Money::round`].

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative monetary amount with exactly two decimal places.
///
/// Serializes as a string (`"15.00"`) so JSON consumers never see float
/// drift. Deserializes from either a JSON string or number.
///
/// ```
/// use peachtree_core::Money;
/// use rust_decimal::Decimal;
///
/// let m = Money::round(Decimal::new(1_5005, 3)).unwrap(); // 15.005
/// assert_eq!(m.to_string(), "15.01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money(Decimal);

impl Money {
    /// Number of decimal places kept.
    pub const SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Round `amount` to cents (half away from zero).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if the rounded amount is below zero.
    pub fn round(amount: Decimal) -> Result<Self, MoneyError> {
        let mut rounded =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(MoneyError::Negative(rounded));
        }
        rounded.set_sign_positive(true);
        rounded.rescale(Self::SCALE);
        Ok(Self(rounded))
    }

    /// Build from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), Self::SCALE))
    }

    /// The underlying decimal (always scale 2).
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The amount as digits only, e.g. `15.00` -> `"1500"`.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.to_string().replace('.', "")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::round(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::round(raw).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a non-negative [`Decimal`] at full precision.
///
/// For amounts the storefront reports (cart line prices, cart totals), which
/// must not be rounded before they are compared. Use with
/// `#[serde(deserialize_with = "peachtree_core::non_negative_decimal")]`.
///
/// # Errors
///
/// Fails if the input is not a decimal or is below zero.
pub fn non_negative_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Decimal, D::Error> {
    let raw = <Decimal as Deserialize>::deserialize(deserializer)?;
    if raw.is_sign_negative() && !raw.is_zero() {
        return Err(serde::de::Error::custom(MoneyError::Negative(raw)));
    }
    Ok(raw)
}

// SQLx support (with postgres feature), stored as NUMERIC(12,2)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::round(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Money::round(Decimal::new(125, 3)).unwrap().to_string(), "0.13");
        assert_eq!(Money::round(Decimal::new(124, 3)).unwrap().to_string(), "0.12");
        assert_eq!(Money::round(Decimal::new(135, 3)).unwrap().to_string(), "0.14");
    }

    #[test]
    fn test_round_pads_scale() {
        assert_eq!(Money::round(Decimal::from(15)).unwrap().to_string(), "15.00");
        assert_eq!(Money::round(Decimal::new(155, 1)).unwrap().to_string(), "15.50");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Money::round(Decimal::new(-1, 2)),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_negative_that_rounds_to_zero_is_zero() {
        let m = Money::round(Decimal::new(-1, 3)).unwrap();
        assert!(m.is_zero());
        assert_eq!(m.to_string(), "0.00");
    }

    #[test]
    fn test_digits() {
        assert_eq!(Money::from_cents(1500).digits(), "1500");
        assert_eq!(Money::from_cents(5).digits(), "005");
    }

    #[test]
    fn test_serde_accepts_number_and_string() {
        let from_number: Money = serde_json::from_str("29.99").unwrap();
        let from_string: Money = serde_json::from_str("\"29.99\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"29.99\"");
    }

    #[test]
    fn test_serde_rejects_negative() {
        assert!(serde_json::from_str::<Money>("-3").is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Total {
        #[serde(deserialize_with = "non_negative_decimal")]
        total: Decimal,
    }

    #[test]
    fn test_non_negative_decimal_keeps_precision() {
        let parsed: Total = serde_json::from_str(r#"{"total": "16.005"}"#).unwrap();
        assert_eq!(parsed.total, Decimal::new(16_005, 3));

        let parsed: Total = serde_json::from_str(r#"{"total": 45}"#).unwrap();
        assert_eq!(parsed.total, Decimal::from(45));
    }

    #[test]
    fn test_non_negative_decimal_rejects_negative() {
        assert!(serde_json::from_str::<Total>(r#"{"total": "-0.001"}"#).is_err());
        assert!(serde_json::from_str::<Total>(r#"{"total": "0"}"#).is_ok());
    }
}
