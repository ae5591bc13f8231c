//! Shopify Admin REST payloads for price rules and discount codes.
//!
//! Only the fields the wholesale flow sends or reads are modelled. Responses
//! are kept as raw JSON until the id is extracted, so a malformed body can be
//! reported upstream verbatim.

use chrono::{DateTime, Utc};
use peachtree_core::Money;
use serde::Serialize;

/// What a price rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    LineItem,
}

/// Which targets the rule selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelection {
    All,
}

/// How the value is spread over the selected targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    Across,
}

/// Kind of value the rule carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    FixedAmount,
}

/// Which customers may redeem the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSelection {
    All,
}

/// Body of `POST /price_rules.json` (inside the `price_rule` envelope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPriceRule {
    pub title: String,
    pub target_type: TargetType,
    pub target_selection: TargetSelection,
    pub allocation_method: AllocationMethod,
    pub value_type: ValueType,
    /// Signed decimal string; discounts are negative (`"-15.00"`).
    pub value: String,
    pub customer_selection: CustomerSelection,
    pub once_per_customer: bool,
    pub usage_limit: Option<u32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewPriceRule {
    /// A single-use, fixed-amount rule across all line items.
    #[must_use]
    pub fn single_use_fixed_amount(
        title: impl Into<String>,
        amount: Money,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            target_type: TargetType::LineItem,
            target_selection: TargetSelection::All,
            allocation_method: AllocationMethod::Across,
            value_type: ValueType::FixedAmount,
            value: format!("-{amount}"),
            customer_selection: CustomerSelection::All,
            once_per_customer: false,
            usage_limit: Some(1),
            starts_at,
            ends_at: Some(ends_at),
        }
    }
}

/// Body of `POST /price_rules/{id}/discount_codes.json` (inside the
/// `discount_code` envelope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDiscountCode {
    pub code: String,
    pub usage_count: u32,
}

impl NewDiscountCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            usage_count: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PriceRuleEnvelope<'a> {
    pub price_rule: &'a NewPriceRule,
}

#[derive(Debug, Serialize)]
pub(crate) struct DiscountCodeEnvelope<'a> {
    pub discount_code: &'a NewDiscountCode,
}

/// Pull `{resource}.id` out of a REST response body.
pub(crate) fn resource_id(body: &serde_json::Value, resource: &str) -> Option<i64> {
    body.get(resource)?.get("id")?.as_i64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_price_rule_body() {
        let starts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ends = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let rule = NewPriceRule::single_use_fixed_amount(
            "Wholesale Discount - a@b.com",
            Money::from_cents(1500),
            starts,
            ends,
        );

        let body = serde_json::to_value(PriceRuleEnvelope { price_rule: &rule }).unwrap();

        assert_eq!(
            body,
            json!({
                "price_rule": {
                    "title": "Wholesale Discount - a@b.com",
                    "target_type": "line_item",
                    "target_selection": "all",
                    "allocation_method": "across",
                    "value_type": "fixed_amount",
                    "value": "-15.00",
                    "customer_selection": "all",
                    "once_per_customer": false,
                    "usage_limit": 1,
                    "starts_at": "2025-01-01T00:00:00Z",
                    "ends_at": "2025-01-02T00:00:00Z"
                }
            })
        );
    }

    #[test]
    fn test_discount_code_body() {
        let code = NewDiscountCode::new("WS-ABCOM-1500-1-0");
        let body = serde_json::to_value(DiscountCodeEnvelope {
            discount_code: &code,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"discount_code": {"code": "WS-ABCOM-1500-1-0", "usage_count": 0}})
        );
    }

    #[test]
    fn test_resource_id() {
        let body = json!({"price_rule": {"id": 507_328_175, "title": "x"}});
        assert_eq!(resource_id(&body, "price_rule"), Some(507_328_175));
        assert_eq!(resource_id(&body, "discount_code"), None);
        assert_eq!(resource_id(&json!({"price_rule": {}}), "price_rule"), None);
        assert_eq!(
            resource_id(&json!({"price_rule": {"id": "abc"}}), "price_rule"),
            None
        );
    }
}
