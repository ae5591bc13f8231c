//! End-to-end checkout tests against a fake Shopify Admin API.

use std::sync::Arc;
use std::time::Duration;

use peachtree_integration_tests::{ACCESS_TOKEN, ShopifyBehavior, TestContext};
use peachtree_wholesale::directory::InMemoryDirectory;
use reqwest::StatusCode;
use serde_json::json;

fn scenario_a_cart(email: &str) -> serde_json::Value {
    json!({
        "customerEmail": email,
        "cartItems": [{"product_id": "P1", "quantity": 3, "price": 15}],
        "cartTotal": 45
    })
}

#[tokio::test]
async fn test_wholesale_customer_gets_discount_code() {
    let ctx = TestContext::start(ShopifyBehavior::Succeed).await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requiresDiscount"], true);
    assert_eq!(body["discountAmount"], "15.00");
    assert_eq!(body["wholesaleTotal"], "30.00");

    let code = body["discountCode"].as_str().unwrap();
    assert!(code.starts_with("WS-ABCOM-1500-"), "unexpected code {code}");
    assert_eq!(body["checkoutUrl"], format!("/checkout?discount={code}"));

    let requests = ctx.shopify.requests();
    assert_eq!(requests.len(), 2);

    let rule = &requests[0];
    assert_eq!(rule.path, "/price_rules.json");
    assert_eq!(rule.access_token.as_deref(), Some(ACCESS_TOKEN));
    assert_eq!(rule.body["price_rule"]["title"], "Wholesale Discount - a@b.com");
    assert_eq!(rule.body["price_rule"]["value"], "-15.00");
    assert_eq!(rule.body["price_rule"]["value_type"], "fixed_amount");
    assert_eq!(rule.body["price_rule"]["target_type"], "line_item");
    assert_eq!(rule.body["price_rule"]["allocation_method"], "across");
    assert_eq!(rule.body["price_rule"]["usage_limit"], 1);

    let discount = &requests[1];
    assert_eq!(discount.path, "/price_rules/1000001/discount_codes.json");
    assert_eq!(discount.access_token.as_deref(), Some(ACCESS_TOKEN));
    assert_eq!(discount.body["discount_code"]["code"], code);
    assert_eq!(discount.body["discount_code"]["usage_count"], 0);
}

#[tokio::test]
async fn test_cart_without_wholesale_products_checks_out_normally() {
    let ctx = TestContext::start(ShopifyBehavior::Succeed).await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx
        .checkout(&json!({
            "customerEmail": "a@b.com",
            "cartItems": [{"product_id": "P2", "quantity": 1, "price": 20}],
            "cartTotal": 20
        }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"requiresDiscount": false, "checkoutUrl": "/checkout"})
    );
    assert!(ctx.shopify.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_customer_is_forbidden_without_side_effects() {
    let ctx = TestContext::start(ShopifyBehavior::Succeed).await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("x@y.com")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Not a wholesale customer"}));
    assert!(ctx.shopify.requests().is_empty());

    let customers: serde_json::Value = ctx
        .get("/api/wholesale-customers")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(customers, json!(["a@b.com"]));
}

#[tokio::test]
async fn test_wholesale_price_equal_to_regular_needs_no_discount() {
    let ctx = TestContext::start(ShopifyBehavior::Succeed).await;
    ctx.seed("a@b.com", &[("P1", "15.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requiresDiscount"], false);
    assert!(ctx.shopify.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_price_rule_returns_upstream_details() {
    let ctx = TestContext::start(ShopifyBehavior::RejectPriceRule).await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create discount code");
    assert_eq!(body["details"]["step"], "create_price_rule");
    assert_eq!(body["details"]["upstream"]["status"], 422);
    assert_eq!(
        body["details"]["upstream"]["body"]["errors"]["value"][0],
        "must be less than or equal to 0"
    );
    assert_eq!(ctx.shopify.requests().len(), 1);
}

#[tokio::test]
async fn test_failed_discount_code_reports_orphaned_price_rule() {
    let ctx = TestContext::start(ShopifyBehavior::RejectDiscountCode).await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"]["step"], "create_discount_code");
    assert_eq!(body["details"]["priceRuleId"], 1_000_001);
    assert!(body.get("discountCode").is_none());
    assert_eq!(ctx.shopify.requests().len(), 2);
}

#[tokio::test]
async fn test_price_rule_without_id_fails_before_second_call() {
    let ctx = TestContext::start(ShopifyBehavior::OmitPriceRuleId).await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"]["step"], "create_price_rule");
    assert_eq!(
        body["details"]["upstream"]["body"]["price_rule"]["title"],
        "Wholesale Discount - a@b.com"
    );
    assert_eq!(ctx.shopify.requests().len(), 1);
}

#[tokio::test]
async fn test_stalled_shopify_times_out() {
    let ctx = TestContext::start_with(
        ShopifyBehavior::Stall,
        Arc::new(InMemoryDirectory::new()),
        Duration::from_millis(300),
    )
    .await;
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"]["upstream"]["error"], "request timed out");
}

#[tokio::test]
async fn test_concurrent_checkouts_get_distinct_codes() {
    let ctx = Arc::new(TestContext::start(ShopifyBehavior::Succeed).await);
    ctx.seed("a@b.com", &[("P1", "10.00")]).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move {
            let (status, body) = ctx.checkout(&scenario_a_cart("a@b.com")).await;
            assert_eq!(status, StatusCode::OK);
            body["discountCode"].as_str().unwrap().to_string()
        }));
    }

    let mut codes = std::collections::HashSet::new();
    for handle in handles {
        assert!(codes.insert(handle.await.unwrap()));
    }
    assert_eq!(codes.len(), 20);
}
