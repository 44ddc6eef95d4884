use serde_json::json;

use checkout_payment::api::web::dto::{
    CaptureStatusWebhookDto, CheckoutCartDto, OrderStatusWebhookDto,
};

#[test]
fn order_webhook_camel_case_fields() {
    let raw = json!({
        "quoteId": "cart-00481",
        "sessionId": "sess-9f2a",
        "event": "order_status"
    });
    let parsed = serde_json::from_value::<OrderStatusWebhookDto>(raw).unwrap();
    assert_eq!(parsed.cart_id.as_str(), "cart-00481");
    assert_eq!(parsed.session_id.as_str(), "sess-9f2a");
    assert_eq!(parsed.event.as_deref(), Some("order_status"));
}

#[test]
fn capture_webhook_auto_captured_defaults_off() {
    let raw = json!({
        "sessionId": "sess-9f2a",
        "captureId": "cap-0661"
    });
    let parsed = serde_json::from_value::<CaptureStatusWebhookDto>(raw).unwrap();
    assert!(parsed.cart_id.is_none());
    assert_eq!(parsed.capture_id.as_str(), "cap-0661");
    assert!(!parsed.auto_captured);

    let raw = json!({
        "quoteId": "cart-00481",
        "sessionId": "sess-9f2a",
        "captureId": "cap-0661",
        "autoCaptured": true
    });
    let parsed = serde_json::from_value::<CaptureStatusWebhookDto>(raw).unwrap();
    assert!(parsed.auto_captured);
}

#[test]
fn checkout_cart_converted_defaults_off() {
    let raw = json!({
        "cart_id": "cart-00481",
        "currency": "SEK",
        "base_currency": "SEK",
        "currency_rate": "1.0",
        "grand_total": "312.50",
        "items": [],
        "shipping": null,
        "billing_address": null,
        "shipping_address": null,
        "customer_email": null,
        "registered_email": null,
        "reserved_order_id": null
    });
    let parsed = serde_json::from_value::<CheckoutCartDto>(raw).unwrap();
    assert!(!parsed.converted);
    assert!(parsed.items.is_empty());
}
