use serde_json::json;

use checkout_payment::adapter::processor::{
    compose_session_payload, DecisionWire, ReferencesWire, SettlementWire, SoftErrorWire,
};
use checkout_payment::api::web::dto::CheckoutCartDto;
use checkout_payment::model::{CartModel, ContactModel};

use crate::ut_setup_checkout_cfg;

fn ut_cart_model() -> CartModel {
    let cfg = ut_setup_checkout_cfg();
    let raw = json!({
        "cart_id": "cart-00481",
        "currency": "SEK",
        "base_currency": "SEK",
        "currency_rate": "1.0",
        "grand_total": "312.50",
        "items": [{
            "item_id": "10087",
            "sku": "SKU-001",
            "name": "Alpha Lamp",
            "quantity": 2,
            "unit_price": "100.00",
            "tax_percent": "25.00"
        }],
        "shipping": {
            "amount": "50.00",
            "tax_percent": "25.00",
            "description": "Standard Delivery"
        }
    });
    let dto = serde_json::from_value::<CheckoutCartDto>(raw).unwrap();
    CartModel::try_build(&cfg, &dto).unwrap()
}

#[test]
fn decision_wire_shapes() {
    let wire = DecisionWire::allow();
    let serial = serde_json::to_value(&wire).unwrap();
    assert_eq!(serial, json!({"decision": "allow"}));

    let wire = DecisionWire::reject(Vec::new());
    let serial = serde_json::to_value(&wire).unwrap();
    assert_eq!(
        serial,
        json!({"decision": "reject", "rejectionType": "notify_user"})
    );

    let wire = DecisionWire::reject(vec![SoftErrorWire {
        message: "Email address is missing".to_string(),
    }]);
    let serial = serde_json::to_value(&wire).unwrap();
    assert_eq!(
        serial.pointer("/softErrors/0/message").unwrap().as_str(),
        Some("Email address is missing")
    );
}

#[test]
fn settlement_wire_capture_vs_refund() {
    let cart_m = ut_cart_model();
    let capture = serde_json::to_value(SettlementWire::capture(&cart_m)).unwrap();
    assert!(capture.get("captureId").is_none());
    assert_eq!(
        capture.pointer("/data/order/amountIncVat").unwrap().as_i64(),
        Some(31250)
    );
    // settlement lines carry the per-line totals the provider validates
    assert_eq!(
        capture.pointer("/data/order/cart/0/totalAmount").unwrap().as_i64(),
        Some(25000)
    );
    assert_eq!(
        capture
            .pointer("/data/order/cart/0/totalVatAmount")
            .unwrap()
            .as_i64(),
        Some(5000)
    );

    let refund =
        serde_json::to_value(SettlementWire::refund("cap-0661".to_string(), &cart_m)).unwrap();
    assert_eq!(
        refund.get("captureId").unwrap().as_str(),
        Some("cap-0661")
    );
}

#[test]
fn session_payload_structure() {
    let cfg = ut_setup_checkout_cfg();
    let cart_m = ut_cart_model();
    let billing = ContactModel {
        email: "tove@example.se".to_string(),
        ..ContactModel::default()
    };
    let shipping = billing.clone();
    let payload = compose_session_payload(&cfg, "cart-00481", &cart_m, &billing, &shipping);
    assert_eq!(payload.get("country").unwrap().as_str(), Some("SE"));
    assert_eq!(
        payload.get("customerType").unwrap().as_str(),
        Some("consumer")
    );
    assert_eq!(
        payload.pointer("/references/quoteId").unwrap().as_str(),
        Some("cart-00481")
    );
    assert_eq!(
        payload.pointer("/data/order/amountIncVat").unwrap().as_i64(),
        Some(31250)
    );
    // session lines omit the totals reserved for settlement calls
    assert!(payload
        .pointer("/data/order/cart/0/totalAmount")
        .is_none());
    assert_eq!(
        payload.pointer("/data/billing/email").unwrap().as_str(),
        Some("tove@example.se")
    );
    let hooks = payload.get("hooks").unwrap().as_array().unwrap();
    assert_eq!(hooks.len(), 2);
    assert_eq!(
        hooks[0].get("url").unwrap().as_str(),
        Some("https://shop.example.se/hook/order-status")
    );
    assert_eq!(
        hooks[1].get("url").unwrap().as_str(),
        Some("https://shop.example.se/hook/capture-status")
    );
}

#[test]
fn order_references_wire() {
    let wire = ReferencesWire::new("100000023".to_string(), "cart-00481".to_string());
    let serial = serde_json::to_value(&wire).unwrap();
    assert_eq!(
        serial.pointer("/references/reference1").unwrap().as_str(),
        Some("100000023")
    );
    assert_eq!(
        serial.pointer("/references/quoteId").unwrap().as_str(),
        Some("cart-00481")
    );
}
