use serde_json::{json, Value as JsnVal};

use checkout_payment::api::web::dto::{AddressDto, CheckoutCartDto};
use checkout_payment::model::ContactModel;

fn ut_address_raw() -> JsnVal {
    json!({
        "street": ["Kungsgatan 1", "Apt 2"],
        "zip": "11143",
        "city": "Stockholm",
        "region": "Stockholms l\u{00e4}n",
        "first_name": "Tove",
        "last_name": "Berg",
        "email": "tove@example.se",
        "phone_number": "+4681234567"
    })
}

fn ut_cart_raw(customer_email: Option<&str>, registered_email: Option<&str>) -> CheckoutCartDto {
    let raw = json!({
        "cart_id": "cart-00481",
        "currency": "SEK",
        "base_currency": "SEK",
        "currency_rate": "1.0",
        "grand_total": "312.50",
        "items": [],
        "customer_email": customer_email,
        "registered_email": registered_email,
    });
    serde_json::from_value::<CheckoutCartDto>(raw).unwrap()
}

#[test]
fn resolve_full_address() {
    let addr = serde_json::from_value::<AddressDto>(ut_address_raw()).unwrap();
    let cart = ut_cart_raw(None, None);
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    assert_eq!(contact.street_address.as_str(), "Kungsgatan 1");
    assert_eq!(contact.street_address2.as_str(), "Apt 2");
    assert_eq!(contact.zip.as_str(), "11143");
    assert_eq!(contact.email.as_str(), "tove@example.se");
    assert!(contact.missing_fields().is_empty());
}

#[test]
fn email_resolution_walks_the_chain() {
    let mut raw = ut_address_raw();
    raw.as_object_mut()
        .unwrap()
        .insert("email".to_string(), JsnVal::Null);
    let addr = serde_json::from_value::<AddressDto>(raw).unwrap();
    // address record empty, cart-level customer email wins
    let cart = ut_cart_raw(Some("quote@example.se"), Some("account@example.se"));
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    assert_eq!(contact.email.as_str(), "quote@example.se");
    // then the registered-account email
    let cart = ut_cart_raw(None, Some("account@example.se"));
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    assert_eq!(contact.email.as_str(), "account@example.se");
    // finally the guest fallback carried by the caller
    let cart = ut_cart_raw(None, None);
    let contact = ContactModel::resolve(Some(&addr), &cart, Some("guest@example.se"));
    assert_eq!(contact.email.as_str(), "guest@example.se");
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    assert!(contact.email.is_empty());
}

#[test]
fn missing_address_still_resolves_email() {
    let cart = ut_cart_raw(Some("quote@example.se"), None);
    let contact = ContactModel::resolve(None, &cart, None);
    assert_eq!(contact.email.as_str(), "quote@example.se");
    let missing = contact.missing_fields();
    assert!(missing.contains(&"streetAddress"));
    assert!(missing.contains(&"zip"));
    assert!(!missing.contains(&"email"));
}

#[test]
fn snapshot_comparison_ignores_provider_owned_keys() {
    let addr = serde_json::from_value::<AddressDto>(ut_address_raw()).unwrap();
    let cart = ut_cart_raw(None, None);
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    let snapshot = json!({
        "streetAddress": "Kungsgatan 1",
        "streetAddress2": "Apt 2",
        "zip": "11143",
        "city": "Stockholm",
        "region": "different-region-label",
        "firstName": "Tove",
        "lastName": "Berg",
        "email": "tove@example.se",
        "phoneNumber": "+4681234567",
        "country": "SE",
        "companyName": "ACME AB",
        "cin": "5560360793"
    });
    assert!(contact.matches_snapshot(&snapshot));
}

#[test]
fn snapshot_mismatch_on_buyer_edited_field() {
    let addr = serde_json::from_value::<AddressDto>(ut_address_raw()).unwrap();
    let cart = ut_cart_raw(None, None);
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    let snapshot = json!({
        "streetAddress": "Drottninggatan 9",
        "streetAddress2": "Apt 2",
        "zip": "11143",
        "city": "Stockholm",
        "firstName": "Tove",
        "lastName": "Berg",
        "email": "tove@example.se",
        "phoneNumber": "+4681234567"
    });
    assert!(!contact.matches_snapshot(&snapshot));
    // a null snapshot matches nothing with actual address data
    assert!(!contact.matches_snapshot(&JsnVal::Null));
}

#[test]
fn wire_object_carries_every_field() {
    let addr = serde_json::from_value::<AddressDto>(ut_address_raw()).unwrap();
    let cart = ut_cart_raw(None, None);
    let contact = ContactModel::resolve(Some(&addr), &cart, None);
    let wire = contact.to_wire();
    let obj = wire.as_object().unwrap();
    assert_eq!(obj.len(), 9);
    assert_eq!(
        obj.get("streetAddress").unwrap().as_str().unwrap(),
        "Kungsgatan 1"
    );
    assert_eq!(obj.get("email").unwrap().as_str().unwrap(), "tove@example.se");
}
