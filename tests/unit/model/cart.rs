use serde_json::{json, Value as JsnVal};

use checkout_payment::api::web::dto::{CartItemDto, CheckoutCartDto};
use checkout_payment::model::{CartLineType, CartModel, CartModelError};

use crate::ut_setup_checkout_cfg;

fn ut_item_raw(sku: &str, quantity: u32) -> JsnVal {
    json!({
        "item_id": "10087",
        "sku": sku,
        "name": "Alpha Lamp",
        "quantity": quantity,
        "unit_price": "100.00",
        "tax_percent": "25.00"
    })
}

fn ut_cart_dto(items: Vec<JsnVal>, grand_total: &str, with_shipping: bool) -> CheckoutCartDto {
    let shipping = with_shipping.then(|| {
        json!({
            "amount": "50.00",
            "tax_percent": "25.00",
            "tax_amount": "12.50",
            "description": "Standard Delivery"
        })
    });
    let raw = json!({
        "cart_id": "cart-00481",
        "currency": "SEK",
        "base_currency": "SEK",
        "currency_rate": "1.0000",
        "grand_total": grand_total,
        "items": items,
        "shipping": shipping,
    });
    serde_json::from_value::<CheckoutCartDto>(raw).unwrap()
}

#[test]
fn build_product_and_shipping_lines() {
    let cfg = ut_setup_checkout_cfg();
    let dto = ut_cart_dto(vec![ut_item_raw("SKU-001", 2)], "312.50", true);
    let result = CartModel::try_build(&cfg, &dto);
    assert!(result.is_ok());
    if let Ok(cart_m) = result {
        assert_eq!(cart_m.lines.len(), 2);
        let product = &cart_m.lines[0];
        assert_eq!(product.line_type, CartLineType::Physical);
        assert_eq!(product.reference.as_str(), "SKU-001");
        assert_eq!(product.quantity, 2);
        assert_eq!(product.unit_price, 10000);
        assert_eq!(product.tax_rate, 2500);
        assert_eq!(product.unit_price_inc_vat, 12500);
        let shipfee = &cart_m.lines[1];
        assert_eq!(shipfee.line_type, CartLineType::ShippingFee);
        assert_eq!(shipfee.unit_price, 5000);
        assert_eq!(shipfee.tax_rate, 2500);
        assert_eq!(shipfee.unit_price_inc_vat, 6250);
        assert_eq!(cart_m.amount_inc_vat, 31250);
        assert_eq!(cart_m.amount_ex_vat, 25000);
    }
} // end of fn build_product_and_shipping_lines

#[test]
fn shipping_rate_derived_from_tax_amount() {
    let cfg = ut_setup_checkout_cfg();
    let mut dto = ut_cart_dto(vec![ut_item_raw("SKU-001", 2)], "312.50", true);
    // some tax setups report a zero percent alongside a real tax amount
    let fee = dto.shipping.as_mut().unwrap();
    fee.tax_percent = Some("0".to_string());
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    let shipfee = &cart_m.lines[1];
    assert_eq!(shipfee.tax_rate, 2500);
    assert_eq!(shipfee.unit_price_inc_vat, 6250);
}

#[test]
fn discount_line_negated_with_compensation() {
    let cfg = ut_setup_checkout_cfg();
    let mut item = ut_item_raw("SKU-001", 2);
    item.as_object_mut().unwrap().insert(
        "discount_inc_vat".to_string(),
        JsnVal::String("25.00".to_string()),
    );
    item.as_object_mut().unwrap().insert(
        "discount_tax_compensation".to_string(),
        JsnVal::String("5.00".to_string()),
    );
    let dto = ut_cart_dto(vec![item], "220.00", false);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    assert_eq!(cart_m.lines.len(), 2);
    let discount = &cart_m.lines[1];
    assert_eq!(discount.line_type, CartLineType::Discount);
    assert_eq!(discount.reference.as_str(), "SKU-001_discount");
    assert_eq!(discount.quantity, 1);
    assert_eq!(discount.unit_price, -2400);
    assert_eq!(discount.unit_price_inc_vat, -3000);
    // 25000 product total minus the inclusive discount
    assert_eq!(cart_m.amount_inc_vat, 22000);
}

#[test]
fn weee_line_respects_taxable_flag() {
    let cfg = ut_setup_checkout_cfg();
    let mut item = ut_item_raw("SKU-001", 2);
    item.as_object_mut().unwrap().insert(
        "weee_applied".to_string(),
        JsnVal::String("10.00".to_string()),
    );
    item.as_object_mut()
        .unwrap()
        .insert("weee_taxable".to_string(), JsnVal::Bool(true));
    let dto = ut_cart_dto(vec![item.clone()], "275.00", false);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    let weee = &cart_m.lines[1];
    assert_eq!(weee.line_type, CartLineType::Surcharge);
    assert_eq!(weee.reference.as_str(), "SKU-001_weee_tax");
    assert_eq!(weee.quantity, 2);
    assert_eq!(weee.unit_price, 1000);
    assert_eq!(weee.tax_rate, 2500);
    assert_eq!(weee.unit_price_inc_vat, 1250);

    item.as_object_mut()
        .unwrap()
        .insert("weee_taxable".to_string(), JsnVal::Bool(false));
    let dto = ut_cart_dto(vec![item], "270.00", false);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    let weee = &cart_m.lines[1];
    assert_eq!(weee.tax_rate, 0);
    assert_eq!(weee.unit_price_inc_vat, 1000);
}

#[test]
fn weee_skipped_when_surcharge_disabled() {
    let mut cfg = ut_setup_checkout_cfg();
    cfg.weee_surcharge_enable = false;
    let mut item = ut_item_raw("SKU-001", 2);
    item.as_object_mut().unwrap().insert(
        "weee_applied".to_string(),
        JsnVal::String("10.00".to_string()),
    );
    let dto = ut_cart_dto(vec![item], "250.00", false);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    assert_eq!(cart_m.lines.len(), 1);
    assert_eq!(cart_m.amount_inc_vat, 25000);
}

#[test]
fn strict_rounding_adds_synthetic_line() {
    let mut cfg = ut_setup_checkout_cfg();
    cfg.strict_rounding = true;
    let dto = ut_cart_dto(vec![ut_item_raw("SKU-001", 2)], "312.49", true);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    assert_eq!(cart_m.lines.len(), 3);
    let rounding = &cart_m.lines[2];
    assert_eq!(rounding.reference.as_str(), "rounding");
    assert_eq!(rounding.unit_price_inc_vat, -1);
    // line sums match the storefront header again
    assert_eq!(cart_m.amount_inc_vat, 31249);
}

#[test]
fn residual_beyond_tolerance_rejected() {
    let cfg = ut_setup_checkout_cfg();
    // one minor unit off stays within the configured tolerance
    let dto = ut_cart_dto(vec![ut_item_raw("SKU-001", 2)], "312.49", true);
    assert!(CartModel::try_build(&cfg, &dto).is_ok());
    let dto = ut_cart_dto(vec![ut_item_raw("SKU-001", 2)], "312.40", true);
    let result = CartModel::try_build(&cfg, &dto);
    assert!(result.is_err());
    if let Err(CartModelError::RoundingResidual { header, line_sum }) = result {
        assert_eq!(header, 31240);
        assert_eq!(line_sum, 31250);
    } else {
        assert!(false);
    }
}

#[test]
fn long_sku_truncated_before_suffix() {
    let cfg = ut_setup_checkout_cfg();
    let long_sku = "B".repeat(70);
    let mut item = ut_item_raw(long_sku.as_str(), 1);
    item.as_object_mut().unwrap().insert(
        "discount_inc_vat".to_string(),
        JsnVal::String("25.00".to_string()),
    );
    let dto = ut_cart_dto(vec![item], "100.00", false);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    let product = &cart_m.lines[0];
    assert_eq!(product.reference.len(), 64);
    let discount = &cart_m.lines[1];
    assert!(discount.reference.starts_with(&"B".repeat(64)));
    assert!(discount.reference.ends_with("_discount"));
}

#[test]
fn empty_cart_rejected() {
    let cfg = ut_setup_checkout_cfg();
    let dto = ut_cart_dto(Vec::new(), "0.00", false);
    let result = CartModel::try_build(&cfg, &dto);
    assert!(matches!(result, Err(CartModelError::EmptyCart)));
}

#[test]
fn virtual_item_maps_to_digital_line() {
    let cfg = ut_setup_checkout_cfg();
    let mut item = ut_item_raw("EBOOK-01", 1);
    item.as_object_mut()
        .unwrap()
        .insert("is_virtual".to_string(), JsnVal::Bool(true));
    let dto = ut_cart_dto(vec![item], "125.00", false);
    let cart_m = CartModel::try_build(&cfg, &dto).unwrap();
    assert_eq!(cart_m.lines[0].line_type, CartLineType::Digital);
}

#[test]
fn line_totals_derived_from_unit_amounts() {
    let raw = ut_item_raw("SKU-001", 3);
    let item = serde_json::from_value::<CartItemDto>(raw).unwrap();
    let currency = checkout_payment::model::CurrencyContextModel::try_build(
        "SEK".to_string(),
        "SEK".to_string(),
        "1.0",
    )
    .unwrap();
    let line =
        checkout_payment::model::CartLineModel::product_item(&item, 3, &currency).unwrap();
    assert_eq!(line.total_amount(), 37500);
    assert_eq!(line.total_ex_vat(), 30000);
    assert_eq!(line.total_vat_amount(), 7500);
}
