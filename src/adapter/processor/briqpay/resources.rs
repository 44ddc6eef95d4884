use serde::Serialize;
use serde_json::{json, Value as JsnVal};

use crate::config::AppCheckoutCfg;
use crate::model::{CartLineModel, CartModel, ContactModel};

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CartLineWire {
    pub product_type: String,
    pub reference: String,
    pub name: String,
    pub quantity: u32,
    pub quantity_unit: String,
    pub unit_price: i64,
    pub tax_rate: i64,
    pub discount_percentage: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price_inc_vat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_vat_amount: Option<i64>,
}

impl CartLineWire {
    /// session create / update variant, header totals carry the money facts
    pub fn slim(m: &CartLineModel) -> Self {
        Self {
            product_type: m.line_type.wire_label().to_string(),
            reference: m.reference.clone(),
            name: m.name.clone(),
            quantity: m.quantity,
            quantity_unit: m.quantity_unit.clone(),
            unit_price: m.unit_price,
            tax_rate: m.tax_rate,
            discount_percentage: m.discount_percentage,
            unit_price_inc_vat: None,
            total_amount: None,
            total_vat_amount: None,
        }
    }

    /// capture / refund variant, the provider validates per-line totals
    pub fn rich(m: &CartLineModel) -> Self {
        let mut out = Self::slim(m);
        out.unit_price_inc_vat = Some(m.unit_price_inc_vat);
        out.total_amount = Some(m.total_amount());
        out.total_vat_amount = Some(m.total_vat_amount());
        out
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderWire {
    pub currency: String,
    pub amount_inc_vat: i64,
    pub amount_ex_vat: i64,
    pub cart: Vec<CartLineWire>,
}

impl OrderWire {
    pub fn slim(m: &CartModel) -> Self {
        Self {
            currency: m.currency.clone(),
            amount_inc_vat: m.amount_inc_vat,
            amount_ex_vat: m.amount_ex_vat,
            cart: m.lines.iter().map(CartLineWire::slim).collect(),
        }
    }
    pub fn rich(m: &CartModel) -> Self {
        Self {
            currency: m.currency.clone(),
            amount_inc_vat: m.amount_inc_vat,
            amount_ex_vat: m.amount_ex_vat,
            cart: m.lines.iter().map(CartLineWire::rich).collect(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SettlementDataWire {
    pub order: OrderWire,
}

/// body of a capture or refund call, `captureId` is present only for
/// refunds which are scoped to exactly one prior capture
#[derive(Serialize, Debug)]
pub struct SettlementWire {
    #[serde(rename = "captureId", skip_serializing_if = "Option::is_none")]
    pub capture_id: Option<String>,
    pub data: SettlementDataWire,
}

impl SettlementWire {
    pub fn capture(cart: &CartModel) -> Self {
        Self {
            capture_id: None,
            data: SettlementDataWire {
                order: OrderWire::rich(cart),
            },
        }
    }
    pub fn refund(capture_id: String, cart: &CartModel) -> Self {
        Self {
            capture_id: Some(capture_id),
            data: SettlementDataWire {
                order: OrderWire::rich(cart),
            },
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SoftErrorWire {
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct DecisionWire {
    pub decision: &'static str,
    #[serde(rename = "rejectionType", skip_serializing_if = "Option::is_none")]
    pub rejection_type: Option<&'static str>,
    #[serde(rename = "softErrors", skip_serializing_if = "Option::is_none")]
    pub soft_errors: Option<Vec<SoftErrorWire>>,
}

impl DecisionWire {
    pub fn allow() -> Self {
        Self {
            decision: "allow",
            rejection_type: None,
            soft_errors: None,
        }
    }
    /// reject, with buyer-visible retry messages only when the failure
    /// is a recoverable data-quality problem
    pub fn reject(soft_errors: Vec<SoftErrorWire>) -> Self {
        Self {
            decision: "reject",
            rejection_type: Some("notify_user"),
            soft_errors: (!soft_errors.is_empty()).then_some(soft_errors),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ReferencesWire {
    pub references: ReferencesInnerWire,
}

#[derive(Serialize, Debug)]
pub struct ReferencesInnerWire {
    pub reference1: String,
    #[serde(rename = "quoteId")]
    pub quote_id: String,
}

impl ReferencesWire {
    pub fn new(reserved_order_id: String, cart_id: String) -> Self {
        Self {
            references: ReferencesInnerWire {
                reference1: reserved_order_id,
                quote_id: cart_id,
            },
        }
    }
}

/// full session create / update body, returned as a JSON value so the
/// merchant payload-mutation hooks can rework it before it is sent
pub fn compose_session_payload(
    cfg: &AppCheckoutCfg,
    cart_id: &str,
    cart: &CartModel,
    billing: &ContactModel,
    shipping: &ContactModel,
) -> JsnVal {
    let order = OrderWire::slim(cart);
    let customer_type = cfg
        .customer_types
        .first()
        .map(String::as_str)
        .unwrap_or("consumer");
    json!({
        "country": cfg.country,
        "locale": cfg.locale,
        "customerType": customer_type,
        "product": {"type": "payment", "intent": "payment_one_time"},
        "urls": {
            "redirect": cfg.redirect_url,
            "terms": cfg.terms_url,
        },
        "references": {"quoteId": cart_id},
        "data": {
            "order": serde_json::to_value(&order).unwrap_or(JsnVal::Null),
            "billing": billing.to_wire(),
            "shipping": shipping.to_wire(),
        },
        "hooks": [
            {
                "eventType": "order_status",
                "statuses": ["order_pending", "order_rejected", "order_approved_not_captured"],
                "method": "POST",
                "url": cfg.webhook_order_url,
            },
            {
                "eventType": "capture_status",
                "statuses": ["pending", "rejected", "approved"],
                "method": "POST",
                "url": cfg.webhook_capture_url,
            },
        ],
        "modules": {
            "loadModules": ["payment"],
            "config": {"payment": {"decision": {"enabled": true}}},
        },
    })
} // end of fn compose_session_payload
