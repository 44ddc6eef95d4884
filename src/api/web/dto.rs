use serde::{Deserialize, Serialize};

// ---- storefront-facing request payloads ----
// monetary fields travel as decimal strings in major units, scaling to
// the provider's integer minor units happens in the model layer

#[derive(Deserialize, Clone)]
pub struct AddressDto {
    pub street: Vec<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct CartItemDto {
    // merchant-side line-item identifier, keyed by the capture ledger
    pub item_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub tax_percent: String,
    pub discount_inc_vat: Option<String>,
    pub discount_tax_compensation: Option<String>,
    pub weee_applied: Option<String>,
    #[serde(default)]
    pub weee_taxable: bool,
    #[serde(default)]
    pub is_virtual: bool,
}

#[derive(Deserialize, Clone)]
pub struct ShippingFeeDto {
    pub amount: String,
    pub tax_percent: Option<String>,
    pub tax_amount: Option<String>,
    pub description: String,
}

#[derive(Deserialize, Clone)]
pub struct CheckoutCartDto {
    pub cart_id: String,
    pub currency: String,
    pub base_currency: String,
    pub currency_rate: String,
    pub grand_total: String,
    pub items: Vec<CartItemDto>,
    pub shipping: Option<ShippingFeeDto>,
    pub billing_address: Option<AddressDto>,
    pub shipping_address: Option<AddressDto>,
    pub customer_email: Option<String>,
    pub registered_email: Option<String>,
    pub reserved_order_id: Option<String>,
    // whether the storefront already submitted this cart to an order
    #[serde(default)]
    pub converted: bool,
}

#[derive(Deserialize)]
pub struct SessionBootstrapReqDto {
    pub cart: CheckoutCartDto,
    // base64-encoded guest email carried by the widget for flows where
    // no customer record exists yet
    pub guest_email_hash: Option<String>,
}

#[derive(Serialize)]
pub struct SessionBootstrapRespDto {
    pub session_id: String,
    pub html_snippet: String,
}

#[derive(Deserialize)]
pub struct DecisionReqDto {
    pub session_id: String,
    pub cart: CheckoutCartDto,
    pub guest_email_hash: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum DecisionLabelDto {
    #[serde(rename = "allow")]
    Allow,
    #[serde(rename = "reject")]
    Reject,
}

#[derive(Serialize)]
pub struct DecisionRespDto {
    pub decision: DecisionLabelDto,
}

#[derive(Deserialize)]
pub struct OrderConfirmReqDto {
    pub order_id: String,
    pub cart: CheckoutCartDto,
    pub guest_email_hash: Option<String>,
}

#[derive(Serialize)]
pub struct OrderConfirmRespDto {
    pub order_id: String,
    pub state: String,
    pub status: String,
    pub backoffice_url: String,
}

#[derive(Deserialize)]
pub struct CaptureReqDto {
    pub order_id: String,
    pub invoice_id: String,
    pub currency: String,
    pub base_currency: String,
    pub currency_rate: String,
    // quantities here are the invoiced quantities, not the ordered ones
    pub items: Vec<CartItemDto>,
    pub shipping: Option<ShippingFeeDto>,
}

#[derive(Serialize)]
pub struct CaptureRespDto {
    pub capture_id: String,
    pub order_complete: bool,
}

#[derive(Deserialize)]
pub struct RefundReqDto {
    pub order_id: String,
    pub creditmemo_id: String,
    pub currency: String,
    pub base_currency: String,
    pub currency_rate: String,
    pub items: Vec<CartItemDto>,
    pub shipping: Option<ShippingFeeDto>,
    pub adjustment_positive: Option<String>,
    pub adjustment_negative: Option<String>,
}

#[derive(Serialize)]
pub struct RefundRespDto {
    pub refunded_captures: Vec<String>,
}

#[derive(Deserialize)]
pub struct CancelReqDto {
    pub order_id: String,
}

#[derive(Serialize)]
pub struct CancelRespDto {
    pub cancelled_at_provider: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ---- provider-originated webhook payloads, camel-cased on the wire ----

#[derive(Deserialize)]
pub struct OrderStatusWebhookDto {
    #[serde(rename = "quoteId")]
    pub cart_id: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub event: Option<String>,
}

#[derive(Deserialize)]
pub struct CaptureStatusWebhookDto {
    #[serde(rename = "quoteId")]
    pub cart_id: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "captureId")]
    pub capture_id: String,
    #[serde(rename = "autoCaptured", default)]
    pub auto_captured: bool,
    pub event: Option<String>,
}

#[derive(Serialize)]
pub struct WebhookRespDto {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct CheckoutErrorRespDto {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
