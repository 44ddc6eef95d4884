mod bootstrap_session;
mod cancel_order;
mod capture_order;
mod make_decision;
mod materialize_order;
mod refund_order;
mod webhook_capture;
mod webhook_order;

use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;

pub use bootstrap_session::{SessionBootstrapUcError, SessionBootstrapUseCase};
pub use cancel_order::{CancelOrderUcError, CancelOrderUseCase};
pub use capture_order::{CaptureOrderUcError, CaptureOrderUseCase};
pub use make_decision::{MakeDecisionUcError, MakeDecisionUseCase};
pub use materialize_order::{OrderConfirmUcError, OrderConfirmUseCase};
pub use refund_order::{RefundOrderUcError, RefundOrderUseCase};
pub use webhook_capture::CaptureWebhookUseCase;
pub use webhook_order::OrderWebhookUseCase;

/// the storefront widget carries the guest email base64-encoded, an
/// undecodable value falls back to no email rather than a hard error
pub(crate) fn decode_guest_email(raw: Option<&str>) -> Option<String> {
    let encoded = raw?;
    let bytes = b64.decode(encoded).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    (!decoded.is_empty()).then_some(decoded)
}
