mod decision;
pub mod dto;
mod order;
mod session;
mod settlement;
mod webhook;

use actix_http::Method;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Route};
use std::collections::HashMap;

use decision::make_decision;
use dto::CheckoutErrorRespDto;
use order::{cancel_order, confirm_order};
use session::bootstrap_session;
use settlement::{capture_order, refund_order};
use webhook::{webhook_capture_status, webhook_order_status};

pub struct AppRouteTable {
    pub version: String,
    pub entries: HashMap<String, Route>,
} // note, figure out how do multiple versions of API endpoints co-exist

impl AppRouteTable {
    pub fn get(ver_req: &str) -> Self {
        let (version, entries) = match ver_req {
            "0.1.0" => (format!("v{ver_req}"), Self::v0_1_0_entries()),
            _others => (String::new(), HashMap::new()),
        };
        Self { version, entries }
    }
    fn v0_1_0_entries() -> HashMap<String, Route> {
        let data = [
            (
                "bootstrap_session".to_string(),
                Route::new().method(Method::POST).to(bootstrap_session),
            ),
            (
                "make_decision".to_string(),
                Route::new().method(Method::POST).to(make_decision),
            ),
            (
                "confirm_order".to_string(),
                Route::new().method(Method::POST).to(confirm_order),
            ),
            (
                "capture_order".to_string(),
                Route::new().method(Method::POST).to(capture_order),
            ),
            (
                "refund_order".to_string(),
                Route::new().method(Method::POST).to(refund_order),
            ),
            (
                "cancel_order".to_string(),
                Route::new().method(Method::POST).to(cancel_order),
            ),
            (
                "webhook_order_status".to_string(),
                Route::new().method(Method::POST).to(webhook_order_status),
            ),
            (
                "webhook_capture_status".to_string(),
                Route::new().method(Method::POST).to(webhook_capture_status),
            ),
        ];
        HashMap::from(data)
    }
} // end of impl AppRouteTable

pub(super) fn checkout_error_resp(
    status: StatusCode,
    error: &str,
    message: Option<String>,
) -> HttpResponse {
    let body = CheckoutErrorRespDto {
        error: error.to_string(),
        message,
    };
    let serial = serde_json::to_vec(&body).unwrap();
    HttpResponse::build(status)
        .append_header(ContentType::json())
        .body(serial)
}
