use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::{Data as WebData, Json as ExtJson};
use actix_web::{HttpResponse, Result as ActixResult};

use super::checkout_error_resp;
use super::dto::{CaptureReqDto, RefundReqDto};
use crate::adapter::repository::{app_repo_order, app_repo_settlement};
use crate::logging::{app_log_event, AppLogLevel};
use crate::usecase::{
    CaptureOrderUcError, CaptureOrderUseCase, RefundOrderUcError, RefundOrderUseCase,
};
use crate::AppSharedState;

pub(super) async fn capture_order(
    req_body: ExtJson<CaptureReqDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "capture-order-api");

    let repos = app_repo_order(shr_state.datastore())
        .and_then(|o| app_repo_settlement(shr_state.datastore()).map(|s| (o, s)));
    let (order_repo, settlement_repo) = match repos {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = HttpResponse::InternalServerError()
                .append_header(ContentType::plaintext())
                .body("");
            return Ok(resp);
        }
    };
    let uc = CaptureOrderUseCase {
        cfg: shr_state.checkout_config(),
        processors: shr_state.processor_context(),
        order_repo,
        settlement_repo,
        logctx: shr_state.log_context(),
    };
    let resp = match uc.execute(req_body.into_inner()).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Ok()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            CaptureOrderUcError::OrderNotFound => {
                checkout_error_resp(StatusCode::NOT_FOUND, "order-not-found", None)
            }
            CaptureOrderUcError::MissingSessionRef => {
                checkout_error_resp(StatusCode::UNPROCESSABLE_ENTITY, "no-session-ref", None)
            }
            CaptureOrderUcError::CartInvalid(e) => {
                app_log_event!(logctx_p, AppLogLevel::WARNING, "{:?}", e);
                checkout_error_resp(
                    StatusCode::BAD_REQUEST,
                    "invalid-cart",
                    Some(format!("{:?}", e)),
                )
            }
            CaptureOrderUcError::ExternalProviderError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                checkout_error_resp(StatusCode::SERVICE_UNAVAILABLE, "provider-error", None)
            }
            CaptureOrderUcError::DataStoreError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    }; // end of use-case execution
    Ok(resp)
} // end of fn capture_order

pub(super) async fn refund_order(
    req_body: ExtJson<RefundReqDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "refund-order-api");

    let repos = app_repo_order(shr_state.datastore())
        .and_then(|o| app_repo_settlement(shr_state.datastore()).map(|s| (o, s)));
    let (order_repo, settlement_repo) = match repos {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = HttpResponse::InternalServerError()
                .append_header(ContentType::plaintext())
                .body("");
            return Ok(resp);
        }
    };
    let uc = RefundOrderUseCase {
        cfg: shr_state.checkout_config(),
        processors: shr_state.processor_context(),
        order_repo,
        settlement_repo,
        logctx: shr_state.log_context(),
    };
    let resp = match uc.execute(req_body.into_inner()).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Ok()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            RefundOrderUcError::OrderNotFound => {
                checkout_error_resp(StatusCode::NOT_FOUND, "order-not-found", None)
            }
            RefundOrderUcError::MissingSessionRef => {
                checkout_error_resp(StatusCode::UNPROCESSABLE_ENTITY, "no-session-ref", None)
            }
            RefundOrderUcError::AdjustmentNotSupported => checkout_error_resp(
                StatusCode::BAD_REQUEST,
                "adjustment-not-supported",
                Some(
                    "Creditmemo adjustments cannot be refunded through the \
                     payment provider, refund them manually"
                        .to_string(),
                ),
            ),
            RefundOrderUcError::InsufficientCapturedQuantity { item_id, short_by } => {
                checkout_error_resp(
                    StatusCode::BAD_REQUEST,
                    "insufficient-captured-quantity",
                    Some(format!("item: {}, short by: {}", item_id, short_by)),
                )
            }
            RefundOrderUcError::ConcurrentRefundConflict { entry_id } => {
                app_log_event!(logctx_p, AppLogLevel::WARNING, "entry: {}", entry_id);
                checkout_error_resp(StatusCode::CONFLICT, "concurrent-refund", None)
            }
            RefundOrderUcError::NoCaptureForShipping => checkout_error_resp(
                StatusCode::UNPROCESSABLE_ENTITY,
                "no-capture-for-shipping",
                None,
            ),
            RefundOrderUcError::CartInvalid(e) => {
                app_log_event!(logctx_p, AppLogLevel::WARNING, "{:?}", e);
                checkout_error_resp(
                    StatusCode::BAD_REQUEST,
                    "invalid-cart",
                    Some(format!("{:?}", e)),
                )
            }
            RefundOrderUcError::ExternalProviderError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                checkout_error_resp(StatusCode::SERVICE_UNAVAILABLE, "provider-error", None)
            }
            RefundOrderUcError::DataStoreError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    }; // end of use-case execution
    Ok(resp)
} // end of fn refund_order
