use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::{Data as WebData, Json as ExtJson};
use actix_web::{HttpResponse, Result as ActixResult};

use super::checkout_error_resp;
use super::dto::{CancelReqDto, OrderConfirmReqDto};
use crate::adapter::repository::{app_repo_checkout, app_repo_order};
use crate::logging::{app_log_event, AppLogLevel};
use crate::usecase::{
    CancelOrderUcError, CancelOrderUseCase, OrderConfirmUcError, OrderConfirmUseCase,
};
use crate::AppSharedState;

pub(super) async fn confirm_order(
    req_body: ExtJson<OrderConfirmReqDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "confirm-order-api");

    let repos = app_repo_checkout(shr_state.datastore())
        .and_then(|c| app_repo_order(shr_state.datastore()).map(|o| (c, o)));
    let (checkout_repo, order_repo) = match repos {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = HttpResponse::InternalServerError()
                .append_header(ContentType::plaintext())
                .body("");
            return Ok(resp);
        }
    };
    let uc = OrderConfirmUseCase {
        cfg: shr_state.checkout_config(),
        processors: shr_state.processor_context(),
        checkout_repo,
        order_repo,
        logctx: shr_state.log_context(),
    };
    let resp = match uc.execute(req_body.into_inner()).await {
        Ok(v) => {
            let body_serial = serde_json::to_vec(&v).unwrap();
            HttpResponse::Created()
                .append_header(ContentType::json())
                .body(body_serial)
        }
        Err(uce) => match uce {
            OrderConfirmUcError::NoActiveSession => {
                checkout_error_resp(StatusCode::BAD_REQUEST, "no-active-session", None)
            }
            OrderConfirmUcError::AlreadyConverted => {
                checkout_error_resp(StatusCode::CONFLICT, "cart-already-converted", None)
            }
            OrderConfirmUcError::AmountInvalid(e) => {
                app_log_event!(logctx_p, AppLogLevel::WARNING, "{:?}", e);
                checkout_error_resp(StatusCode::BAD_REQUEST, "invalid-amount", None)
            }
            OrderConfirmUcError::OrderRejected(e) => {
                app_log_event!(logctx_p, AppLogLevel::WARNING, "{:?}", e);
                checkout_error_resp(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "session-not-payable",
                    Some(format!("{:?}", e)),
                )
            }
            OrderConfirmUcError::ExternalProviderError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                checkout_error_resp(StatusCode::SERVICE_UNAVAILABLE, "provider-error", None)
            }
            OrderConfirmUcError::DataStoreError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    }; // end of use-case execution
    Ok(resp)
} // end of fn confirm_order

pub(super) async fn cancel_order(
    req_body: ExtJson<CancelReqDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "cancel-order-api");

    let repos = app_repo_checkout(shr_state.datastore())
        .and_then(|c| app_repo_order(shr_state.datastore()).map(|o| (c, o)));
    let (checkout_repo, order_repo) = match repos {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = HttpResponse::InternalServerError()
                .append_header(ContentType::plaintext())
                .body("");
            return Ok(resp);
        }
    };
    let uc = CancelOrderUseCase {
        processors: shr_state.processor_context(),
        checkout_repo,
        order_repo,
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
            CancelOrderUcError::OrderNotFound => {
                checkout_error_resp(StatusCode::NOT_FOUND, "order-not-found", None)
            }
            CancelOrderUcError::MissingSessionRef => {
                checkout_error_resp(StatusCode::UNPROCESSABLE_ENTITY, "no-session-ref", None)
            }
            CancelOrderUcError::ExternalProviderError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                checkout_error_resp(StatusCode::SERVICE_UNAVAILABLE, "provider-error", None)
            }
            CancelOrderUcError::DataStoreError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    };
    Ok(resp)
} // end of fn cancel_order
