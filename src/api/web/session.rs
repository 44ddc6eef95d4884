use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::{Data as WebData, Json as ExtJson};
use actix_web::{HttpResponse, Result as ActixResult};

use super::checkout_error_resp;
use super::dto::SessionBootstrapReqDto;
use crate::adapter::repository::app_repo_checkout;
use crate::logging::{app_log_event, AppLogLevel};
use crate::usecase::{SessionBootstrapUcError, SessionBootstrapUseCase};
use crate::AppSharedState;

pub(super) async fn bootstrap_session(
    req_body: ExtJson<SessionBootstrapReqDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "bootstrap-session-api");

    let repo = match app_repo_checkout(shr_state.datastore()) {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = HttpResponse::InternalServerError()
                .append_header(ContentType::plaintext())
                .body("");
            return Ok(resp);
        }
    };
    let uc = SessionBootstrapUseCase {
        cfg: shr_state.checkout_config(),
        processors: shr_state.processor_context(),
        repo,
        hooks: shr_state.hooks(),
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
            SessionBootstrapUcError::CartInvalid(e) => {
                app_log_event!(logctx_p, AppLogLevel::WARNING, "{:?}", e);
                checkout_error_resp(
                    StatusCode::BAD_REQUEST,
                    "invalid-cart",
                    Some(format!("{:?}", e)),
                )
            }
            SessionBootstrapUcError::SessionConsumed => checkout_error_resp(
                StatusCode::CONFLICT,
                "session-already-completed",
                Some(
                    "Payment for this cart already completed, the checkout \
                     cannot be restarted"
                        .to_string(),
                ),
            ),
            SessionBootstrapUcError::ExternalProviderError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                checkout_error_resp(StatusCode::SERVICE_UNAVAILABLE, "provider-error", None)
            }
            SessionBootstrapUcError::DataStoreError(e) => {
                app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
                HttpResponse::InternalServerError().finish()
            }
        },
    }; // end of use-case execution
    Ok(resp)
} // end of fn bootstrap_session
