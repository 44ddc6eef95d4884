use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web::{Data as WebData, Json as ExtJson};
use actix_web::{HttpResponse, Result as ActixResult};

use super::checkout_error_resp;
use super::dto::DecisionReqDto;
use crate::logging::{app_log_event, AppLogLevel};
use crate::usecase::{MakeDecisionUcError, MakeDecisionUseCase};
use crate::AppSharedState;

pub(super) async fn make_decision(
    req_body: ExtJson<DecisionReqDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "make-decision-api");

    let uc = MakeDecisionUseCase {
        cfg: shr_state.checkout_config(),
        processors: shr_state.processor_context(),
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
        Err(MakeDecisionUcError::DecisionDeliveryFailed(e)) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "{:?}", e);
            checkout_error_resp(StatusCode::SERVICE_UNAVAILABLE, "provider-error", None)
        }
    };
    Ok(resp)
} // end of fn make_decision
