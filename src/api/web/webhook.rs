use actix_web::http::header::ContentType;
use actix_web::web::{Data as WebData, Json as ExtJson};
use actix_web::{HttpResponse, Result as ActixResult};

use super::dto::{CaptureStatusWebhookDto, OrderStatusWebhookDto, WebhookRespDto};
use crate::adapter::repository::{
    app_repo_checkout, app_repo_order, app_repo_settlement,
};
use crate::logging::{app_log_event, AppLogLevel};
use crate::usecase::{CaptureWebhookUseCase, OrderWebhookUseCase};
use crate::AppSharedState;

// a non-2xx response asks the provider to redeliver the notification

fn webhook_resp(body: WebhookRespDto) -> HttpResponse {
    let serial = serde_json::to_vec(&body).unwrap();
    let mut builder = if body.status {
        HttpResponse::Ok()
    } else {
        HttpResponse::BadRequest()
    };
    builder.append_header(ContentType::json()).body(serial)
}

pub(super) async fn webhook_order_status(
    req_body: ExtJson<OrderStatusWebhookDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "order-status-webhook");

    let repos = app_repo_checkout(shr_state.datastore())
        .and_then(|c| app_repo_order(shr_state.datastore()).map(|o| (c, o)));
    let (checkout_repo, order_repo) = match repos {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = webhook_resp(WebhookRespDto {
                status: false,
                message: Some("temporary storage failure".to_string()),
            });
            return Ok(resp);
        }
    };
    let uc = OrderWebhookUseCase {
        cfg: shr_state.checkout_config(),
        processors: shr_state.processor_context(),
        checkout_repo,
        order_repo,
        logctx: shr_state.log_context(),
    };
    let out = uc.execute(req_body.into_inner()).await;
    Ok(webhook_resp(out))
} // end of fn webhook_order_status

pub(super) async fn webhook_capture_status(
    req_body: ExtJson<CaptureStatusWebhookDto>,
    shr_state: WebData<AppSharedState>,
) -> ActixResult<HttpResponse> {
    let logctx = shr_state.log_context();
    let logctx_p = &logctx;
    app_log_event!(logctx_p, AppLogLevel::DEBUG, "capture-status-webhook");

    let settlement_repo = match app_repo_settlement(shr_state.datastore()) {
        Ok(v) => v,
        Err(e) => {
            app_log_event!(logctx_p, AppLogLevel::ERROR, "repo-init-error {:?}", e);
            let resp = webhook_resp(WebhookRespDto {
                status: false,
                message: Some("temporary storage failure".to_string()),
            });
            return Ok(resp);
        }
    };
    let uc = CaptureWebhookUseCase {
        processors: shr_state.processor_context(),
        settlement_repo,
        logctx: shr_state.log_context(),
    };
    let out = uc.execute(req_body.into_inner()).await;
    Ok(webhook_resp(out))
} // end of fn webhook_capture_status
