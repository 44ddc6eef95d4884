use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::processor::AbstractPaymentOrchestrator;
use crate::adapter::repository::AbstractSettlementRepo;
use crate::api::web::dto::{CaptureStatusWebhookDto, WebhookRespDto};
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};

pub struct CaptureWebhookUseCase {
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub settlement_repo: Box<dyn AbstractSettlementRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl CaptureWebhookUseCase {
    pub async fn execute(&self, req: CaptureStatusWebhookDto) -> WebhookRespDto {
        match self._process(&req).await {
            Ok(resp) => resp,
            Err(detail) => {
                let logctx = &self.logctx;
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "capture webhook failed, session: {}, capture: {}, detail: {}",
                    req.session_id,
                    req.capture_id,
                    detail
                );
                WebhookRespDto {
                    status: false,
                    message: Some(detail),
                }
            }
        }
    }

    async fn _process(&self, req: &CaptureStatusWebhookDto) -> Result<WebhookRespDto, String> {
        let logctx = &self.logctx;
        // the capture id is validated against a fresh session read, not
        // against whatever the webhook body claims
        let session = self
            .processors
            .read_session(req.session_id.as_str())
            .await
            .map_err(|e| format!("session read: {:?}", e))?;
        let capture = match session.find_capture(req.capture_id.as_str()) {
            Some(c) => c,
            None if req.auto_captured => {
                // provider-initiated captures have no merchant invoice
                // and may not be visible in the session yet
                app_log_event!(
                    logctx,
                    AppLogLevel::INFO,
                    "auto-capture acknowledged, session: {}, capture: {}",
                    req.session_id,
                    req.capture_id
                );
                return Ok(Self::_ack());
            }
            None => {
                return Err(format!(
                    "capture {} does not match session {}",
                    req.capture_id, req.session_id
                ))
            }
        };
        let invoice = self
            .settlement_repo
            .find_invoice_by_capture(req.capture_id.as_str())
            .await
            .map_err(|e| format!("invoice lookup: {:?}", e))?;
        let invoice = match invoice {
            Some(i) => i,
            None if req.auto_captured => {
                app_log_event!(
                    logctx,
                    AppLogLevel::INFO,
                    "auto-capture without invoice, session: {}, capture: {}",
                    req.session_id,
                    req.capture_id
                );
                return Ok(Self::_ack());
            }
            None => {
                return Err(format!(
                    "no invoice recorded for capture {}",
                    req.capture_id
                ))
            }
        };
        match capture.status.as_str() {
            "approved" => {
                let changed = self
                    .settlement_repo
                    .mark_invoice_paid(invoice.invoice_id.as_str())
                    .await
                    .map_err(|e| format!("invoice update: {:?}", e))?;
                if changed {
                    app_log_event!(
                        logctx,
                        AppLogLevel::INFO,
                        "invoice settled, invoice: {}, capture: {}",
                        invoice.invoice_id,
                        req.capture_id
                    );
                } // duplicate deliveries end up here with nothing to write
            }
            "pending" | "rejected" => {
                app_log_event!(
                    logctx,
                    AppLogLevel::INFO,
                    "capture not settled yet, capture: {}, status: {}",
                    req.capture_id,
                    capture.status
                );
            }
            other => {
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "unrecognized capture status, capture: {}, raw: {}",
                    req.capture_id,
                    other
                );
            }
        }
        Ok(Self::_ack())
    } // end of fn _process

    fn _ack() -> WebhookRespDto {
        WebhookRespDto {
            status: true,
            message: None,
        }
    }
} // end of impl CaptureWebhookUseCase
