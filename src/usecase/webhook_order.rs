use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::processor::AbstractPaymentOrchestrator;
use crate::adapter::repository::{
    AbstractCheckoutSessionRepo, AbstractMerchantOrderRepo,
};
use crate::api::web::dto::{OrderStatusWebhookDto, WebhookRespDto};
use crate::config::AppCheckoutCfg;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::{MerchantOrderModel, OrderModelError, SessionModel};

pub struct OrderWebhookUseCase {
    pub cfg: AppCheckoutCfg,
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub checkout_repo: Box<dyn AbstractCheckoutSessionRepo>,
    pub order_repo: Box<dyn AbstractMerchantOrderRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl OrderWebhookUseCase {
    /// a `false` status asks the provider to redeliver later, benign
    /// situations such as duplicates always acknowledge
    pub async fn execute(&self, req: OrderStatusWebhookDto) -> WebhookRespDto {
        match self._process(&req).await {
            Ok(resp) => resp,
            Err(detail) => {
                let logctx = &self.logctx;
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "order webhook failed, cart: {}, session: {}, detail: {}",
                    req.cart_id,
                    req.session_id,
                    detail
                );
                WebhookRespDto {
                    status: false,
                    message: Some(detail),
                }
            }
        }
    }

    async fn _process(&self, req: &OrderStatusWebhookDto) -> Result<WebhookRespDto, String> {
        let cart_id = req.cart_id.as_str();
        let logctx = &self.logctx;
        let stored = self
            .checkout_repo
            .get_session_id(cart_id)
            .await
            .map_err(|e| format!("session-ref read: {:?}", e))?;
        match stored.as_deref() {
            None => {
                // hook arrived before the storefront persisted the
                // reference, the notification itself is the backfill
                self.checkout_repo
                    .save_session_id(cart_id, req.session_id.as_str())
                    .await
                    .map_err(|e| format!("session-ref backfill: {:?}", e))?;
            }
            Some(sid) if sid != req.session_id.as_str() => {
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "session mismatch in order webhook, cart: {}, stored: {}, claimed: {}",
                    cart_id,
                    sid,
                    req.session_id
                );
                return Ok(Self::_ack());
            }
            Some(_same) => {}
        }
        // re-read from the provider, the webhook body itself is never
        // trusted for money or status decisions
        let session = self
            .processors
            .read_session(req.session_id.as_str())
            .await
            .map_err(|e| format!("session read: {:?}", e))?;
        if !session.status.completed() {
            app_log_event!(
                logctx,
                AppLogLevel::INFO,
                "order webhook on unfinished session, cart: {}, status: {}",
                cart_id,
                session.status.as_str()
            );
            return Ok(Self::_ack());
        }
        let maybe_order = self
            .order_repo
            .fetch_by_cart_id(cart_id)
            .await
            .map_err(|e| format!("order fetch: {:?}", e))?;
        match maybe_order {
            Some(order_m) => self._progress_existing(order_m, &session).await,
            None => self._materialize_from_hook(cart_id, &session).await,
        }
    } // end of fn _process

    async fn _progress_existing(
        &self,
        mut order_m: MerchantOrderModel,
        session: &SessionModel,
    ) -> Result<WebhookRespDto, String> {
        let logctx = &self.logctx;
        let progress = session
            .order_status
            .as_ref()
            .and_then(|s| s.order_progress());
        let progress = match progress {
            Some(p) => p,
            None => {
                // unrecognized labels are ignored rather than bounced,
                // redelivery would never make them recognizable
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "unrecognized order status in webhook, order: {}, raw: {:?}",
                    order_m.order_id,
                    session.order_status
                );
                return Ok(Self::_ack());
            }
        };
        if order_m.apply_progress(progress) {
            self.order_repo
                .update_progress(order_m.order_id.as_str(), order_m.state, order_m.status)
                .await
                .map_err(|e| format!("progress update: {:?}", e))?;
        }
        Ok(Self::_ack())
    }

    /// the buyer may close the browser right after paying, the hook is
    /// then the only path that ever turns the session into an order
    async fn _materialize_from_hook(
        &self,
        cart_id: &str,
        session: &SessionModel,
    ) -> Result<WebhookRespDto, String> {
        let logctx = &self.logctx;
        let order_id = session
            .reference1
            .clone()
            .unwrap_or_else(|| cart_id.to_string());
        let grand_total = session.amount_inc_vat.unwrap_or(0);
        let result = MerchantOrderModel::materialize(
            order_id.clone(),
            cart_id.to_string(),
            session,
            grand_total,
            self.cfg.test_mode,
        );
        let (order_m, warnings) = match result {
            Ok(v) => v,
            Err(OrderModelError::UnknownOrderStatus(raw)) => {
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "unrecognized order status in webhook, cart: {}, raw: {}",
                    cart_id,
                    raw
                );
                return Ok(Self::_ack());
            }
            Err(e) => return Err(format!("materialize: {:?}", e)),
        };
        for w in warnings.iter() {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "order materialized with gap, order: {}, detail: {}",
                order_id,
                w
            );
        }
        // losing the insert race means a concurrent confirm already owns
        // the conversion, the delivery is acknowledged untouched
        let inserted = self
            .order_repo
            .create(&order_m)
            .await
            .map_err(|e| format!("order create: {:?}", e))?;
        if !inserted {
            return Ok(Self::_ack());
        }
        self.checkout_repo
            .mark_converted(cart_id)
            .await
            .map_err(|e| format!("convert flag: {:?}", e))?;
        app_log_event!(
            logctx,
            AppLogLevel::INFO,
            "order materialized by webhook, order: {}, cart: {}",
            order_id,
            cart_id
        );
        Ok(Self::_ack())
    } // end of fn _materialize_from_hook

    fn _ack() -> WebhookRespDto {
        WebhookRespDto {
            status: true,
            message: None,
        }
    }
} // end of impl OrderWebhookUseCase
