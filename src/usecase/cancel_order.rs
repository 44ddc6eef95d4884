use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::processor::{
    AbstractPaymentOrchestrator, AppProcessorError, CancelOutcome,
};
use crate::adapter::repository::{
    AbstractCheckoutSessionRepo, AbstractMerchantOrderRepo, AppRepoError,
};
use crate::api::web::dto::{CancelReqDto, CancelRespDto};
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::{MerchantOrderState, MerchantOrderStatus};

pub enum CancelOrderUcError {
    OrderNotFound,
    MissingSessionRef,
    ExternalProviderError(AppProcessorError),
    DataStoreError(AppRepoError),
}

impl From<AppProcessorError> for CancelOrderUcError {
    fn from(value: AppProcessorError) -> Self {
        Self::ExternalProviderError(value)
    }
}
impl From<AppRepoError> for CancelOrderUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}

pub struct CancelOrderUseCase {
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub checkout_repo: Box<dyn AbstractCheckoutSessionRepo>,
    pub order_repo: Box<dyn AbstractMerchantOrderRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl CancelOrderUseCase {
    /// the merchant-side cancellation always lands, a provider that
    /// cannot cancel the reservation only downgrades the outcome to a
    /// warning for manual handling
    pub async fn execute(&self, req: CancelReqDto) -> Result<CancelRespDto, CancelOrderUcError> {
        let order_m = self
            .order_repo
            .fetch_by_order_id(req.order_id.as_str())
            .await?
            .ok_or(CancelOrderUcError::OrderNotFound)?;
        let session_id = order_m
            .session_id
            .clone()
            .ok_or(CancelOrderUcError::MissingSessionRef)?;
        let outcome = self.processors.cancel_order(session_id.as_str()).await?;
        self.order_repo
            .update_progress(
                req.order_id.as_str(),
                MerchantOrderState::Canceled,
                MerchantOrderStatus::Canceled,
            )
            .await?;
        // the canceled cart must stop pointing at the dead session
        self.checkout_repo
            .clear_session_id(order_m.cart_id.as_str())
            .await?;
        let resp = match outcome {
            CancelOutcome::Cancelled => CancelRespDto {
                cancelled_at_provider: true,
                warning: None,
            },
            CancelOutcome::NotSupportedAtPsp => {
                let logctx = &self.logctx;
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "provider kept the reservation, order: {}, session: {}",
                    req.order_id,
                    session_id
                );
                CancelRespDto {
                    cancelled_at_provider: false,
                    warning: Some(
                        "The payment provider does not support cancellation, \
                         release the reservation manually in the provider back office"
                            .to_string(),
                    ),
                }
            }
        };
        Ok(resp)
    } // end of fn execute
} // end of impl CancelOrderUseCase
