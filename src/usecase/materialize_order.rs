use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::processor::{AbstractPaymentOrchestrator, AppProcessorError};
use crate::adapter::repository::{
    AbstractCheckoutSessionRepo, AbstractMerchantOrderRepo, AppRepoError,
};
use crate::api::web::dto::{OrderConfirmReqDto, OrderConfirmRespDto};
use crate::config::AppCheckoutCfg;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::money::{self, CurrencyContextModel, MoneyAmountError};
use crate::model::{MerchantOrderModel, OrderModelError};

pub enum OrderConfirmUcError {
    NoActiveSession,   // client error, checkout never reached the widget
    AlreadyConverted,  // duplicate submission, e.g. status code 409
    AmountInvalid(MoneyAmountError),
    OrderRejected(OrderModelError), // session state forbids an order
    ExternalProviderError(AppProcessorError),
    DataStoreError(AppRepoError),
}

impl From<MoneyAmountError> for OrderConfirmUcError {
    fn from(value: MoneyAmountError) -> Self {
        Self::AmountInvalid(value)
    }
}
impl From<OrderModelError> for OrderConfirmUcError {
    fn from(value: OrderModelError) -> Self {
        Self::OrderRejected(value)
    }
}
impl From<AppProcessorError> for OrderConfirmUcError {
    fn from(value: AppProcessorError) -> Self {
        Self::ExternalProviderError(value)
    }
}
impl From<AppRepoError> for OrderConfirmUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}

pub struct OrderConfirmUseCase {
    pub cfg: AppCheckoutCfg,
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub checkout_repo: Box<dyn AbstractCheckoutSessionRepo>,
    pub order_repo: Box<dyn AbstractMerchantOrderRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl OrderConfirmUseCase {
    pub async fn execute(
        &self,
        req: OrderConfirmReqDto,
    ) -> Result<OrderConfirmRespDto, OrderConfirmUcError> {
        let cart_id = req.cart.cart_id.as_str();
        if req.cart.converted {
            // duplicate confirm for the same cart replays the stored
            // outcome instead of touching the provider again
            if let Some(existing) = self.order_repo.fetch_by_cart_id(cart_id).await? {
                return Ok(Self::_to_resp(&existing));
            }
        }
        let session_id = self
            .checkout_repo
            .get_session_id(cart_id)
            .await?
            .ok_or(OrderConfirmUcError::NoActiveSession)?;
        let session = self.processors.read_session(session_id.as_str()).await?;
        let grand_total = self._grand_total_minor(&req)?;
        let (order_m, warnings) = MerchantOrderModel::materialize(
            req.order_id.clone(),
            cart_id.to_string(),
            &session,
            grand_total,
            self.cfg.test_mode,
        )?;
        let logctx = &self.logctx;
        for w in warnings.iter() {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "order materialized with gap, order: {}, detail: {}",
                req.order_id,
                w
            );
        }
        // the unique cart-id index makes the insert the single arbiter of
        // which caller converts the cart, losers replay the winning row
        let inserted = self.order_repo.create(&order_m).await?;
        if !inserted {
            app_log_event!(
                logctx,
                AppLogLevel::INFO,
                "order row already present, order: {}",
                req.order_id
            );
            return match self.order_repo.fetch_by_cart_id(cart_id).await? {
                Some(existing) => Ok(Self::_to_resp(&existing)),
                None => Err(OrderConfirmUcError::AlreadyConverted),
            };
        }
        // the flag flips only once the order row exists, a failure in any
        // step above leaves the cart retryable by confirm and webhook alike
        let _flipped = self.checkout_repo.mark_converted(cart_id).await?;
        Ok(Self::_to_resp(&order_m))
    } // end of fn execute

    fn _grand_total_minor(&self, req: &OrderConfirmReqDto) -> Result<i64, OrderConfirmUcError> {
        let currency = CurrencyContextModel::try_build(
            req.cart.base_currency.clone(),
            req.cart.currency.clone(),
            req.cart.currency_rate.as_str(),
        )?;
        let raw = money::parse_amount(req.cart.grand_total.as_str())?;
        let minor = money::to_minor_units(currency.convert(raw))?;
        Ok(minor)
    }

    fn _to_resp(m: &MerchantOrderModel) -> OrderConfirmRespDto {
        OrderConfirmRespDto {
            order_id: m.order_id.clone(),
            state: m.state.as_str().to_string(),
            status: m.status.as_str().to_string(),
            backoffice_url: m.backoffice_url.clone(),
        }
    }
} // end of impl OrderConfirmUseCase
