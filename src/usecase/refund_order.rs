use std::boxed::Box;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::adapter::processor::{
    AbstractPaymentOrchestrator, AppProcessorError, SettlementWire,
};
use crate::adapter::repository::{
    AbstractMerchantOrderRepo, AbstractSettlementRepo, AppRepoError,
};
use crate::api::web::dto::{RefundReqDto, RefundRespDto};
use crate::config::AppCheckoutCfg;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::money::{self, CurrencyContextModel};
use crate::model::{allocate_refund, CartLineModel, CartModel, CartModelError};

pub enum RefundOrderUcError {
    OrderNotFound,
    MissingSessionRef,
    // free-form creditmemo adjustments have no capture to attribute
    // them to, the merchant has to refund those out of band
    AdjustmentNotSupported,
    // requested more quantity than the ledger still holds for a line
    InsufficientCapturedQuantity { item_id: String, short_by: u32 },
    // another refund drained the same ledger entry first
    ConcurrentRefundConflict { entry_id: u64 },
    NoCaptureForShipping,
    CartInvalid(CartModelError),
    ExternalProviderError(AppProcessorError),
    DataStoreError(AppRepoError),
}

impl From<CartModelError> for RefundOrderUcError {
    fn from(value: CartModelError) -> Self {
        Self::CartInvalid(value)
    }
}
impl From<AppProcessorError> for RefundOrderUcError {
    fn from(value: AppProcessorError) -> Self {
        Self::ExternalProviderError(value)
    }
}
impl From<AppRepoError> for RefundOrderUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}

pub struct RefundOrderUseCase {
    pub cfg: AppCheckoutCfg,
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub order_repo: Box<dyn AbstractMerchantOrderRepo>,
    pub settlement_repo: Box<dyn AbstractSettlementRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl RefundOrderUseCase {
    pub async fn execute(&self, req: RefundReqDto) -> Result<RefundRespDto, RefundOrderUcError> {
        Self::_deny_adjustments(&req)?;
        let order_m = self
            .order_repo
            .fetch_by_order_id(req.order_id.as_str())
            .await?
            .ok_or(RefundOrderUcError::OrderNotFound)?;
        let session_id = order_m
            .session_id
            .clone()
            .ok_or(RefundOrderUcError::MissingSessionRef)?;
        let currency = CurrencyContextModel::try_build(
            req.base_currency.clone(),
            req.currency.clone(),
            req.currency_rate.as_str(),
        )
        .map_err(|e| CartModelError::Amount("currency-rate".to_string(), e))?;

        let groups = self._allocate_lines(&req, &currency).await?;
        let mut refunded = Vec::with_capacity(groups.len());
        for (capture_id, lines) in groups.into_iter() {
            let cart_m = CartModel::from_lines(req.currency.clone(), lines);
            self.processors
                .refund_order(
                    session_id.as_str(),
                    SettlementWire::refund(capture_id.clone(), &cart_m),
                )
                .await?;
            let logctx = &self.logctx;
            app_log_event!(
                logctx,
                AppLogLevel::INFO,
                "refunded, order: {}, creditmemo: {}, capture: {}, amount: {}",
                req.order_id,
                req.creditmemo_id,
                capture_id,
                cart_m.amount_inc_vat
            );
            refunded.push(capture_id);
        }
        Ok(RefundRespDto {
            refunded_captures: refunded,
        })
    } // end of fn execute

    fn _deny_adjustments(req: &RefundReqDto) -> Result<(), RefundOrderUcError> {
        let nonzero = |raw: Option<&String>| {
            raw.and_then(|v| money::parse_amount(v.as_str()).ok())
                .map(|d| d != Decimal::ZERO)
                .unwrap_or(false)
        };
        if nonzero(req.adjustment_positive.as_ref()) || nonzero(req.adjustment_negative.as_ref()) {
            Err(RefundOrderUcError::AdjustmentNotSupported)
        } else {
            Ok(())
        }
    }

    /// walk every creditmemo line through the capture ledger, draining
    /// entries in creation order, then group the resulting cart lines by
    /// the capture each slice came from since the provider refunds one
    /// capture per call
    async fn _allocate_lines(
        &self,
        req: &RefundReqDto,
        currency: &CurrencyContextModel,
    ) -> Result<Vec<(String, Vec<CartLineModel>)>, RefundOrderUcError> {
        let mut groups: Vec<(String, Vec<CartLineModel>)> = Vec::new();
        let mut push_line = |capture_id: &str, line: CartLineModel| {
            match groups.iter_mut().find(|(cid, _)| cid == capture_id) {
                Some((_, lines)) => lines.push(line),
                None => groups.push((capture_id.to_string(), vec![line])),
            }
        };
        for item in req.items.iter() {
            let entries = self
                .settlement_repo
                .fetch_by_item_id(req.order_id.as_str(), item.item_id.as_str())
                .await?;
            let (allocs, unallocated) = allocate_refund(&entries, item.quantity);
            if unallocated > 0 {
                return Err(RefundOrderUcError::InsufficientCapturedQuantity {
                    item_id: item.item_id.clone(),
                    short_by: unallocated,
                });
            }
            for (idx, alloc) in allocs.into_iter().enumerate() {
                let drained = self
                    .settlement_repo
                    .decrement_quantity(alloc.entry_id, alloc.quantity)
                    .await?;
                if !drained {
                    return Err(RefundOrderUcError::ConcurrentRefundConflict {
                        entry_id: alloc.entry_id,
                    });
                }
                push_line(
                    alloc.capture_id.as_str(),
                    CartLineModel::product_item(item, alloc.quantity, currency)?,
                );
                if idx == 0 {
                    // creditmemo-level discount and surcharge components
                    // are not split, they ride on the first capture slice
                    if let Some(d) = CartLineModel::discount_for(item, currency)? {
                        push_line(alloc.capture_id.as_str(), d);
                    }
                    if self.cfg.weee_surcharge_enable {
                        if let Some(w) =
                            CartLineModel::weee_for(item, item.quantity, currency)?
                        {
                            push_line(alloc.capture_id.as_str(), w);
                        }
                    }
                }
            }
        }
        if let Some(fee) = req.shipping.as_ref() {
            if let Some(line) = CartLineModel::shipping(fee, currency)? {
                let first = self
                    .settlement_repo
                    .first_capture_id(req.order_id.as_str())
                    .await?
                    .ok_or(RefundOrderUcError::NoCaptureForShipping)?;
                push_line(first.as_str(), line);
            }
        }
        Ok(groups)
    } // end of fn _allocate_lines
} // end of impl RefundOrderUseCase
