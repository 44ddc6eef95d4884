use std::boxed::Box;
use std::sync::Arc;

use chrono::Utc;

use crate::adapter::processor::{
    AbstractPaymentOrchestrator, AppProcessorError, SettlementWire,
};
use crate::adapter::repository::{
    AbstractMerchantOrderRepo, AbstractSettlementRepo, AppRepoError,
};
use crate::api::web::dto::{CaptureReqDto, CaptureRespDto};
use crate::config::AppCheckoutCfg;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::money::CurrencyContextModel;
use crate::model::{
    CaptureLedgerEntryModel, CartLineModel, CartLineType, CartModel, CartModelError,
    InvoiceRecordModel,
};

pub enum CaptureOrderUcError {
    OrderNotFound,
    // the order was materialized without a session reference, nothing
    // can be captured against the provider
    MissingSessionRef,
    CartInvalid(CartModelError),
    ExternalProviderError(AppProcessorError),
    DataStoreError(AppRepoError),
}

impl From<CartModelError> for CaptureOrderUcError {
    fn from(value: CartModelError) -> Self {
        Self::CartInvalid(value)
    }
}
impl From<AppProcessorError> for CaptureOrderUcError {
    fn from(value: AppProcessorError) -> Self {
        Self::ExternalProviderError(value)
    }
}
impl From<AppRepoError> for CaptureOrderUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}

pub struct CaptureOrderUseCase {
    pub cfg: AppCheckoutCfg,
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub order_repo: Box<dyn AbstractMerchantOrderRepo>,
    pub settlement_repo: Box<dyn AbstractSettlementRepo>,
    pub logctx: Arc<AppLogContext>,
}

impl CaptureOrderUseCase {
    pub async fn execute(
        &self,
        req: CaptureReqDto,
    ) -> Result<CaptureRespDto, CaptureOrderUcError> {
        let mut order_m = self
            .order_repo
            .fetch_by_order_id(req.order_id.as_str())
            .await?
            .ok_or(CaptureOrderUcError::OrderNotFound)?;
        let session_id = order_m
            .session_id
            .clone()
            .ok_or(CaptureOrderUcError::MissingSessionRef)?;
        let cart_m = self._build_capture_cart(&req).await?;
        let shipping_included = cart_m
            .lines
            .iter()
            .any(|l| l.line_type == CartLineType::ShippingFee);

        let capture_id = self
            .processors
            .capture_order(session_id.as_str(), SettlementWire::capture(&cart_m))
            .await?;
        let now = Utc::now();
        let invoice = InvoiceRecordModel {
            invoice_id: req.invoice_id.clone(),
            order_id: req.order_id.clone(),
            shipping_included,
            paid: false,
            created_at: now,
        };
        self.settlement_repo.create_invoice(&invoice).await?;
        let entries = req
            .items
            .iter()
            .map(|item| CaptureLedgerEntryModel {
                id: 0, // assigned by the database on insert
                invoice_id: req.invoice_id.clone(),
                order_id: req.order_id.clone(),
                item_id: item.item_id.clone(),
                capture_id: capture_id.clone(),
                quantity: item.quantity,
                created_at: now,
            })
            .collect::<Vec<_>>();
        self.settlement_repo.add_ledger_entries(&entries).await?;

        let order_complete = order_m.register_payment(cart_m.amount_inc_vat);
        self.order_repo.update_payment(&order_m).await?;
        let logctx = &self.logctx;
        app_log_event!(
            logctx,
            AppLogLevel::INFO,
            "captured, order: {}, capture: {}, amount: {}, complete: {}",
            req.order_id,
            capture_id,
            cart_m.amount_inc_vat,
            order_complete
        );
        Ok(CaptureRespDto {
            capture_id,
            order_complete,
        })
    } // end of fn execute

    /// cart lines scoped to the invoiced quantities, shipping goes into
    /// the first capture that carries it and never a second time
    async fn _build_capture_cart(
        &self,
        req: &CaptureReqDto,
    ) -> Result<CartModel, CaptureOrderUcError> {
        let currency = CurrencyContextModel::try_build(
            req.base_currency.clone(),
            req.currency.clone(),
            req.currency_rate.as_str(),
        )
        .map_err(|e| CartModelError::Amount("currency-rate".to_string(), e))?;
        let mut lines = Vec::with_capacity(req.items.len() * 2 + 1);
        for item in req.items.iter() {
            lines.push(CartLineModel::product_item(item, item.quantity, &currency)?);
            if let Some(d) = CartLineModel::discount_for(item, &currency)? {
                lines.push(d);
            }
            if self.cfg.weee_surcharge_enable {
                if let Some(w) = CartLineModel::weee_for(item, item.quantity, &currency)? {
                    lines.push(w);
                }
            }
        }
        if let Some(fee) = req.shipping.as_ref() {
            let prior = self
                .settlement_repo
                .fetch_invoices(req.order_id.as_str())
                .await?;
            let shipping_captured = prior.iter().any(|i| i.shipping_included);
            if !shipping_captured {
                if let Some(s) = CartLineModel::shipping(fee, &currency)? {
                    lines.push(s);
                }
            }
        }
        Ok(CartModel::from_lines(req.currency.clone(), lines))
    } // end of fn _build_capture_cart
} // end of impl CaptureOrderUseCase
