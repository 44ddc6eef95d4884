mod bootstrap_session;
mod cancel_order;
mod webhook_order;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsnVal};

use checkout_payment::adapter::processor::{
    AbstractPaymentOrchestrator, AppProcessorError, AppProcessorErrorReason,
    AppProcessorFnLabel, CancelOutcome, DecisionWire, ReferencesWire, SettlementWire,
};
use checkout_payment::adapter::repository::{
    AbstractCheckoutSessionRepo, AbstractMerchantOrderRepo, AbstractSettlementRepo,
    AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel,
};
use checkout_payment::error::AppErrorCode;
use checkout_payment::model::{
    CaptureLedgerEntryModel, InvoiceRecordModel, MerchantOrderModel, MerchantOrderState,
    MerchantOrderStatus, SessionModel,
};

pub(super) fn ut_processor_error(fn_label: AppProcessorFnLabel) -> AppProcessorError {
    AppProcessorError {
        reason: AppProcessorErrorReason::ProviderDeclined {
            status: 502,
            body: "mock provider failure".to_string(),
        },
        fn_label,
    }
}

pub(super) fn ut_repo_error(fn_label: AppRepoErrorFnLabel) -> AppRepoError {
    AppRepoError {
        fn_label,
        code: AppErrorCode::RemoteDbServerFailure,
        detail: AppRepoErrorDetail::DatabaseExec("mock database failure".to_string()),
    }
}

/// one product line, quantity 2 at 100.00 with 25% VAT, plus a 50.00
/// shipping fee, the grand total 312.50 lines up with no residual
pub(super) fn ut_checkout_cart_raw(grand_total: &str) -> JsnVal {
    json!({
        "cart_id": "cart-00481",
        "currency": "SEK",
        "base_currency": "SEK",
        "currency_rate": "1.0",
        "grand_total": grand_total,
        "items": [{
            "item_id": "10087",
            "sku": "SKU-001",
            "name": "Alpha Lamp",
            "quantity": 2,
            "unit_price": "100.00",
            "tax_percent": "25.00"
        }],
        "shipping": {
            "amount": "50.00",
            "tax_percent": "25.00",
            "description": "Standard Delivery"
        },
        "billing_address": {
            "street": ["Storgatan 1"],
            "zip": "11122",
            "city": "Stockholm",
            "region": "AB",
            "first_name": "Tove",
            "last_name": "Larsson",
            "phone_number": "+46701234567"
        },
        "customer_email": "tove@example.se"
    })
}

fn ut_contact_snapshot() -> JsnVal {
    json!({
        "streetAddress": "Storgatan 1",
        "streetAddress2": "",
        "zip": "11122",
        "city": "Stockholm",
        "region": "AB",
        "firstName": "Tove",
        "lastName": "Larsson",
        "email": "tove@example.se",
        "phoneNumber": "+46701234567"
    })
}

/// completed provider session whose amount and contact snapshots match
/// the cart built by [ut_checkout_cart_raw]
pub(super) fn ut_provider_session_raw(status: &str, amount_inc_vat: i64) -> JsnVal {
    json!({
        "status": status,
        "customerType": "consumer",
        "billing": ut_contact_snapshot(),
        "shipping": ut_contact_snapshot(),
        "references": {"reference1": "100000023", "quoteId": "cart-00481"},
        "moduleStatus": {"payment": {"orderStatus": "order_approved_not_captured"}},
        "data": {
            "order": {"amountIncVat": amount_inc_vat},
            "transactions": [
                {"status": "reserved", "pspDisplayName": "Card", "reservationId": "rsv-7731"}
            ]
        }
    })
}

pub(super) fn ut_session_model(session_id: &str, status: &str, amount: i64) -> SessionModel {
    SessionModel::parse(session_id.to_string(), &ut_provider_session_raw(status, amount))
}

pub(super) fn ut_order_model(grand_total: i64) -> MerchantOrderModel {
    let session = ut_session_model("sess-9f2a", "completed", grand_total);
    let (order_m, _warnings) = MerchantOrderModel::materialize(
        "100000023".to_string(),
        "cart-00481".to_string(),
        &session,
        grand_total,
        true,
    )
    .unwrap();
    order_m
}

pub(super) fn ut_ledger_entry(
    id: u64,
    item_id: &str,
    capture_id: &str,
    quantity: u32,
) -> CaptureLedgerEntryModel {
    CaptureLedgerEntryModel {
        id,
        invoice_id: format!("inv-{id}"),
        order_id: "100000023".to_string(),
        item_id: item_id.to_string(),
        capture_id: capture_id.to_string(),
        quantity,
        created_at: chrono::Utc::now(),
    }
}

pub(super) fn ut_invoice_record(
    invoice_id: &str,
    shipping_included: bool,
    paid: bool,
) -> InvoiceRecordModel {
    InvoiceRecordModel {
        invoice_id: invoice_id.to_string(),
        order_id: "100000023".to_string(),
        shipping_included,
        paid,
        created_at: chrono::Utc::now(),
    }
}

// ---- hand-rolled mocks, an unconfigured method panics on invocation
// which doubles as a must-not-call assertion ----

#[derive(Default)]
pub(super) struct MockOrchestrator {
    pub _create_session_result: Mutex<Option<Result<SessionModel, AppProcessorError>>>,
    pub _read_session_result: Mutex<Option<Result<SessionModel, AppProcessorError>>>,
    pub _update_session_result: Mutex<Option<Result<SessionModel, AppProcessorError>>>,
    pub _update_references_result: Mutex<Option<Result<(), AppProcessorError>>>,
    pub _send_decision_result: Mutex<Option<Result<(), AppProcessorError>>>,
    pub _capture_order_result: Mutex<Option<Result<String, AppProcessorError>>>,
    pub _refund_order_results: Mutex<Vec<Result<(), AppProcessorError>>>,
    pub _cancel_order_result: Mutex<Option<Result<CancelOutcome, AppProcessorError>>>,
    // recorders shared with the test body through `Arc` clones
    pub _created_payload: Arc<Mutex<Option<JsnVal>>>,
    pub _updated_payload: Arc<Mutex<Option<JsnVal>>>,
    pub _references_recorded: Arc<Mutex<Option<JsnVal>>>,
    pub _decision_recorded: Arc<Mutex<Option<JsnVal>>>,
    pub _capture_recorded: Arc<Mutex<Option<JsnVal>>>,
    pub _refunds_recorded: Arc<Mutex<Vec<JsnVal>>>,
}

#[async_trait]
impl AbstractPaymentOrchestrator for MockOrchestrator {
    async fn create_session(&self, body: JsnVal) -> Result<SessionModel, AppProcessorError> {
        *self._created_payload.lock().unwrap() = Some(body);
        self._create_session_result.lock().unwrap().take().unwrap()
    }
    async fn read_session(&self, _session_id: &str) -> Result<SessionModel, AppProcessorError> {
        self._read_session_result.lock().unwrap().take().unwrap()
    }
    async fn update_session(
        &self,
        _session_id: &str,
        body: JsnVal,
    ) -> Result<SessionModel, AppProcessorError> {
        *self._updated_payload.lock().unwrap() = Some(body);
        self._update_session_result.lock().unwrap().take().unwrap()
    }
    async fn update_references(
        &self,
        _session_id: &str,
        refs: ReferencesWire,
    ) -> Result<(), AppProcessorError> {
        *self._references_recorded.lock().unwrap() = Some(serde_json::to_value(&refs).unwrap());
        self._update_references_result.lock().unwrap().take().unwrap()
    }
    async fn send_decision(
        &self,
        _session_id: &str,
        body: DecisionWire,
    ) -> Result<(), AppProcessorError> {
        *self._decision_recorded.lock().unwrap() = Some(serde_json::to_value(&body).unwrap());
        self._send_decision_result.lock().unwrap().take().unwrap()
    }
    async fn capture_order(
        &self,
        _session_id: &str,
        body: SettlementWire,
    ) -> Result<String, AppProcessorError> {
        *self._capture_recorded.lock().unwrap() = Some(serde_json::to_value(&body).unwrap());
        self._capture_order_result.lock().unwrap().take().unwrap()
    }
    async fn refund_order(
        &self,
        _session_id: &str,
        body: SettlementWire,
    ) -> Result<(), AppProcessorError> {
        self._refunds_recorded
            .lock()
            .unwrap()
            .push(serde_json::to_value(&body).unwrap());
        let mut results = self._refund_order_results.lock().unwrap();
        assert!(!results.is_empty());
        results.remove(0)
    }
    async fn cancel_order(&self, _session_id: &str) -> Result<CancelOutcome, AppProcessorError> {
        self._cancel_order_result.lock().unwrap().take().unwrap()
    }
} // end of impl AbstractPaymentOrchestrator for MockOrchestrator

#[derive(Default)]
pub(super) struct MockCheckoutRepo {
    pub _get_session_id_result: Mutex<Option<Result<Option<String>, AppRepoError>>>,
    pub _save_session_id_result: Mutex<Option<Result<(), AppRepoError>>>,
    pub _clear_session_id_result: Mutex<Option<Result<(), AppRepoError>>>,
    pub _mark_converted_result: Mutex<Option<Result<bool, AppRepoError>>>,
    pub _saved_pair: Arc<Mutex<Option<(String, String)>>>,
    pub _cleared_cart: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl AbstractCheckoutSessionRepo for MockCheckoutRepo {
    async fn get_session_id(&self, _cart_id: &str) -> Result<Option<String>, AppRepoError> {
        self._get_session_id_result.lock().unwrap().take().unwrap()
    }
    async fn save_session_id(
        &self,
        cart_id: &str,
        session_id: &str,
    ) -> Result<(), AppRepoError> {
        *self._saved_pair.lock().unwrap() =
            Some((cart_id.to_string(), session_id.to_string()));
        self._save_session_id_result.lock().unwrap().take().unwrap()
    }
    async fn clear_session_id(&self, cart_id: &str) -> Result<(), AppRepoError> {
        *self._cleared_cart.lock().unwrap() = Some(cart_id.to_string());
        self._clear_session_id_result.lock().unwrap().take().unwrap()
    }
    async fn mark_converted(&self, _cart_id: &str) -> Result<bool, AppRepoError> {
        self._mark_converted_result.lock().unwrap().take().unwrap()
    }
} // end of impl AbstractCheckoutSessionRepo for MockCheckoutRepo

#[derive(Default)]
pub(super) struct MockOrderRepo {
    pub _create_result: Mutex<Option<Result<bool, AppRepoError>>>,
    pub _fetch_by_order_id_result:
        Mutex<Option<Result<Option<MerchantOrderModel>, AppRepoError>>>,
    pub _fetch_by_cart_id_result:
        Mutex<Option<Result<Option<MerchantOrderModel>, AppRepoError>>>,
    pub _update_progress_result: Mutex<Option<Result<(), AppRepoError>>>,
    pub _update_payment_result: Mutex<Option<Result<(), AppRepoError>>>,
    pub _created_order: Arc<Mutex<Option<MerchantOrderModel>>>,
    pub _progress_recorded:
        Arc<Mutex<Option<(String, MerchantOrderState, MerchantOrderStatus)>>>,
    pub _payment_recorded: Arc<Mutex<Option<i64>>>,
}

#[async_trait]
impl AbstractMerchantOrderRepo for MockOrderRepo {
    async fn create(&self, order: &MerchantOrderModel) -> Result<bool, AppRepoError> {
        *self._created_order.lock().unwrap() = Some(order.clone());
        self._create_result.lock().unwrap().take().unwrap()
    }
    async fn fetch_by_order_id(
        &self,
        _order_id: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError> {
        self._fetch_by_order_id_result.lock().unwrap().take().unwrap()
    }
    async fn fetch_by_cart_id(
        &self,
        _cart_id: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError> {
        self._fetch_by_cart_id_result.lock().unwrap().take().unwrap()
    }
    async fn update_progress(
        &self,
        order_id: &str,
        state: MerchantOrderState,
        status: MerchantOrderStatus,
    ) -> Result<(), AppRepoError> {
        *self._progress_recorded.lock().unwrap() =
            Some((order_id.to_string(), state, status));
        self._update_progress_result.lock().unwrap().take().unwrap()
    }
    async fn update_payment(&self, order: &MerchantOrderModel) -> Result<(), AppRepoError> {
        *self._payment_recorded.lock().unwrap() = Some(order.total_paid);
        self._update_payment_result.lock().unwrap().take().unwrap()
    }
} // end of impl AbstractMerchantOrderRepo for MockOrderRepo

#[derive(Default)]
pub(super) struct MockSettlementRepo {
    pub _add_ledger_result: Mutex<Option<Result<(), AppRepoError>>>,
    // keyed by item id, consumed once per fetch
    pub _item_entries: Mutex<HashMap<String, Vec<CaptureLedgerEntryModel>>>,
    pub _first_capture_result: Mutex<Option<Result<Option<String>, AppRepoError>>>,
    pub _decrement_results: Mutex<Vec<Result<bool, AppRepoError>>>,
    pub _create_invoice_result: Mutex<Option<Result<(), AppRepoError>>>,
    pub _fetch_invoices_result: Mutex<Option<Result<Vec<InvoiceRecordModel>, AppRepoError>>>,
    pub _find_invoice_result:
        Mutex<Option<Result<Option<InvoiceRecordModel>, AppRepoError>>>,
    pub _mark_paid_result: Mutex<Option<Result<bool, AppRepoError>>>,
    pub _ledger_recorded: Arc<Mutex<Vec<(String, String, u32)>>>,
    pub _decrements_recorded: Arc<Mutex<Vec<(u64, u32)>>>,
    pub _invoice_recorded: Arc<Mutex<Option<(String, bool)>>>,
    pub _paid_invoice_recorded: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl AbstractSettlementRepo for MockSettlementRepo {
    async fn add_ledger_entries(
        &self,
        entries: &[CaptureLedgerEntryModel],
    ) -> Result<(), AppRepoError> {
        let mut recorded = self._ledger_recorded.lock().unwrap();
        for e in entries {
            recorded.push((e.item_id.clone(), e.capture_id.clone(), e.quantity));
        }
        self._add_ledger_result.lock().unwrap().take().unwrap()
    }
    async fn fetch_by_item_id(
        &self,
        _order_id: &str,
        item_id: &str,
    ) -> Result<Vec<CaptureLedgerEntryModel>, AppRepoError> {
        Ok(self._item_entries.lock().unwrap().remove(item_id).unwrap())
    }
    async fn first_capture_id(&self, _order_id: &str) -> Result<Option<String>, AppRepoError> {
        self._first_capture_result.lock().unwrap().take().unwrap()
    }
    async fn decrement_quantity(&self, entry_id: u64, by: u32) -> Result<bool, AppRepoError> {
        self._decrements_recorded.lock().unwrap().push((entry_id, by));
        let mut results = self._decrement_results.lock().unwrap();
        assert!(!results.is_empty());
        results.remove(0)
    }
    async fn create_invoice(&self, invoice: &InvoiceRecordModel) -> Result<(), AppRepoError> {
        *self._invoice_recorded.lock().unwrap() =
            Some((invoice.invoice_id.clone(), invoice.shipping_included));
        self._create_invoice_result.lock().unwrap().take().unwrap()
    }
    async fn fetch_invoices(
        &self,
        _order_id: &str,
    ) -> Result<Vec<InvoiceRecordModel>, AppRepoError> {
        self._fetch_invoices_result.lock().unwrap().take().unwrap()
    }
    async fn find_invoice_by_capture(
        &self,
        _capture_id: &str,
    ) -> Result<Option<InvoiceRecordModel>, AppRepoError> {
        self._find_invoice_result.lock().unwrap().take().unwrap()
    }
    async fn mark_invoice_paid(&self, invoice_id: &str) -> Result<bool, AppRepoError> {
        *self._paid_invoice_recorded.lock().unwrap() = Some(invoice_id.to_string());
        self._mark_paid_result.lock().unwrap().take().unwrap()
    }
} // end of impl AbstractSettlementRepo for MockSettlementRepo
