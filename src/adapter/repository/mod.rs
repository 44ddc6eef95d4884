mod mariadb;

use std::boxed::Box;
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;

use self::mariadb::{MariadbCheckoutRepo, MariadbOrderRepo, MariadbSettlementRepo};
use super::datastore::{AppDStoreError, AppDataStoreContext};
use crate::error::AppErrorCode;
use crate::model::{
    CaptureLedgerEntryModel, InvoiceRecordModel, MerchantOrderModel, MerchantOrderState,
    MerchantOrderStatus,
};

#[derive(Debug)]
pub enum AppRepoErrorFnLabel {
    InitCheckoutRepo,
    InitOrderRepo,
    InitSettlementRepo,
    GetSessionRef,
    SaveSessionRef,
    ClearSessionRef,
    MarkCartConverted,
    CreateOrder,
    FetchOrder,
    UpdateOrderProgress,
    UpdateOrderPayment,
    AddLedgerEntries,
    FetchLedgerEntries,
    DecrementLedgerEntry,
    CreateInvoice,
    FetchInvoices,
    MarkInvoicePaid,
}

#[derive(Debug)]
pub enum AppRepoErrorDetail {
    DataStore(AppDStoreError),
    DatabaseTxStart(String),
    DatabaseTxCommit(String),
    DatabaseExec(String),
    DataRowParse(String),
    Unknown,
}

#[derive(Debug)]
pub struct AppRepoError {
    pub fn_label: AppRepoErrorFnLabel,
    pub code: AppErrorCode,
    pub detail: AppRepoErrorDetail,
}

/// session reference persisted against the active cart, the only local
/// state the checkout flow keeps between requests
#[async_trait]
pub trait AbstractCheckoutSessionRepo: Sync + Send {
    async fn get_session_id(&self, cart_id: &str) -> Result<Option<String>, AppRepoError>;
    async fn save_session_id(&self, cart_id: &str, session_id: &str)
        -> Result<(), AppRepoError>;
    async fn clear_session_id(&self, cart_id: &str) -> Result<(), AppRepoError>;
    /// compare-and-swap on the converted flag, returns whether this call
    /// performed the flip, guarding at-most-once order materialization
    async fn mark_converted(&self, cart_id: &str) -> Result<bool, AppRepoError>;
}

#[async_trait]
pub trait AbstractMerchantOrderRepo: Sync + Send {
    /// insert guarded by the unique cart-id constraint, returns `false`
    /// when an order for the cart already exists
    async fn create(&self, order: &MerchantOrderModel) -> Result<bool, AppRepoError>;
    async fn fetch_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError>;
    async fn fetch_by_cart_id(
        &self,
        cart_id: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError>;
    async fn update_progress(
        &self,
        order_id: &str,
        state: MerchantOrderState,
        status: MerchantOrderStatus,
    ) -> Result<(), AppRepoError>;
    async fn update_payment(&self, order: &MerchantOrderModel) -> Result<(), AppRepoError>;
}

#[async_trait]
pub trait AbstractSettlementRepo: Sync + Send {
    async fn add_ledger_entries(
        &self,
        entries: &[CaptureLedgerEntryModel],
    ) -> Result<(), AppRepoError>;
    /// entries for one order line, ordered by creation time
    async fn fetch_by_item_id(
        &self,
        order_id: &str,
        item_id: &str,
    ) -> Result<Vec<CaptureLedgerEntryModel>, AppRepoError>;
    /// the earliest capture recorded for the order, shipping refunds are
    /// attributed to it
    async fn first_capture_id(&self, order_id: &str) -> Result<Option<String>, AppRepoError>;
    /// atomic decrement, returns `false` when the remaining quantity is
    /// lower than requested, concurrent refunds must never double-spend
    async fn decrement_quantity(&self, entry_id: u64, by: u32) -> Result<bool, AppRepoError>;
    async fn create_invoice(&self, invoice: &InvoiceRecordModel) -> Result<(), AppRepoError>;
    async fn fetch_invoices(
        &self,
        order_id: &str,
    ) -> Result<Vec<InvoiceRecordModel>, AppRepoError>;
    async fn find_invoice_by_capture(
        &self,
        capture_id: &str,
    ) -> Result<Option<InvoiceRecordModel>, AppRepoError>;
    /// returns whether the paid flag actually changed
    async fn mark_invoice_paid(&self, invoice_id: &str) -> Result<bool, AppRepoError>;
} // end of trait AbstractSettlementRepo

pub fn app_repo_checkout(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractCheckoutSessionRepo>, AppRepoError> {
    let repo = MariadbCheckoutRepo::new(dstore)?;
    Ok(Box::new(repo))
}

pub fn app_repo_order(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractMerchantOrderRepo>, AppRepoError> {
    let repo = MariadbOrderRepo::new(dstore)?;
    Ok(Box::new(repo))
}

pub fn app_repo_settlement(
    dstore: Arc<AppDataStoreContext>,
) -> Result<Box<dyn AbstractSettlementRepo>, AppRepoError> {
    let repo = MariadbSettlementRepo::new(dstore)?;
    Ok(Box::new(repo))
}
