use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::{Query, Queryable, WithParams};
use mysql_async::{IsolationLevel, Params, TxOpts};

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::error::AppErrorCode;
use crate::logging::{app_log_event, AppLogLevel};
use crate::model::{CaptureLedgerEntryModel, InvoiceRecordModel};

use super::super::{
    AbstractSettlementRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel,
};
use super::{raw_column_to_datetime, DATETIME_FMT_P0F};

struct InsertLedgerArgs(String, Vec<Params>);
struct FetchLedgerArgs(String, Params);
struct DecrementArgs(String, Params);
struct InsertInvoiceArgs(String, Params);
struct FetchInvoiceArgs(String, Params);
struct MarkPaidArgs(String, Params);

#[rustfmt::skip]
type LedgerRowType = (
    u64,                // id
    String,             // invoice_id
    String,             // order_id
    String,             // item_id
    String,             // capture_id
    u32,                // quantity
    mysql_async::Value, // created_at
);
type InvoiceRowType = (String, String, bool, bool, mysql_async::Value);

const LEDGER_COLUMNS: &str =
    "`id`,`invoice_id`,`order_id`,`item_id`,`capture_id`,`quantity`,`created_at`";
const INVOICE_COLUMNS: &str =
    "`invoice_id`,`order_id`,`shipping_included`,`paid`,`created_at`";

impl<'a> From<&'a [CaptureLedgerEntryModel]> for InsertLedgerArgs {
    fn from(entries: &'a [CaptureLedgerEntryModel]) -> Self {
        let stmt = "INSERT INTO `capture_ledger`(`invoice_id`,`order_id`,`item_id`,\
                    `capture_id`,`quantity`,`created_at`) VALUES (?,?,?,?,?,?)";
        let params = entries
            .iter()
            .map(|e| {
                let arg = vec![
                    e.invoice_id.as_str().into(),
                    e.order_id.as_str().into(),
                    e.item_id.as_str().into(),
                    e.capture_id.as_str().into(),
                    e.quantity.into(),
                    e.created_at.format(DATETIME_FMT_P0F).to_string().into(),
                ];
                Params::Positional(arg)
            })
            .collect::<Vec<_>>();
        Self(stmt.to_string(), params)
    }
} // end of impl InsertLedgerArgs

impl FetchLedgerArgs {
    fn by_item(order_id: &str, item_id: &str) -> Self {
        let stmt = format!(
            "SELECT {LEDGER_COLUMNS} FROM `capture_ledger` \
             WHERE `order_id`=? AND `item_id`=? ORDER BY `created_at` ASC, `id` ASC"
        );
        let params = Params::Positional(vec![order_id.into(), item_id.into()]);
        Self(stmt, params)
    }
    fn first_capture(order_id: &str) -> Self {
        let stmt = "SELECT `capture_id` FROM `capture_ledger` WHERE `order_id`=? \
                    ORDER BY `created_at` ASC, `id` ASC LIMIT 1";
        let params = Params::Positional(vec![order_id.into()]);
        Self(stmt.to_string(), params)
    }
} // end of impl FetchLedgerArgs

impl From<(u64, u32)> for DecrementArgs {
    fn from(value: (u64, u32)) -> Self {
        let (entry_id, by) = value;
        // the quantity guard in the predicate keeps concurrent refunds
        // from draining the same entry twice
        let stmt = "UPDATE `capture_ledger` SET `quantity`=`quantity`-? \
                    WHERE `id`=? AND `quantity`>=?";
        let arg = vec![by.into(), entry_id.into(), by.into()];
        Self(stmt.to_string(), Params::Positional(arg))
    }
}
impl<'a> From<&'a InvoiceRecordModel> for InsertInvoiceArgs {
    fn from(value: &'a InvoiceRecordModel) -> Self {
        let stmt = format!(
            "INSERT INTO `order_invoice`({INVOICE_COLUMNS}) VALUES (?,?,?,?,?)"
        );
        let arg = vec![
            value.invoice_id.as_str().into(),
            value.order_id.as_str().into(),
            value.shipping_included.into(),
            value.paid.into(),
            value.created_at.format(DATETIME_FMT_P0F).to_string().into(),
        ];
        Self(stmt, Params::Positional(arg))
    }
}
impl FetchInvoiceArgs {
    fn by_order(order_id: &str) -> Self {
        let stmt = format!(
            "SELECT {INVOICE_COLUMNS} FROM `order_invoice` \
             WHERE `order_id`=? ORDER BY `created_at` ASC"
        );
        let params = Params::Positional(vec![order_id.into()]);
        Self(stmt, params)
    }
    fn by_capture(capture_id: &str) -> Self {
        let stmt = "SELECT `i`.`invoice_id`,`i`.`order_id`,`i`.`shipping_included`,\
                    `i`.`paid`,`i`.`created_at` FROM `order_invoice` AS `i` \
                    INNER JOIN `capture_ledger` AS `l` ON `l`.`invoice_id`=`i`.`invoice_id` \
                    WHERE `l`.`capture_id`=? LIMIT 1";
        let params = Params::Positional(vec![capture_id.into()]);
        Self(stmt.to_string(), params)
    }
}
impl<'a> From<&'a str> for MarkPaidArgs {
    fn from(invoice_id: &'a str) -> Self {
        let stmt = "UPDATE `order_invoice` SET `paid`=1 WHERE `invoice_id`=? AND `paid`=0";
        let params = Params::Positional(vec![invoice_id.into()]);
        Self(stmt.to_string(), params)
    }
}

fn try_into_ledger_entry(
    row: LedgerRowType,
) -> Result<CaptureLedgerEntryModel, (AppErrorCode, AppRepoErrorDetail)> {
    let (id, invoice_id, order_id, item_id, capture_id, quantity, created_raw) = row;
    let created_at = raw_column_to_datetime(created_raw, 0)?;
    Ok(CaptureLedgerEntryModel {
        id,
        invoice_id,
        order_id,
        item_id,
        capture_id,
        quantity,
        created_at,
    })
}
fn try_into_invoice(
    row: InvoiceRowType,
) -> Result<InvoiceRecordModel, (AppErrorCode, AppRepoErrorDetail)> {
    let (invoice_id, order_id, shipping_included, paid, created_raw) = row;
    let created_at = raw_column_to_datetime(created_raw, 0)?;
    Ok(InvoiceRecordModel {
        invoice_id,
        order_id,
        shipping_included,
        paid,
        created_at,
    })
}

pub(crate) struct MariadbSettlementRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbSettlementRepo {
    pub(crate) fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitSettlementRepo,
                code: AppErrorCode::MissingDataStore,
                detail: AppRepoErrorDetail::Unknown,
            })
    }

    fn _map_err(&self, fn_label: AppRepoErrorFnLabel, detail: AppRepoErrorDetail) -> AppRepoError {
        let e = AppRepoError {
            fn_label,
            code: AppErrorCode::RemoteDbServerFailure,
            detail,
        };
        let logctx = self._dstore.log_context();
        app_log_event!(logctx, AppLogLevel::ERROR, "{:?}", e);
        e
    }

    async fn _fetch_entries(
        &self,
        fn_label: AppRepoErrorFnLabel,
        q_arg: FetchLedgerArgs,
    ) -> Result<Vec<CaptureLedgerEntryModel>, AppRepoError> {
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::FetchLedgerEntries,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let rows = q_arg
            .0
            .with(q_arg.1)
            .fetch::<LedgerRowType, _>(&mut conn)
            .await
            .map_err(|e| {
                self._map_err(fn_label, AppRepoErrorDetail::DatabaseExec(e.to_string()))
            })?;
        rows.into_iter()
            .map(|row| {
                try_into_ledger_entry(row).map_err(|(code, detail)| {
                    let mut e =
                        self._map_err(AppRepoErrorFnLabel::FetchLedgerEntries, detail);
                    e.code = code;
                    e
                })
            })
            .collect()
    } // end of fn _fetch_entries
} // end of impl MariadbSettlementRepo

#[async_trait]
impl AbstractSettlementRepo for MariadbSettlementRepo {
    async fn add_ledger_entries(
        &self,
        entries: &[CaptureLedgerEntryModel],
    ) -> Result<(), AppRepoError> {
        if entries.is_empty() {
            return Ok(());
        }
        let q_arg = InsertLedgerArgs::from(entries);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::AddLedgerEntries,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let mut options = TxOpts::new();
        options.with_isolation_level(IsolationLevel::ReadCommitted);
        let mut tx = conn.start_transaction(options).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::AddLedgerEntries,
                AppRepoErrorDetail::DatabaseTxStart(e.to_string()),
            )
        })?;
        tx.exec_batch(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::AddLedgerEntries,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        tx.commit().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::AddLedgerEntries,
                AppRepoErrorDetail::DatabaseTxCommit(e.to_string()),
            )
        })
    } // end of fn add_ledger_entries

    async fn fetch_by_item_id(
        &self,
        order_id: &str,
        item_id: &str,
    ) -> Result<Vec<CaptureLedgerEntryModel>, AppRepoError> {
        let q_arg = FetchLedgerArgs::by_item(order_id, item_id);
        self._fetch_entries(AppRepoErrorFnLabel::FetchLedgerEntries, q_arg)
            .await
    }

    async fn first_capture_id(&self, order_id: &str) -> Result<Option<String>, AppRepoError> {
        let q_arg = FetchLedgerArgs::first_capture(order_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::FetchLedgerEntries,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let row = q_arg
            .0
            .with(q_arg.1)
            .first::<(String,), _>(&mut conn)
            .await
            .map_err(|e| {
                self._map_err(
                    AppRepoErrorFnLabel::FetchLedgerEntries,
                    AppRepoErrorDetail::DatabaseExec(e.to_string()),
                )
            })?;
        Ok(row.map(|(capture_id,)| capture_id))
    }

    async fn decrement_quantity(&self, entry_id: u64, by: u32) -> Result<bool, AppRepoError> {
        let q_arg = DecrementArgs::from((entry_id, by));
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::DecrementLedgerEntry,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::DecrementLedgerEntry,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(resultset.affected_rows() == 1u64)
    }

    async fn create_invoice(&self, invoice: &InvoiceRecordModel) -> Result<(), AppRepoError> {
        let q_arg = InsertInvoiceArgs::from(invoice);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::CreateInvoice,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let _resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::CreateInvoice,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(())
    }

    async fn fetch_invoices(
        &self,
        order_id: &str,
    ) -> Result<Vec<InvoiceRecordModel>, AppRepoError> {
        let q_arg = FetchInvoiceArgs::by_order(order_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::FetchInvoices,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let rows = q_arg
            .0
            .with(q_arg.1)
            .fetch::<InvoiceRowType, _>(&mut conn)
            .await
            .map_err(|e| {
                self._map_err(
                    AppRepoErrorFnLabel::FetchInvoices,
                    AppRepoErrorDetail::DatabaseExec(e.to_string()),
                )
            })?;
        rows.into_iter()
            .map(|row| {
                try_into_invoice(row).map_err(|(code, detail)| {
                    let mut e = self._map_err(AppRepoErrorFnLabel::FetchInvoices, detail);
                    e.code = code;
                    e
                })
            })
            .collect()
    } // end of fn fetch_invoices

    async fn find_invoice_by_capture(
        &self,
        capture_id: &str,
    ) -> Result<Option<InvoiceRecordModel>, AppRepoError> {
        let q_arg = FetchInvoiceArgs::by_capture(capture_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::FetchInvoices,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let maybe_row = q_arg
            .0
            .with(q_arg.1)
            .first::<InvoiceRowType, _>(&mut conn)
            .await
            .map_err(|e| {
                self._map_err(
                    AppRepoErrorFnLabel::FetchInvoices,
                    AppRepoErrorDetail::DatabaseExec(e.to_string()),
                )
            })?;
        match maybe_row {
            None => Ok(None),
            Some(row) => try_into_invoice(row).map(Some).map_err(|(code, detail)| {
                let mut e = self._map_err(AppRepoErrorFnLabel::FetchInvoices, detail);
                e.code = code;
                e
            }),
        }
    } // end of fn find_invoice_by_capture

    async fn mark_invoice_paid(&self, invoice_id: &str) -> Result<bool, AppRepoError> {
        let q_arg = MarkPaidArgs::from(invoice_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::MarkInvoicePaid,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::MarkInvoicePaid,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(resultset.affected_rows() == 1u64)
    }
} // end of impl AbstractSettlementRepo for MariadbSettlementRepo
