use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::{FromValue, Query, Queryable, WithParams};
use mysql_async::{from_value_opt, Params, Row as DbRow, Value as DbValue};

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::error::AppErrorCode;
use crate::logging::{app_log_event, AppLogLevel};
use crate::model::{
    CompanyModel, MerchantOrderModel, MerchantOrderState, MerchantOrderStatus,
};

use super::super::{
    AbstractMerchantOrderRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel,
};

struct InsertOrderArgs(String, Params);
struct FetchOrderArgs(String, Params);
struct UpdateProgressArgs(String, Params);
struct UpdatePaymentArgs(String, Params);

const ORDER_COLUMNS: &str = "`order_id`,`cart_id`,`state`,`status`,`session_id`,\
    `psp_name`,`reservation_id`,`backoffice_url`,`session_status`,`company_cin`,\
    `company_name`,`company_vat`,`strong_auth`,`total_paid`,`grand_total`";

impl<'a> From<&'a MerchantOrderModel> for InsertOrderArgs {
    fn from(value: &'a MerchantOrderModel) -> Self {
        let (cin, cname, cvat) = match value.company.as_ref() {
            Some(c) => (
                Some(c.cin.clone()),
                Some(c.name.clone()),
                Some(c.vat_number.clone()),
            ),
            None => (None, None, None),
        };
        let arg = vec![
            value.order_id.as_str().into(),
            value.cart_id.as_str().into(),
            value.state.as_str().into(),
            value.status.as_str().into(),
            value.session_id.clone().into(),
            value.psp_display_name.as_str().into(),
            value.reservation_id.as_str().into(),
            value.backoffice_url.as_str().into(),
            value.session_status.as_str().into(),
            cin.into(),
            cname.into(),
            cvat.into(),
            value.strong_auth.clone().into(),
            value.total_paid.into(),
            value.grand_total.into(),
        ];
        // INSERT IGNORE together with the unique cart-id index keeps
        // concurrent materialization attempts down to a single row
        let stmt = format!(
            "INSERT IGNORE INTO `merchant_order`({ORDER_COLUMNS}) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"
        );
        Self(stmt, Params::Positional(arg))
    }
} // end of impl InsertOrderArgs

impl<'a> From<(&'a str, &'a str)> for FetchOrderArgs {
    fn from(value: (&'a str, &'a str)) -> Self {
        let (key_column, key) = value;
        let stmt = format!(
            "SELECT {ORDER_COLUMNS} FROM `merchant_order` WHERE `{key_column}`=?"
        );
        let params = Params::Positional(vec![key.into()]);
        Self(stmt, params)
    }
}
impl<'a> From<(&'a str, MerchantOrderState, MerchantOrderStatus)> for UpdateProgressArgs {
    fn from(value: (&'a str, MerchantOrderState, MerchantOrderStatus)) -> Self {
        let (order_id, state, status) = value;
        let stmt = "UPDATE `merchant_order` SET `state`=?, `status`=? WHERE `order_id`=?";
        let arg = vec![
            state.as_str().into(),
            status.as_str().into(),
            order_id.into(),
        ];
        Self(stmt.to_string(), Params::Positional(arg))
    }
}
impl<'a> From<&'a MerchantOrderModel> for UpdatePaymentArgs {
    fn from(value: &'a MerchantOrderModel) -> Self {
        let stmt = "UPDATE `merchant_order` SET `state`=?, `status`=?, `total_paid`=? \
                    WHERE `order_id`=?";
        let arg = vec![
            value.state.as_str().into(),
            value.status.as_str().into(),
            value.total_paid.into(),
            value.order_id.as_str().into(),
        ];
        Self(stmt.to_string(), Params::Positional(arg))
    }
}

fn take_cell<T: FromValue>(
    cells: &mut std::vec::IntoIter<DbValue>,
    label: &str,
) -> Result<T, (AppErrorCode, AppRepoErrorDetail)> {
    let parse_err = || {
        (
            AppErrorCode::DataCorruption,
            AppRepoErrorDetail::DataRowParse(label.to_string()),
        )
    };
    let value = cells.next().ok_or_else(parse_err)?;
    from_value_opt::<T>(value).map_err(|_e| parse_err())
}

// the order row is wider than the widest tuple `mysql_async` converts
// through `FromRow`, cells are pulled out of the raw row one by one
fn try_into_order(
    cells: Vec<DbValue>,
) -> Result<MerchantOrderModel, (AppErrorCode, AppRepoErrorDetail)> {
    let c = &mut cells.into_iter();
    let order_id = take_cell::<String>(c, "order_id")?;
    let cart_id = take_cell::<String>(c, "cart_id")?;
    let state_raw = take_cell::<String>(c, "state")?;
    let status_raw = take_cell::<String>(c, "status")?;
    let session_id = take_cell::<Option<String>>(c, "session_id")?;
    let psp_display_name = take_cell::<String>(c, "psp_name")?;
    let reservation_id = take_cell::<String>(c, "reservation_id")?;
    let backoffice_url = take_cell::<String>(c, "backoffice_url")?;
    let session_status = take_cell::<String>(c, "session_status")?;
    let company_cin = take_cell::<Option<String>>(c, "company_cin")?;
    let company_name = take_cell::<Option<String>>(c, "company_name")?;
    let company_vat = take_cell::<Option<String>>(c, "company_vat")?;
    let strong_auth = take_cell::<Option<String>>(c, "strong_auth")?;
    let total_paid = take_cell::<i64>(c, "total_paid")?;
    let grand_total = take_cell::<i64>(c, "grand_total")?;
    let state = MerchantOrderState::from_label(state_raw.as_str()).ok_or((
        AppErrorCode::DataCorruption,
        AppRepoErrorDetail::DataRowParse(format!("order-state: {state_raw}")),
    ))?;
    let status = MerchantOrderStatus::from_label(status_raw.as_str()).ok_or((
        AppErrorCode::DataCorruption,
        AppRepoErrorDetail::DataRowParse(format!("order-status: {status_raw}")),
    ))?;
    let company = company_cin.map(|cin| CompanyModel {
        cin,
        name: company_name.unwrap_or_default(),
        vat_number: company_vat.unwrap_or_default(),
    });
    Ok(MerchantOrderModel {
        order_id,
        cart_id,
        state,
        status,
        session_id,
        psp_display_name,
        reservation_id,
        backoffice_url,
        session_status,
        company,
        strong_auth,
        total_paid,
        grand_total,
    })
} // end of fn try_into_order

pub(crate) struct MariadbOrderRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbOrderRepo {
    pub(crate) fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitOrderRepo,
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

    async fn _fetch_one(
        &self,
        key_column: &str,
        key: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError> {
        let q_arg = FetchOrderArgs::from((key_column, key));
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::FetchOrder,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let maybe_row = q_arg
            .0
            .with(q_arg.1)
            .first::<DbRow, _>(&mut conn)
            .await
            .map_err(|e| {
                self._map_err(
                    AppRepoErrorFnLabel::FetchOrder,
                    AppRepoErrorDetail::DatabaseExec(e.to_string()),
                )
            })?;
        match maybe_row {
            None => Ok(None),
            Some(row) => try_into_order(row.unwrap()).map(Some).map_err(|(code, detail)| {
                let mut e = self._map_err(AppRepoErrorFnLabel::FetchOrder, detail);
                e.code = code;
                e
            }),
        }
    } // end of fn _fetch_one
} // end of impl MariadbOrderRepo

#[async_trait]
impl AbstractMerchantOrderRepo for MariadbOrderRepo {
    async fn create(&self, order: &MerchantOrderModel) -> Result<bool, AppRepoError> {
        let q_arg = InsertOrderArgs::from(order);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::CreateOrder,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::CreateOrder,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(resultset.affected_rows() == 1u64)
    }

    async fn fetch_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError> {
        self._fetch_one("order_id", order_id).await
    }

    async fn fetch_by_cart_id(
        &self,
        cart_id: &str,
    ) -> Result<Option<MerchantOrderModel>, AppRepoError> {
        self._fetch_one("cart_id", cart_id).await
    }

    async fn update_progress(
        &self,
        order_id: &str,
        state: MerchantOrderState,
        status: MerchantOrderStatus,
    ) -> Result<(), AppRepoError> {
        let q_arg = UpdateProgressArgs::from((order_id, state, status));
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::UpdateOrderProgress,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let _resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::UpdateOrderProgress,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(())
    }

    async fn update_payment(&self, order: &MerchantOrderModel) -> Result<(), AppRepoError> {
        let q_arg = UpdatePaymentArgs::from(order);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::UpdateOrderPayment,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let _resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::UpdateOrderPayment,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(())
    }
} // end of impl AbstractMerchantOrderRepo for MariadbOrderRepo
