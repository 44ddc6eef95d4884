use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use mysql_async::prelude::{Query, Queryable, WithParams};
use mysql_async::Params;

use crate::adapter::datastore::{AppDStoreMariaDB, AppDataStoreContext};
use crate::error::AppErrorCode;
use crate::logging::{app_log_event, AppLogLevel};

use super::super::{
    AbstractCheckoutSessionRepo, AppRepoError, AppRepoErrorDetail, AppRepoErrorFnLabel,
};

struct FetchRefArgs(String, Params);
struct SaveRefArgs(String, Params);
struct ClearRefArgs(String, Params);
struct ConvertArgs(String, Params);

impl<'a> From<&'a str> for FetchRefArgs {
    fn from(cart_id: &'a str) -> Self {
        let stmt = "SELECT `session_id` FROM `checkout_session_ref` WHERE `cart_id`=?";
        let params = Params::Positional(vec![cart_id.into()]);
        Self(stmt.to_string(), params)
    }
}
impl<'a> From<(&'a str, &'a str)> for SaveRefArgs {
    fn from(value: (&'a str, &'a str)) -> Self {
        let (cart_id, session_id) = value;
        let stmt = "INSERT INTO `checkout_session_ref`(`cart_id`,`session_id`,`converted`) \
                    VALUES (?,?,0) ON DUPLICATE KEY UPDATE `session_id`=VALUE(`session_id`)";
        let params = Params::Positional(vec![cart_id.into(), session_id.into()]);
        Self(stmt.to_string(), params)
    }
}
impl<'a> From<&'a str> for ClearRefArgs {
    fn from(cart_id: &'a str) -> Self {
        let stmt = "UPDATE `checkout_session_ref` SET `session_id`=NULL WHERE `cart_id`=?";
        let params = Params::Positional(vec![cart_id.into()]);
        Self(stmt.to_string(), params)
    }
}
impl<'a> From<&'a str> for ConvertArgs {
    fn from(cart_id: &'a str) -> Self {
        // the flip happens at most once, racing materialization paths
        // observe zero affected rows and turn into no-ops
        let stmt = "UPDATE `checkout_session_ref` SET `converted`=1 \
                    WHERE `cart_id`=? AND `converted`=0";
        let params = Params::Positional(vec![cart_id.into()]);
        Self(stmt.to_string(), params)
    }
}

pub(crate) struct MariadbCheckoutRepo {
    _dstore: Arc<AppDStoreMariaDB>,
}

impl MariadbCheckoutRepo {
    pub(crate) fn new(ds: Arc<AppDataStoreContext>) -> Result<Self, AppRepoError> {
        ds.mariadb(None)
            .map(|found| Self { _dstore: found })
            .ok_or(AppRepoError {
                fn_label: AppRepoErrorFnLabel::InitCheckoutRepo,
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
} // end of impl MariadbCheckoutRepo

#[async_trait]
impl AbstractCheckoutSessionRepo for MariadbCheckoutRepo {
    async fn get_session_id(&self, cart_id: &str) -> Result<Option<String>, AppRepoError> {
        let q_arg = FetchRefArgs::from(cart_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::GetSessionRef,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let row = q_arg
            .0
            .with(q_arg.1)
            .first::<(Option<String>,), _>(&mut conn)
            .await
            .map_err(|e| {
                self._map_err(
                    AppRepoErrorFnLabel::GetSessionRef,
                    AppRepoErrorDetail::DatabaseExec(e.to_string()),
                )
            })?;
        Ok(row.and_then(|(maybe_sid,)| maybe_sid))
    }

    async fn save_session_id(
        &self,
        cart_id: &str,
        session_id: &str,
    ) -> Result<(), AppRepoError> {
        let q_arg = SaveRefArgs::from((cart_id, session_id));
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::SaveSessionRef,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let _resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::SaveSessionRef,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(())
    }

    async fn clear_session_id(&self, cart_id: &str) -> Result<(), AppRepoError> {
        let q_arg = ClearRefArgs::from(cart_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::ClearSessionRef,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let _resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::ClearSessionRef,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(())
    }

    async fn mark_converted(&self, cart_id: &str) -> Result<bool, AppRepoError> {
        let q_arg = ConvertArgs::from(cart_id);
        let mut conn = self._dstore.acquire().await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::MarkCartConverted,
                AppRepoErrorDetail::DataStore(e),
            )
        })?;
        let resultset = conn.exec_iter(q_arg.0, q_arg.1).await.map_err(|e| {
            self._map_err(
                AppRepoErrorFnLabel::MarkCartConverted,
                AppRepoErrorDetail::DatabaseExec(e.to_string()),
            )
        })?;
        Ok(resultset.affected_rows() == 1u64)
    }
} // end of impl AbstractCheckoutSessionRepo for MariadbCheckoutRepo
