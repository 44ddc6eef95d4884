use std::sync::Arc;

use hyper::header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use hyper::{Method, StatusCode};
use serde::ser::Serialize;
use serde_json::Value as JsnVal;
use tokio_native_tls::TlsConnector;

use super::super::base_client::{BaseClient, BaseClientError, BaseClientErrorReason};
use crate::logging::AppLogContext;

pub(super) struct AppBriqpayClient {
    api_key: String, // base64(client-id:shared-secret)
    user_agent: String,
    _base_client: BaseClient,
}

impl AppBriqpayClient {
    pub(super) async fn try_build(
        logctx: Arc<AppLogContext>,
        secure_connector: &TlsConnector,
        host: String,
        port: u16,
        api_key: String,
        user_agent: String,
    ) -> Result<Self, BaseClientError> {
        let _base_client = BaseClient::try_build(logctx, secure_connector, host, port).await?;
        Ok(Self {
            api_key,
            user_agent,
            _base_client,
        })
    }

    pub(super) async fn execute_json<S>(
        &mut self,
        path: &str,
        method: Method,
        body_obj: Option<&S>,
    ) -> Result<(JsnVal, StatusCode), BaseClientError>
    where
        S: Serialize + Send + 'static,
    {
        let raw_body = match body_obj {
            Some(b) => serde_json::to_vec(b).map_err(|e| BaseClientError {
                reason: BaseClientErrorReason::SerialiseFailure(e.to_string()),
            })?,
            None => Vec::new(),
        };
        let value = format!("Basic {}", self.api_key.as_str());
        let headers: Vec<(HeaderName, HeaderValue)> = vec![
            (
                AUTHORIZATION,
                HeaderValue::from_str(value.as_str()).map_err(|_e| BaseClientError {
                    reason: BaseClientErrorReason::HttpRequest(
                        "auth-header-parse-fail".to_string(),
                    ),
                })?,
            ),
            (ACCEPT, HeaderValue::from_str("application/json").unwrap()),
            (
                CONTENT_TYPE,
                HeaderValue::from_str("application/json").unwrap(),
            ),
            (
                USER_AGENT,
                HeaderValue::from_str(self.user_agent.as_str()).map_err(|_e| BaseClientError {
                    reason: BaseClientErrorReason::HttpRequest(
                        "user-agent-header-parse-fail".to_string(),
                    ),
                })?,
            ),
        ];
        let (raw_resp, status) = self
            ._base_client
            .execute(path, method, raw_body, headers)
            .await?;
        let parsed = if raw_resp.is_empty() {
            JsnVal::Null
        } else {
            serde_json::from_slice::<JsnVal>(&raw_resp).map_err(|_e| BaseClientError {
                reason: BaseClientErrorReason::DeserialiseFailure(
                    Box::new(String::from_utf8_lossy(&raw_resp).to_string()),
                    status.as_u16(),
                ),
            })?
        };
        Ok((parsed, status))
    } // end of fn execute_json
} // end of impl AppBriqpayClient
