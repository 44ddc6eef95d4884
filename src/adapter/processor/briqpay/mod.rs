mod client;
mod mock;
pub mod resources;

use std::boxed::Box;
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::Method;
use serde::Deserialize;
use serde_json::Value as JsnVal;
use tokio_native_tls::{native_tls, TlsConnector as TlsConnectorWrapper};

use self::client::AppBriqpayClient;
use self::resources::{DecisionWire, ReferencesWire, SettlementWire};
pub(super) use mock::MockProcessorBriqpayCtx;

use super::{AppProcessorErrorReason, BaseClientError, CancelOutcome};
use crate::confidentiality::AbstractConfidentiality;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::SessionModel;

const CANCEL_NOT_SUPPORTED_CODE: &str = "CANCEL_NOT_SUPPORTED";
const CANCEL_NOT_SUPPORTED_MSG: &str =
    "Cancel is not supported for the selected payment provider";

/// the configured storefront platform tag is appended so provider-side
/// request logs tell merchant installations apart
fn compose_user_agent(platform_tag: &str) -> String {
    let mut out = format!("checkout-payment/{}", env!("CARGO_PKG_VERSION"));
    if !platform_tag.is_empty() {
        out.push(' ');
        out.push_str(platform_tag);
    }
    out
}

#[async_trait]
pub(super) trait AbstBriqpayContext: Send + Sync {
    async fn create_session(&self, body: JsnVal)
        -> Result<SessionModel, AppProcessorErrorReason>;
    async fn read_session(&self, session_id: &str)
        -> Result<SessionModel, AppProcessorErrorReason>;
    async fn update_session(
        &self,
        session_id: &str,
        body: JsnVal,
    ) -> Result<SessionModel, AppProcessorErrorReason>;
    async fn update_references(
        &self,
        session_id: &str,
        refs: ReferencesWire,
    ) -> Result<(), AppProcessorErrorReason>;
    async fn send_decision(
        &self,
        session_id: &str,
        body: DecisionWire,
    ) -> Result<(), AppProcessorErrorReason>;
    async fn capture_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<String, AppProcessorErrorReason>;
    async fn refund_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<(), AppProcessorErrorReason>;
    async fn cancel_order(
        &self,
        session_id: &str,
    ) -> Result<CancelOutcome, AppProcessorErrorReason>;
} // end of trait AbstBriqpayContext

#[derive(Deserialize)]
struct BriqpaySecret {
    #[serde(rename = "CLIENT_ID")]
    client_id: String,
    #[serde(rename = "SHARED_SECRET")]
    shared_secret: String,
}

pub(super) struct AppProcessorBriqpayCtx {
    host: String,
    port: u16,
    secure_connector: TlsConnectorWrapper,
    api_key: String,
    user_agent: String,
    logctx: Arc<AppLogContext>,
}

impl AppProcessorBriqpayCtx {
    pub(super) fn try_build(
        host: &str,
        port: u16,
        confidential_path: &str,
        platform_tag: &str,
        cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
        logctx: Arc<AppLogContext>,
    ) -> Result<Box<dyn AbstBriqpayContext>, AppProcessorErrorReason> {
        let serial = cfdntl
            .try_get_payload(confidential_path)
            .map_err(|_e| AppProcessorErrorReason::MissingCredential)?;
        let secret = serde_json::from_str::<BriqpaySecret>(serial.as_str())
            .map_err(|_e| AppProcessorErrorReason::CredentialCorrupted)?;
        if secret.client_id.is_empty() || secret.shared_secret.is_empty() {
            return Err(AppProcessorErrorReason::MissingCredential);
        }
        let api_key = {
            use base64::{engine::general_purpose::STANDARD as b64, Engine};
            b64.encode(format!("{}:{}", secret.client_id, secret.shared_secret))
        };
        let user_agent = compose_user_agent(platform_tag);
        let secure_connector = {
            let mut builder = native_tls::TlsConnector::builder();
            builder.min_protocol_version(Some(native_tls::Protocol::Tlsv12));
            let c = builder
                .build()
                .map_err(|e| BaseClientError { reason: e.into() })
                .map_err(AppProcessorErrorReason::from)?;
            c.into()
        };
        Ok(Box::new(Self {
            host: host.to_string(),
            port,
            secure_connector,
            api_key,
            user_agent,
            logctx,
        }))
    } // end of fn try_build

    async fn _client(&self) -> Result<AppBriqpayClient, AppProcessorErrorReason> {
        AppBriqpayClient::try_build(
            self.logctx.clone(),
            &self.secure_connector,
            self.host.clone(),
            self.port,
            self.api_key.clone(),
            self.user_agent.clone(),
        )
        .await
        .map_err(AppProcessorErrorReason::from)
    }

    fn _accept_2xx(
        &self,
        resp: (JsnVal, hyper::StatusCode),
    ) -> Result<JsnVal, AppProcessorErrorReason> {
        let (body, status) = resp;
        if status.is_success() {
            Ok(body)
        } else {
            let logctx_p = &self.logctx;
            app_log_event!(
                logctx_p,
                AppLogLevel::ERROR,
                "status:{}, body:{}",
                status.as_u16(),
                body
            );
            Err(AppProcessorErrorReason::ProviderDeclined {
                status: status.as_u16(),
                body: body.to_string(),
            })
        }
    }

    fn _session_from_resp(fallback_id: &str, resp: &JsnVal) -> SessionModel {
        let sid = resp
            .get("sessionId")
            .and_then(JsnVal::as_str)
            .unwrap_or(fallback_id)
            .to_string();
        SessionModel::parse(sid, resp)
    }
} // end of impl AppProcessorBriqpayCtx

#[async_trait]
impl AbstBriqpayContext for AppProcessorBriqpayCtx {
    async fn create_session(
        &self,
        body: JsnVal,
    ) -> Result<SessionModel, AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let resp = client
            .execute_json("/v3/session", Method::POST, Some(&body))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        let resp = self._accept_2xx(resp)?;
        Ok(Self::_session_from_resp("", &resp))
    }

    async fn read_session(
        &self,
        session_id: &str,
    ) -> Result<SessionModel, AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}");
        let resp = client
            .execute_json::<JsnVal>(path.as_str(), Method::GET, None)
            .await
            .map_err(AppProcessorErrorReason::from)?;
        let resp = self._accept_2xx(resp)?;
        Ok(Self::_session_from_resp(session_id, &resp))
    }

    async fn update_session(
        &self,
        session_id: &str,
        body: JsnVal,
    ) -> Result<SessionModel, AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}");
        let resp = client
            .execute_json(path.as_str(), Method::PATCH, Some(&body))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        let resp = self._accept_2xx(resp)?;
        Ok(Self::_session_from_resp(session_id, &resp))
    }

    async fn update_references(
        &self,
        session_id: &str,
        refs: ReferencesWire,
    ) -> Result<(), AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}/metadata");
        let resp = client
            .execute_json(path.as_str(), Method::PATCH, Some(&refs))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        self._accept_2xx(resp).map(|_v| ())
    }

    async fn send_decision(
        &self,
        session_id: &str,
        body: DecisionWire,
    ) -> Result<(), AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}/decision");
        let resp = client
            .execute_json(path.as_str(), Method::POST, Some(&body))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        self._accept_2xx(resp).map(|_v| ())
    }

    async fn capture_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<String, AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}/order/capture");
        let resp = client
            .execute_json(path.as_str(), Method::POST, Some(&body))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        let resp = self._accept_2xx(resp)?;
        resp.get("captureId")
            .and_then(JsnVal::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| {
                AppProcessorErrorReason::CorruptedResponse("capture-id-missing".to_string())
            })
    }

    async fn refund_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<(), AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}/order/refund");
        let resp = client
            .execute_json(path.as_str(), Method::POST, Some(&body))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        self._accept_2xx(resp).map(|_v| ())
    }

    async fn cancel_order(
        &self,
        session_id: &str,
    ) -> Result<CancelOutcome, AppProcessorErrorReason> {
        let mut client = self._client().await?;
        let path = format!("/v3/session/{session_id}/order/cancel");
        let body = serde_json::json!({"data": {}});
        let (resp, status) = client
            .execute_json(path.as_str(), Method::POST, Some(&body))
            .await
            .map_err(AppProcessorErrorReason::from)?;
        if status.is_success() {
            return Ok(CancelOutcome::Cancelled);
        }
        // cancellation being unsupported at the routed PSP is an expected
        // business outcome, everything else is a genuine failure
        let code = resp.pointer("/error/code").and_then(JsnVal::as_str);
        let msg = resp.pointer("/error/message").and_then(JsnVal::as_str);
        if code == Some(CANCEL_NOT_SUPPORTED_CODE) && msg == Some(CANCEL_NOT_SUPPORTED_MSG) {
            let logctx_p = &self.logctx;
            app_log_event!(
                logctx_p,
                AppLogLevel::WARNING,
                "cancel-not-supported, session:{}",
                session_id
            );
            Ok(CancelOutcome::NotSupportedAtPsp)
        } else {
            self._accept_2xx((resp, status)).map(|_v| CancelOutcome::Cancelled)
        }
    } // end of fn cancel_order
} // end of impl AbstBriqpayContext for AppProcessorBriqpayCtx
