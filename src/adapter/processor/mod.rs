mod base_client;
mod briqpay;

use std::boxed::Box;
use std::marker::{Send, Sync};
use std::result::Result;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsnVal;

pub use self::base_client::{BaseClientError, BaseClientErrorReason};
use self::briqpay::{AbstBriqpayContext, AppProcessorBriqpayCtx, MockProcessorBriqpayCtx};
pub use self::briqpay::resources::{
    CartLineWire, DecisionWire, OrderWire, ReferencesWire, SettlementWire, SoftErrorWire,
};
pub use self::briqpay::resources::compose_session_payload;
use crate::confidentiality::AbstractConfidentiality;
use crate::config::App3rdPartyCfg;
use crate::logging::AppLogContext;
use crate::model::SessionModel;

/// merchant-side view of the payment orchestration provider, every call
/// is one authenticated HTTP round trip, session reads are the single
/// source of truth for money decisions
#[async_trait]
pub trait AbstractPaymentOrchestrator: Send + Sync {
    async fn create_session(&self, body: JsnVal) -> Result<SessionModel, AppProcessorError>;
    async fn read_session(&self, session_id: &str) -> Result<SessionModel, AppProcessorError>;
    async fn update_session(
        &self,
        session_id: &str,
        body: JsnVal,
    ) -> Result<SessionModel, AppProcessorError>;
    async fn update_references(
        &self,
        session_id: &str,
        refs: ReferencesWire,
    ) -> Result<(), AppProcessorError>;
    async fn send_decision(
        &self,
        session_id: &str,
        body: DecisionWire,
    ) -> Result<(), AppProcessorError>;
    async fn capture_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<String, AppProcessorError>;
    async fn refund_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<(), AppProcessorError>;
    async fn cancel_order(&self, session_id: &str) -> Result<CancelOutcome, AppProcessorError>;
} // end of trait AbstractPaymentOrchestrator

#[derive(Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    // recoverable business outcome, the merchant-side cancellation stays
    // in place while the provider-side state needs manual handling
    NotSupportedAtPsp,
}

#[derive(Debug)]
pub enum AppProcessorErrorReason {
    InvalidConfig,
    MissingCredential,
    CredentialCorrupted,
    NotImplemented,
    LowLvlNet(BaseClientError),
    ProviderDeclined { status: u16, body: String },
    CorruptedResponse(String),
}

#[derive(Debug)]
pub enum AppProcessorFnLabel {
    TryBuild,
    CreateSession,
    ReadSession,
    UpdateSession,
    UpdateReferences,
    SendDecision,
    CaptureOrder,
    RefundOrder,
    CancelOrder,
}

#[derive(Debug)]
pub struct AppProcessorError {
    pub reason: AppProcessorErrorReason,
    pub fn_label: AppProcessorFnLabel,
}

impl From<BaseClientError> for AppProcessorErrorReason {
    fn from(value: BaseClientError) -> Self {
        Self::LowLvlNet(value)
    }
}

struct AppProcessorContext {
    _briqpay: Box<dyn AbstBriqpayContext>,
    _logctx: Arc<AppLogContext>,
}

impl AppProcessorContext {
    fn new(
        cfgs3pt: Vec<Arc<App3rdPartyCfg>>,
        platform_tag: &str,
        cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
        _logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppProcessorError> {
        let mut errors = Vec::new();
        let mut result_briqpay = None;
        cfgs3pt
            .into_iter()
            .map(|c| match c.as_ref() {
                App3rdPartyCfg::dev {
                    name,
                    host,
                    port,
                    confidentiality_path,
                } => {
                    if result_briqpay.is_none() && name.as_str().to_lowercase() == "briqpay" {
                        result_briqpay = AppProcessorBriqpayCtx::try_build(
                            host.as_str(),
                            *port,
                            confidentiality_path.as_str(),
                            platform_tag,
                            cfdntl.clone(),
                            _logctx.clone(),
                        )
                        .map_err(|e| errors.push(e))
                        .ok();
                    }
                }
                App3rdPartyCfg::test { name, data_src } => {
                    if result_briqpay.is_none() && name.as_str().to_lowercase() == "briqpay" {
                        result_briqpay =
                            Some(MockProcessorBriqpayCtx::build(data_src.clone()));
                    }
                }
            })
            .count();
        if errors.is_empty() {
            if let Some(_briqpay) = result_briqpay {
                Ok(Self { _logctx, _briqpay })
            } else {
                Err(AppProcessorError {
                    reason: AppProcessorErrorReason::InvalidConfig,
                    fn_label: AppProcessorFnLabel::TryBuild,
                })
            }
        } else {
            Err(AppProcessorError {
                reason: errors.remove(0),
                fn_label: AppProcessorFnLabel::TryBuild,
            })
        }
    } // end of fn new
} // end of impl AppProcessorContext

#[async_trait]
impl AbstractPaymentOrchestrator for AppProcessorContext {
    async fn create_session(&self, body: JsnVal) -> Result<SessionModel, AppProcessorError> {
        self._briqpay
            .create_session(body)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::CreateSession,
            })
    }
    async fn read_session(&self, session_id: &str) -> Result<SessionModel, AppProcessorError> {
        self._briqpay
            .read_session(session_id)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::ReadSession,
            })
    }
    async fn update_session(
        &self,
        session_id: &str,
        body: JsnVal,
    ) -> Result<SessionModel, AppProcessorError> {
        self._briqpay
            .update_session(session_id, body)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::UpdateSession,
            })
    }
    async fn update_references(
        &self,
        session_id: &str,
        refs: ReferencesWire,
    ) -> Result<(), AppProcessorError> {
        self._briqpay
            .update_references(session_id, refs)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::UpdateReferences,
            })
    }
    async fn send_decision(
        &self,
        session_id: &str,
        body: DecisionWire,
    ) -> Result<(), AppProcessorError> {
        self._briqpay
            .send_decision(session_id, body)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::SendDecision,
            })
    }
    async fn capture_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<String, AppProcessorError> {
        self._briqpay
            .capture_order(session_id, body)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::CaptureOrder,
            })
    }
    async fn refund_order(
        &self,
        session_id: &str,
        body: SettlementWire,
    ) -> Result<(), AppProcessorError> {
        self._briqpay
            .refund_order(session_id, body)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::RefundOrder,
            })
    }
    async fn cancel_order(&self, session_id: &str) -> Result<CancelOutcome, AppProcessorError> {
        self._briqpay
            .cancel_order(session_id)
            .await
            .map_err(|reason| AppProcessorError {
                reason,
                fn_label: AppProcessorFnLabel::CancelOrder,
            })
    }
} // end of impl AbstractPaymentOrchestrator for AppProcessorContext

pub(crate) fn app_processor_context(
    cfg_3pt: &Option<Vec<Arc<App3rdPartyCfg>>>,
    platform_tag: &str,
    cfdntl: Arc<Box<dyn AbstractConfidentiality>>,
    logctx: Arc<AppLogContext>,
) -> Result<Box<dyn AbstractPaymentOrchestrator>, AppProcessorError> {
    let _cfg_3pt = cfg_3pt.as_ref().cloned().ok_or(AppProcessorError {
        reason: AppProcessorErrorReason::InvalidConfig,
        fn_label: AppProcessorFnLabel::TryBuild,
    })?;
    let proc = AppProcessorContext::new(_cfg_3pt, platform_tag, cfdntl, logctx)?;
    Ok(Box::new(proc))
}
