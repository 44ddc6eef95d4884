use std::boxed::Box;
use std::result::Result;

use async_trait::async_trait;
use serde_json::Value as JsnVal;

use super::resources::{DecisionWire, ReferencesWire, SettlementWire};
use super::{AbstBriqpayContext, AppProcessorErrorReason, CancelOutcome};
use crate::model::SessionModel;

const MOCK_SESSION_ID: &str = "mock-briqpay-session-id";
const MOCK_CAPTURE_ID: &str = "mock-briqpay-capture-id";

/// canned provider backed by a local JSON document, the file holds the
/// session payload every read returns
pub(crate) struct MockProcessorBriqpayCtx {
    data_src: String,
}

impl MockProcessorBriqpayCtx {
    pub(crate) fn build(data_src: String) -> Box<dyn AbstBriqpayContext> {
        Box::new(Self { data_src })
    }

    fn load_canned(&self) -> Result<JsnVal, AppProcessorErrorReason> {
        let raw = std::fs::read(self.data_src.as_str())
            .map_err(|e| AppProcessorErrorReason::CorruptedResponse(e.to_string()))?;
        serde_json::from_slice::<JsnVal>(&raw)
            .map_err(|e| AppProcessorErrorReason::CorruptedResponse(e.to_string()))
    }
}

#[async_trait]
impl AbstBriqpayContext for MockProcessorBriqpayCtx {
    async fn create_session(
        &self,
        _body: JsnVal,
    ) -> Result<SessionModel, AppProcessorErrorReason> {
        let mut canned = self.load_canned()?;
        if let Some(obj) = canned.as_object_mut() {
            obj.entry("sessionId")
                .or_insert(JsnVal::String(MOCK_SESSION_ID.to_string()));
            obj.entry("htmlSnippet").or_insert(JsnVal::String(
                "<div id=\"briqpay-widget\"></div>".to_string(),
            ));
        }
        Ok(session_from(&canned))
    }

    async fn read_session(
        &self,
        session_id: &str,
    ) -> Result<SessionModel, AppProcessorErrorReason> {
        let canned = self.load_canned()?;
        let sid = canned
            .get("sessionId")
            .and_then(JsnVal::as_str)
            .unwrap_or(session_id)
            .to_string();
        Ok(SessionModel::parse(sid, &canned))
    }

    async fn update_session(
        &self,
        session_id: &str,
        _body: JsnVal,
    ) -> Result<SessionModel, AppProcessorErrorReason> {
        self.read_session(session_id).await
    }

    async fn update_references(
        &self,
        _session_id: &str,
        _refs: ReferencesWire,
    ) -> Result<(), AppProcessorErrorReason> {
        Ok(())
    }

    async fn send_decision(
        &self,
        _session_id: &str,
        _body: DecisionWire,
    ) -> Result<(), AppProcessorErrorReason> {
        Ok(())
    }

    async fn capture_order(
        &self,
        _session_id: &str,
        _body: SettlementWire,
    ) -> Result<String, AppProcessorErrorReason> {
        Ok(MOCK_CAPTURE_ID.to_string())
    }

    async fn refund_order(
        &self,
        _session_id: &str,
        _body: SettlementWire,
    ) -> Result<(), AppProcessorErrorReason> {
        Ok(())
    }

    async fn cancel_order(
        &self,
        _session_id: &str,
    ) -> Result<CancelOutcome, AppProcessorErrorReason> {
        Ok(CancelOutcome::Cancelled)
    }
} // end of impl MockProcessorBriqpayCtx

fn session_from(canned: &JsnVal) -> SessionModel {
    let sid = canned
        .get("sessionId")
        .and_then(JsnVal::as_str)
        .unwrap_or(MOCK_SESSION_ID)
        .to_string();
    SessionModel::parse(sid, canned)
}
