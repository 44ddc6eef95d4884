use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::processor::{
    AbstractPaymentOrchestrator, AppProcessorError, DecisionWire, SoftErrorWire,
};
use crate::api::web::dto::{DecisionLabelDto, DecisionReqDto, DecisionRespDto};
use crate::config::AppCheckoutCfg;
use crate::hooks::AppHookRegistry;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::{CartModel, ContactModel, SessionModel};

use super::decode_guest_email;

pub enum MakeDecisionUcError {
    // the provider never received the verdict, the buyer stays blocked
    // at the widget so this is a hard failure
    DecisionDeliveryFailed(AppProcessorError),
}

impl From<AppProcessorError> for MakeDecisionUcError {
    fn from(value: AppProcessorError) -> Self {
        Self::DecisionDeliveryFailed(value)
    }
}

pub struct MakeDecisionUseCase {
    pub cfg: AppCheckoutCfg,
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub hooks: Arc<AppHookRegistry>,
    pub logctx: Arc<AppLogContext>,
}

impl MakeDecisionUseCase {
    /// fail-closed, every internal problem turns into a reject so money
    /// never moves on a cart this service could not fully verify
    pub async fn execute(
        &self,
        req: DecisionReqDto,
    ) -> Result<DecisionRespDto, MakeDecisionUcError> {
        let (wire, label) = self._evaluate(&req).await;
        self.processors
            .send_decision(req.session_id.as_str(), wire)
            .await?;
        Ok(DecisionRespDto { decision: label })
    }

    async fn _evaluate(&self, req: &DecisionReqDto) -> (DecisionWire, DecisionLabelDto) {
        let logctx = &self.logctx;
        let session = match self.processors.read_session(req.session_id.as_str()).await {
            Ok(s) => s,
            Err(e) => {
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "session unreadable at decision time, id: {}, error: {:?}",
                    req.session_id,
                    e
                );
                return Self::_reject(Vec::new());
            }
        };
        let cart_m = match CartModel::try_build(&self.cfg, &req.cart) {
            Ok(c) => c,
            Err(e) => {
                app_log_event!(
                    logctx,
                    AppLogLevel::ERROR,
                    "cart rebuild failed at decision time, session: {}, error: {:?}",
                    req.session_id,
                    e
                );
                return Self::_reject(Vec::new());
            }
        };
        if let Some(reason) = self._restriction_violated(req) {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "restriction rejected the purchase, session: {}, reason: {}",
                req.session_id,
                reason
            );
            return Self::_reject(Vec::new());
        }

        let mut soft_errors = Vec::new();
        let guest_email = decode_guest_email(req.guest_email_hash.as_deref());
        let billing = ContactModel::resolve(
            req.cart.billing_address.as_ref(),
            &req.cart,
            guest_email.as_deref(),
        );
        let ship_addr = req
            .cart
            .shipping_address
            .as_ref()
            .or(req.cart.billing_address.as_ref());
        let shipping = ContactModel::resolve(ship_addr, &req.cart, guest_email.as_deref());
        if billing.email.is_empty() {
            soft_errors.push(SoftErrorWire {
                message: "Email address is missing, please fill it in and try again".to_string(),
            });
        }
        // an empty field matching an equally-empty session snapshot would
        // slip past the comparator, completeness is checked on its own
        for (label, contact) in [("billing", &billing), ("shipping", &shipping)] {
            let mut missing = contact.missing_fields();
            missing.retain(|f| *f != "email");
            if !missing.is_empty() {
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "incomplete {} contact at decision time, session: {}, fields: {:?}",
                    label,
                    req.session_id,
                    missing
                );
                soft_errors.push(SoftErrorWire {
                    message: format!(
                        "Your {label} address is incomplete, \
                         please fill in the missing fields and try again"
                    ),
                });
            }
        }
        if !billing.matches_snapshot(&session.billing)
            || !shipping.matches_snapshot(&session.shipping)
        {
            soft_errors.push(SoftErrorWire {
                message: "Your address details have changed, please review and try again"
                    .to_string(),
            });
        }
        if session.amount_inc_vat != Some(cart_m.amount_inc_vat) {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "cart total diverged from session, session: {}, local: {}, remote: {:?}",
                req.session_id,
                cart_m.amount_inc_vat,
                session.amount_inc_vat
            );
            soft_errors.push(SoftErrorWire {
                message: "The cart total has changed, please refresh the page and try again"
                    .to_string(),
            });
        }
        if !soft_errors.is_empty() {
            return Self::_reject(soft_errors);
        }
        if let Err(reason) = self._veto_verdict(&session, req) {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "merchant veto rejected the purchase, session: {}, reason: {}",
                req.session_id,
                reason
            );
            return Self::_reject(Vec::new());
        }
        (DecisionWire::allow(), DecisionLabelDto::Allow)
    } // end of fn _evaluate

    fn _restriction_violated(&self, req: &DecisionReqDto) -> Option<String> {
        let countries = &self.cfg.allowed_countries;
        if !countries.is_empty() && !countries.contains(&self.cfg.country) {
            return Some(format!("country: {}", self.cfg.country));
        }
        let currencies = &self.cfg.allowed_currencies;
        if !currencies.is_empty() && !currencies.contains(&req.cart.currency) {
            return Some(format!("currency: {}", req.cart.currency));
        }
        None
    }

    fn _veto_verdict(&self, session: &SessionModel, req: &DecisionReqDto) -> Result<(), String> {
        self.hooks.evaluate_decision_vetoes(session, &req.cart)
    }

    fn _reject(soft_errors: Vec<SoftErrorWire>) -> (DecisionWire, DecisionLabelDto) {
        (DecisionWire::reject(soft_errors), DecisionLabelDto::Reject)
    }
} // end of impl MakeDecisionUseCase
