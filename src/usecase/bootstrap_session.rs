use std::boxed::Box;
use std::sync::Arc;

use crate::adapter::processor::{
    compose_session_payload, AbstractPaymentOrchestrator, AppProcessorError, ReferencesWire,
};
use crate::adapter::repository::{AbstractCheckoutSessionRepo, AppRepoError};
use crate::api::web::dto::{SessionBootstrapReqDto, SessionBootstrapRespDto};
use crate::config::AppCheckoutCfg;
use crate::hooks::AppHookRegistry;
use crate::logging::{app_log_event, AppLogContext, AppLogLevel};
use crate::model::{CartModel, CartModelError, ContactModel, SessionModel};

use super::decode_guest_email;

pub enum SessionBootstrapUcError {
    CartInvalid(CartModelError), // client error, e.g. status code 400
    // the stored session already completed payment, handing out a fresh
    // payable session for the same cart would risk a double charge
    SessionConsumed,
    ExternalProviderError(AppProcessorError),
    DataStoreError(AppRepoError),
}

impl From<CartModelError> for SessionBootstrapUcError {
    fn from(value: CartModelError) -> Self {
        Self::CartInvalid(value)
    }
}
impl From<AppProcessorError> for SessionBootstrapUcError {
    fn from(value: AppProcessorError) -> Self {
        Self::ExternalProviderError(value)
    }
}
impl From<AppRepoError> for SessionBootstrapUcError {
    fn from(value: AppRepoError) -> Self {
        Self::DataStoreError(value)
    }
}

pub struct SessionBootstrapUseCase {
    pub cfg: AppCheckoutCfg,
    pub processors: Arc<Box<dyn AbstractPaymentOrchestrator>>,
    pub repo: Box<dyn AbstractCheckoutSessionRepo>,
    pub hooks: Arc<AppHookRegistry>,
    pub logctx: Arc<AppLogContext>,
}

impl SessionBootstrapUseCase {
    pub async fn execute(
        &self,
        req: SessionBootstrapReqDto,
    ) -> Result<SessionBootstrapRespDto, SessionBootstrapUcError> {
        let guest_email = decode_guest_email(req.guest_email_hash.as_deref());
        let cart_m = CartModel::try_build(&self.cfg, &req.cart)?;
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
        self._warn_incomplete_contact("billing", &billing);
        self._warn_incomplete_contact("shipping", &shipping);

        let cart_id = req.cart.cart_id.as_str();
        let reusable = self._find_reusable_session(cart_id).await?;
        let session = match reusable {
            Some(existing) => {
                self._refresh_if_diverged(existing, &cart_m, &billing, &shipping)
                    .await?
            }
            None => {
                let s = self
                    ._create_new_session(cart_id, &cart_m, &billing, &shipping)
                    .await?;
                self._push_order_references(&s, &req).await;
                s
            }
        };
        Ok(SessionBootstrapRespDto {
            session_id: session.session_id.clone(),
            html_snippet: session.sanitized_html_snippet().unwrap_or_default(),
        })
    } // end of fn execute

    fn _warn_incomplete_contact(&self, label: &str, contact: &ContactModel) {
        let missing = contact.missing_fields();
        if !missing.is_empty() {
            let logctx = &self.logctx;
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "incomplete {} contact, fields: {:?}",
                label,
                missing
            );
        }
    }

    /// a stored session reference is only worth keeping when the session
    /// still exists at the provider and has not finished its lifecycle
    async fn _find_reusable_session(
        &self,
        cart_id: &str,
    ) -> Result<Option<SessionModel>, SessionBootstrapUcError> {
        let stored = self.repo.get_session_id(cart_id).await?;
        let sid = match stored {
            Some(s) => s,
            None => return Ok(None),
        };
        match self.processors.read_session(sid.as_str()).await {
            Ok(sess) if !sess.status.completed() => Ok(Some(sess)),
            Ok(_sess) => {
                // payment already went through on this cart, the stale
                // reference is dropped and the checkout must not restart
                let logctx = &self.logctx;
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "stored session already completed, cart: {}, id: {}",
                    cart_id,
                    sid
                );
                self.repo.clear_session_id(cart_id).await?;
                Err(SessionBootstrapUcError::SessionConsumed)
            }
            Err(e) => {
                let logctx = &self.logctx;
                app_log_event!(
                    logctx,
                    AppLogLevel::WARNING,
                    "stale session reference dropped, id: {}, error: {:?}",
                    sid,
                    e
                );
                self.repo.clear_session_id(cart_id).await?;
                Ok(None)
            }
        }
    } // end of fn _find_reusable_session

    /// cart or contact divergence pushes an update to the provider, an
    /// unchanged session saves the round trip entirely
    async fn _refresh_if_diverged(
        &self,
        existing: SessionModel,
        cart_m: &CartModel,
        billing: &ContactModel,
        shipping: &ContactModel,
    ) -> Result<SessionModel, SessionBootstrapUcError> {
        let unchanged = existing.amount_inc_vat == Some(cart_m.amount_inc_vat)
            && billing.matches_snapshot(&existing.billing)
            && shipping.matches_snapshot(&existing.shipping);
        if unchanged {
            return Ok(existing);
        }
        let body = {
            let raw = compose_session_payload(
                &self.cfg,
                existing.session_id.as_str(),
                cart_m,
                billing,
                shipping,
            );
            self.hooks.apply_payload_mutations(raw, &self.cfg, cart_m)
        };
        let updated = self
            .processors
            .update_session(existing.session_id.as_str(), body)
            .await?;
        Ok(updated)
    }

    async fn _create_new_session(
        &self,
        cart_id: &str,
        cart_m: &CartModel,
        billing: &ContactModel,
        shipping: &ContactModel,
    ) -> Result<SessionModel, SessionBootstrapUcError> {
        let body = {
            let raw = compose_session_payload(&self.cfg, cart_id, cart_m, billing, shipping);
            self.hooks.apply_payload_mutations(raw, &self.cfg, cart_m)
        };
        let session = self.processors.create_session(body).await?;
        self.repo
            .save_session_id(cart_id, session.session_id.as_str())
            .await?;
        Ok(session)
    }

    /// reserved order id lets back-office staff find the session by the
    /// merchant order number, a failure here never blocks the checkout
    async fn _push_order_references(&self, session: &SessionModel, req: &SessionBootstrapReqDto) {
        let reserved = match req.cart.reserved_order_id.as_ref() {
            Some(r) if !r.is_empty() => r.clone(),
            _others => return,
        };
        let refs = ReferencesWire::new(reserved, req.cart.cart_id.clone());
        if let Err(e) = self
            .processors
            .update_references(session.session_id.as_str(), refs)
            .await
        {
            let logctx = &self.logctx;
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "reference update skipped, session: {}, error: {:?}",
                session.session_id,
                e
            );
        }
    }
} // end of impl SessionBootstrapUseCase
