use std::boxed::Box;
use std::marker::{Send, Sync};

use serde_json::Value as JsnVal;

use crate::api::web::dto::CheckoutCartDto;
use crate::config::AppCheckoutCfg;
use crate::model::{CartModel, SessionModel};

/// reworks an outgoing session create / update body before it is sent,
/// merchants use this to inject identity fields the storefront does not
/// natively collect
pub trait AbstractCartPayloadMutator: Send + Sync {
    fn mutate(&self, body: JsnVal, cfg: &AppCheckoutCfg, cart: &CartModel) -> JsnVal;
}

/// merchant-side veto evaluated at decision time, an `Err` carries the
/// internal reason which is logged, never shown to the buyer
pub trait AbstractDecisionVeto: Send + Sync {
    fn evaluate(&self, session: &SessionModel, cart: &CheckoutCartDto) -> Result<(), String>;
}

/// composition-time registry replacing a publish/subscribe event bus,
/// hooks run in registration order
#[derive(Default)]
pub struct AppHookRegistry {
    mutators: Vec<Box<dyn AbstractCartPayloadMutator>>,
    vetoes: Vec<Box<dyn AbstractDecisionVeto>>,
}

impl AppHookRegistry {
    pub fn register_payload_mutator(&mut self, m: Box<dyn AbstractCartPayloadMutator>) {
        self.mutators.push(m);
    }
    pub fn register_decision_veto(&mut self, v: Box<dyn AbstractDecisionVeto>) {
        self.vetoes.push(v);
    }

    pub fn apply_payload_mutations(
        &self,
        body: JsnVal,
        cfg: &AppCheckoutCfg,
        cart: &CartModel,
    ) -> JsnVal {
        self.mutators
            .iter()
            .fold(body, |acc, m| m.mutate(acc, cfg, cart))
    }

    pub fn evaluate_decision_vetoes(
        &self,
        session: &SessionModel,
        cart: &CheckoutCartDto,
    ) -> Result<(), String> {
        for v in self.vetoes.iter() {
            v.evaluate(session, cart)?;
        }
        Ok(())
    }
} // end of impl AppHookRegistry
