use std::boxed::Box;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value as JsnVal};

use checkout_payment::adapter::processor::AbstractPaymentOrchestrator;
use checkout_payment::hooks::AppHookRegistry;
use checkout_payment::model::SessionModel;
use checkout_payment::usecase::{SessionBootstrapUcError, SessionBootstrapUseCase};

use super::{
    ut_checkout_cart_raw, ut_provider_session_raw, ut_session_model, MockCheckoutRepo,
    MockOrchestrator,
};
use crate::{ut_setup_checkout_cfg, ut_setup_log_context};

fn ut_usecase(mock: MockOrchestrator, repo: MockCheckoutRepo) -> SessionBootstrapUseCase {
    let processors: Arc<Box<dyn AbstractPaymentOrchestrator>> = Arc::new(Box::new(mock));
    SessionBootstrapUseCase {
        cfg: ut_setup_checkout_cfg(),
        processors,
        repo: Box::new(repo),
        hooks: Arc::new(AppHookRegistry::default()),
        logctx: ut_setup_log_context(),
    }
}

fn ut_req(cart: JsnVal) -> checkout_payment::api::web::dto::SessionBootstrapReqDto {
    serde_json::from_value(json!({"cart": cart})).unwrap()
}

fn ut_created_session() -> SessionModel {
    let mut raw = ut_provider_session_raw("pending", 31250);
    raw.as_object_mut().unwrap().insert(
        "htmlSnippet".to_string(),
        JsnVal::String("<div id=\"widget\"></div><script>init();</script>".to_string()),
    );
    SessionModel::parse("sess-9f2a".to_string(), &raw)
}

#[actix_web::test]
async fn new_session_created_and_referenced() {
    let created_payload = Arc::new(Mutex::new(None));
    let references = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        _create_session_result: Mutex::new(Some(Ok(ut_created_session()))),
        _update_references_result: Mutex::new(Some(Ok(()))),
        _created_payload: created_payload.clone(),
        _references_recorded: references.clone(),
        ..Default::default()
    };
    let saved = Arc::new(Mutex::new(None));
    let repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(None))),
        _save_session_id_result: Mutex::new(Some(Ok(()))),
        _saved_pair: saved.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, repo);
    let mut cart = ut_checkout_cart_raw("312.50");
    cart.as_object_mut().unwrap().insert(
        "reserved_order_id".to_string(),
        JsnVal::String("100000023".to_string()),
    );
    let result = uc.execute(ut_req(cart)).await;
    assert!(result.is_ok());
    let resp = result.ok().unwrap();
    assert_eq!(resp.session_id.as_str(), "sess-9f2a");
    assert_eq!(resp.html_snippet.as_str(), "<div id=\"widget\"></div>");
    let pair = saved.lock().unwrap().take().unwrap();
    assert_eq!(pair.0.as_str(), "cart-00481");
    assert_eq!(pair.1.as_str(), "sess-9f2a");
    let payload = created_payload.lock().unwrap().take().unwrap();
    assert_eq!(
        payload.pointer("/data/order/amountIncVat").unwrap().as_i64(),
        Some(31250)
    );
    let refs = references.lock().unwrap().take().unwrap();
    assert_eq!(
        refs.pointer("/references/reference1").unwrap().as_str(),
        Some("100000023")
    );
} // end of fn new_session_created_and_referenced

#[actix_web::test]
async fn unchanged_session_reused_without_update() {
    // neither update-session nor create-session is configured, any call
    // to them would panic
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "pending",
            31250,
        )))),
        ..Default::default()
    };
    let repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let uc = ut_usecase(mock, repo);
    let result = uc.execute(ut_req(ut_checkout_cart_raw("312.50"))).await;
    assert_eq!(result.ok().unwrap().session_id.as_str(), "sess-9f2a");
}

#[actix_web::test]
async fn diverged_session_pushed_back_to_provider() {
    let updated_payload = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        // remote session still carries an outdated total
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "pending",
            30000,
        )))),
        _update_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "pending",
            31250,
        )))),
        _updated_payload: updated_payload.clone(),
        ..Default::default()
    };
    let repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let uc = ut_usecase(mock, repo);
    let result = uc.execute(ut_req(ut_checkout_cart_raw("312.50"))).await;
    assert!(result.is_ok());
    let payload = updated_payload.lock().unwrap().take().unwrap();
    assert_eq!(
        payload.pointer("/data/order/amountIncVat").unwrap().as_i64(),
        Some(31250)
    );
}

#[actix_web::test]
async fn completed_session_refuses_bootstrap() {
    // payment already went through on the stored session, handing the
    // buyer a fresh payable widget could charge the cart twice, the
    // attempt fails and only the dangling reference gets cleaned up
    // (create-session is unconfigured and would panic if reached)
    let cleared = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "completed",
            31250,
        )))),
        ..Default::default()
    };
    let repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        _clear_session_id_result: Mutex::new(Some(Ok(()))),
        _cleared_cart: cleared.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, repo);
    let result = uc.execute(ut_req(ut_checkout_cart_raw("312.50"))).await;
    assert!(matches!(
        result,
        Err(SessionBootstrapUcError::SessionConsumed)
    ));
    assert_eq!(
        cleared.lock().unwrap().take().unwrap().as_str(),
        "cart-00481"
    );
} // end of fn completed_session_refuses_bootstrap

#[actix_web::test]
async fn empty_cart_rejected_before_any_io() {
    let mock = MockOrchestrator::default();
    let repo = MockCheckoutRepo::default();
    let uc = ut_usecase(mock, repo);
    let cart = json!({
        "cart_id": "cart-00481",
        "currency": "SEK",
        "base_currency": "SEK",
        "currency_rate": "1.0",
        "grand_total": "0.00",
        "items": []
    });
    let result = uc.execute(ut_req(cart)).await;
    assert!(matches!(result, Err(SessionBootstrapUcError::CartInvalid(_))));
}
