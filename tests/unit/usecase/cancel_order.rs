use std::boxed::Box;
use std::sync::{Arc, Mutex};

use serde_json::json;

use checkout_payment::adapter::processor::{AbstractPaymentOrchestrator, CancelOutcome};
use checkout_payment::api::web::dto::CancelReqDto;
use checkout_payment::model::{MerchantOrderState, MerchantOrderStatus};
use checkout_payment::usecase::{CancelOrderUcError, CancelOrderUseCase};

use super::{ut_order_model, MockCheckoutRepo, MockOrchestrator, MockOrderRepo};
use crate::ut_setup_log_context;

fn ut_usecase(
    mock: MockOrchestrator,
    checkout_repo: MockCheckoutRepo,
    order_repo: MockOrderRepo,
) -> CancelOrderUseCase {
    let processors: Arc<Box<dyn AbstractPaymentOrchestrator>> = Arc::new(Box::new(mock));
    CancelOrderUseCase {
        processors,
        checkout_repo: Box::new(checkout_repo),
        order_repo: Box::new(order_repo),
        logctx: ut_setup_log_context(),
    }
}

fn ut_req() -> CancelReqDto {
    serde_json::from_value(json!({"order_id": "100000023"})).unwrap()
}

#[actix_web::test]
async fn cancel_releases_reservation_at_provider() {
    let progress = Arc::new(Mutex::new(None));
    let cleared = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        _cancel_order_result: Mutex::new(Some(Ok(CancelOutcome::Cancelled))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _clear_session_id_result: Mutex::new(Some(Ok(()))),
        _cleared_cart: cleared.clone(),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_order_id_result: Mutex::new(Some(Ok(Some(ut_order_model(31250))))),
        _update_progress_result: Mutex::new(Some(Ok(()))),
        _progress_recorded: progress.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let result = uc.execute(ut_req()).await;
    assert!(result.is_ok());
    let resp = result.ok().unwrap();
    assert!(resp.cancelled_at_provider);
    assert!(resp.warning.is_none());
    let (order_id, state, status) = progress.lock().unwrap().take().unwrap();
    assert_eq!(order_id.as_str(), "100000023");
    assert_eq!(state, MerchantOrderState::Canceled);
    assert_eq!(status, MerchantOrderStatus::Canceled);
    // the cart no longer points at the cancelled session
    assert_eq!(
        cleared.lock().unwrap().take().unwrap().as_str(),
        "cart-00481"
    );
}

#[actix_web::test]
async fn provider_keeping_reservation_downgrades_to_warning() {
    let progress = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        _cancel_order_result: Mutex::new(Some(Ok(CancelOutcome::NotSupportedAtPsp))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _clear_session_id_result: Mutex::new(Some(Ok(()))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_order_id_result: Mutex::new(Some(Ok(Some(ut_order_model(31250))))),
        _update_progress_result: Mutex::new(Some(Ok(()))),
        _progress_recorded: progress.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let result = uc.execute(ut_req()).await;
    let resp = result.ok().unwrap();
    assert!(!resp.cancelled_at_provider);
    let warning = resp.warning.unwrap();
    assert!(warning.contains("does not support cancellation"));
    // the merchant-side cancellation still lands
    assert!(progress.lock().unwrap().take().is_some());
}

#[actix_web::test]
async fn cancel_unknown_order() {
    let mock = MockOrchestrator::default();
    let order_repo = MockOrderRepo {
        _fetch_by_order_id_result: Mutex::new(Some(Ok(None))),
        ..Default::default()
    };
    let uc = ut_usecase(mock, MockCheckoutRepo::default(), order_repo);
    let result = uc.execute(ut_req()).await;
    assert!(matches!(result, Err(CancelOrderUcError::OrderNotFound)));
}
