use std::boxed::Box;
use std::sync::{Arc, Mutex};

use serde_json::json;

use checkout_payment::adapter::processor::{
    AbstractPaymentOrchestrator, AppProcessorFnLabel,
};
use checkout_payment::api::web::dto::OrderStatusWebhookDto;
use checkout_payment::model::SessionModel;
use checkout_payment::usecase::OrderWebhookUseCase;

use super::{
    ut_order_model, ut_processor_error, ut_provider_session_raw, ut_session_model,
    MockCheckoutRepo, MockOrchestrator, MockOrderRepo,
};
use crate::{ut_setup_checkout_cfg, ut_setup_log_context};

fn ut_usecase(
    mock: MockOrchestrator,
    checkout_repo: MockCheckoutRepo,
    order_repo: MockOrderRepo,
) -> OrderWebhookUseCase {
    let processors: Arc<Box<dyn AbstractPaymentOrchestrator>> = Arc::new(Box::new(mock));
    OrderWebhookUseCase {
        cfg: ut_setup_checkout_cfg(),
        processors,
        checkout_repo: Box::new(checkout_repo),
        order_repo: Box::new(order_repo),
        logctx: ut_setup_log_context(),
    }
}

fn ut_req() -> OrderStatusWebhookDto {
    serde_json::from_value(json!({
        "quoteId": "cart-00481",
        "sessionId": "sess-9f2a",
        "event": "order_status"
    }))
    .unwrap()
}

#[actix_web::test]
async fn hook_backfills_reference_and_materializes() {
    let saved = Arc::new(Mutex::new(None));
    let created = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "completed",
            31250,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(None))),
        _save_session_id_result: Mutex::new(Some(Ok(()))),
        _mark_converted_result: Mutex::new(Some(Ok(true))),
        _saved_pair: saved.clone(),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_cart_id_result: Mutex::new(Some(Ok(None))),
        _create_result: Mutex::new(Some(Ok(true))),
        _created_order: created.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(resp.status);
    assert!(resp.message.is_none());
    let pair = saved.lock().unwrap().take().unwrap();
    assert_eq!(pair.1.as_str(), "sess-9f2a");
    let order_m = created.lock().unwrap().take().unwrap();
    // order id taken from the reference patched in at bootstrap time
    assert_eq!(order_m.order_id.as_str(), "100000023");
    assert_eq!(order_m.grand_total, 31250);
} // end of fn hook_backfills_reference_and_materializes

#[actix_web::test]
async fn hook_recovers_cart_from_interrupted_confirm() {
    // a confirm that inserted nothing left the cart unconverted, the
    // next delivery completes the conversion on its own
    let created = Arc::new(Mutex::new(None));
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "completed",
            31250,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        _mark_converted_result: Mutex::new(Some(Ok(true))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_cart_id_result: Mutex::new(Some(Ok(None))),
        _create_result: Mutex::new(Some(Ok(true))),
        _created_order: created.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(resp.status);
    let order_m = created.lock().unwrap().take().unwrap();
    assert_eq!(order_m.order_id.as_str(), "100000023");
} // end of fn hook_recovers_cart_from_interrupted_confirm

#[actix_web::test]
async fn hook_yields_to_concurrent_confirm() {
    // the order insert loses against a confirm running at the same
    // moment, the hook acknowledges and leaves the convert flag to the
    // winner (unconfigured mock would panic on a flip attempt)
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "completed",
            31250,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_cart_id_result: Mutex::new(Some(Ok(None))),
        _create_result: Mutex::new(Some(Ok(false))),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(resp.status);
}

#[actix_web::test]
async fn duplicate_delivery_stays_write_free() {
    // the stored order already carries the progress the hook reports,
    // update-progress is unconfigured and would panic if reached
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "completed",
            31250,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_cart_id_result: Mutex::new(Some(Ok(Some(ut_order_model(31250))))),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(resp.status);
}

#[actix_web::test]
async fn progress_change_written_through() {
    let progress = Arc::new(Mutex::new(None));
    // existing order still pending, the session has moved to approved
    let pending_raw = {
        let mut raw = ut_provider_session_raw("completed", 31250);
        *raw.pointer_mut("/moduleStatus/payment/orderStatus").unwrap() =
            json!("order_pending");
        raw
    };
    let session = SessionModel::parse("sess-9f2a".to_string(), &pending_raw);
    let (pending_order, _warnings) =
        checkout_payment::model::MerchantOrderModel::materialize(
            "100000023".to_string(),
            "cart-00481".to_string(),
            &session,
            31250,
            true,
        )
        .unwrap();
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "completed",
            31250,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo {
        _fetch_by_cart_id_result: Mutex::new(Some(Ok(Some(pending_order)))),
        _update_progress_result: Mutex::new(Some(Ok(()))),
        _progress_recorded: progress.clone(),
        ..Default::default()
    };
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(resp.status);
    let (order_id, state, _status) = progress.lock().unwrap().take().unwrap();
    assert_eq!(order_id.as_str(), "100000023");
    assert_eq!(state, checkout_payment::model::MerchantOrderState::Processing);
} // end of fn progress_change_written_through

#[actix_web::test]
async fn session_mismatch_acknowledged_without_processing() {
    let mock = MockOrchestrator::default();
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-other".to_string())))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo::default();
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    // acknowledged so the provider stops redelivering, nothing touched
    assert!(resp.status);
}

#[actix_web::test]
async fn session_read_failure_requests_redelivery() {
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Err(ut_processor_error(
            AppProcessorFnLabel::ReadSession,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo::default();
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(!resp.status);
    assert!(resp.message.unwrap().contains("session read"));
}

#[actix_web::test]
async fn unfinished_session_acknowledged() {
    let mock = MockOrchestrator {
        _read_session_result: Mutex::new(Some(Ok(ut_session_model(
            "sess-9f2a",
            "pending",
            31250,
        )))),
        ..Default::default()
    };
    let checkout_repo = MockCheckoutRepo {
        _get_session_id_result: Mutex::new(Some(Ok(Some("sess-9f2a".to_string())))),
        ..Default::default()
    };
    let order_repo = MockOrderRepo::default();
    let uc = ut_usecase(mock, checkout_repo, order_repo);
    let resp = uc.execute(ut_req()).await;
    assert!(resp.status);
}
