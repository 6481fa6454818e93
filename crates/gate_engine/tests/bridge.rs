mod common;

use std::sync::mpsc;
use std::sync::Arc;

use gate_engine::{
    ApiError, Bridge, ChannelEventSink, EngineEvent, LicenseId, LicenseStore, StoredLicense,
    ValidateResponse, STATUS_ERROR, STATUS_NO_EXPORT_DIR, STATUS_NO_KEY, STATUS_OK,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{item, scrape_request, FakeApi, FakeWorker};

struct Fixture {
    _temp: TempDir,
    store: LicenseStore,
    api: Arc<FakeApi>,
    worker: Arc<FakeWorker>,
    bridge: Bridge,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let store = LicenseStore::new(temp.path().to_path_buf());
    let api = Arc::new(FakeApi::default());
    let worker = Arc::new(FakeWorker::default());
    let bridge = Bridge::new(api.clone(), worker.clone(), store.clone(), "hash-1", "ui");
    Fixture {
        _temp: temp,
        store,
        api,
        worker,
        bridge,
    }
}

fn store_key(fx: &Fixture) {
    fx.store
        .save(&StoredLicense {
            license_key: "KEY-1".to_string(),
            license_id: Some(LicenseId::from(7)),
        })
        .unwrap();
}

fn sink() -> (Arc<ChannelEventSink>, mpsc::Receiver<EngineEvent>) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(ChannelEventSink::new(tx)), rx)
}

#[tokio::test]
async fn successful_activation_stores_the_key() {
    let fx = fixture();

    let response = fx.bridge.activate("  KEY-1 ").await.unwrap();

    assert_eq!(response.status, STATUS_OK);
    let sent = fx.api.activations.lock().unwrap().clone();
    assert_eq!(sent[0].license_key, "KEY-1");
    assert_eq!(sent[0].machine_hash, "hash-1");
    assert_eq!(sent[0].app_version, "ui");
    assert_eq!(
        fx.store.load(),
        Some(StoredLicense {
            license_key: "KEY-1".to_string(),
            license_id: Some(LicenseId::from(7)),
        })
    );
}

#[tokio::test]
async fn rejected_activation_stores_nothing() {
    let fx = fixture();
    *fx.api.activate_reply.lock().unwrap() = Ok(gate_engine::ActivateResponse {
        status: "INVALID".to_string(),
        license_id: None,
        expires_at: None,
        message: None,
    });

    let response = fx.bridge.activate("KEY-X").await.unwrap();

    assert_eq!(response.status, "INVALID");
    assert_eq!(fx.store.load(), None);
}

#[tokio::test]
async fn validate_without_stored_key_is_local_no_key() {
    let fx = fixture();

    let response = fx.bridge.validate().await.unwrap();

    assert_eq!(response, ValidateResponse::with_status(STATUS_NO_KEY));
    assert!(fx.api.validations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn validate_uses_the_stored_key() {
    let fx = fixture();
    store_key(&fx);

    let response = fx.bridge.validate().await.unwrap();

    assert_eq!(response.session_token.as_deref(), Some("sess-7"));
    let sent = fx.api.validations.lock().unwrap().clone();
    assert_eq!(sent[0].license_key, "KEY-1");
    assert_eq!(sent[0].machine_hash, "hash-1");
}

#[tokio::test]
async fn start_checks_export_dir_before_key() {
    let fx = fixture();
    let (sink, _rx) = sink();

    let response = fx.bridge.start_scrape(scrape_request("  "), sink.clone()).await.unwrap();
    assert_eq!(response.status, STATUS_NO_EXPORT_DIR);

    let response = fx.bridge.start_scrape(scrape_request("/out"), sink).await.unwrap();
    assert_eq!(response.status, STATUS_NO_KEY);
    assert!(fx.worker.starts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn start_passes_rejected_license_status_through() {
    let fx = fixture();
    store_key(&fx);
    *fx.api.validate_reply.lock().unwrap() = Ok(ValidateResponse::with_status("EXPIRED"));
    let (sink, _rx) = sink();

    let response = fx.bridge.start_scrape(scrape_request("/out"), sink).await.unwrap();

    assert_eq!(response.status, "EXPIRED");
    assert!(fx.worker.starts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn start_reports_unreachable_authority_as_err() {
    let fx = fixture();
    store_key(&fx);
    *fx.api.validate_reply.lock().unwrap() = Err(ApiError::Timeout);
    let (sink, _rx) = sink();

    let result = fx.bridge.start_scrape(scrape_request("/out"), sink).await;

    assert_eq!(result, Err(ApiError::Timeout));
    assert!(fx.worker.starts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn start_launches_worker_with_sink() {
    let fx = fixture();
    store_key(&fx);
    fx.worker.emit_on_start.lock().unwrap().push(item("Lamp"));
    let (sink, rx) = sink();

    let response = fx.bridge.start_scrape(scrape_request("/out"), sink).await.unwrap();

    assert_eq!(response.status, STATUS_OK);
    assert_eq!(fx.worker.starts.lock().unwrap()[0].export_dir, "/out");
    let events: Vec<EngineEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], EngineEvent::Item(item("Lamp")));
}

#[tokio::test]
async fn worker_refusal_is_an_error_status() {
    let fx = fixture();
    store_key(&fx);
    *fx.worker.refuse.lock().unwrap() = Some("busy".to_string());
    let (sink, _rx) = sink();

    let response = fx.bridge.start_scrape(scrape_request("/out"), sink).await.unwrap();

    assert_eq!(response.status, STATUS_ERROR);
    assert_eq!(
        response.message.as_deref(),
        Some("a collection job is already running")
    );
}

#[tokio::test]
async fn stop_is_always_forwarded() {
    let fx = fixture();

    assert_eq!(fx.bridge.stop_scrape().await.status, STATUS_OK);
    assert_eq!(fx.bridge.stop_scrape().await.status, STATUS_OK);
    assert_eq!(*fx.worker.stops.lock().unwrap(), 2);
}
