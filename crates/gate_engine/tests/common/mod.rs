#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use gate_engine::{
    ActivateRequest, ActivateResponse, ApiError, EventSink, HeartbeatRequest, LicenseApi,
    LicenseId, ScrapeRequest, ScrapeWorker, ValidateRequest, ValidateResponse, WorkerError,
    WorkerItem, WorkerProgress,
};

/// Scripted license authority recording every request.
pub struct FakeApi {
    pub activate_reply: Mutex<Result<ActivateResponse, ApiError>>,
    pub validate_reply: Mutex<Result<ValidateResponse, ApiError>>,
    pub activations: Mutex<Vec<ActivateRequest>>,
    pub validations: Mutex<Vec<ValidateRequest>>,
    pub heartbeats: Mutex<Vec<HeartbeatRequest>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            activate_reply: Mutex::new(Ok(activate_ok(7))),
            validate_reply: Mutex::new(Ok(validate_ok(7, "sess-7"))),
            activations: Mutex::default(),
            validations: Mutex::default(),
            heartbeats: Mutex::default(),
        }
    }
}

#[async_trait::async_trait]
impl LicenseApi for FakeApi {
    async fn activate(&self, request: &ActivateRequest) -> Result<ActivateResponse, ApiError> {
        self.activations.lock().unwrap().push(request.clone());
        self.activate_reply.lock().unwrap().clone()
    }

    async fn validate(&self, request: &ValidateRequest) -> Result<ValidateResponse, ApiError> {
        self.validations.lock().unwrap().push(request.clone());
        self.validate_reply.lock().unwrap().clone()
    }

    async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), ApiError> {
        self.heartbeats.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub fn activate_ok(license_id: i64) -> ActivateResponse {
    ActivateResponse {
        status: "OK".to_string(),
        license_id: Some(LicenseId::from(license_id)),
        expires_at: Some("2099-01-01T00:00:00Z".to_string()),
        message: None,
    }
}

pub fn validate_ok(license_id: i64, token: &str) -> ValidateResponse {
    ValidateResponse {
        status: "OK".to_string(),
        license_id: Some(LicenseId::from(license_id)),
        session_token: Some(token.to_string()),
        expires_at: Some("2099-01-01T00:00:00Z".to_string()),
    }
}

/// Worker that emits a scripted burst of events synchronously on start.
#[derive(Default)]
pub struct FakeWorker {
    pub starts: Mutex<Vec<ScrapeRequest>>,
    pub stops: Mutex<usize>,
    pub refuse: Mutex<Option<String>>,
    pub emit_on_start: Mutex<Vec<WorkerItem>>,
}

#[async_trait::async_trait]
impl ScrapeWorker for FakeWorker {
    async fn start(
        &self,
        request: ScrapeRequest,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), WorkerError> {
        if self.refuse.lock().unwrap().is_some() {
            return Err(WorkerError::AlreadyRunning);
        }
        self.starts.lock().unwrap().push(request);
        let items: Vec<WorkerItem> = self.emit_on_start.lock().unwrap().clone();
        for (n, item) in items.into_iter().enumerate() {
            sink.on_progress(WorkerProgress {
                visited: n as u64 + 1,
                collected: n as u64 + 1,
                ..WorkerProgress::default()
            });
            sink.on_item(item);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), WorkerError> {
        *self.stops.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn scrape_request(export_dir: &str) -> ScrapeRequest {
    ScrapeRequest {
        keyword: "lamp".to_string(),
        price: 10.0,
        pinned: 100,
        reviews: 5,
        export_dir: export_dir.to_string(),
    }
}

pub fn item(title: &str) -> WorkerItem {
    WorkerItem {
        title: title.to_string(),
        price: 9.9,
        pinned: 120,
        reviews: 3,
        url: None,
    }
}
