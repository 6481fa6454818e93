use std::sync::Arc;

use gate_logging::{gate_info, gate_warn, mask_secret};

use crate::api::LicenseApi;
use crate::store::{LicenseStore, StoredLicense};
use crate::worker::{EventSink, ScrapeWorker};
use crate::{
    ActivateRequest, ActivateResponse, ApiError, ControlResponse, HeartbeatRequest,
    ScrapeRequest, ValidateRequest, ValidateResponse, STATUS_ERROR, STATUS_NO_EXPORT_DIR,
    STATUS_NO_KEY, STATUS_OK,
};

/// Front-end operations backed by the license authority, the key store and the worker.
pub struct Bridge {
    api: Arc<dyn LicenseApi>,
    worker: Arc<dyn ScrapeWorker>,
    store: LicenseStore,
    machine_hash: String,
    app_version: String,
}

impl Bridge {
    pub fn new(
        api: Arc<dyn LicenseApi>,
        worker: Arc<dyn ScrapeWorker>,
        store: LicenseStore,
        machine_hash: impl Into<String>,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            api,
            worker,
            store,
            machine_hash: machine_hash.into(),
            app_version: app_version.into(),
        }
    }

    /// Activates `license_key`; the key is stored when the authority answers OK.
    pub async fn activate(&self, license_key: &str) -> Result<ActivateResponse, ApiError> {
        let request = ActivateRequest {
            license_key: license_key.trim().to_string(),
            machine_hash: self.machine_hash.clone(),
            app_version: self.app_version.clone(),
        };
        gate_info!("activate: key {}", mask_secret(&request.license_key));
        let response = self.api.activate(&request).await?;

        if response.status == STATUS_OK {
            let stored = StoredLicense {
                license_key: request.license_key,
                license_id: response.license_id.clone(),
            };
            if let Err(err) = self.store.save(&stored) {
                gate_warn!("activate: license accepted but not saved: {err}");
            }
        }
        Ok(response)
    }

    /// Validates the stored key. `NO_KEY` when nothing has been activated yet.
    pub async fn validate(&self) -> Result<ValidateResponse, ApiError> {
        let Some(stored) = self.store.load() else {
            return Ok(ValidateResponse::with_status(STATUS_NO_KEY));
        };
        let request = ValidateRequest {
            license_key: stored.license_key,
            machine_hash: self.machine_hash.clone(),
        };
        self.api.validate(&request).await
    }

    pub async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<(), ApiError> {
        self.api.heartbeat(request).await
    }

    /// Checks the export directory and the stored key, re-validates, then launches the worker.
    ///
    /// Refusals come back as a status; `Err` only when the license re-check
    /// could not reach the authority.
    pub async fn start_scrape(
        &self,
        request: ScrapeRequest,
        sink: Arc<dyn EventSink>,
    ) -> Result<ControlResponse, ApiError> {
        if request.export_dir.trim().is_empty() {
            return Ok(ControlResponse::with_message(
                STATUS_NO_EXPORT_DIR,
                "no export directory selected",
            ));
        }
        if self.store.load().is_none() {
            return Ok(ControlResponse::with_message(STATUS_NO_KEY, "no license key stored"));
        }

        let validation = self.validate().await?;
        if validation.status != STATUS_OK {
            gate_warn!("start: license check answered {}", validation.status);
            return Ok(ControlResponse {
                status: validation.status,
                message: None,
            });
        }

        match self.worker.start(request, sink).await {
            Ok(()) => Ok(ControlResponse::ok()),
            Err(err) => {
                gate_warn!("start: worker refused: {err}");
                Ok(ControlResponse::with_message(STATUS_ERROR, err.to_string()))
            }
        }
    }

    pub async fn stop_scrape(&self) -> ControlResponse {
        match self.worker.stop().await {
            Ok(()) => ControlResponse::ok(),
            Err(err) => ControlResponse::with_message(STATUS_ERROR, err.to_string()),
        }
    }
}
