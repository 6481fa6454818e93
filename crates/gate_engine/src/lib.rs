//! Harvest gate engine: license authority client, stores, worker and the engine thread.
mod api;
mod bridge;
mod engine;
mod heartbeat;
mod identity;
mod persist;
mod settings;
mod store;
mod types;
mod worker;

pub use api::{LicenseApi, ReqwestLicenseApi};
pub use bridge::Bridge;
pub use engine::{EngineHandle, EngineStopped};
pub use heartbeat::HeartbeatTimer;
pub use identity::{
    current_signals, hash_machine_guid, HostIdentitySource, IdentityResolver, MachineIdSource,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use settings::{
    ClientSettings, WorkerCommand, DEFAULT_API_BASE, DEFAULT_SALT, ENV_API_BASE, ENV_SALT,
    ENV_STATE_DIR, ENV_WORKER_CMD,
};
pub use store::{IdentityCache, LicenseStore, StoredLicense};
pub use types::{
    ActivateRequest, ActivateResponse, ApiError, ControlResponse, EngineEvent, HeartbeatRequest,
    LicenseId, ScrapeRequest, ValidateRequest, ValidateResponse, WorkerItem, WorkerProgress,
    STATUS_ERROR, STATUS_NO_EXPORT_DIR, STATUS_NO_KEY, STATUS_OK,
};
pub use worker::{
    ChannelEventSink, EventSink, ProcessWorker, ScrapeWorker, WorkerError, ERROR_STATUS,
    PARAMS_ENV, STOPPED_STATUS,
};
