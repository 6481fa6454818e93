//! Harvest gate core: pure license/job state machine and view-model helpers.
mod bounded;
mod effect;
mod identity;
mod msg;
mod state;
mod update;
mod view_model;

pub use bounded::BoundedView;
pub use effect::{Effect, HeartbeatPayload, Notice, NoticeLevel};
pub use identity::{derive_fallback_identity, EnvironmentSignals, FALLBACK_IDENTITY_PREFIX};
pub use msg::{ActivateReply, Msg, StartReply, StopReply, ValidateReply};
pub use state::{
    remaining_days, ActivationState, AppState, DeviceIdentity, JobState, LicenseId,
    LicenseSession, ProgressSnapshot, ResultItem, ScrapeParameters, SessionCredentials,
    StartBlocked, ACTIVITY_LOG_CAPACITY, COMPACT_VIEW_CAPACITY, DETAILED_VIEW_CAPACITY,
    HEARTBEAT_PERIOD, IDLE_STATUS,
};
pub use update::update;
pub use view_model::{AppViewModel, CompactCard, DetailRow, MetricsView};
