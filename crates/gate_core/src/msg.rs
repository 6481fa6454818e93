use chrono::{DateTime, Utc};

use crate::{DeviceIdentity, LicenseId, ProgressSnapshot, ResultItem, ScrapeParameters, SessionCredentials};

/// Authority answer to an activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivateReply {
    Ok {
        license_id: LicenseId,
        expires_at: Option<DateTime<Utc>>,
    },
    Invalid,
    BoundToOtherDevice,
    Error(String),
}

/// Authority answer to a validation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateReply {
    Ok {
        credentials: SessionCredentials,
        expires_at: Option<DateTime<Utc>>,
    },
    Expired,
    /// Any other status (`NO_KEY`, `INVALID`, ...); logged and otherwise ignored.
    Other(String),
}

/// Bridge answer to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartReply {
    Ok,
    NoKey,
    NoExportDirectory,
    Error(String),
}

/// Bridge answer to a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReply {
    Ok,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Startup finished resolving the identity and loading saved form values.
    Initialized {
        identity: DeviceIdentity,
        saved_parameters: Option<ScrapeParameters>,
    },
    /// User asked to redeem a license key.
    ActivateClicked(String),
    /// Transport failures arrive as `Err` with a printable message.
    ActivateResponse {
        result: Result<ActivateReply, String>,
        received_at: DateTime<Utc>,
    },
    ValidateResponse {
        result: Result<ValidateReply, String>,
        received_at: DateTime<Utc>,
    },
    /// Periodic heartbeat timer fired.
    HeartbeatTick,
    HeartbeatSent(Result<(), String>),
    /// User asked to start a collection job.
    StartClicked(ScrapeParameters),
    StartResponse(Result<StartReply, String>),
    /// User asked to stop the collection job.
    StopClicked,
    StopResponse(Result<StopReply, String>),
    /// Worker progress snapshot.
    WorkerProgress(ProgressSnapshot),
    /// Worker collected one item.
    WorkerItem(ResultItem),
    /// Worker status string (`"idle"` signals completion).
    WorkerStatus(String),
    /// User cleared the result lists.
    ClearResultsClicked,
    /// User asked where the export went.
    ExportLocationRequested,
    /// Free-form line for the activity log.
    Log(String),
}
