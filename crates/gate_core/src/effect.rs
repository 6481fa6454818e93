use std::fmt;

use crate::{LicenseId, ScrapeParameters, StartBlocked};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Activate { license_key: String },
    Validate,
    StartHeartbeat,
    SendHeartbeat(HeartbeatPayload),
    StartScrape(ScrapeParameters),
    StopScrape,
    PersistParameters(ScrapeParameters),
    Notify(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatPayload {
    pub license_id: LicenseId,
    pub machine_hash: String,
    pub session_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing message produced by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LicenseKeyRequired,
    Activating,
    Activated { remaining_days: Option<i64> },
    LicenseExpired,
    InvalidLicenseKey,
    LicenseBoundElsewhere,
    ActivationError(String),
    ActivationFailed(String),
    StartBlocked(StartBlocked),
    Starting,
    Started,
    NoLicenseKey,
    NoExportDirectory,
    StartError(String),
    StartFailed(String),
    Stopped,
    StopFailed,
    Completed,
    ExportLocation(String),
    NoExportFile,
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::Activating | Notice::Starting | Notice::NoExportFile => NoticeLevel::Info,
            Notice::Activated { .. }
            | Notice::Started
            | Notice::Stopped
            | Notice::Completed
            | Notice::ExportLocation(_) => NoticeLevel::Success,
            Notice::LicenseKeyRequired | Notice::LicenseExpired | Notice::StartBlocked(_) => {
                NoticeLevel::Warning
            }
            Notice::InvalidLicenseKey
            | Notice::LicenseBoundElsewhere
            | Notice::ActivationError(_)
            | Notice::ActivationFailed(_)
            | Notice::NoLicenseKey
            | Notice::NoExportDirectory
            | Notice::StartError(_)
            | Notice::StartFailed(_)
            | Notice::StopFailed => NoticeLevel::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LicenseKeyRequired => write!(f, "Please enter a license key"),
            Notice::Activating => write!(f, "Activating..."),
            Notice::Activated {
                remaining_days: Some(days),
            } => write!(f, "Activation succeeded, {days} days remaining"),
            Notice::Activated {
                remaining_days: None,
            } => write!(f, "Activation succeeded"),
            Notice::LicenseExpired => write!(f, "License has expired"),
            Notice::InvalidLicenseKey => write!(f, "License key is invalid"),
            Notice::LicenseBoundElsewhere => {
                write!(f, "License key is already bound to another device")
            }
            Notice::ActivationError(message) => write!(f, "Activation error: {message}"),
            Notice::ActivationFailed(message) => write!(f, "Activation failed: {message}"),
            Notice::StartBlocked(StartBlocked::NotActivated) => {
                write!(f, "Please activate the software first")
            }
            Notice::StartBlocked(StartBlocked::MissingKeyword) => {
                write!(f, "Please enter a product keyword")
            }
            Notice::StartBlocked(StartBlocked::MissingExportDirectory) => {
                write!(f, "Please choose an export directory")
            }
            Notice::Starting => write!(f, "Starting collection..."),
            Notice::Started => write!(f, "Collection started"),
            Notice::NoLicenseKey => write!(f, "No license key found"),
            Notice::NoExportDirectory => write!(f, "No export directory selected"),
            Notice::StartError(message) => write!(f, "Start error: {message}"),
            Notice::StartFailed(message) => write!(f, "Failed to start collection: {message}"),
            Notice::Stopped => write!(f, "Collection stopped"),
            Notice::StopFailed => write!(f, "Failed to stop collection"),
            Notice::Completed => write!(f, "Collection finished"),
            Notice::ExportLocation(path) => write!(f, "Results exported to: {path}"),
            Notice::NoExportFile => write!(f, "No export file yet"),
        }
    }
}
