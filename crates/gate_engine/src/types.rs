use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gate_core::LicenseId;

pub const STATUS_OK: &str = "OK";
pub const STATUS_NO_KEY: &str = "NO_KEY";
pub const STATUS_NO_EXPORT_DIR: &str = "NO_EXPORT_DIR";
pub const STATUS_ERROR: &str = "ERROR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateRequest {
    pub license_key: String,
    pub machine_hash: String,
    pub app_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub status: String,
    #[serde(default)]
    pub license_id: Option<LicenseId>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub license_key: String,
    pub machine_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub status: String,
    #[serde(default)]
    pub license_id: Option<LicenseId>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl ValidateResponse {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            license_id: None,
            session_token: None,
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub license_id: LicenseId,
    pub machine_hash: String,
    pub session_token: String,
}

/// Parameters handed to the collection worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub keyword: String,
    pub price: f64,
    pub pinned: u32,
    pub reviews: u32,
    #[serde(rename = "exportDir")]
    pub export_dir: String,
}

/// `{status, message?}` answer of the start/stop bridge calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message: None,
        }
    }

    pub fn with_message(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: Some(message.into()),
        }
    }
}

/// Progress line of the worker. Missing or `null` fields read as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerProgress {
    #[serde(deserialize_with = "lenient::count")]
    pub visited: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub collected: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub filtered: u64,
    #[serde(deserialize_with = "lenient::optional_number")]
    pub avg_price: Option<f64>,
    #[serde(deserialize_with = "lenient::optional_number")]
    pub avg_pinned: Option<f64>,
    #[serde(rename = "outfile", deserialize_with = "lenient::optional_text")]
    pub output_file: Option<String>,
}

/// One collected listing. Missing or `null` fields read as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerItem {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub pinned: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub reviews: u64,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub url: Option<String>,
}

/// Field decoders for worker output, which is loosely typed: `null` for
/// absent values, floats for counts, and numbers sent as strings.
pub(crate) mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    fn to_number<E: Error>(value: &Value) -> Result<Option<f64>, E> {
        let number = match value {
            Value::Null => return Ok(None),
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            other => return Err(E::custom(format!("expected a number, found {other}"))),
        };
        match number {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(E::custom(format!("not a finite number: {value}"))),
        }
    }

    /// Non-negative count; fractional values are rounded.
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(exact) = value.as_u64() {
            return Ok(exact);
        }
        match to_number::<D::Error>(&value)? {
            None => Ok(0),
            Some(n) if n >= 0.0 => Ok(n.round() as u64),
            Some(n) => Err(D::Error::custom(format!("negative count {n}"))),
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(to_number::<D::Error>(&value)?.unwrap_or_default())
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        to_number(&value)
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(D::Error::custom(format!("expected text, found {other}"))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        optional_text(deserializer).map(Option::unwrap_or_default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Activated(Result<ActivateResponse, ApiError>),
    Validated(Result<ValidateResponse, ApiError>),
    /// Heartbeat timer fired; the coordinator decides whether to send.
    HeartbeatDue,
    HeartbeatSent(Result<(), ApiError>),
    /// `Err` when the license re-check before launch could not reach the authority.
    ScrapeStarted(Result<ControlResponse, ApiError>),
    ScrapeStopped(ControlResponse),
    Progress(WorkerProgress),
    Item(WorkerItem),
    Status(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Decode(String),
}
