use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8010";
pub const DEFAULT_SALT: &str = "dev-salt-change";

pub const ENV_API_BASE: &str = "LICENSE_API_BASE";
pub const ENV_SALT: &str = "LICENSE_SALT";
pub const ENV_WORKER_CMD: &str = "HARVEST_WORKER_CMD";
pub const ENV_STATE_DIR: &str = "HARVEST_GATE_HOME";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base: String,
    /// Salt mixed into the host machine id before hashing.
    pub salt: String,
    /// Sent as `app_version` on activation.
    pub app_version: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub heartbeat_period: Duration,
    pub state_dir: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            salt: DEFAULT_SALT.to_string(),
            app_version: "ui".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            heartbeat_period: gate_core::HEARTBEAT_PERIOD,
            state_dir: PathBuf::from(".harvest_gate"),
        }
    }
}

impl ClientSettings {
    /// Defaults overlaid with `LICENSE_API_BASE`, `LICENSE_SALT` and `HARVEST_GATE_HOME`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(base) = non_empty(ENV_API_BASE) {
            settings.api_base = base.trim().to_string();
        }
        if let Some(salt) = non_empty(ENV_SALT) {
            settings.salt = salt;
        }
        if let Some(dir) = non_empty(ENV_STATE_DIR) {
            settings.state_dir = PathBuf::from(dir.trim());
        }
        settings
    }
}

/// External collection worker program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerCommand {
    /// Splits a command line on whitespace; `None` when blank.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(ToOwned::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_WORKER_CMD)
            .ok()
            .and_then(|line| Self::parse(&line))
    }
}
