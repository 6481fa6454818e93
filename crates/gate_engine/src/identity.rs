use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use gate_core::{derive_fallback_identity, DeviceIdentity, EnvironmentSignals};
use gate_logging::{gate_info, gate_warn};
use sha2::{Digest, Sha256};

use crate::store::IdentityCache;

const MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Authoritative host identifier, if the platform offers one.
pub trait HostIdentitySource: Send + Sync {
    fn machine_guid(&self) -> Option<String>;
}

/// Reads the OS machine id from the first readable candidate file.
#[derive(Debug, Clone)]
pub struct MachineIdSource {
    candidates: Vec<PathBuf>,
}

impl Default for MachineIdSource {
    fn default() -> Self {
        Self {
            candidates: MACHINE_ID_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl MachineIdSource {
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

impl HostIdentitySource for MachineIdSource {
    fn machine_guid(&self) -> Option<String> {
        self.candidates.iter().find_map(|path| {
            fs::read_to_string(path)
                .ok()
                .map(|raw| raw.trim().to_string())
                .filter(|guid| !guid.is_empty())
        })
    }
}

/// Lowercase hex SHA-256 of `guid + salt`.
pub fn hash_machine_guid(guid: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(guid.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Fallback identity signals taken from the host and the controlling terminal.
pub fn current_signals() -> EnvironmentSignals {
    let dimension = |key: &str| {
        std::env::var(key)
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
    };
    let local_minus_utc = chrono::Local::now().offset().local_minus_utc();
    EnvironmentSignals {
        agent: format!(
            "harvest_gate/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
        display_width: dimension("COLUMNS"),
        display_height: dimension("LINES"),
        timezone_offset_minutes: -(local_minus_utc / 60),
    }
}

/// Resolves the device identity once per process.
///
/// Order: salted host machine id, then the cached identity, then a value
/// derived from [`EnvironmentSignals`] which is written back to the cache.
pub struct IdentityResolver {
    source: Box<dyn HostIdentitySource>,
    salt: String,
    cache: IdentityCache,
    signals: EnvironmentSignals,
    resolved: OnceLock<DeviceIdentity>,
}

impl IdentityResolver {
    pub fn new(
        source: Box<dyn HostIdentitySource>,
        salt: impl Into<String>,
        cache: IdentityCache,
        signals: EnvironmentSignals,
    ) -> Self {
        Self {
            source,
            salt: salt.into(),
            cache,
            signals,
            resolved: OnceLock::new(),
        }
    }

    pub fn resolve(&self) -> DeviceIdentity {
        self.resolved.get_or_init(|| self.resolve_uncached()).clone()
    }

    fn resolve_uncached(&self) -> DeviceIdentity {
        if let Some(guid) = self.source.machine_guid() {
            gate_info!("identity: using host machine id");
            return DeviceIdentity::new(hash_machine_guid(&guid, &self.salt));
        }
        if let Some(cached) = self.cache.load() {
            gate_info!("identity: using cached identity");
            return DeviceIdentity::new(cached);
        }

        let derived = derive_fallback_identity(&self.signals);
        if let Err(err) = self.cache.save(derived.as_str()) {
            gate_warn!("identity: could not cache derived identity: {err}");
        }
        gate_info!("identity: derived {derived} from environment");
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_hex_of_guid_and_salt() {
        assert_eq!(
            hash_machine_guid("", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_machine_guid("ab", "c"), hash_machine_guid("a", "bc"));
        assert_ne!(hash_machine_guid("a", "bc"), hash_machine_guid("a", "bd"));
    }
}
