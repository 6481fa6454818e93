use std::path::PathBuf;

use gate_logging::{gate_debug, gate_warn};
use serde::{Deserialize, Serialize};

use crate::persist::{AtomicFileWriter, PersistError};
use crate::LicenseId;

const LICENSE_FILE: &str = "license_state.json";
const IDENTITY_FILE: &str = "identity.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLicense {
    pub license_key: String,
    #[serde(default)]
    pub license_id: Option<LicenseId>,
}

/// Remembers the last successfully activated license key.
#[derive(Debug, Clone)]
pub struct LicenseStore {
    writer: AtomicFileWriter,
}

impl LicenseStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn save(&self, license: &StoredLicense) -> Result<(), PersistError> {
        self.writer.write_json(LICENSE_FILE, license)?;
        gate_debug!("license store: saved key for license {:?}", license.license_id);
        Ok(())
    }

    /// A missing or unreadable file reads as "no key".
    pub fn load(&self) -> Option<StoredLicense> {
        match self.writer.read_json::<StoredLicense>(LICENSE_FILE) {
            Ok(stored) => stored.filter(|license| !license.license_key.trim().is_empty()),
            Err(err) => {
                gate_warn!("license store: ignoring unreadable state: {err}");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), PersistError> {
        self.writer.remove(LICENSE_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedIdentity {
    machine_hash: String,
}

/// Last resolved host identity, so a restart reports the same value.
#[derive(Debug, Clone)]
pub struct IdentityCache {
    writer: AtomicFileWriter,
}

impl IdentityCache {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn load(&self) -> Option<String> {
        match self.writer.read_json::<CachedIdentity>(IDENTITY_FILE) {
            Ok(cached) => cached
                .map(|cached| cached.machine_hash)
                .filter(|hash| !hash.trim().is_empty()),
            Err(err) => {
                gate_warn!("identity cache: ignoring unreadable entry: {err}");
                None
            }
        }
    }

    pub fn save(&self, machine_hash: &str) -> Result<(), PersistError> {
        self.writer.write_json(
            IDENTITY_FILE,
            &CachedIdentity {
                machine_hash: machine_hash.to_string(),
            },
        )?;
        Ok(())
    }
}
