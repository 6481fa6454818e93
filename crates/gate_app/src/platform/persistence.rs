use std::fs;
use std::path::{Path, PathBuf};

use gate_core::ScrapeParameters;
use gate_engine::AtomicFileWriter;
use gate_logging::{gate_error, gate_info, gate_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = "ui_state.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PersistedParameters {
    keyword: String,
    #[serde(default)]
    price_floor: f64,
    #[serde(default)]
    min_pinned: u32,
    #[serde(default)]
    min_reviews: u32,
    #[serde(default)]
    export_dir: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct PersistedUiState {
    #[serde(default)]
    consent_accepted: bool,
    #[serde(default)]
    parameters: Option<PersistedParameters>,
}

impl PersistedUiState {
    pub(crate) fn consent_accepted(&self) -> bool {
        self.consent_accepted
    }

    pub(crate) fn accept_consent(&mut self) {
        self.consent_accepted = true;
    }

    pub(crate) fn parameters(&self) -> Option<ScrapeParameters> {
        self.parameters.as_ref().map(|saved| ScrapeParameters {
            keyword: saved.keyword.clone(),
            price_floor: saved.price_floor,
            min_pinned: saved.min_pinned,
            min_reviews: saved.min_reviews,
            export_dir: saved.export_dir.clone(),
        })
    }

    pub(crate) fn set_parameters(&mut self, parameters: &ScrapeParameters) {
        self.parameters = Some(PersistedParameters {
            keyword: parameters.keyword.clone(),
            price_floor: parameters.price_floor,
            min_pinned: parameters.min_pinned,
            min_reviews: parameters.min_reviews,
            export_dir: parameters.export_dir.clone(),
        });
    }
}

pub(crate) fn load_ui_state(state_dir: &Path) -> PersistedUiState {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PersistedUiState::default();
        }
        Err(err) => {
            gate_warn!("Failed to read persisted ui state from {:?}: {}", path, err);
            return PersistedUiState::default();
        }
    };

    match ron::from_str(&content) {
        Ok(state) => {
            gate_info!("Loaded persisted ui state from {:?}", path);
            state
        }
        Err(err) => {
            gate_warn!("Failed to parse persisted ui state from {:?}: {}", path, err);
            PersistedUiState::default()
        }
    }
}

pub(crate) fn save_ui_state(state_dir: &Path, state: &PersistedUiState) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(state, pretty) {
        Ok(text) => text,
        Err(err) => {
            gate_error!("Failed to serialize ui state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(STATE_FILENAME, &content) {
        gate_error!("Failed to write ui state to {:?}: {}", state_dir, err);
    }
}

/// Stores the last started form values next to the consent flag.
pub(crate) fn save_parameters(state_dir: &Path, parameters: &ScrapeParameters) {
    let mut state = load_ui_state(state_dir);
    state.set_parameters(parameters);
    save_ui_state(state_dir, &state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn parameters() -> ScrapeParameters {
        ScrapeParameters {
            keyword: "desk lamp".to_string(),
            price_floor: 12.5,
            min_pinned: 300,
            min_reviews: 10,
            export_dir: "/data/out".to_string(),
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let state = load_ui_state(temp.path());

        assert!(!state.consent_accepted());
        assert_eq!(state.parameters(), None);
    }

    #[test]
    fn parameters_keep_the_consent_flag() {
        let temp = TempDir::new().unwrap();
        let mut state = PersistedUiState::default();
        state.accept_consent();
        save_ui_state(temp.path(), &state);

        save_parameters(temp.path(), &parameters());
        let loaded = load_ui_state(temp.path());

        assert!(loaded.consent_accepted());
        assert_eq!(loaded.parameters(), Some(parameters()));
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STATE_FILENAME), "(consent_accepted: maybe").unwrap();

        assert_eq!(load_ui_state(temp.path()), PersistedUiState::default());
    }
}
