//! Application configuration loaded from YAML.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use civic_intake::ValidationRules;
use civic_lifecycle::AdvancePolicy;

pub const DATA_FILE_NAME: &str = "civic-connect-data.json";
pub const APP_DIR_NAME: &str = "civic-connect";

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Snapshot file; defaults to the platform data directory.
    pub data_path: Option<PathBuf>,
    /// Record new reports as submitted while disconnected.
    pub offline: bool,
    pub validation: ValidationRules,
    pub simulation: SimulationConfig,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub stagger_ms: u64,
    pub initial_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stagger_ms: 10_000,
            initial_delay_ms: 0,
        }
    }
}

impl SimulationConfig {
    pub fn advance_policy(&self) -> AdvancePolicy {
        AdvancePolicy {
            stagger: Duration::from_millis(self.stagger_ms),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
        }
    }
}

impl AppConfig {
    /// Snapshot location: explicit setting, else the platform data dir,
    /// else the working directory.
    pub fn resolved_data_path(&self) -> PathBuf {
        if let Some(path) = &self.data_path {
            return path.clone();
        }
        match dirs::data_dir() {
            Some(mut dir) => {
                dir.push(APP_DIR_NAME);
                dir.push(DATA_FILE_NAME);
                dir
            }
            None => PathBuf::from(DATA_FILE_NAME),
        }
    }
}
