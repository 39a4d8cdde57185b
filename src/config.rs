//! Store configuration.
//!
//! A host passes this as JSON to [`create_store`](crate::create_store). Every
//! field has a default, so `{}` is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level settings for a [`PhraseStore`](crate::store::PhraseStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base path of the LMDB environment; the directory is `<db_path>.lmdb`.
    pub db_path: String,
    /// Key of the single slot holding the collection.
    pub slot_name: String,
    /// Search debounce window in milliseconds.
    pub debounce_ms: u64,
    /// LMDB map size.
    pub map_size_bytes: usize,
    pub simulation: SimulationConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "phrases_db".to_string(),
            slot_name: "phrases".to_string(),
            debounce_ms: 300,
            map_size_bytes: 10 * 1024 * 1024,
            simulation: SimulationConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.slot_name.is_empty() {
            return Err(ConfigError::EmptySlotName);
        }
        self.simulation.validate()
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Simulated remote latency and failure.
///
/// Disabled by default. When enabled, each operation waits its fixed latency
/// and then fails independently with probability `failure_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
    /// Probability of failing an operation (0.0 - 1.0).
    pub failure_rate: f64,
    pub load_ms: u64,
    pub add_ms: u64,
    pub update_ms: u64,
    pub delete_ms: u64,
    /// Fixed RNG seed for reproducible fault sequences.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_rate: 0.1,
            load_ms: 500,
            add_ms: 300,
            update_ms: 300,
            delete_ms: 200,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ConfigError::InvalidFailureRate(self.failure_rate));
        }
        Ok(())
    }
}
