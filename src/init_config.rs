// init_config.rs
// Handles loading and parsing the run configuration from particle_life.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::SimConfig;
use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "particle_life.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InitConfig {
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Settings for the headless driver.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of frames to run. Runs until the process is stopped when omitted.
    pub frames: Option<u64>,
    /// Emit a summary line every N frames.
    pub log_every: u64,
    /// Ask for a fresh rule matrix every N frames.
    pub regenerate_every: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: Some(600),
            log_every: 60,
            regenerate_every: None,
        }
    }
}

impl InitConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: InitConfig = toml::from_str(content)?;
        config.simulation.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }
}
