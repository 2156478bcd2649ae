//! CLI Configuration

use crate::output::OutputFormat;
use agriforms_engine::EngineConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-user settings from `~/.agriforms/config.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Engine configuration used when `--config` is not given
    pub engine_config: Option<PathBuf>,
    pub default_format: Option<OutputFormat>,
}

impl Profile {
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Engine configuration: the explicit path, else the profile's, else defaults
    pub fn engine_config(&self, explicit: Option<&Path>) -> anyhow::Result<EngineConfig> {
        match explicit.or(self.engine_config.as_deref()) {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading engine config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".agriforms").join("config.toml"))
    }
}
