//! Engine Configuration

use crate::error::ConfigError;
use agriforms_attach::{AttachmentValidator, ValidatorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Files per upload field when the schema sets no limit
pub const DEFAULT_MAX_FILES: u32 = 3;

/// Accepted types for upload fields that set none
pub const DEFAULT_ACCEPTED_TYPES: &str = ".pdf,.doc,.docx,.jpg,.jpeg,.png";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attachment validator settings
    pub attachments: ValidatorConfig,
    /// Default `maxFiles` for file fields
    pub default_max_files: u32,
    /// Default `acceptedFileTypes` for file fields
    pub default_accepted_types: String,
    /// Directory holding `<key>.json` schemas
    pub schema_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attachments: ValidatorConfig::default(),
            default_max_files: DEFAULT_MAX_FILES,
            default_accepted_types: DEFAULT_ACCEPTED_TYPES.into(),
            schema_dir: PathBuf::from("forms"),
        }
    }
}

impl EngineConfig {
    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the attachment validator
    pub fn validator(&self) -> Result<AttachmentValidator, ConfigError> {
        Ok(AttachmentValidator::new(&self.attachments)?)
    }
}
