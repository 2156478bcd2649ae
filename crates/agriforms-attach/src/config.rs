//! Validator configuration

use crate::{DEFAULT_MAX_BYTES, DEFAULT_SCAN_WINDOW};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validator settings. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Largest accepted file, in bytes
    pub max_bytes: usize,
    /// Leading bytes inspected by the content scan
    pub scan_window: usize,
    /// Extensions accepted in addition to the defaults
    pub extra_extensions: Vec<String>,
    /// Signatures for extra extensions, as hex (`"504B0304"`)
    pub extra_signatures: BTreeMap<String, String>,
    /// Extra extensions explicitly accepted without a content signature
    pub unsigned_extensions: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            scan_window: DEFAULT_SCAN_WINDOW,
            extra_extensions: Vec::new(),
            extra_signatures: BTreeMap::new(),
            unsigned_extensions: Vec::new(),
        }
    }
}

/// Lower-case an extension and strip a leading dot
pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}
