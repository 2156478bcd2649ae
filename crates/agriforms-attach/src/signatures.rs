//! Magic-number table keyed by extension

use crate::config::normalize_extension;
use crate::ConfigError;
use std::collections::HashMap;

/// Content shorter than this never matches
pub const MIN_CONTENT_LEN: usize = 4;

const PDF: &[u8] = &[0x25, 0x50, 0x44, 0x46];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const GIF: &[u8] = &[0x47, 0x49, 0x46, 0x38];
const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const ZIP: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

const BUILTIN: &[(&str, &[u8])] = &[
    ("pdf", PDF),
    ("jpg", JPEG),
    ("jpeg", JPEG),
    ("png", PNG),
    ("gif", GIF),
    ("doc", OLE),
    ("docx", ZIP),
    ("xlsx", ZIP),
    ("pptx", ZIP),
];

/// Expected leading bytes per extension
#[derive(Debug, Clone)]
pub struct SignatureTable {
    entries: HashMap<String, Vec<u8>>,
}

impl SignatureTable {
    /// Table with the built-in formats
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(ext, sig)| (ext.to_string(), sig.to_vec()))
                .collect(),
        }
    }

    /// Add or replace a signature given as hex
    pub fn insert_hex(&mut self, extension: &str, hex_signature: &str) -> Result<(), ConfigError> {
        let extension = normalize_extension(extension);
        let bytes = hex::decode(hex_signature.trim()).map_err(|source| {
            ConfigError::InvalidSignature {
                extension: extension.clone(),
                source,
            }
        })?;
        if bytes.is_empty() {
            return Err(ConfigError::EmptySignature(extension));
        }
        self.entries.insert(extension, bytes);
        Ok(())
    }

    /// Signature for an extension
    pub fn expected(&self, extension: &str) -> Option<&[u8]> {
        self.entries.get(extension).map(Vec::as_slice)
    }

    /// Whether an extension has a signature
    pub fn contains(&self, extension: &str) -> bool {
        self.entries.contains_key(extension)
    }

    /// Check `content` against the signature for `extension`.
    ///
    /// Content under [`MIN_CONTENT_LEN`] bytes fails; extensions without a
    /// signature pass.
    pub fn matches(&self, extension: &str, content: &[u8]) -> bool {
        if content.len() < MIN_CONTENT_LEN {
            return false;
        }
        match self.expected(extension) {
            Some(signature) => content.starts_with(signature),
            None => true,
        }
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}
