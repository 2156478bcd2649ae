//! Per-field accepted-type lists
//!
//! A file field narrows what it takes with a list such as
//! `.pdf,.doc,image/*`. This runs before the validator and never widens it.

use crate::filename::extension_of;

/// Parsed accepted-type list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptList {
    extensions: Vec<String>,
    mime_types: Vec<String>,
}

impl AcceptList {
    /// Parse a comma-separated list. Tokens are `.ext`, `type/subtype`,
    /// `type/*`, or a bare extension.
    pub fn parse(spec: &str) -> Self {
        let mut list = Self::default();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let token = token.to_ascii_lowercase();
            if token.contains('/') {
                list.mime_types.push(token);
            } else {
                list.extensions.push(token.trim_start_matches('.').to_string());
            }
        }
        list
    }

    /// Whether the list has no entries (accepts anything)
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.mime_types.is_empty()
    }

    /// Whether a file with this name and declared type is accepted
    pub fn permits(&self, filename: &str, declared_mime: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let extension = extension_of(filename);
        if self.extensions.iter().any(|e| *e == extension) {
            return true;
        }
        let mime = declared_mime.trim().to_ascii_lowercase();
        self.mime_types.iter().any(|pattern| match pattern.strip_suffix("/*") {
            Some(major) => mime.split('/').next() == Some(major),
            None => *pattern == mime,
        })
    }
}
