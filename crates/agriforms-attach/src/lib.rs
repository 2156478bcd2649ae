//! Agriforms Attachment Validator
//!
//! Decides whether an uploaded file may enter a form's answers using its
//! bytes, never the client-declared type.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 validate(filename, mime, bytes)               │
//! │                                                              │
//! │  1. size ──► 2. extension ──► 3. signature ──► 4. content    │
//! │     │            allow-list       magic bytes      scan      │
//! │     │                                               │        │
//! │     └──────── first failure short-circuits ─────────┤        │
//! │                                                     ▼        │
//! │                                            5. filename       │
//! │                                                     │        │
//! │                                          Ok(()) / Rejection  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is deterministic, performs no I/O and never mutates its input.

#![warn(missing_docs)]

pub mod accept;
pub mod config;
pub mod filename;
pub mod patterns;
pub mod signatures;
pub mod validator;

pub use accept::AcceptList;
pub use config::ValidatorConfig;
pub use filename::{extension_of, FilenameIssue, FilenameRules};
pub use patterns::ContentScanner;
pub use signatures::SignatureTable;
pub use validator::{check_extension, check_filename, check_signature, check_size, AttachmentValidator};

use thiserror::Error;

/// Default per-file size limit (10 MiB)
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Default number of leading bytes inspected by the content scan
pub const DEFAULT_SCAN_WINDOW: usize = 8 * 1024;

/// Extensions accepted out of the box
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png", "gif"];

/// Why an upload was refused. `Display` is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Larger than the configured limit
    #[error("file is too large ({}); the maximum size is {}", format_size(*.size), format_size(*.max))]
    TooLarge {
        /// Actual size in bytes
        size: usize,
        /// Limit in bytes
        max: usize,
    },

    /// Extension not in the allow-list
    #[error("file extension not allowed: `{extension}`")]
    ExtensionNotAllowed {
        /// Lower-cased extension, empty when the name has none
        extension: String,
    },

    /// Leading bytes do not match the extension
    #[error("file content does not match its `.{extension}` extension; check that the file is not corrupted")]
    SignatureMismatch {
        /// Extension the content was checked against
        extension: String,
    },

    /// Heuristic scan found active content
    #[error("file contains disallowed content and was rejected for security reasons")]
    DangerousContent {
        /// Pattern that matched
        pattern: &'static str,
    },

    /// Name looks like an executable, hidden or malformed file
    #[error("suspicious file name ({0}); please rename the file")]
    SuspiciousFilename(FilenameIssue),
}

impl Rejection {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "too_large",
            Self::ExtensionNotAllowed { .. } => "extension_not_allowed",
            Self::SignatureMismatch { .. } => "signature_mismatch",
            Self::DangerousContent { .. } => "dangerous_content",
            Self::SuspiciousFilename(_) => "suspicious_filename",
        }
    }
}

/// Validator construction error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An extra extension has no content signature and was not opted out
    #[error("extension `{0}` has no content signature; add one or list it under unsigned_extensions")]
    UnsignedExtension(String),

    /// A configured signature is not valid hex
    #[error("invalid signature for `{extension}`: {source}")]
    InvalidSignature {
        /// Extension the signature was configured for
        extension: String,
        /// Decoding failure
        #[source]
        source: hex::FromHexError,
    },

    /// A configured signature decodes to no bytes
    #[error("empty signature for `{0}`")]
    EmptySignature(String),

    /// Pattern automaton could not be built
    #[error("pattern build error: {0}")]
    Patterns(#[from] aho_corasick::BuildError),

    /// Filename rule could not be compiled
    #[error("filename rule error: {0}")]
    Regex(#[from] regex::Error),
}

/// Human-readable size: `512 B`, `1.5 KB`, `10.0 MB`
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
