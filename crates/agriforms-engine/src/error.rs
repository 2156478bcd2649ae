//! Error types for the form engine

use agriforms_attach::Rejection;
use agriforms_schema::{Relation, SchemaError};
use std::fmt;
use thiserror::Error;

/// Result type for form operations
pub type FormResult<T> = std::result::Result<T, FormError>;

/// Form engine error type
#[derive(Error, Debug)]
pub enum FormError {
    /// The schema cannot be turned into a form
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Input names a field the form does not have
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Input value does not fit the control kind
    #[error("field `{field}` expects {expected} input")]
    InputMismatch {
        /// Target field
        field: String,
        /// Kind of input the control takes
        expected: &'static str,
    },

    /// Choice outside the field options
    #[error("`{value}` is not an option of field `{field}`")]
    UnknownOption {
        /// Select or multiselect field
        field: String,
        /// Value outside its options
        value: String,
    },

    /// Lookup id not among the populated records
    #[error("record {id} is not available for field `{field}`")]
    UnknownRecord {
        /// Lookup field
        field: String,
        /// Record id that was not offered
        id: i64,
    },

    /// File field is full
    #[error("field `{field}` already holds the maximum of {max} files")]
    MaxFilesReached {
        /// File field
        field: String,
        /// Its file limit
        max: u32,
    },

    /// Upload refused, answers unchanged
    #[error("upload to `{field}` refused: {source}")]
    Upload {
        /// File field
        field: String,
        /// Why it was refused
        #[source]
        source: UploadError,
    },

    /// File removal index past the end of the list
    #[error("no file at index {index} in field `{field}`")]
    FileIndexOutOfRange {
        /// File field
        field: String,
        /// Requested index
        index: usize,
    },

    /// Required visible fields are unanswered
    #[error("{}", describe_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// Related records could not be fetched
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Submission payload could not be persisted
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Attachment validator could not be built
    #[error("attachment validator: {0}")]
    Attachments(#[from] agriforms_attach::ConfigError),

    /// The actor task owning the instance has stopped
    #[error("form actor stopped")]
    ActorClosed,
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    let parts: Vec<String> = violations.iter().map(ToString::to_string).collect();
    format!("form is incomplete: {}", parts.join("; "))
}

/// Why an upload was refused before or by the validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The attachment validator rejected the bytes
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The field's accepted-type list does not cover the file
    #[error("`{filename}` is not an accepted type for this field ({accepted})")]
    NotAccepted {
        /// Uploaded file name
        filename: String,
        /// Field's accepted-type list
        accepted: String,
    },
}

/// A field that blocks submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Offending field
    pub field: String,
    /// What is wrong with it
    pub reason: ViolationReason,
}

/// Reason a field blocks submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    /// Visible, required and unanswered
    Required,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            ViolationReason::Required => write!(f, "`{}` is required", self.field),
        }
    }
}

/// Schema store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// No schema stored under the key
    #[error("schema not found: {0}")]
    NotFound(String),

    /// Key is empty, starts with `.`, or holds a path separator
    #[error("invalid schema key: {0}")]
    InvalidKey(String),

    /// Reading or writing the schema file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored schema is malformed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Relationship lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The member registry could not answer
    #[error("{relation} lookup failed for member {parent}: {reason}")]
    Unavailable {
        /// Member whose relatives were requested
        parent: i64,
        /// Relation looked up
        relation: Relation,
        /// Backend message
        reason: String,
    },
}

/// Submission sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// Storage refused the payload
    #[error("submission rejected by storage: {0}")]
    Rejected(String),

    /// Payload could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Engine configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Attachment settings are inconsistent
    #[error(transparent)]
    Attachments(#[from] agriforms_attach::ConfigError),
}
