//! Form Events - what happened to a form instance
//!
//! Events are:
//! - Named in past tense
//! - Recorded in order and drained by the host
//! - Free of file contents

use serde::Serialize;
use uuid::Uuid;

/// Something that happened to a form instance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    /// An answer was written or cleared
    AnswerChanged {
        /// Answered field
        field: String,
        /// The answer was removed
        cleared: bool,
    },
    /// A field was shown or hidden
    VisibilityChanged {
        /// Toggled field
        field: String,
        /// New visibility
        visible: bool,
    },
    /// An upload passed validation and was stored
    FileAccepted {
        /// File field
        field: String,
        /// Uploaded file name
        filename: String,
        /// Size in bytes
        size: usize,
    },
    /// An upload was refused
    FileRejected {
        /// File field
        field: String,
        /// Uploaded file name
        filename: String,
        /// User-facing reason
        reason: String,
    },
    /// A stored file was removed
    FileRemoved {
        /// File field
        field: String,
        /// Removed file name
        filename: String,
    },
    /// The form was submitted
    Submitted {
        /// Id of the produced submission
        submission_id: Uuid,
        /// Number of submitted fields
        fields: usize,
    },
}

impl FormEvent {
    /// Dotted event name, e.g. `form.submitted`
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AnswerChanged { .. } => "form.answer_changed",
            Self::VisibilityChanged { .. } => "form.visibility_changed",
            Self::FileAccepted { .. } => "form.file_accepted",
            Self::FileRejected { .. } => "form.file_rejected",
            Self::FileRemoved { .. } => "form.file_removed",
            Self::Submitted { .. } => "form.submitted",
        }
    }

    /// Field the event concerns, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::AnswerChanged { field, .. }
            | Self::VisibilityChanged { field, .. }
            | Self::FileAccepted { field, .. }
            | Self::FileRejected { field, .. }
            | Self::FileRemoved { field, .. } => Some(field),
            Self::Submitted { .. } => None,
        }
    }
}
